//! Test probes for ensemble actor systems.
//!
//! A [`TestProbe`] is a real actor whose mailbox is readable from test code:
//! use its ref as the sender of a tell (or as a watcher) and assert on what
//! arrives.
//!
//! ```no_run
//! # async fn demo(system: ensemble_actor::ActorSystem, target: ensemble_actor::ActorRef) {
//! let mut probe = ensemble_testkit::TestProbe::new(&system).unwrap();
//! probe.send(&target, String::from("ping"));
//! probe.expect_msg(String::from("ping")).await.unwrap();
//! # }
//! ```

use std::any::{Any, type_name};
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use ensemble_actor::{
	Actor, ActorContext, ActorError, ActorRef, ActorSystem, Message, Props, SpawnError, Terminated, Termination,
};
use thiserror::Error;
use tokio::sync::mpsc;

/// Default wait for `expect_*` helpers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Assertion failure raised by a probe.
#[derive(Debug, Error)]
pub enum ProbeError {
	#[error("no message within {0:?}")]
	Timeout(Duration),

	#[error("expected a `{expected}`, got a `{actual}`")]
	UnexpectedType { expected: &'static str, actual: &'static str },

	#[error("expected {expected}, got {actual}")]
	Mismatch { expected: String, actual: String },

	#[error("expected no message, got a `{0}`")]
	UnexpectedMessage(&'static str),

	#[error("expected termination of {expected}, got termination of {actual}")]
	WrongActor { expected: String, actual: String },

	#[error("no sender to reply to")]
	NoSender,

	#[error("probe actor terminated")]
	Closed,
}

/// One message captured by a probe.
#[derive(Debug)]
pub struct Received {
	pub message: Message,
	pub sender: Option<ActorRef>,
}

struct ProbeActor {
	tx: mpsc::UnboundedSender<Received>,
}

#[async_trait]
impl Actor for ProbeActor {
	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
		let sender = ctx.has_sender().then(|| ctx.sender());
		if self.tx.send(Received { message: msg, sender }).is_err() {
			// Probe handle dropped; nothing left to observe.
			ctx.stop_self();
		}
		Ok(())
	}
}

/// Actor-backed message recorder for tests.
pub struct TestProbe {
	system: ActorSystem,
	actor: ActorRef,
	rx: mpsc::UnboundedReceiver<Received>,
	last_sender: Option<ActorRef>,
	timeout: Duration,
}

impl TestProbe {
	/// Spawns a probe actor in `system`.
	pub fn new(system: &ActorSystem) -> Result<Self, SpawnError> {
		let (tx, rx) = mpsc::unbounded_channel();
		let tx = parking_lot::Mutex::new(Some(tx));
		// The factory runs once; a restarted probe would have nowhere to report.
		let actor = system.spawn(
			Props::new(move || ProbeActor {
				tx: tx.lock().take().unwrap_or_else(|| mpsc::unbounded_channel().0),
			})
			.max_restarts(0),
			None,
		)?;
		Ok(Self {
			system: system.clone(),
			actor,
			rx,
			last_sender: None,
			timeout: DEFAULT_TIMEOUT,
		})
	}

	/// Overrides the wait used by `expect_*` helpers.
	#[must_use]
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn actor_ref(&self) -> &ActorRef {
		&self.actor
	}

	/// Tells `msg` to `target` with this probe as sender.
	pub fn send<T: Any + Send>(&self, target: &ActorRef, msg: T) {
		target.tell(msg, Some(&self.actor));
	}

	/// Sender of the most recently received message.
	pub fn last_sender(&self) -> Option<&ActorRef> {
		self.last_sender.as_ref()
	}

	/// Replies to the sender of the most recently received message.
	pub fn reply<T: Any + Send>(&self, msg: T) -> Result<(), ProbeError> {
		let sender = self.last_sender.as_ref().ok_or(ProbeError::NoSender)?;
		sender.tell(msg, Some(&self.actor));
		Ok(())
	}

	/// Waits up to `within` for the next message of any type.
	pub async fn receive(&mut self, within: Duration) -> Result<Received, ProbeError> {
		let received = tokio::time::timeout(within, self.rx.recv())
			.await
			.map_err(|_| ProbeError::Timeout(within))?
			.ok_or(ProbeError::Closed)?;
		tracing::trace!(probe = %self.actor.path(), message = received.message.type_name(), "probe.received");
		self.last_sender = received.sender.clone();
		Ok(received)
	}

	/// Waits for the next message and requires it to be a `T`.
	pub async fn expect_msg_type<T: Any>(&mut self) -> Result<T, ProbeError> {
		let received = self.receive(self.timeout).await?;
		received.message.downcast::<T>().map_err(|message| ProbeError::UnexpectedType {
			expected: type_name::<T>(),
			actual: message.type_name(),
		})
	}

	/// Waits for the next message and requires it to equal `expected`.
	pub async fn expect_msg<T>(&mut self, expected: T) -> Result<T, ProbeError>
	where
		T: Any + PartialEq + Debug,
	{
		let actual = self.expect_msg_type::<T>().await?;
		if actual != expected {
			return Err(ProbeError::Mismatch {
				expected: format!("{expected:?}"),
				actual: format!("{actual:?}"),
			});
		}
		Ok(actual)
	}

	/// Requires that nothing arrives within `within`.
	pub async fn expect_no_msg(&mut self, within: Duration) -> Result<(), ProbeError> {
		match self.receive(within).await {
			Err(ProbeError::Timeout(_)) => Ok(()),
			Ok(received) => Err(ProbeError::UnexpectedMessage(received.message.type_name())),
			Err(other) => Err(other),
		}
	}

	/// Watches `target`; pair with [`TestProbe::expect_terminated`].
	pub fn watch(&self, target: &ActorRef) {
		self.system.watch(&self.actor, target);
	}

	/// Waits for the [`Terminated`] notice of `target`.
	pub async fn expect_terminated(&mut self, target: &ActorRef) -> Result<Termination, ProbeError> {
		let Terminated { actor, termination } = self.expect_msg_type::<Terminated>().await?;
		if &actor != target {
			return Err(ProbeError::WrongActor {
				expected: target.to_string(),
				actual: actor.to_string(),
			});
		}
		Ok(termination)
	}
}

impl Drop for TestProbe {
	fn drop(&mut self) {
		self.actor.stop();
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	struct Echo;

	#[async_trait]
	impl Actor for Echo {
		async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
			if let Some(text) = msg.as_text() {
				ctx.reply(text.to_string());
			}
			Ok(())
		}
	}

	#[tokio::test]
	async fn probe_observes_replies() {
		let system = ActorSystem::new("probe").unwrap();
		let echo = system.spawn(Props::new(|| Echo), Some("echo")).unwrap();
		let mut probe = TestProbe::new(&system).unwrap();

		probe.send(&echo, String::from("ping"));
		assert_eq!(probe.expect_msg(String::from("ping")).await.unwrap(), "ping");
		assert_eq!(probe.last_sender(), Some(&echo));
		probe.expect_no_msg(Duration::from_millis(30)).await.unwrap();
		system.shutdown(Duration::from_secs(1)).await;
	}

	#[tokio::test]
	async fn mismatch_and_wrong_type_are_reported() {
		let system = ActorSystem::new("probe").unwrap();
		let mut probe = TestProbe::new(&system).unwrap().with_timeout(Duration::from_millis(200));
		probe.actor_ref().tell(1u8, None);
		probe.actor_ref().tell(2u8, None);

		assert!(matches!(probe.expect_msg(9u8).await, Err(ProbeError::Mismatch { .. })));
		assert!(matches!(
			probe.expect_msg_type::<String>().await,
			Err(ProbeError::UnexpectedType { actual: "u8", .. })
		));
		assert!(matches!(probe.expect_msg_type::<u8>().await, Err(ProbeError::Timeout(_))));
		assert!(matches!(probe.reply(()), Err(ProbeError::NoSender)));
		system.shutdown(Duration::from_secs(1)).await;
	}

	#[tokio::test]
	async fn probe_sees_termination_of_watched_actor() {
		let system = ActorSystem::new("probe").unwrap();
		let echo = system.spawn(Props::new(|| Echo), None).unwrap();
		let mut probe = TestProbe::new(&system).unwrap();
		probe.watch(&echo);
		echo.stop();
		assert_eq!(probe.expect_terminated(&echo).await.unwrap(), Termination::Stopped);
		system.shutdown(Duration::from_secs(1)).await;
	}
}
