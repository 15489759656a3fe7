use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{ActorContext, ActorError, MailboxConfig, Message, SupervisorDirective};

/// Behavior of one actor.
///
/// All methods run on the dispatcher worker currently holding the actor's
/// cell; at most one of them runs at a time for a given actor.
#[async_trait]
pub trait Actor: Send + 'static {
	/// Invoked before the first message, and again on each restarted instance.
	async fn pre_start(&mut self, _ctx: &mut ActorContext) -> Result<(), ActorError> {
		Ok(())
	}

	/// Handles one message. An `Err` is routed to [`Actor::on_failure`] and,
	/// when the message came from an `ask`, resolves that ask with the error.
	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError>;

	/// Invoked once the actor has terminated, and on the old instance before a restart.
	async fn post_stop(&mut self, _ctx: &mut ActorContext) {}

	/// Chooses how to react to a failed `handle` or `pre_start`.
	async fn on_failure(&mut self, _error: &ActorError, _ctx: &mut ActorContext) -> SupervisorDirective {
		SupervisorDirective::Stop
	}
}

type ActorFactory = dyn Fn() -> Box<dyn Actor> + Send + Sync;

/// Recipe for creating (and re-creating) an actor.
#[derive(Clone)]
pub struct Props {
	factory: Arc<ActorFactory>,
	pub(crate) mailbox: Option<MailboxConfig>,
	pub(crate) max_restarts: usize,
}

impl fmt::Debug for Props {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Props")
			.field("mailbox", &self.mailbox)
			.field("max_restarts", &self.max_restarts)
			.finish_non_exhaustive()
	}
}

impl Props {
	const DEFAULT_MAX_RESTARTS: usize = 10;

	/// Creates props from a factory closure.
	pub fn new<A, F>(factory: F) -> Self
	where
		A: Actor,
		F: Fn() -> A + Send + Sync + 'static,
	{
		Self {
			factory: Arc::new(move || Box::new(factory()) as Box<dyn Actor>),
			mailbox: None,
			max_restarts: Self::DEFAULT_MAX_RESTARTS,
		}
	}

	/// Overrides the system's default mailbox for this actor.
	#[must_use]
	pub fn mailbox(mut self, mailbox: MailboxConfig) -> Self {
		self.mailbox = Some(mailbox);
		self
	}

	/// Caps [`SupervisorDirective::Restart`]; past the cap a restart becomes a stop.
	#[must_use]
	pub fn max_restarts(mut self, max_restarts: usize) -> Self {
		self.max_restarts = max_restarts;
		self
	}

	pub(crate) fn produce(&self) -> Box<dyn Actor> {
		(self.factory)()
	}
}
