//! Request/response on top of fire-and-forget delivery.
//!
//! An ask allocates a single-use reply slot addressed by a temporary
//! [`ActorRef`], tells the target with that ref as sender, and races the slot
//! against the deadline. The slot resolves exactly once; anything sent to it
//! afterwards is a dead letter.

use std::any::{Any, type_name};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::dead_letters::DeadLetterReason;
use crate::message::Envelope;
use crate::{ActorError, ActorId, ActorPath, ActorRef, AskError, DeadLetterOffice, Message, Status};

#[derive(Debug)]
pub(crate) enum AskOutcome {
	Reply(Message),
	Failure(ActorError),
	TargetTerminated,
}

/// Single-assignment result slot of one pending ask.
pub(crate) struct PromiseSlot {
	id: ActorId,
	target: ActorPath,
	tx: Mutex<Option<oneshot::Sender<AskOutcome>>>,
	dead_letters: Arc<DeadLetterOffice>,
}

impl PromiseSlot {
	fn new(target: ActorPath, tx: oneshot::Sender<AskOutcome>, dead_letters: Arc<DeadLetterOffice>) -> Self {
		Self {
			id: ActorId::temp(),
			target,
			tx: Mutex::new(Some(tx)),
			dead_letters,
		}
	}

	pub(crate) fn id(&self) -> &ActorId {
		&self.id
	}

	pub(crate) fn dead_letter_office(&self) -> Arc<DeadLetterOffice> {
		Arc::clone(&self.dead_letters)
	}

	pub(crate) fn is_resolved(&self) -> bool {
		self.tx.lock().is_none()
	}

	/// Resolves the slot. Hands the outcome back if the slot was already
	/// resolved or the asker stopped waiting.
	fn resolve(&self, outcome: AskOutcome) -> Result<(), AskOutcome> {
		let Some(tx) = self.tx.lock().take() else {
			return Err(outcome);
		};
		tx.send(outcome)
	}

	/// Resolves from a reply told to the slot's ref.
	pub(crate) fn complete_from(&self, envelope: Envelope) {
		let Envelope { message, sender } = envelope;
		let outcome = match message.downcast::<Status>() {
			Ok(Status::Success(reply)) => AskOutcome::Reply(reply),
			Ok(Status::Failure(cause)) => AskOutcome::Failure(cause),
			Err(reply) => AskOutcome::Reply(reply),
		};
		let Err(late) = self.resolve(outcome) else {
			return;
		};
		let message = match late {
			AskOutcome::Reply(reply) => reply,
			AskOutcome::Failure(cause) => Message::new(Status::Failure(cause)),
			AskOutcome::TargetTerminated => return,
		};
		self.dead_letters
			.record_envelope(self.id.path(), Envelope::new(message, sender), DeadLetterReason::AskAlreadyResolved);
	}

	pub(crate) fn fail(&self, cause: ActorError) {
		let _ = self.resolve(AskOutcome::Failure(cause));
	}

	pub(crate) fn fail_terminated(&self) {
		if self.resolve(AskOutcome::TargetTerminated).is_ok() {
			tracing::debug!(target_actor = %self.target, ask = %self.id.path(), "ask.target_terminated");
		}
	}

	/// Marks the slot resolved without a value; later replies become dead letters.
	fn expire(&self) {
		self.tx.lock().take();
	}
}

/// Sends `msg` to `target` and waits up to `timeout` for a reply of type `R`.
///
/// Resolves exactly once with one of:
/// * `Ok(R)` when the target replies with an `R` (or `Status::Success(R)`);
/// * [`AskError::Failed`] when the target replies with `Status::Failure`, or
///   its handler returns an error while processing this message;
/// * [`AskError::TargetTerminated`] when the target is already gone, or is
///   killed with this message still queued;
/// * [`AskError::Timeout`] otherwise, once the deadline passes.
///
/// A timed-out ask does not retract the message; a late reply is recorded as
/// a dead letter.
pub async fn ask<R, T>(target: &ActorRef, msg: T, timeout: Duration) -> Result<R, AskError>
where
	R: Any + Send,
	T: Any + Send,
{
	let (tx, mut rx) = oneshot::channel();
	let target_path = target.path().clone();
	let slot = Arc::new(PromiseSlot::new(target_path.clone(), tx, target.dead_letter_office()));
	let reply_to = ActorRef::promise(Arc::clone(&slot));
	tracing::trace!(target_actor = %target_path, ask = %slot.id().path(), ?timeout, "ask.send");
	target.tell(msg, Some(&reply_to));

	let outcome = match tokio::time::timeout(timeout, &mut rx).await {
		Ok(Ok(outcome)) => outcome,
		Ok(Err(_)) => return Err(AskError::TargetTerminated { target: target_path }),
		Err(_) => {
			slot.expire();
			// A reply may have landed between the deadline firing and expiry.
			match rx.try_recv() {
				Ok(outcome) => outcome,
				Err(_) => {
					tracing::debug!(target_actor = %target_path, ?timeout, "ask.timeout");
					return Err(AskError::Timeout {
						target: target_path,
						after: timeout,
					});
				}
			}
		}
	};

	match outcome {
		AskOutcome::Reply(reply) => reply.downcast::<R>().map_err(|reply| AskError::UnexpectedReply {
			target: target_path,
			expected: type_name::<R>(),
			actual: reply.type_name(),
		}),
		AskOutcome::Failure(cause) => Err(AskError::Failed { target: target_path, cause }),
		AskOutcome::TargetTerminated => Err(AskError::TargetTerminated { target: target_path }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn slot() -> (Arc<PromiseSlot>, oneshot::Receiver<AskOutcome>, Arc<DeadLetterOffice>) {
		let office = Arc::new(DeadLetterOffice::new(8));
		let (tx, rx) = oneshot::channel();
		(Arc::new(PromiseSlot::new(ActorPath::top_level("target"), tx, Arc::clone(&office))), rx, office)
	}

	#[tokio::test]
	async fn first_reply_wins_and_late_reply_is_dead_lettered() {
		let (slot, rx, office) = slot();
		slot.complete_from(Envelope::new(Message::new(1u32), None));
		slot.complete_from(Envelope::new(Message::new(2u32), None));

		match rx.await.unwrap() {
			AskOutcome::Reply(reply) => assert_eq!(reply.downcast::<u32>().ok(), Some(1)),
			other => panic!("unexpected outcome {other:?}"),
		}
		let letters = office.drain();
		assert_eq!(letters.len(), 1);
		assert_eq!(letters[0].reason, DeadLetterReason::AskAlreadyResolved);
		assert!(slot.is_resolved());
	}

	#[tokio::test]
	async fn status_failure_resolves_as_failure() {
		let (slot, rx, _office) = slot();
		slot.complete_from(Envelope::new(Message::new(Status::Failure(ActorError::domain("nope"))), None));
		assert!(matches!(rx.await.unwrap(), AskOutcome::Failure(ActorError::Domain(msg)) if msg == "nope"));
	}

	#[tokio::test]
	async fn status_success_unwraps_inner_value() {
		let (slot, rx, _office) = slot();
		slot.complete_from(Envelope::new(Message::new(Status::Success(Message::new("ok"))), None));
		match rx.await.unwrap() {
			AskOutcome::Reply(reply) => assert_eq!(reply.as_text(), Some("ok")),
			other => panic!("unexpected outcome {other:?}"),
		}
	}

	#[tokio::test]
	async fn expired_slot_rejects_replies() {
		let (slot, _rx, office) = slot();
		slot.expire();
		slot.complete_from(Envelope::new(Message::new(5u8), None));
		slot.fail_terminated();
		assert_eq!(office.total(), 1);
	}
}
