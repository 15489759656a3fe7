use std::any::{Any, type_name};
use std::fmt;

use crate::{ActorError, ActorRef, Termination};

/// Opaquely typed message payload.
///
/// The concrete type name is captured at construction so dead letters and
/// mismatched replies can be reported without downcasting.
pub struct Message {
	payload: Box<dyn Any + Send>,
	type_name: &'static str,
}

impl Message {
	/// Wraps a payload.
	pub fn new<T: Any + Send>(payload: T) -> Self {
		Self {
			payload: Box::new(payload),
			type_name: type_name::<T>(),
		}
	}

	/// Returns the payload's type name.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Returns true if the payload is a `T`.
	pub fn is<T: Any>(&self) -> bool {
		self.payload.is::<T>()
	}

	/// Borrows the payload as a `T`.
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.payload.downcast_ref::<T>()
	}

	/// Takes the payload as a `T`, handing the message back on mismatch.
	pub fn downcast<T: Any>(self) -> Result<T, Self> {
		let type_name = self.type_name;
		match self.payload.downcast::<T>() {
			Ok(value) => Ok(*value),
			Err(payload) => Err(Self { payload, type_name }),
		}
	}

	/// Borrows a textual payload (`String` or `&'static str`).
	pub fn as_text(&self) -> Option<&str> {
		if let Some(text) = self.downcast_ref::<String>() {
			return Some(text.as_str());
		}
		self.downcast_ref::<&'static str>().copied()
	}
}

impl fmt::Debug for Message {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Message").field("type", &self.type_name).finish_non_exhaustive()
	}
}

/// One enqueued user message plus its optional sender.
#[derive(Debug)]
pub(crate) struct Envelope {
	pub(crate) message: Message,
	pub(crate) sender: Option<ActorRef>,
}

impl Envelope {
	pub(crate) fn new(message: Message, sender: Option<ActorRef>) -> Self {
		Self { message, sender }
	}
}

/// Control signals carried on the mailbox priority lane.
#[derive(Debug)]
pub(crate) enum SystemSignal {
	/// Runs `pre_start` before any user message.
	Start,
	/// Graceful stop.
	Stop,
	/// Forced, abnormal termination.
	Kill,
	/// A child escalated its failure.
	Escalated { child: crate::ActorPath, cause: ActorError },
}

/// Reply status understood by the ask gateway.
///
/// Telling `Status::Failure` to an asker resolves its ask with
/// [`crate::AskError::Failed`]; `Status::Success` unwraps to the inner value.
#[derive(Debug)]
pub enum Status {
	Success(Message),
	Failure(ActorError),
}

/// Ordinary message that stops the receiving actor once reached in FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoisonPill;

/// Delivered to watchers when a watched actor terminates.
#[derive(Debug, Clone)]
pub struct Terminated {
	/// The terminated actor.
	pub actor: ActorRef,
	/// How it terminated.
	pub termination: Termination,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn downcast_mismatch_returns_message_intact() {
		let msg = Message::new(42u32);
		let msg = msg.downcast::<String>().unwrap_err();
		assert_eq!(msg.type_name(), "u32");
		assert_eq!(msg.downcast::<u32>().ok(), Some(42));
	}

	#[test]
	fn text_accessor_accepts_both_string_kinds() {
		assert_eq!(Message::new("printit").as_text(), Some("printit"));
		assert_eq!(Message::new(String::from("printit")).as_text(), Some("printit"));
		assert_eq!(Message::new(1u8).as_text(), None);
	}
}
