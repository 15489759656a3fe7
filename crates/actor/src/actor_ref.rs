use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::ask::PromiseSlot;
use crate::cell::ActorCell;
use crate::dead_letters::DeadLetterReason;
use crate::message::{Envelope, SystemSignal};
use crate::{ActorError, ActorId, ActorPath, AskError, DeadLetterOffice, Message, Termination};

#[derive(Clone)]
enum RefInner {
	Local(Arc<ActorCell>),
	Promise(Arc<PromiseSlot>),
	DeadLetters(Arc<DeadLetterOffice>),
}

/// Shareable handle addressing one actor.
///
/// Equality and hashing follow the actor's [`ActorId`], so a handle to a
/// terminated actor never equals a handle to a newer actor at the same path.
#[derive(Clone)]
pub struct ActorRef {
	inner: RefInner,
}

impl ActorRef {
	pub(crate) fn local(cell: Arc<ActorCell>) -> Self {
		Self {
			inner: RefInner::Local(cell),
		}
	}

	pub(crate) fn promise(slot: Arc<PromiseSlot>) -> Self {
		Self {
			inner: RefInner::Promise(slot),
		}
	}

	pub(crate) fn dead_letters(office: Arc<DeadLetterOffice>) -> Self {
		Self {
			inner: RefInner::DeadLetters(office),
		}
	}

	/// Actor identity.
	pub fn id(&self) -> &ActorId {
		match &self.inner {
			RefInner::Local(cell) => cell.id(),
			RefInner::Promise(slot) => slot.id(),
			RefInner::DeadLetters(office) => office.id(),
		}
	}

	/// Actor path.
	pub fn path(&self) -> &ActorPath {
		self.id().path()
	}

	/// Fire-and-forget send.
	///
	/// Never fails: messages to a terminated actor are recorded as dead letters.
	pub fn tell<T: Any + Send>(&self, msg: T, sender: Option<&ActorRef>) {
		self.tell_message(Message::new(msg), sender.cloned());
	}

	/// Fire-and-forget send of an already wrapped message.
	pub fn tell_message(&self, message: Message, sender: Option<ActorRef>) {
		self.deliver(Envelope::new(message, sender));
	}

	pub(crate) fn deliver(&self, envelope: Envelope) {
		match &self.inner {
			RefInner::Local(cell) => cell.send_user(envelope),
			RefInner::Promise(slot) => slot.complete_from(envelope),
			RefInner::DeadLetters(office) => office.record_envelope(office.id().path(), envelope, DeadLetterReason::NoSender),
		}
	}

	/// Request/response with a deadline. See [`crate::ask`].
	pub async fn ask<R, T>(&self, msg: T, timeout: Duration) -> Result<R, AskError>
	where
		R: Any + Send,
		T: Any + Send,
	{
		crate::ask(self, msg, timeout).await
	}

	/// Requests a graceful stop: the current message finishes, queued
	/// messages become dead letters.
	pub fn stop(&self) {
		if let RefInner::Local(cell) = &self.inner {
			cell.send_system(SystemSignal::Stop);
		}
	}

	/// Requests forced termination, recorded as abnormal. Asks queued
	/// behind the kill fail immediately.
	pub fn kill(&self) {
		if let RefInner::Local(cell) = &self.inner {
			cell.send_system(SystemSignal::Kill);
		}
	}

	/// Returns true once the actor has fully terminated.
	pub fn is_terminated(&self) -> bool {
		match &self.inner {
			RefInner::Local(cell) => cell.is_terminated(),
			RefInner::Promise(slot) => slot.is_resolved(),
			RefInner::DeadLetters(_) => false,
		}
	}

	/// Waits until the actor has terminated and reports how.
	///
	/// Ask reply refs report [`Termination::Stopped`] immediately; the
	/// dead-letters pseudo-actor never terminates.
	pub async fn terminated(&self) -> Termination {
		match &self.inner {
			RefInner::Local(cell) => cell.terminated().await,
			RefInner::Promise(_) => Termination::Stopped,
			RefInner::DeadLetters(_) => std::future::pending().await,
		}
	}

	/// Returns the actor's termination if it has already terminated.
	pub fn termination(&self) -> Option<Termination> {
		match &self.inner {
			RefInner::Local(cell) => cell.termination(),
			_ => None,
		}
	}

	pub(crate) fn cell(&self) -> Option<&Arc<ActorCell>> {
		match &self.inner {
			RefInner::Local(cell) => Some(cell),
			_ => None,
		}
	}

	pub(crate) fn dead_letter_office(&self) -> Arc<DeadLetterOffice> {
		match &self.inner {
			RefInner::Local(cell) => cell.dead_letter_office(),
			RefInner::Promise(slot) => slot.dead_letter_office(),
			RefInner::DeadLetters(office) => Arc::clone(office),
		}
	}

	/// Fails a pending ask behind this ref because its target terminated.
	pub(crate) fn notify_target_terminated(&self) {
		if let RefInner::Promise(slot) = &self.inner {
			slot.fail_terminated();
		}
	}

	/// Fails a pending ask behind this ref with a handler error.
	pub(crate) fn fail_pending_ask(&self, cause: &ActorError) {
		if let RefInner::Promise(slot) = &self.inner {
			slot.fail(cause.clone());
		}
	}
}

impl PartialEq for ActorRef {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for ActorRef {}

impl Hash for ActorRef {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id().hash(state);
	}
}

impl fmt::Debug for ActorRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ActorRef({})", self.id())
	}
}

impl fmt::Display for ActorRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self.path(), f)
	}
}
