use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crate::cell::ActorCell;
use crate::spawn::spawn_on;
use crate::system::spawn_actor;
use crate::{ActorError, ActorPath, ActorRef, ActorSystem, AskError, Props, SpawnError, Status, TaskClass};

/// Handle given to an actor while one of its callbacks runs.
pub struct ActorContext {
	cell: Arc<ActorCell>,
	sender: Option<ActorRef>,
	stop_requested: bool,
}

impl ActorContext {
	pub(crate) fn new(cell: Arc<ActorCell>, sender: Option<ActorRef>) -> Self {
		Self {
			cell,
			sender,
			stop_requested: false,
		}
	}

	/// Ref to the running actor.
	pub fn self_ref(&self) -> ActorRef {
		ActorRef::local(Arc::clone(&self.cell))
	}

	pub fn path(&self) -> &ActorPath {
		self.cell.id().path()
	}

	/// Sender of the current message, or the dead-letters ref when there is none.
	pub fn sender(&self) -> ActorRef {
		match &self.sender {
			Some(sender) => sender.clone(),
			None => ActorRef::dead_letters(self.cell.dead_letter_office()),
		}
	}

	pub fn has_sender(&self) -> bool {
		self.sender.is_some()
	}

	/// Tells `msg` to the sender of the current message.
	pub fn reply<T: Any + Send>(&self, msg: T) {
		let this = self.self_ref();
		self.sender().tell(msg, Some(&this));
	}

	/// Replies with [`Status::Failure`], failing the sender's ask if it is one.
	pub fn reply_failure(&self, cause: impl ToString) {
		self.reply(Status::Failure(ActorError::domain(cause)));
	}

	/// Spawns a child under this actor's path. The child is stopped when this actor terminates.
	pub fn spawn(&self, props: Props, name: Option<&str>) -> Result<ActorRef, SpawnError> {
		spawn_actor(self.cell.shared(), props, name, Some(&self.cell))
	}

	pub fn children(&self) -> Vec<ActorRef> {
		self.cell.children()
	}

	/// Stops this actor once the current callback returns.
	pub fn stop_self(&mut self) {
		self.stop_requested = true;
	}

	pub(crate) fn stop_requested(&self) -> bool {
		self.stop_requested
	}

	/// Delivers [`crate::Terminated`] to this actor when `target` terminates,
	/// immediately if it already has.
	pub fn watch(&self, target: &ActorRef) {
		match target.cell() {
			Some(cell) => cell.add_watcher(self.self_ref()),
			None => tracing::debug!(actor = %self.path(), target_actor = %target.path(), "watch.unsupported_target"),
		}
	}

	pub fn unwatch(&self, target: &ActorRef) {
		if let Some(cell) = target.cell() {
			cell.remove_watcher(&self.self_ref());
		}
	}

	/// Asks `target` in the background and tells the mapped result back to
	/// this actor as an ordinary message, so the handler never blocks on a reply.
	pub fn pipe_ask<R, T, M, F>(&self, target: &ActorRef, msg: T, timeout: Duration, map: F)
	where
		R: Any + Send,
		T: Any + Send,
		M: Any + Send,
		F: FnOnce(Result<R, AskError>) -> M + Send + 'static,
	{
		let target = target.clone();
		let this = self.self_ref();
		let _ = spawn_on(&self.cell.shared().runtime, TaskClass::Pipe, async move {
			let result = crate::ask::<R, T>(&target, msg, timeout).await;
			this.tell(map(result), Some(&target));
		});
	}

	/// The system this actor belongs to.
	pub fn system(&self) -> ActorSystem {
		ActorSystem::from_shared(Arc::clone(self.cell.shared()))
	}

	/// How many times this actor has been restarted.
	pub fn restarts(&self) -> usize {
		self.cell.restarts()
	}
}
