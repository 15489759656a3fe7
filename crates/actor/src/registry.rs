use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cell::ActorCell;
use crate::{ActorId, ActorPath, SpawnError};

/// Scheduling state of one live actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStatus {
	/// Mailbox drained, not on the run queue.
	Idle,
	/// Queued for or currently holding a dispatcher worker.
	Scheduled,
	/// Terminated; about to leave the registry.
	Stopped,
}

/// Snapshot for one registered actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
	pub path: ActorPath,
	pub uid: u64,
	pub parent: Option<ActorPath>,
	pub pending: usize,
	pub restarts: usize,
	pub status: ActorStatus,
}

/// Path-indexed table of live actors.
#[derive(Default, Clone)]
pub(crate) struct Registry {
	inner: Arc<RwLock<HashMap<ActorPath, Arc<ActorCell>>>>,
}

impl Registry {
	/// Registers a freshly created cell under its path.
	pub(crate) fn register(&self, cell: Arc<ActorCell>) -> Result<(), SpawnError> {
		let path = cell.id().path().clone();
		let mut guard = self.inner.write();
		if guard.contains_key(&path) {
			return Err(SpawnError::NameTaken(path));
		}
		guard.insert(path, cell);
		Ok(())
	}

	/// Removes the entry for `id`, unless the path already belongs to a newer actor.
	pub(crate) fn unregister(&self, id: &ActorId) {
		let mut guard = self.inner.write();
		if guard.get(id.path()).is_some_and(|cell| cell.id() == id) {
			guard.remove(id.path());
		}
	}

	pub(crate) fn lookup(&self, path: &str) -> Option<Arc<ActorCell>> {
		self.inner.read().get(&ActorPath::from_raw(path)).cloned()
	}

	/// Returns all live cells.
	pub(crate) fn cells(&self) -> Vec<Arc<ActorCell>> {
		self.inner.read().values().cloned().collect()
	}

	pub(crate) fn len(&self) -> usize {
		self.inner.read().len()
	}

	/// Drops every entry, returning how many were left.
	pub(crate) fn clear(&self) -> usize {
		let mut guard = self.inner.write();
		let left = guard.len();
		guard.clear();
		left
	}

	/// Returns snapshots sorted by path.
	pub(crate) fn snapshots(&self) -> Vec<ActorRecord> {
		let mut records: Vec<_> = self.cells().iter().map(|cell| cell.record()).collect();
		records.sort_by(|a, b| a.path.cmp(&b.path));
		records
	}
}
