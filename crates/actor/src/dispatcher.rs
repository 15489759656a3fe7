//! Fixed pool of workers draining a shared run queue of cells.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::TaskClass;
use crate::cell::ActorCell;

/// Stand-in for "no deadline" when `now + timeout` does not fit in an instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Instant `timeout` from now, saturating at a far-future deadline.
pub(crate) fn deadline_after(timeout: Duration) -> tokio::time::Instant {
	let now = tokio::time::Instant::now();
	now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// FIFO of cells that have work. A cell appears at most once.
#[derive(Default)]
struct RunQueue {
	cells: Mutex<VecDeque<Arc<ActorCell>>>,
	ready: Notify,
	closed: AtomicBool,
}

impl RunQueue {
	fn push(&self, cell: Arc<ActorCell>) -> bool {
		if self.closed.load(Ordering::Acquire) {
			return false;
		}
		self.cells.lock().push_back(cell);
		self.ready.notify_one();
		true
	}

	async fn pop(&self) -> Arc<ActorCell> {
		loop {
			let notified = self.ready.notified();
			let next = self.cells.lock().pop_front();
			if let Some(cell) = next {
				return cell;
			}
			notified.await;
		}
	}

	fn len(&self) -> usize {
		self.cells.lock().len()
	}
}

/// Join coordination for the worker pool.
///
/// Only one shutdown caller awaits the workers; concurrent callers wait for
/// the leader to finish.
enum JoinState {
	Running(JoinSet<()>),
	Joining,
	Done,
}

pub(crate) struct Dispatcher {
	queue: Arc<RunQueue>,
	cancel: CancellationToken,
	join: tokio::sync::Mutex<JoinState>,
	joined: Notify,
	workers: usize,
}

impl Dispatcher {
	/// Spawns `workers` workers on `handle`, each stepping one cell at a time
	/// for up to `throughput` messages.
	pub(crate) fn start(handle: &Handle, workers: usize, throughput: usize) -> Self {
		let queue = Arc::new(RunQueue::default());
		let cancel = CancellationToken::new();
		let mut set = JoinSet::new();
		for index in 0..workers {
			tracing::trace!(task_class = TaskClass::Dispatcher.as_str(), worker = index, "runtime.spawn");
			set.spawn_on(worker_loop(index, Arc::clone(&queue), cancel.clone(), throughput), handle);
		}
		Self {
			queue,
			cancel,
			join: tokio::sync::Mutex::new(JoinState::Running(set)),
			joined: Notify::new(),
			workers,
		}
	}

	pub(crate) fn enqueue(&self, cell: Arc<ActorCell>) {
		if !self.queue.push(cell) {
			tracing::trace!("dispatcher.closed");
		}
	}

	pub(crate) fn workers(&self) -> usize {
		self.workers
	}

	pub(crate) fn queued(&self) -> usize {
		self.queue.len()
	}

	/// Stops accepting cells, cancels idle workers, and waits for busy ones
	/// to finish their current step. Returns `false` if workers had to be
	/// aborted after `timeout`.
	pub(crate) async fn shutdown(&self, timeout: Duration) -> bool {
		self.queue.closed.store(true, Ordering::Release);
		self.cancel.cancel();
		let deadline = deadline_after(timeout);
		loop {
			let mut set = {
				let mut state = self.join.lock().await;
				match &*state {
					JoinState::Done => return true,
					JoinState::Joining => {
						let notified = self.joined.notified();
						drop(state);
						tokio::select! {
							_ = notified => continue,
							_ = tokio::time::sleep_until(deadline) => return false,
						}
					}
					JoinState::Running(_) => match std::mem::replace(&mut *state, JoinState::Joining) {
						JoinState::Running(set) => set,
						_ => return true,
					},
				}
			};
			let graceful = tokio::time::timeout_at(deadline, async {
				while let Some(joined) = set.join_next().await {
					if let Err(error) = joined
						&& error.is_panic()
					{
						tracing::error!(%error, "dispatcher.worker.panicked");
					}
				}
			})
			.await
			.is_ok();
			if !graceful {
				tracing::warn!(remaining = set.len(), "dispatcher.shutdown.abort");
				set.abort_all();
			}
			*self.join.lock().await = JoinState::Done;
			self.joined.notify_waiters();
			return graceful;
		}
	}
}

async fn worker_loop(index: usize, queue: Arc<RunQueue>, cancel: CancellationToken, throughput: usize) {
	tracing::trace!(worker = index, "dispatcher.worker.start");
	loop {
		let cell = tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			cell = queue.pop() => cell,
		};
		cell.run_step(throughput).await;
		cell.release();
	}
	tracing::trace!(worker = index, "dispatcher.worker.exit");
}
