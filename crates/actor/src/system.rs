use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::cell::ActorCell;
use crate::dispatcher::{Dispatcher, deadline_after};
use crate::id::UidClock;
use crate::message::SystemSignal;
use crate::registry::Registry;
use crate::spawn::runtime_handle;
use crate::{
	ActorId, ActorPath, ActorRecord, ActorRef, AskError, DeadLetterOffice, Props, SpawnError, SystemConfig, SystemError,
};

/// How long killed stragglers get to finish before the dispatcher is torn down.
const KILL_GRACE: Duration = Duration::from_millis(100);

/// State shared by the system handle and every cell.
pub(crate) struct SystemShared {
	pub(crate) name: String,
	pub(crate) config: SystemConfig,
	pub(crate) registry: Registry,
	pub(crate) dead_letters: Arc<DeadLetterOffice>,
	pub(crate) dispatcher: Dispatcher,
	pub(crate) runtime: tokio::runtime::Handle,
	anonymous: UidClock,
	terminating: AtomicBool,
}

/// Outcome of [`ActorSystem::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
	/// Actors alive when shutdown began.
	pub actors: usize,
	/// Actors that had to be killed after the graceful budget ran out.
	pub forced: usize,
	/// Whether every actor stopped gracefully in time.
	pub graceful: bool,
	/// Whether dispatcher workers exited without being aborted.
	pub workers_joined: bool,
	/// Dead letters recorded over the system's lifetime.
	pub dead_letters: u64,
}

impl ShutdownReport {
	pub fn completed(&self) -> bool {
		self.graceful && self.workers_joined
	}

	pub fn timed_out(&self) -> bool {
		!self.completed()
	}
}

/// Owner of the dispatcher, the registry and the dead-letter office.
///
/// Cloning yields another handle to the same system. Live cells keep the
/// shared state alive, so dropping every handle does not stop the workers:
/// call [`ActorSystem::shutdown`] to release them.
#[derive(Clone)]
pub struct ActorSystem {
	shared: Arc<SystemShared>,
}

impl std::fmt::Debug for ActorSystem {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActorSystem")
			.field("name", &self.shared.name)
			.field("actors", &self.shared.registry.len())
			.finish_non_exhaustive()
	}
}

impl ActorSystem {
	/// Starts a system with default configuration.
	pub fn new(name: &str) -> Result<Self, SystemError> {
		Self::with_config(name, SystemConfig::default())
	}

	/// Starts a system, spawning its dispatcher workers on the ambient tokio
	/// runtime (or a shared one outside of tokio).
	pub fn with_config(name: &str, config: SystemConfig) -> Result<Self, SystemError> {
		if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
			return Err(SystemError::InvalidName(name.to_string()));
		}
		config.validate()?;
		let runtime = runtime_handle()?;
		let dispatcher = Dispatcher::start(&runtime, config.workers, config.throughput);
		tracing::info!(
			system = name,
			workers = config.workers,
			throughput = config.throughput,
			"actor_system.start"
		);
		Ok(Self {
			shared: Arc::new(SystemShared {
				name: name.to_string(),
				dead_letters: Arc::new(DeadLetterOffice::new(config.dead_letter_capacity)),
				config,
				registry: Registry::default(),
				dispatcher,
				runtime,
				anonymous: UidClock::new(),
				terminating: AtomicBool::new(false),
			}),
		})
	}

	pub(crate) fn from_shared(shared: Arc<SystemShared>) -> Self {
		Self { shared }
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	pub fn config(&self) -> &SystemConfig {
		&self.shared.config
	}

	/// Spawns a top-level actor at `/user/<name>`; `None` picks a unique `$n` name.
	pub fn spawn(&self, props: Props, name: Option<&str>) -> Result<ActorRef, SpawnError> {
		spawn_actor(&self.shared, props, name, None)
	}

	pub fn tell<T: Any + Send>(&self, target: &ActorRef, msg: T, sender: Option<&ActorRef>) {
		target.tell(msg, sender);
	}

	pub async fn ask<R, T>(&self, target: &ActorRef, msg: T, timeout: Duration) -> Result<R, AskError>
	where
		R: Any + Send,
		T: Any + Send,
	{
		crate::ask(target, msg, timeout).await
	}

	/// Ask with the configured default timeout.
	pub async fn ask_default<R, T>(&self, target: &ActorRef, msg: T) -> Result<R, AskError>
	where
		R: Any + Send,
		T: Any + Send,
	{
		crate::ask(target, msg, self.shared.config.ask_timeout()).await
	}

	pub fn stop(&self, target: &ActorRef) {
		target.stop();
	}

	pub fn kill(&self, target: &ActorRef) {
		target.kill();
	}

	/// Registers `watcher` for a [`crate::Terminated`] message when `target` terminates.
	pub fn watch(&self, watcher: &ActorRef, target: &ActorRef) {
		if let Some(cell) = target.cell() {
			cell.add_watcher(watcher.clone());
		}
	}

	/// Resolves a live actor by path, e.g. `/user/reader/$3`.
	pub fn lookup(&self, path: &str) -> Option<ActorRef> {
		self.shared.registry.lookup(path).map(ActorRef::local)
	}

	pub fn dead_letters(&self) -> &DeadLetterOffice {
		&self.shared.dead_letters
	}

	/// Ref that records everything told to it as a dead letter.
	pub fn dead_letters_ref(&self) -> ActorRef {
		ActorRef::dead_letters(Arc::clone(&self.shared.dead_letters))
	}

	/// Snapshots of live actors, sorted by path.
	pub fn records(&self) -> Vec<ActorRecord> {
		self.shared.registry.snapshots()
	}

	/// Cells waiting for a dispatcher worker.
	pub fn queued(&self) -> usize {
		self.shared.dispatcher.queued()
	}

	pub fn workers(&self) -> usize {
		self.shared.dispatcher.workers()
	}

	pub fn is_terminating(&self) -> bool {
		self.shared.terminating.load(Ordering::Acquire)
	}

	/// Stops every actor, kills whatever is still alive after `timeout`, and
	/// joins the dispatcher. Spawning fails from here on.
	pub async fn shutdown(&self, timeout: Duration) -> ShutdownReport {
		self.shared.terminating.store(true, Ordering::Release);
		let deadline = deadline_after(timeout);
		let cells = self.shared.registry.cells();
		let actors = cells.len();
		tracing::info!(system = %self.shared.name, actors, ?timeout, "actor_system.shutdown");

		for cell in cells.iter().filter(|cell| cell.is_top_level()) {
			cell.send_system(SystemSignal::Stop);
		}
		let graceful = tokio::time::timeout_at(deadline, wait_all(&cells)).await.is_ok();

		let mut forced = 0;
		if !graceful {
			let stragglers = self.shared.registry.cells();
			forced = stragglers.len();
			tracing::warn!(system = %self.shared.name, forced, "actor_system.shutdown.kill");
			for cell in &stragglers {
				cell.send_system(SystemSignal::Kill);
			}
			let _ = tokio::time::timeout(KILL_GRACE, wait_all(&stragglers)).await;
		}

		let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
		let workers_joined = self.shared.dispatcher.shutdown(remaining.max(KILL_GRACE)).await;
		// Cells whose worker was aborted never finished terminating.
		for cell in self.shared.registry.cells() {
			cell.force_terminate();
		}
		let leaked = self.shared.registry.clear();
		if leaked > 0 {
			tracing::warn!(system = %self.shared.name, leaked, "actor_system.shutdown.leaked");
		}

		let report = ShutdownReport {
			actors,
			forced,
			graceful,
			workers_joined,
			dead_letters: self.shared.dead_letters.total(),
		};
		tracing::info!(system = %self.shared.name, ?report, "actor_system.terminated");
		report
	}

	/// Shutdown with the configured default budget.
	pub async fn shutdown_default(&self) -> ShutdownReport {
		self.shutdown(self.shared.config.shutdown_timeout()).await
	}
}

async fn wait_all(cells: &[Arc<ActorCell>]) {
	for cell in cells {
		cell.terminated().await;
	}
}

fn validate_name(name: &str) -> Result<(), SpawnError> {
	if name.is_empty() || name.contains('/') || name.starts_with('$') || name.chars().any(char::is_whitespace) {
		return Err(SpawnError::InvalidName(name.to_string()));
	}
	Ok(())
}

pub(crate) fn spawn_actor(
	shared: &Arc<SystemShared>,
	props: Props,
	name: Option<&str>,
	parent: Option<&Arc<ActorCell>>,
) -> Result<ActorRef, SpawnError> {
	let name = match name {
		Some(name) => {
			validate_name(name)?;
			name.to_string()
		}
		None => format!("${}", shared.anonymous.next()),
	};
	let path = match parent {
		Some(parent) => parent.id().path().child(&name),
		None => ActorPath::top_level(&name),
	};
	if shared.terminating.load(Ordering::Acquire) || parent.is_some_and(|parent| parent.is_terminated()) {
		return Err(SpawnError::SystemTerminated(path.to_string()));
	}

	let cell = ActorCell::new(ActorId::allocate(path), parent, props, Arc::clone(shared));
	shared.registry.register(Arc::clone(&cell))?;
	let actor = ActorRef::local(Arc::clone(&cell));
	cell.start();
	if let Some(parent) = parent
		&& !parent.add_child(actor.clone())
	{
		// Parent terminated while the child was being created.
		actor.stop();
	}
	tracing::debug!(actor = %cell.id(), "actor.spawn");
	Ok(actor)
}
