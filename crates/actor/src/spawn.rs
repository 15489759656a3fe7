use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

/// Returns the ambient tokio runtime, or a lazily built shared one when the
/// caller is not inside a runtime.
pub(crate) fn runtime_handle() -> std::io::Result<tokio::runtime::Handle> {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return Ok(handle);
	}

	if let Some(runtime) = GLOBAL_RT.get() {
		return Ok(runtime.handle().clone());
	}
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.worker_threads(2)
		.thread_name("ensemble-global")
		.build()?;
	// A concurrent caller may have won the race; its runtime is used and ours is dropped.
	let runtime = GLOBAL_RT.get_or_init(|| runtime);
	Ok(runtime.handle().clone())
}

/// Spawns an async task on `handle` with classification metadata.
pub(crate) fn spawn_on<F>(handle: &tokio::runtime::Handle, class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(task_class = class.as_str(), "runtime.spawn");
	handle.spawn(fut)
}

/// Spawns an async task with classification metadata.
///
/// Falls back to the shared runtime outside of a tokio context.
pub fn spawn<F>(class: TaskClass, fut: F) -> std::io::Result<JoinHandle<F::Output>>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	let handle = runtime_handle()?;
	Ok(spawn_on(&handle, class, fut))
}

#[cfg(test)]
mod tests {
	use std::sync::mpsc;
	use std::time::Duration;

	use super::*;

	#[test]
	fn spawn_outside_runtime_uses_shared_runtime() {
		let (tx, rx) = mpsc::channel();
		spawn(TaskClass::Pipe, async move {
			let _ = tx.send(tokio::runtime::Handle::current().metrics().num_workers());
		})
		.unwrap();
		assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
	}

	#[tokio::test]
	async fn spawn_inside_runtime_uses_ambient_runtime() {
		let workers = spawn(TaskClass::Pipe, async { tokio::runtime::Handle::current().metrics().num_workers() })
			.unwrap()
			.await
			.unwrap();
		assert_eq!(workers, 1);
	}
}
