/// Execution classes for tasks spawned by the runtime, used for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Long-lived dispatcher worker pulling runnable actor cells.
	Dispatcher,
	/// Detached ask whose result is piped back into an actor mailbox.
	Pipe,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Dispatcher => "dispatcher",
			Self::Pipe => "pipe",
		}
	}
}
