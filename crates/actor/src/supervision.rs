use std::fmt;

use crate::ActorError;

/// What to do with an actor whose handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorDirective {
	/// Drop the failed message and keep the current state.
	Resume,
	/// Replace the actor with a fresh instance from its props, keeping the mailbox.
	Restart,
	/// Terminate the actor as failed.
	#[default]
	Stop,
	/// Terminate the actor as failed and fail its parent with the same cause.
	Escalate,
}

/// How an actor terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
	/// Graceful stop (stop signal, poison pill, or `stop_self`).
	Stopped,
	/// Forced termination.
	Killed,
	/// Terminated by the directive table after a failure.
	Failed(ActorError),
}

impl Termination {
	/// Returns true for kill and failure terminations.
	pub fn is_abnormal(&self) -> bool {
		!matches!(self, Self::Stopped)
	}

	pub(crate) const fn as_str(&self) -> &'static str {
		match self {
			Self::Stopped => "stopped",
			Self::Killed => "killed",
			Self::Failed(_) => "failed",
		}
	}
}

impl fmt::Display for Termination {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Failed(cause) => write!(f, "failed: {cause}"),
			other => f.write_str(other.as_str()),
		}
	}
}

/// Resolution of one failure after consulting the directive table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FailureOutcome {
	Resume,
	Restart,
	Terminate { escalate: bool },
}

/// Maps a directive to an outcome given the restart budget.
///
/// A restart past `max_restarts` degrades to a stop.
pub(crate) fn resolve_directive(directive: SupervisorDirective, restarts: usize, max_restarts: usize) -> FailureOutcome {
	match directive {
		SupervisorDirective::Resume => FailureOutcome::Resume,
		SupervisorDirective::Restart if restarts < max_restarts => FailureOutcome::Restart,
		SupervisorDirective::Restart | SupervisorDirective::Stop => FailureOutcome::Terminate { escalate: false },
		SupervisorDirective::Escalate => FailureOutcome::Terminate { escalate: true },
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_directive_is_stop() {
		assert_eq!(SupervisorDirective::default(), SupervisorDirective::Stop);
	}

	#[test]
	fn restart_within_budget() {
		assert_eq!(resolve_directive(SupervisorDirective::Restart, 0, 3), FailureOutcome::Restart);
		assert_eq!(resolve_directive(SupervisorDirective::Restart, 2, 3), FailureOutcome::Restart);
	}

	#[test]
	fn restart_past_budget_stops() {
		assert_eq!(
			resolve_directive(SupervisorDirective::Restart, 3, 3),
			FailureOutcome::Terminate { escalate: false }
		);
	}

	#[test]
	fn escalate_and_resume_ignore_budget() {
		assert_eq!(resolve_directive(SupervisorDirective::Resume, 99, 0), FailureOutcome::Resume);
		assert_eq!(
			resolve_directive(SupervisorDirective::Escalate, 0, 3),
			FailureOutcome::Terminate { escalate: true }
		);
	}

	#[test]
	fn only_graceful_stop_is_normal() {
		assert!(!Termination::Stopped.is_abnormal());
		assert!(Termination::Killed.is_abnormal());
		assert!(Termination::Failed(ActorError::domain("x")).is_abnormal());
		assert_eq!(Termination::Failed(ActorError::domain("x")).to_string(), "failed: x");
	}
}
