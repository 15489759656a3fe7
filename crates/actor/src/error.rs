//! Error types for the actor runtime.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::ActorPath;

/// Failure raised by an actor while handling a message or starting up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
	/// The handler rejected its input or violated a business rule.
	#[error("{0}")]
	Domain(String),

	/// The handler panicked; carries the panic payload text.
	#[error("actor panicked: {0}")]
	Panicked(String),

	/// A child failed and escalated its failure to this actor.
	#[error("child {child} escalated: {cause}")]
	Escalated {
		/// Path of the failed child.
		child: ActorPath,
		/// The child's failure.
		cause: Box<ActorError>,
	},
}

impl ActorError {
	/// Builds a domain failure from any displayable cause.
	pub fn domain<E: ToString>(cause: E) -> Self {
		Self::Domain(cause.to_string())
	}
}

/// Failure resolving an `ask`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AskError {
	/// The target signalled a failure while handling the request.
	#[error("ask to {target} failed: {cause}")]
	Failed {
		/// Asked actor.
		target: ActorPath,
		/// Failure reported by the target.
		cause: ActorError,
	},

	/// No reply arrived before the deadline.
	#[error("ask to {target} timed out after {after:?}")]
	Timeout {
		/// Asked actor.
		target: ActorPath,
		/// Configured timeout.
		after: Duration,
	},

	/// The target terminated before replying.
	#[error("ask target {target} terminated before replying")]
	TargetTerminated {
		/// Asked actor.
		target: ActorPath,
	},

	/// The reply was not of the requested type.
	#[error("ask to {target} expected a `{expected}` reply, got `{actual}`")]
	UnexpectedReply {
		/// Asked actor.
		target: ActorPath,
		/// Requested reply type.
		expected: &'static str,
		/// Type of the reply that arrived.
		actual: &'static str,
	},
}

impl AskError {
	/// Returns true if the ask resolved through its deadline.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}

	/// Returns the underlying actor failure, if the target reported one.
	pub fn cause(&self) -> Option<&ActorError> {
		match self {
			Self::Failed { cause, .. } => Some(cause),
			_ => None,
		}
	}
}

/// Failure spawning an actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
	/// A live actor already occupies the requested path.
	#[error("actor name already taken: {0}")]
	NameTaken(ActorPath),

	/// Names must be non-empty, must not contain `/`, and must not start with `$`.
	#[error("invalid actor name: {0:?}")]
	InvalidName(String),

	/// The system or the parent actor is shutting down.
	#[error("cannot spawn {0}: system is terminating")]
	SystemTerminated(String),
}

/// Errors that can occur when loading runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// TOML syntax or schema error.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A numeric setting is outside its allowed range.
	#[error("invalid value for `{field}`: {reason}")]
	InvalidValue {
		/// Offending field.
		field: &'static str,
		/// Why it was rejected.
		reason: &'static str,
	},
}

/// Failure constructing an actor system.
#[derive(Debug, Error)]
pub enum SystemError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("invalid system name: {0:?}")]
	InvalidName(String),

	#[error("failed to start dispatcher runtime: {0}")]
	Runtime(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn domain_failure_displays_original_text() {
		let err = ActorError::domain("The text to process can't be null!");
		assert_eq!(err.to_string(), "The text to process can't be null!");
	}

	#[test]
	fn failed_ask_message_contains_cause() {
		let err = AskError::Failed {
			target: ActorPath::top_level("counter"),
			cause: ActorError::domain("bad input"),
		};
		assert!(err.to_string().contains("bad input"));
		assert!(err.to_string().contains("/user/counter"));
		assert_eq!(err.cause(), Some(&ActorError::domain("bad input")));
		assert!(!err.is_timeout());
	}

	#[test]
	fn escalation_nests_child_cause() {
		let err = ActorError::Escalated {
			child: ActorPath::top_level("parent").child("kid"),
			cause: Box::new(ActorError::domain("boom")),
		};
		assert_eq!(err.to_string(), "child /user/parent/kid escalated: boom");
	}
}
