//! Runtime configuration.
//!
//! Configuration is TOML; every field is optional and falls back to its
//! default:
//!
//! ```toml
//! workers = 4
//! throughput = 1
//! dead-letter-capacity = 512
//! ask-timeout-ms = 5000
//! shutdown-timeout-ms = 1000
//!
//! [mailbox]
//! capacity = 1024
//! overflow = "drop-oldest"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::ConfigError;

/// What a bounded mailbox does with a message that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
	/// Reject the incoming message.
	#[default]
	DropNewest,
	/// Evict the oldest queued message.
	DropOldest,
}

/// Mailbox sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MailboxConfig {
	/// User lane capacity, unbounded when absent.
	pub capacity: Option<usize>,
	/// Overflow behavior for bounded mailboxes.
	pub overflow: OverflowPolicy,
}

impl MailboxConfig {
	/// Unbounded mailbox.
	pub fn unbounded() -> Self {
		Self::default()
	}

	/// Bounded mailbox with an overflow policy.
	pub fn bounded(capacity: usize, overflow: OverflowPolicy) -> Self {
		Self {
			capacity: Some(capacity),
			overflow,
		}
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == Some(0) {
			return Err(ConfigError::InvalidValue {
				field: "mailbox.capacity",
				reason: "must be > 0",
			});
		}
		Ok(())
	}
}

/// Actor system configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SystemConfig {
	/// Dispatcher worker count.
	pub workers: usize,
	/// Messages handled per scheduling slot before a cell yields its worker.
	pub throughput: usize,
	/// Default mailbox for actors whose props do not override it.
	pub mailbox: MailboxConfig,
	/// Dead letters retained for inspection.
	pub dead_letter_capacity: usize,
	/// Ask timeout used by [`crate::ActorSystem::ask_default`].
	pub ask_timeout_ms: u64,
	/// Shutdown budget used when the system is shut down without an explicit one.
	pub shutdown_timeout_ms: u64,
}

impl Default for SystemConfig {
	fn default() -> Self {
		let workers = std::thread::available_parallelism().map(usize::from).unwrap_or(2).max(2);
		Self {
			workers,
			throughput: 1,
			mailbox: MailboxConfig::default(),
			dead_letter_capacity: 512,
			ask_timeout_ms: 5_000,
			shutdown_timeout_ms: 1_000,
		}
	}
}

impl SystemConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses, and validates a TOML file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	/// Sets the worker count.
	#[must_use]
	pub fn workers(mut self, workers: usize) -> Self {
		self.workers = workers;
		self
	}

	/// Sets the per-slot throughput.
	#[must_use]
	pub fn throughput(mut self, throughput: usize) -> Self {
		self.throughput = throughput;
		self
	}

	/// Sets the default mailbox.
	#[must_use]
	pub fn mailbox(mut self, mailbox: MailboxConfig) -> Self {
		self.mailbox = mailbox;
		self
	}

	/// Sets the dead-letter retention.
	#[must_use]
	pub fn dead_letter_capacity(mut self, capacity: usize) -> Self {
		self.dead_letter_capacity = capacity;
		self
	}

	/// Rejects values the runtime cannot operate with.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.workers == 0 {
			return Err(ConfigError::InvalidValue {
				field: "workers",
				reason: "must be > 0",
			});
		}
		if self.throughput == 0 {
			return Err(ConfigError::InvalidValue {
				field: "throughput",
				reason: "must be > 0",
			});
		}
		if self.dead_letter_capacity == 0 {
			return Err(ConfigError::InvalidValue {
				field: "dead-letter-capacity",
				reason: "must be > 0",
			});
		}
		self.mailbox.validate()
	}

	/// Default ask timeout.
	pub fn ask_timeout(&self) -> Duration {
		Duration::from_millis(self.ask_timeout_ms)
	}

	/// Default shutdown budget.
	pub fn shutdown_timeout(&self) -> Duration {
		Duration::from_millis(self.shutdown_timeout_ms)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		let config = SystemConfig::from_toml_str("").unwrap();
		assert_eq!(config, SystemConfig::default());
		assert_eq!(config.throughput, 1);
		assert!(config.workers >= 2);
	}

	#[test]
	fn parses_all_fields() {
		let config = SystemConfig::from_toml_str(
			r#"
workers = 3
throughput = 5
dead-letter-capacity = 16
ask-timeout-ms = 250
shutdown-timeout-ms = 100

[mailbox]
capacity = 8
overflow = "drop-oldest"
"#,
		)
		.unwrap();

		assert_eq!(
			config,
			SystemConfig {
				workers: 3,
				throughput: 5,
				mailbox: MailboxConfig::bounded(8, OverflowPolicy::DropOldest),
				dead_letter_capacity: 16,
				ask_timeout_ms: 250,
				shutdown_timeout_ms: 100,
			}
		);
		assert_eq!(config.ask_timeout(), Duration::from_millis(250));
	}

	#[test]
	fn rejects_zero_workers() {
		let err = SystemConfig::from_toml_str("workers = 0").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { field: "workers", .. }), "{err}");
	}

	#[test]
	fn rejects_zero_mailbox_capacity() {
		let err = SystemConfig::from_toml_str("[mailbox]\ncapacity = 0").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { field: "mailbox.capacity", .. }), "{err}");
	}

	#[test]
	fn rejects_unknown_fields() {
		let err = SystemConfig::from_toml_str("wrokers = 2").unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)), "{err}");
	}

	#[test]
	fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "workers = 7").unwrap();
		let config = SystemConfig::from_path(file.path()).unwrap();
		assert_eq!(config.workers, 7);
	}

	#[test]
	fn missing_file_reports_path() {
		let err = SystemConfig::from_path("/nonexistent/ensemble.toml").unwrap_err();
		assert!(err.to_string().contains("/nonexistent/ensemble.toml"));
	}
}
