use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide monotonic uid source for actor identities.
static UID_CLOCK: UidClock = UidClock::new();

/// Monotonic uid clock.
#[derive(Debug)]
pub(crate) struct UidClock {
	next: AtomicU64,
}

impl UidClock {
	/// Creates a clock whose first uid is 1.
	pub const fn new() -> Self {
		Self { next: AtomicU64::new(0) }
	}

	/// Returns the next uid.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Hierarchical actor address, e.g. `/user/reader/$3`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorPath(Arc<str>);

impl ActorPath {
	pub(crate) const USER_ROOT: &'static str = "/user";
	pub(crate) const TEMP_ROOT: &'static str = "/temp";
	pub(crate) const DEAD_LETTERS: &'static str = "/deadLetters";

	pub(crate) fn from_raw(raw: impl Into<Arc<str>>) -> Self {
		Self(raw.into())
	}

	/// Path of a top-level actor.
	pub(crate) fn top_level(name: &str) -> Self {
		Self::from_raw(format!("{}/{name}", Self::USER_ROOT))
	}

	/// Path of a child of `self`.
	pub(crate) fn child(&self, name: &str) -> Self {
		Self::from_raw(format!("{}/{name}", self.0))
	}

	/// Returns the path as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Last path segment.
	pub fn name(&self) -> &str {
		self.0.rsplit('/').next().unwrap_or_default()
	}
}

impl fmt::Display for ActorPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for ActorPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ActorPath({})", self.0)
	}
}

/// Unique, immutable actor identity.
///
/// Two actors spawned under the same path at different times have different
/// uids, so a stale identity never addresses a newer incarnation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorId {
	uid: u64,
	path: ActorPath,
}

impl ActorId {
	/// Allocates a fresh identity for `path`.
	pub(crate) fn allocate(path: ActorPath) -> Self {
		Self { uid: UID_CLOCK.next(), path }
	}

	/// Allocates an identity for a short-lived ask reply slot.
	pub(crate) fn temp() -> Self {
		let uid = UID_CLOCK.next();
		Self {
			uid,
			path: ActorPath::from_raw(format!("{}/${uid}", ActorPath::TEMP_ROOT)),
		}
	}

	pub(crate) fn dead_letters() -> Self {
		Self {
			uid: 0,
			path: ActorPath::from_raw(ActorPath::DEAD_LETTERS),
		}
	}

	/// Process-wide unique id.
	pub const fn uid(&self) -> u64 {
		self.uid
	}

	/// Actor path.
	pub fn path(&self) -> &ActorPath {
		&self.path
	}
}

impl fmt::Display for ActorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.path, self.uid)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn uid_clock_is_monotonic_and_starts_at_one() {
		let clock = UidClock::new();
		assert_eq!(clock.next(), 1);
		assert_eq!(clock.next(), 2);
		assert_eq!(clock.next(), 3);
	}

	#[test]
	fn child_paths_nest_under_parent() {
		let parent = ActorPath::top_level("reader");
		let child = parent.child("$7");
		assert_eq!(child.as_str(), "/user/reader/$7");
		assert_eq!(child.name(), "$7");
	}

	#[test]
	fn identities_at_same_path_are_distinct() {
		let a = ActorId::allocate(ActorPath::top_level("same"));
		let b = ActorId::allocate(ActorPath::top_level("same"));
		assert_ne!(a, b);
		assert_eq!(a.path(), b.path());
	}

	#[test]
	fn temp_ids_live_under_temp_root() {
		let id = ActorId::temp();
		assert!(id.path().as_str().starts_with("/temp/$"));
	}
}
