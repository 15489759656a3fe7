use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::OverflowPolicy;

/// Outcome from enqueueing a user message.
///
/// Every variant except `Enqueued` hands a message back so the caller can
/// record it as a dead letter.
#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueOutcome<M> {
	/// Message was appended at the tail.
	Enqueued,
	/// Mailbox is full and the policy rejected the incoming message.
	DroppedNewest(M),
	/// Mailbox was full; the incoming message was appended and the head evicted.
	EvictedOldest(M),
	/// Mailbox is closed.
	Closed(M),
}

/// One dequeued item, control signals first.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<M, S> {
	System(S),
	User(M),
}

struct MailboxState<M, S> {
	system: VecDeque<S>,
	user: VecDeque<M>,
	closed: bool,
}

/// Two-lane FIFO mailbox owned by one actor.
///
/// Enqueueing never blocks. The system lane is always drained before the user
/// lane, so control signals overtake queued messages without pre-empting the
/// message currently being handled.
pub struct Mailbox<M, S> {
	capacity: Option<usize>,
	overflow: OverflowPolicy,
	state: Mutex<MailboxState<M, S>>,
}

impl<M, S> Mailbox<M, S> {
	/// Creates an unbounded mailbox.
	pub fn unbounded() -> Self {
		Self::with_state(None, OverflowPolicy::DropNewest)
	}

	/// Creates a mailbox whose user lane holds at most `capacity` messages.
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero.
	pub fn bounded(capacity: usize, overflow: OverflowPolicy) -> Self {
		assert!(capacity > 0, "mailbox capacity must be > 0");
		Self::with_state(Some(capacity), overflow)
	}

	fn with_state(capacity: Option<usize>, overflow: OverflowPolicy) -> Self {
		Self {
			capacity,
			overflow,
			state: Mutex::new(MailboxState {
				system: VecDeque::new(),
				user: VecDeque::with_capacity(capacity.unwrap_or(0).min(1024)),
				closed: false,
			}),
		}
	}

	/// Appends one user message honoring the overflow policy.
	pub fn enqueue_user(&self, msg: M) -> EnqueueOutcome<M> {
		let mut state = self.state.lock();
		if state.closed {
			return EnqueueOutcome::Closed(msg);
		}
		let Some(capacity) = self.capacity else {
			state.user.push_back(msg);
			return EnqueueOutcome::Enqueued;
		};
		if state.user.len() < capacity {
			state.user.push_back(msg);
			return EnqueueOutcome::Enqueued;
		}
		match self.overflow {
			OverflowPolicy::DropNewest => EnqueueOutcome::DroppedNewest(msg),
			OverflowPolicy::DropOldest => {
				state.user.push_back(msg);
				match state.user.pop_front() {
					Some(evicted) => EnqueueOutcome::EvictedOldest(evicted),
					None => EnqueueOutcome::Enqueued,
				}
			}
		}
	}

	/// Appends one control signal. Returns the signal back if the mailbox is closed.
	pub fn enqueue_system(&self, signal: S) -> Result<(), S> {
		let mut state = self.state.lock();
		if state.closed {
			return Err(signal);
		}
		state.system.push_back(signal);
		Ok(())
	}

	/// Pops the next item: the system head if any, else the user head.
	pub fn dequeue(&self) -> Option<Dequeued<M, S>> {
		let mut state = self.state.lock();
		if let Some(signal) = state.system.pop_front() {
			return Some(Dequeued::System(signal));
		}
		state.user.pop_front().map(Dequeued::User)
	}

	/// Closes the mailbox and returns the user messages still queued.
	///
	/// Pending control signals are discarded. Closing twice returns nothing
	/// the second time.
	pub fn close(&self) -> Vec<M> {
		let mut state = self.state.lock();
		state.closed = true;
		state.system.clear();
		state.user.drain(..).collect()
	}

	/// Returns true once [`Self::close`] has run.
	pub fn is_closed(&self) -> bool {
		self.state.lock().closed
	}

	/// Returns true if either lane holds an item.
	pub fn has_messages(&self) -> bool {
		let state = self.state.lock();
		!state.system.is_empty() || !state.user.is_empty()
	}

	/// Number of queued user messages.
	pub fn len(&self) -> usize {
		self.state.lock().user.len()
	}

	/// Returns true if no user message is queued.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// User lane capacity, `None` when unbounded.
	pub fn capacity(&self) -> Option<usize> {
		self.capacity
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	type TestMailbox = Mailbox<u32, &'static str>;

	fn drain_all(mailbox: &TestMailbox) -> Vec<Dequeued<u32, &'static str>> {
		std::iter::from_fn(|| mailbox.dequeue()).collect()
	}

	#[test]
	fn unbounded_preserves_fifo_order() {
		let mailbox = TestMailbox::unbounded();
		for i in 0..100 {
			assert_eq!(mailbox.enqueue_user(i), EnqueueOutcome::Enqueued);
		}
		let drained: Vec<_> = drain_all(&mailbox).into_iter().collect();
		let expected: Vec<_> = (0..100).map(Dequeued::User).collect();
		assert_eq!(drained, expected);
	}

	#[test]
	fn system_lane_overtakes_queued_user_messages() {
		let mailbox = TestMailbox::unbounded();
		let _ = mailbox.enqueue_user(1);
		let _ = mailbox.enqueue_user(2);
		assert!(mailbox.enqueue_system("stop").is_ok());

		assert_eq!(mailbox.dequeue(), Some(Dequeued::System("stop")));
		assert_eq!(mailbox.dequeue(), Some(Dequeued::User(1)));
		assert_eq!(mailbox.dequeue(), Some(Dequeued::User(2)));
		assert_eq!(mailbox.dequeue(), None);
	}

	// ── Bounded golden tests (capacity=3, push 1..=5) ──

	#[test]
	fn drop_newest_rejects_incoming_when_full() {
		let mailbox = TestMailbox::bounded(3, OverflowPolicy::DropNewest);
		assert_eq!(mailbox.enqueue_user(1), EnqueueOutcome::Enqueued);
		assert_eq!(mailbox.enqueue_user(2), EnqueueOutcome::Enqueued);
		assert_eq!(mailbox.enqueue_user(3), EnqueueOutcome::Enqueued);
		assert_eq!(mailbox.enqueue_user(4), EnqueueOutcome::DroppedNewest(4));
		assert_eq!(mailbox.enqueue_user(5), EnqueueOutcome::DroppedNewest(5));

		assert_eq!(drain_all(&mailbox), vec![Dequeued::User(1), Dequeued::User(2), Dequeued::User(3)]);
	}

	#[test]
	fn drop_oldest_evicts_head_when_full() {
		let mailbox = TestMailbox::bounded(3, OverflowPolicy::DropOldest);
		assert_eq!(mailbox.enqueue_user(1), EnqueueOutcome::Enqueued);
		assert_eq!(mailbox.enqueue_user(2), EnqueueOutcome::Enqueued);
		assert_eq!(mailbox.enqueue_user(3), EnqueueOutcome::Enqueued);
		assert_eq!(mailbox.enqueue_user(4), EnqueueOutcome::EvictedOldest(1));
		assert_eq!(mailbox.enqueue_user(5), EnqueueOutcome::EvictedOldest(2));

		assert_eq!(drain_all(&mailbox), vec![Dequeued::User(3), Dequeued::User(4), Dequeued::User(5)]);
	}

	#[test]
	fn bounded_capacity_ignores_system_lane() {
		let mailbox = TestMailbox::bounded(1, OverflowPolicy::DropNewest);
		assert_eq!(mailbox.enqueue_user(1), EnqueueOutcome::Enqueued);
		assert!(mailbox.enqueue_system("kill").is_ok());
		assert!(mailbox.enqueue_system("stop").is_ok());
		assert_eq!(mailbox.len(), 1);
	}

	// ── Closed mailbox ──

	#[test]
	fn close_returns_leftovers_and_rejects_further_sends() {
		let mailbox = TestMailbox::unbounded();
		let _ = mailbox.enqueue_user(10);
		let _ = mailbox.enqueue_user(20);
		let _ = mailbox.enqueue_system("stop");

		assert_eq!(mailbox.close(), vec![10, 20]);
		assert!(mailbox.is_closed());
		assert_eq!(mailbox.enqueue_user(30), EnqueueOutcome::Closed(30));
		assert_eq!(mailbox.enqueue_system("kill"), Err("kill"));
		assert_eq!(mailbox.dequeue(), None);
		assert!(mailbox.close().is_empty());
	}

	#[test]
	fn has_messages_tracks_both_lanes() {
		let mailbox = TestMailbox::unbounded();
		assert!(!mailbox.has_messages());
		let _ = mailbox.enqueue_system("start");
		assert!(mailbox.has_messages());
		assert!(mailbox.is_empty());
		let _ = mailbox.dequeue();
		assert!(!mailbox.has_messages());
	}

	// ── Concurrency: no loss, per-producer order kept ──

	#[test]
	fn concurrent_producers_never_lose_or_reorder() {
		const PRODUCERS: u32 = 8;
		const PER_PRODUCER: u32 = 500;

		let mailbox = Arc::new(TestMailbox::unbounded());
		let threads: Vec<_> = (0..PRODUCERS)
			.map(|producer| {
				let mailbox = Arc::clone(&mailbox);
				std::thread::spawn(move || {
					for seq in 0..PER_PRODUCER {
						let _ = mailbox.enqueue_user(producer * PER_PRODUCER + seq);
					}
				})
			})
			.collect();
		for thread in threads {
			thread.join().unwrap();
		}

		let received: Vec<u32> = std::iter::from_fn(|| mailbox.dequeue())
			.map(|item| match item {
				Dequeued::User(v) => v,
				Dequeued::System(s) => panic!("unexpected signal {s}"),
			})
			.collect();
		assert_eq!(received.len(), (PRODUCERS * PER_PRODUCER) as usize);

		for producer in 0..PRODUCERS {
			let lo = producer * PER_PRODUCER;
			let hi = lo + PER_PRODUCER;
			let seen: Vec<u32> = received.iter().copied().filter(|v| (lo..hi).contains(v)).collect();
			let expected: Vec<u32> = (lo..hi).collect();
			assert_eq!(seen, expected, "producer {producer} order must be preserved");
		}
	}
}
