use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::message::Envelope;
use crate::{ActorId, ActorPath, Message};

/// Why a message could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterReason {
	/// The recipient had terminated (or was unknown).
	RecipientTerminated,
	/// The recipient's bounded mailbox overflowed.
	MailboxOverflow,
	/// A reply was sent on behalf of a message that had no sender.
	NoSender,
	/// A reply arrived for an ask that had already resolved.
	AskAlreadyResolved,
}

impl DeadLetterReason {
	const fn as_str(self) -> &'static str {
		match self {
			Self::RecipientTerminated => "recipient_terminated",
			Self::MailboxOverflow => "mailbox_overflow",
			Self::NoSender => "no_sender",
			Self::AskAlreadyResolved => "ask_already_resolved",
		}
	}
}

impl fmt::Display for DeadLetterReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One undeliverable message.
#[derive(Debug)]
pub struct DeadLetter {
	/// Intended recipient.
	pub recipient: ActorPath,
	/// Original sender, if any.
	pub sender: Option<ActorPath>,
	/// Why delivery failed.
	pub reason: DeadLetterReason,
	/// The payload itself.
	pub message: Message,
}

impl DeadLetter {
	/// Cloneable metadata view of this dead letter.
	pub fn summary(&self) -> DeadLetterSummary {
		DeadLetterSummary {
			recipient: self.recipient.clone(),
			sender: self.sender.clone(),
			reason: self.reason,
			message_type: self.message.type_name(),
		}
	}
}

/// Metadata of a dead letter, without the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterSummary {
	pub recipient: ActorPath,
	pub sender: Option<ActorPath>,
	pub reason: DeadLetterReason,
	pub message_type: &'static str,
}

/// Bounded record of undeliverable messages.
///
/// Doubles as the `/deadLetters` pseudo-actor: replies to a message without a
/// sender land here.
pub struct DeadLetterOffice {
	id: ActorId,
	capacity: usize,
	ring: Mutex<VecDeque<DeadLetter>>,
	total: AtomicU64,
	evicted: AtomicU64,
	events: broadcast::Sender<DeadLetterSummary>,
}

impl fmt::Debug for DeadLetterOffice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeadLetterOffice")
			.field("capacity", &self.capacity)
			.field("total", &self.total())
			.field("evicted", &self.evicted())
			.finish()
	}
}

impl DeadLetterOffice {
	const EVENT_BUFFER: usize = 256;
	const WARN_EVERY: u64 = 1024;

	/// Creates an office retaining at most `capacity` records.
	pub fn new(capacity: usize) -> Self {
		let (events, _) = broadcast::channel(Self::EVENT_BUFFER);
		Self {
			id: ActorId::dead_letters(),
			capacity: capacity.max(1),
			ring: Mutex::new(VecDeque::new()),
			total: AtomicU64::new(0),
			evicted: AtomicU64::new(0),
			events,
		}
	}

	pub(crate) fn id(&self) -> &ActorId {
		&self.id
	}

	pub(crate) fn record_envelope(&self, recipient: &ActorPath, envelope: Envelope, reason: DeadLetterReason) {
		self.record(DeadLetter {
			recipient: recipient.clone(),
			sender: envelope.sender.as_ref().map(|sender| sender.path().clone()),
			reason,
			message: envelope.message,
		});
	}

	/// Records one dead letter, evicting the oldest record when full.
	pub fn record(&self, letter: DeadLetter) {
		let summary = letter.summary();
		let count = self.total.fetch_add(1, Ordering::Relaxed);
		if count % Self::WARN_EVERY == Self::WARN_EVERY - 1 {
			tracing::warn!(total = count + 1, "dead_letter.accumulating");
		}
		tracing::debug!(
			recipient = %summary.recipient,
			sender = ?summary.sender.as_ref().map(ActorPath::as_str),
			reason = %summary.reason,
			message_type = summary.message_type,
			"dead_letter"
		);

		{
			let mut ring = self.ring.lock();
			if ring.len() >= self.capacity {
				ring.pop_front();
				self.evicted.fetch_add(1, Ordering::Relaxed);
			}
			ring.push_back(letter);
		}
		let _ = self.events.send(summary);
	}

	/// Dead letters currently retained.
	pub fn len(&self) -> usize {
		self.ring.lock().len()
	}

	/// Returns true if nothing is retained.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Dead letters recorded since creation, including evicted ones.
	pub fn total(&self) -> u64 {
		self.total.load(Ordering::Relaxed)
	}

	/// Records evicted because the ring was full.
	pub fn evicted(&self) -> u64 {
		self.evicted.load(Ordering::Relaxed)
	}

	/// Removes and returns every retained dead letter, oldest first.
	pub fn drain(&self) -> Vec<DeadLetter> {
		self.ring.lock().drain(..).collect()
	}

	/// Metadata of every retained dead letter, oldest first.
	pub fn summaries(&self) -> Vec<DeadLetterSummary> {
		self.ring.lock().iter().map(DeadLetter::summary).collect()
	}

	/// Subscribes to dead letters recorded from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<DeadLetterSummary> {
		self.events.subscribe()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn letter(value: u32) -> DeadLetter {
		DeadLetter {
			recipient: ActorPath::top_level("gone"),
			sender: None,
			reason: DeadLetterReason::RecipientTerminated,
			message: Message::new(value),
		}
	}

	#[test]
	fn ring_evicts_oldest_when_full() {
		let office = DeadLetterOffice::new(2);
		office.record(letter(1));
		office.record(letter(2));
		office.record(letter(3));

		assert_eq!(office.total(), 3);
		assert_eq!(office.evicted(), 1);
		let kept: Vec<u32> = office.drain().into_iter().filter_map(|l| l.message.downcast::<u32>().ok()).collect();
		assert_eq!(kept, vec![2, 3]);
		assert!(office.is_empty());
		assert_eq!(office.total(), 3, "drain does not reset the running total");
	}

	#[tokio::test]
	async fn subscribers_see_summaries() {
		let office = DeadLetterOffice::new(4);
		let mut events = office.subscribe();
		office.record(letter(9));

		let summary = events.recv().await.unwrap();
		assert_eq!(summary.recipient.as_str(), "/user/gone");
		assert_eq!(summary.reason, DeadLetterReason::RecipientTerminated);
		assert_eq!(summary.message_type, "u32");
		assert_eq!(office.summaries(), vec![summary]);
	}
}
