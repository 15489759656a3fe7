use async_trait::async_trait;
use ensemble_actor::{Actor, ActorContext, ActorError, Message, SupervisorDirective};

/// Failure text for a [`CountWords`] without text.
pub const NULL_TEXT: &str = "The text to process can't be null!";

/// Request to count the words of one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountWords {
	pub text: Option<String>,
	/// Report a missing text as a `Status::Failure` reply instead of a handler error.
	pub reply_with_status: bool,
}

impl CountWords {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: Some(text.into()),
			reply_with_status: false,
		}
	}

	/// A request without text; the counter fails it.
	pub fn missing(reply_with_status: bool) -> Self {
		Self {
			text: None,
			reply_with_status,
		}
	}
}

/// Whitespace-separated word count.
pub fn count_words(text: &str) -> usize {
	text.split_whitespace().count()
}

/// Replies to [`CountWords`] with a `usize` word count.
///
/// A missing text fails the request; the actor itself resumes and keeps serving.
pub struct WordCounterActor;

#[async_trait]
impl Actor for WordCounterActor {
	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
		let Ok(request) = msg.downcast::<CountWords>() else {
			return Ok(());
		};
		match request {
			CountWords { text: Some(text), .. } => {
				let words = count_words(&text);
				tracing::debug!(actor = %ctx.path(), words, "word_counter.counted");
				ctx.reply(words);
				Ok(())
			}
			CountWords {
				text: None,
				reply_with_status: true,
			} => {
				ctx.reply_failure(NULL_TEXT);
				Ok(())
			}
			CountWords { text: None, .. } => Err(ActorError::domain(NULL_TEXT)),
		}
	}

	async fn on_failure(&mut self, _error: &ActorError, _ctx: &mut ActorContext) -> SupervisorDirective {
		SupervisorDirective::Resume
	}
}

#[cfg(test)]
mod tests {
	use super::count_words;

	#[test]
	fn counts_whitespace_separated_words() {
		assert_eq!(count_words("chinese man is good"), 4);
		assert_eq!(count_words("  padded\tand\nsplit  "), 3);
		assert_eq!(count_words(""), 0);
	}

	#[test]
	fn sample_text_has_ninety_one_words() {
		assert_eq!(count_words(crate::LINES), 91);
		assert_eq!(crate::LINES.lines().count(), 11);
	}
}
