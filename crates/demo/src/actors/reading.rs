use std::time::Duration;

use async_trait::async_trait;
use ensemble_actor::{Actor, ActorContext, ActorError, ActorRef, AskError, Message, Props};

use super::{CountWords, PrintFinalResult, PrinterActor, WordCounterActor};

/// Starts counting the reader's text. Replies with a [`WordTotal`].
#[derive(Debug, Clone, Copy)]
pub struct ReadLines;

/// Outcome of one [`ReadLines`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordTotal {
	pub lines: usize,
	pub words: usize,
	/// Lines whose count failed or timed out.
	pub failed_lines: usize,
}

struct LineCounted {
	counter: ActorRef,
	result: Result<usize, AskError>,
}

#[derive(Default)]
struct Run {
	requester: Option<ActorRef>,
	lines: usize,
	pending: usize,
	words: usize,
	failed: usize,
}

/// Splits its text into lines, counts each line on a child
/// [`WordCounterActor`], and reports the total to a child [`PrinterActor`].
pub struct ReadingActor {
	text: String,
	line_timeout: Duration,
	printer: Option<ActorRef>,
	run: Option<Run>,
}

impl ReadingActor {
	const LINE_TIMEOUT: Duration = Duration::from_secs(5);

	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			line_timeout: Self::LINE_TIMEOUT,
			printer: None,
			run: None,
		}
	}

	pub fn props(text: impl Into<String>) -> Props {
		let text = text.into();
		Props::new(move || Self::new(text.clone()))
	}

	fn start(&mut self, ctx: &mut ActorContext) -> Result<(), ActorError> {
		if self.run.is_some() {
			ctx.reply_failure("already reading");
			return Ok(());
		}
		let mut run = Run {
			requester: ctx.has_sender().then(|| ctx.sender()),
			..Run::default()
		};
		for line in self.text.lines().filter(|line| !line.trim().is_empty()) {
			let counter = ctx
				.spawn(Props::new(|| WordCounterActor), None)
				.map_err(ActorError::domain)?;
			let reply_from = counter.clone();
			ctx.pipe_ask(&counter, CountWords::new(line), self.line_timeout, move |result: Result<usize, AskError>| LineCounted {
				counter: reply_from,
				result,
			});
			run.lines += 1;
			run.pending += 1;
		}
		tracing::debug!(actor = %ctx.path(), lines = run.lines, "reading.started");
		self.run = Some(run);
		self.finish_if_done(ctx);
		Ok(())
	}

	fn line_counted(&mut self, counted: LineCounted, ctx: &mut ActorContext) {
		counted.counter.stop();
		let Some(run) = self.run.as_mut() else {
			return;
		};
		run.pending = run.pending.saturating_sub(1);
		match counted.result {
			Ok(words) => run.words += words,
			Err(error) => {
				tracing::warn!(actor = %ctx.path(), %error, "reading.line_failed");
				run.failed += 1;
			}
		}
		self.finish_if_done(ctx);
	}

	fn finish_if_done(&mut self, ctx: &mut ActorContext) {
		if self.run.as_ref().is_none_or(|run| run.pending > 0) {
			return;
		}
		let Some(run) = self.run.take() else {
			return;
		};
		if let Some(printer) = &self.printer {
			printer.tell(PrintFinalResult(run.words), Some(&ctx.self_ref()));
		}
		let total = WordTotal {
			lines: run.lines,
			words: run.words,
			failed_lines: run.failed,
		};
		match run.requester {
			Some(requester) => requester.tell(total, Some(&ctx.self_ref())),
			None => tracing::info!(actor = %ctx.path(), ?total, "reading.finished"),
		}
	}
}

#[async_trait]
impl Actor for ReadingActor {
	async fn pre_start(&mut self, ctx: &mut ActorContext) -> Result<(), ActorError> {
		self.printer = Some(
			ctx.spawn(Props::new(|| PrinterActor), Some("printer"))
				.map_err(ActorError::domain)?,
		);
		Ok(())
	}

	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
		if msg.is::<ReadLines>() {
			return self.start(ctx);
		}
		let msg = match msg.downcast::<LineCounted>() {
			Ok(counted) => {
				self.line_counted(counted, ctx);
				return Ok(());
			}
			Err(msg) => msg,
		};
		if let Some(ack) = msg.as_text() {
			tracing::info!(actor = %ctx.path(), ack, "reading.printer_ack");
		}
		Ok(())
	}
}
