//! Example clients of the ensemble actor runtime.
//!
//! The actors here form a small word-counting pipeline (reader, counters,
//! printer), plus a logger that reports its own address and a task actor that
//! demonstrates strictly sequential processing.

pub mod actors;

pub use actors::{
	CountWords, LogAddressActor, LongTimeActor, LongTimeTaskInfo, NULL_TEXT, PRINT_COMMAND, PrintFinalResult,
	PrinterActor, ReadLines, ReadingActor, ShortTimeTaskInfo, TaskEvent, TaskKind, TaskPhase, TaskReport,
	WordCounterActor, WordTotal, count_words,
};

/// Sample text used by the word-count pipeline when no file is given.
pub const LINES: &str = "Lorem Ipsum is simply dummy text\n\
of the printing and typesetting industry.\n\
Lorem Ipsum has been the industry's standard dummy text\n\
ever since the 1500s, when an unknown printer took a galley\n\
of type and scrambled it to make a type specimen book.\n \
It has survived not only five centuries, but also the leap\n\
into electronic typesetting, remaining essentially unchanged.\n \
It was popularised in the 1960s with the release of Letraset\n \
sheets containing Lorem Ipsum passages, and more recently with\n \
desktop publishing software like Aldus PageMaker including\n\
versions of Lorem Ipsum.";
