mod log_address;
mod long_time;
mod printer;
mod reading;
mod word_counter;

pub use log_address::{LogAddressActor, PRINT_COMMAND};
pub use long_time::{LongTimeActor, LongTimeTaskInfo, ShortTimeTaskInfo, TaskEvent, TaskKind, TaskPhase, TaskReport};
pub use printer::{PrintFinalResult, PrinterActor};
pub use reading::{ReadLines, ReadingActor, WordTotal};
pub use word_counter::{CountWords, NULL_TEXT, WordCounterActor, count_words};
