//! Ensemble demo binary.
//!
//! Runs the example actors:
//! - `wordcount`: reader -> per-line counters -> printer pipeline
//! - `ordering`: short and long tasks on one actor, processed strictly in order

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ensemble_actor::{ActorSystem, PoisonPill, Props, SystemConfig};
use ensemble_demo::{
	LINES, LogAddressActor, LongTimeActor, LongTimeTaskInfo, PRINT_COMMAND, ReadLines, ReadingActor, ShortTimeTaskInfo,
	TaskEvent, TaskReport, WordTotal,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo command line arguments.
#[derive(Parser, Debug)]
#[command(name = "ensemble-demo")]
#[command(about = "Example actors running on the ensemble actor runtime")]
struct Args {
	/// TOML system configuration
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Dispatcher worker count, overriding the configuration
	#[arg(short, long)]
	workers: Option<usize>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Count the words of a text through reader, counter and printer actors
	Wordcount {
		/// Text file to count, defaults to a built-in sample
		#[arg(short, long, value_name = "PATH")]
		file: Option<PathBuf>,
	},
	/// Send short and long tasks to one actor and show they run one at a time
	Ordering {
		/// Duration of the long task in milliseconds
		#[arg(long, default_value_t = 500)]
		long_ms: u64,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// ENSEMBLE_LOG wins over --verbose.
	let filter = EnvFilter::try_from_env("ENSEMBLE_LOG")
		.unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
	let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let mut config = match &args.config {
		Some(path) => SystemConfig::from_path(path)?,
		None => SystemConfig::default(),
	};
	if let Some(workers) = args.workers {
		config = config.workers(workers);
	}

	let system = ActorSystem::with_config("ensemble-demo", config)?;
	info!(workers = system.workers(), "Starting ensemble-demo");

	match args.command {
		Command::Wordcount { file } => wordcount(&system, file).await?,
		Command::Ordering { long_ms } => ordering(&system, Duration::from_millis(long_ms)).await?,
	}

	let report = system.shutdown_default().await;
	info!(
		completed = report.completed(),
		forced = report.forced,
		dead_letters = report.dead_letters,
		"Shutdown finished"
	);
	Ok(())
}

async fn wordcount(system: &ActorSystem, file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
	let text = match file {
		Some(path) => std::fs::read_to_string(&path)?,
		None => LINES.to_string(),
	};

	let log_actor = system.spawn(Props::new(|| LogAddressActor), Some("log-actor"))?;
	// No sender: the reply lands in dead letters.
	log_actor.tell(PRINT_COMMAND, None);

	let reader = system.spawn(ReadingActor::props(text), Some("reading-actor"))?;
	let total: WordTotal = system.ask_default(&reader, ReadLines).await?;
	println!("{} words in {} lines", total.words, total.lines);
	if total.failed_lines > 0 {
		println!("{} lines could not be counted", total.failed_lines);
	}

	log_actor.tell(PoisonPill, None);
	reader.kill();
	Ok(())
}

async fn ordering(system: &ActorSystem, long: Duration) -> Result<(), Box<dyn std::error::Error>> {
	let actor = system.spawn(Props::new(move || LongTimeActor::new(long)), Some("long-actor"))?;
	actor.tell(short(1), None);
	actor.tell(
		LongTimeTaskInfo {
			id: 2,
			payload: String::new(),
		},
		None,
	);
	for id in 3..=5 {
		actor.tell(short(id), None);
	}

	let journal: Vec<TaskEvent> = actor.ask(TaskReport, long + system.config().ask_timeout()).await?;
	for event in journal {
		println!("task {} ({:?}) {:?}", event.id, event.kind, event.phase);
	}
	Ok(())
}

fn short(id: u32) -> ShortTimeTaskInfo {
	ShortTimeTaskInfo {
		id,
		payload: String::new(),
	}
}
