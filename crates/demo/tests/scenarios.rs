use std::time::{Duration, Instant};

use ensemble_actor::{ActorSystem, AskError, DeadLetterReason, PoisonPill, Props, SystemConfig, Termination};
use ensemble_demo::{
	CountWords, LINES, LogAddressActor, LongTimeActor, LongTimeTaskInfo, NULL_TEXT, PRINT_COMMAND, PrintFinalResult,
	PrinterActor, ReadLines, ReadingActor, ShortTimeTaskInfo, TaskEvent, TaskKind, TaskPhase, TaskReport,
	WordCounterActor, WordTotal,
};
use ensemble_testkit::TestProbe;
use pretty_assertions::assert_eq;

fn system() -> ActorSystem {
	ActorSystem::with_config("test-system", SystemConfig::default().workers(4)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn log_address_replies_to_printit() {
	let system = system();
	let mut probe = TestProbe::new(&system).unwrap();
	let log_actor = system.spawn(Props::new(|| LogAddressActor), None).unwrap();

	probe.send(&log_actor, PRINT_COMMAND);
	probe.expect_msg(String::from("Got Message")).await.unwrap();
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn printer_acknowledges_total() {
	let system = system();
	let mut probe = TestProbe::new(&system).unwrap();
	let printer = system.spawn(Props::new(|| PrinterActor), None).unwrap();

	probe.send(&printer, PrintFinalResult(111));
	probe.expect_msg(String::from("111个单词已收到")).await.unwrap();
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn word_counter_counts_words() {
	let system = system();
	let counter = system.spawn(Props::new(|| WordCounterActor), None).unwrap();
	let words: usize = counter
		.ask(CountWords::new("chinese man is good"), Duration::from_secs(20))
		.await
		.unwrap();
	assert_eq!(words, 4);
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn word_counter_failure_reaches_asker_before_timeout() {
	let system = system();
	let counter = system.spawn(Props::new(|| WordCounterActor), None).unwrap();

	for reply_with_status in [false, true] {
		let started = Instant::now();
		let err = counter
			.ask::<usize, _>(CountWords::missing(reply_with_status), Duration::from_millis(1000))
			.await
			.unwrap_err();
		assert!(matches!(err, AskError::Failed { .. }), "unexpected {err:?}");
		assert!(err.to_string().contains(NULL_TEXT));
		assert!(started.elapsed() < Duration::from_millis(1000));
	}

	// The counter resumes after a failure.
	let words: usize = counter.ask(CountWords::new("still here"), Duration::from_secs(1)).await.unwrap();
	assert_eq!(words, 2);
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reading_pipeline_counts_sample_text() {
	let system = system();
	let reader = system.spawn(ReadingActor::props(LINES), Some("reading-actor")).unwrap();
	let total: WordTotal = reader.ask(ReadLines, Duration::from_secs(5)).await.unwrap();
	assert_eq!(
		total,
		WordTotal {
			lines: 11,
			words: 91,
			failed_lines: 0,
		}
	);
	let printer = system.lookup("/user/reading-actor/printer").unwrap();

	reader.kill();
	assert_eq!(reader.terminated().await, Termination::Killed);
	assert_eq!(printer.terminated().await, Termination::Stopped);
	assert!(system.lookup("/user/reading-actor/printer").is_none());
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn poison_pill_and_kill_after_reading() {
	let system = system();
	let log_actor = system.spawn(Props::new(|| LogAddressActor), Some("log-actor")).unwrap();
	log_actor.tell(PRINT_COMMAND, None);
	let reader = system.spawn(ReadingActor::props(LINES), Some("reading-actor")).unwrap();
	reader.tell(ReadLines, None);

	log_actor.tell(PoisonPill, None);
	assert_eq!(log_actor.terminated().await, Termination::Stopped);
	// The printit reply had no sender to go to.
	let letters = system.dead_letters().summaries();
	assert!(letters.iter().any(|l| l.reason == DeadLetterReason::NoSender && l.message_type.contains("String")));

	reader.kill();
	assert_eq!(reader.terminated().await, Termination::Killed);
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tell_kill_tell_dead_letters_only_the_late_message() {
	let system = system();
	let mut probe = TestProbe::new(&system).unwrap();
	let counter = system.spawn(Props::new(|| WordCounterActor), None).unwrap();

	probe.send(&counter, CountWords::new("x marks the spot"));
	probe.expect_msg(4usize).await.unwrap();
	counter.kill();
	assert_eq!(counter.terminated().await, Termination::Killed);
	probe.send(&counter, CountWords::new("never counted"));
	probe.expect_no_msg(Duration::from_millis(50)).await.unwrap();

	let letters = system.dead_letters().summaries();
	assert_eq!(letters.len(), 1);
	assert_eq!(letters[0].reason, DeadLetterReason::RecipientTerminated);
	assert_eq!(letters[0].recipient, *counter.path());
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn long_task_does_not_let_later_tasks_overtake() {
	let system = system();
	let actor = system
		.spawn(Props::new(|| LongTimeActor::new(Duration::from_millis(200))), Some("long-actor"))
		.unwrap();
	actor.tell(
		ShortTimeTaskInfo {
			id: 1,
			payload: String::new(),
		},
		None,
	);
	actor.tell(
		LongTimeTaskInfo {
			id: 2,
			payload: String::new(),
		},
		None,
	);
	for id in 3..=5 {
		actor.tell(
			ShortTimeTaskInfo {
				id,
				payload: String::new(),
			},
			None,
		);
	}

	let journal: Vec<TaskEvent> = actor.ask(TaskReport, Duration::from_secs(5)).await.unwrap();
	let expected: Vec<TaskEvent> = [
		(1, TaskKind::Short),
		(2, TaskKind::Long),
		(3, TaskKind::Short),
		(4, TaskKind::Short),
		(5, TaskKind::Short),
	]
	.into_iter()
	.flat_map(|(id, kind)| {
		[TaskPhase::Started, TaskPhase::Finished]
			.into_iter()
			.map(move |phase| TaskEvent { id, kind, phase })
	})
	.collect();
	assert_eq!(journal, expected);
	system.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_reports_clean_completion() {
	let system = system();
	system.spawn(ReadingActor::props(LINES), Some("reading-actor")).unwrap();
	system.spawn(Props::new(|| LogAddressActor), Some("log-actor")).unwrap();
	let report = system.shutdown(Duration::from_secs(1)).await;
	assert!(report.completed());
	assert_eq!(report.forced, 0);
	assert!(system.records().is_empty());
}
