use std::time::Duration;

use async_trait::async_trait;
use ensemble_actor::{Actor, ActorContext, ActorError, Message};

/// Task that completes immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortTimeTaskInfo {
	pub id: u32,
	pub payload: String,
}

/// Task that occupies the actor for its configured long duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongTimeTaskInfo {
	pub id: u32,
	pub payload: String,
}

/// Requests the journal so far. Replies with a `Vec<TaskEvent>`.
#[derive(Debug, Clone, Copy)]
pub struct TaskReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
	Short,
	Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
	Started,
	Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskEvent {
	pub id: u32,
	pub kind: TaskKind,
	pub phase: TaskPhase,
}

/// Runs short and long tasks one at a time, journaling start and finish.
pub struct LongTimeActor {
	long_duration: Duration,
	journal: Vec<TaskEvent>,
}

impl LongTimeActor {
	pub fn new(long_duration: Duration) -> Self {
		Self {
			long_duration,
			journal: Vec::new(),
		}
	}

	async fn run(&mut self, id: u32, kind: TaskKind) {
		self.journal.push(TaskEvent {
			id,
			kind,
			phase: TaskPhase::Started,
		});
		tracing::info!(id, ?kind, "task.start");
		if kind == TaskKind::Long {
			tokio::time::sleep(self.long_duration).await;
		}
		tracing::info!(id, ?kind, "task.finish");
		self.journal.push(TaskEvent {
			id,
			kind,
			phase: TaskPhase::Finished,
		});
	}
}

#[async_trait]
impl Actor for LongTimeActor {
	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
		if msg.is::<TaskReport>() {
			ctx.reply(self.journal.clone());
			return Ok(());
		}
		let task = msg
			.downcast_ref::<ShortTimeTaskInfo>()
			.map(|task| (task.id, TaskKind::Short))
			.or_else(|| msg.downcast_ref::<LongTimeTaskInfo>().map(|task| (task.id, TaskKind::Long)));
		if let Some((id, kind)) = task {
			self.run(id, kind).await;
		}
		Ok(())
	}
}
