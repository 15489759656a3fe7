use async_trait::async_trait;
use ensemble_actor::{Actor, ActorContext, ActorError, Message};

/// Final word count to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintFinalResult(pub usize);

/// Prints a word total and acknowledges it to the sender.
pub struct PrinterActor;

#[async_trait]
impl Actor for PrinterActor {
	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
		if let Some(PrintFinalResult(total)) = msg.downcast_ref::<PrintFinalResult>() {
			tracing::info!(total, "received total number of words");
			ctx.reply(format!("{total}个单词已收到"));
		}
		Ok(())
	}
}
