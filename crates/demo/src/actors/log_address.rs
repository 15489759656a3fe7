use async_trait::async_trait;
use ensemble_actor::{Actor, ActorContext, ActorError, Message};

/// Command understood by [`LogAddressActor`].
pub const PRINT_COMMAND: &str = "printit";

/// Logs its own address on [`PRINT_COMMAND`] and replies `"Got Message"`.
pub struct LogAddressActor;

#[async_trait]
impl Actor for LogAddressActor {
	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
		if msg.as_text() == Some(PRINT_COMMAND) {
			tracing::info!(actor = %ctx.self_ref(), "my actor reference");
			ctx.reply(String::from("Got Message"));
		} else {
			tracing::debug!(actor = %ctx.path(), message = msg.type_name(), "log_address.unhandled");
		}
		Ok(())
	}
}
