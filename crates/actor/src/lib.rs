//! In-process actor runtime.
//!
//! Actors are isolated units of state reachable only through asynchronous
//! messages. This crate provides:
//!
//! * per-actor FIFO mailboxes with a priority lane for control signals
//! * a fixed pool of dispatcher workers that run one bounded step per slot
//! * fire-and-forget [`ActorRef::tell`] and request/response [`ActorRef::ask`]
//! * graceful stop, forced kill, and a directive table for handler failures
//! * a dead-letter office recording every undeliverable message
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use ensemble_actor::{Actor, ActorContext, ActorError, ActorSystem, Message, Props};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Actor for Echo {
//! 	async fn handle(&mut self, msg: Message, ctx: &mut ActorContext) -> Result<(), ActorError> {
//! 		if let Ok(text) = msg.downcast::<String>() {
//! 			ctx.reply(text);
//! 		}
//! 		Ok(())
//! 	}
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let system = ActorSystem::new("demo")?;
//! let echo = system.spawn(Props::new(|| Echo), Some("echo"))?;
//! let reply: String = echo.ask(String::from("hi"), Duration::from_secs(1)).await?;
//! assert_eq!(reply, "hi");
//! system.shutdown(Duration::from_secs(1)).await;
//! # Ok(())
//! # }
//! ```

mod actor;
mod actor_ref;
mod ask;
mod cell;
mod class;
mod config;
mod context;
mod dead_letters;
mod dispatcher;
mod error;
mod id;
mod mailbox;
mod message;
mod panic;
mod registry;
mod spawn;
mod supervision;
mod system;

pub use actor::{Actor, Props};
pub use actor_ref::ActorRef;
pub use ask::ask;
pub use class::TaskClass;
pub use config::{MailboxConfig, OverflowPolicy, SystemConfig};
pub use context::ActorContext;
pub use dead_letters::{DeadLetter, DeadLetterOffice, DeadLetterReason, DeadLetterSummary};
pub use error::{ActorError, AskError, ConfigError, SpawnError, SystemError};
pub use id::{ActorId, ActorPath};
pub use mailbox::{Dequeued, EnqueueOutcome, Mailbox};
pub use message::{Message, PoisonPill, Status, Terminated};
pub use panic::panic_message;
pub use registry::{ActorRecord, ActorStatus};
pub use spawn::spawn;
pub use supervision::{SupervisorDirective, Termination};
pub use system::{ActorSystem, ShutdownReport};
