//! Per-session dialog state machine.
//!
//! - `Session`/`Stage`: the conversation state the machine mutates
//! - `SessionStore`: key-value seam over session storage (in-memory impl)
//! - `DialogOrchestrator`: decides the next bot turn for an incoming message
//! - `ScriptedReplies`: the fixed qualification-script texts

mod orchestrator;
mod replies;
mod session;
mod store;

pub use orchestrator::{BotReply, DialogOrchestrator};
pub use replies::ScriptedReplies;
pub use session::{ChatTurn, Session, Stage, UserData, UserType};
pub use store::{InMemorySessionStore, SessionStore};
