//! Conversation state and the turn loop.

mod driver;
mod state;
mod step;

pub use driver::{
    ConversationLoop, DEFAULT_MAX_TURNS, LoopConfig, RunError, RunOutcome, Termination,
};
pub use state::Conversation;
pub use step::{Anomaly, Step, classify};
