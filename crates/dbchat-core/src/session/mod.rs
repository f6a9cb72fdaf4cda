//! Chat sessions and their store

mod chat;
mod store;

pub use chat::{
    ChatOutcome, ChatSession, BUDGET_EXHAUSTED_MESSAGE, DEFAULT_MAX_ITERATIONS,
};
pub use store::{SessionId, SessionInfo, SessionStore};
