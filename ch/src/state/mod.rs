//! State management for the history engine
//!
//! Uses the actor pattern: a single task owns the engine state and applies
//! mutations sent over a channel. Reads are served from the last committed
//! snapshot.

mod engine;
mod manager;
mod messages;

pub use engine::{Change, EngineState, StoreKey};
pub use manager::{DEFAULT_QUEUE_CAPACITY, HistoryManager, ManagerOptions};
pub use messages::{HistoryCommand, HistoryError, HistoryEvent, HistoryResponse, SaveOutcome};
