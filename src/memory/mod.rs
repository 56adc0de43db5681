//! Persistence layer: per-session memory and cross-session conversation history.

mod history;
mod session;

pub use history::{ConversationRecord, ConversationStore};
pub use session::{MemoryItem, MemoryKind, MemoryManager};
