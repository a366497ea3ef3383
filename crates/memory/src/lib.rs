//! Relational persistence for the assistant: conversations, long-term
//! facts, roleplay entities, the literal-text document index, and the
//! directory allow-list behind every filesystem capability.

pub mod conversation;
pub mod database;
pub mod manager;
pub mod memory;
pub mod rp;
pub mod sandbox;
pub mod text_index;

pub use conversation::{Conversation, ConversationStore, StoredMessage};
pub use database::{Database, StoreError};
pub use manager::MemoryManager;
pub use memory::{Memory, MemoryStore};
pub use rp::{RpCharacter, RpStore, RpStoryCard};
pub use sandbox::AllowedDirs;
pub use text_index::{SearchHit, TextIndex};
