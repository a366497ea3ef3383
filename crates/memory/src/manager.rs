//! Ties the stores together and adapts them to the agent's turn
//! persistence contract.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use hearth_agent::{ChatMessage, Role, TurnStore};

use crate::conversation::ConversationStore;
use crate::database::{Database, StoreError};
use crate::memory::{Memory, MemoryStore};

/// High-level entry point: owns the current conversation id and exposes
/// conversation plus fact storage. On startup it resumes the most recent
/// conversation, creating one if the database is fresh.
pub struct MemoryManager {
    pub conversations: ConversationStore,
    pub memories: MemoryStore,
    current: AtomicI64,
}

impl MemoryManager {
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let conversations = ConversationStore::new(db.clone());
        let memories = MemoryStore::new(db);

        let current = match conversations.current()? {
            Some(id) => id,
            None => conversations.create("normal")?,
        };

        Ok(Self {
            conversations,
            memories,
            current: AtomicI64::new(current),
        })
    }

    pub fn current_conversation(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn start_new_conversation(&self, mode: &str) -> Result<i64, StoreError> {
        let id = self.conversations.create(mode)?;
        self.current.store(id, Ordering::SeqCst);
        Ok(id)
    }

    pub fn search_facts(
        &self,
        category: Option<&str>,
        min_importance: i64,
    ) -> Result<Vec<Memory>, StoreError> {
        self.memories.search(category, min_importance)
    }
}

impl TurnStore for MemoryManager {
    fn save_turn(&self, role: Role, content: &str, metadata: Option<&str>) -> anyhow::Result<()> {
        self.conversations
            .add_message(self.current_conversation(), role.as_str(), content, metadata)?;
        Ok(())
    }

    /// Most recent `limit` turns of the current conversation, oldest
    /// first. Rows whose role tag is unknown are skipped.
    fn load_recent_turns(&self, limit: usize) -> anyhow::Result<Vec<ChatMessage>> {
        let messages = self.conversations.messages(self.current_conversation())?;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages
            .into_iter()
            .skip(skip)
            .filter_map(|message| {
                Role::parse(&message.role).map(|role| ChatMessage::new(role, message.content))
            })
            .collect())
    }

    /// Facts worth reminding the model about at the start of every turn.
    /// Importance below 30 is considered noise and left out.
    fn context_facts(&self) -> anyhow::Result<Vec<String>> {
        let facts = self.search_facts(None, 30)?;
        Ok(facts
            .into_iter()
            .map(|fact| format!("{}: {}", fact.key, fact.content))
            .collect())
    }
}
