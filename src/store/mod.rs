//! Persistence Collaborators
//!
//! The subsystem does not own chat storage. It reaches it through two
//! narrow traits: [`ChatStore`] for reading conversations and bumping
//! unread counters, and [`MessageReceiver`], the use case that persists an
//! incoming message.
//!
//! [`MemoryStore`] implements both for the binary and for tests.

mod error;
mod memory;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::transport::MessageFrame;

/// A member of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Summary view of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    /// Display name; for one-to-one chats this is the counterpart's name
    pub name: String,
    pub is_group: bool,
    pub participants: Vec<Participant>,
    pub unread_count: u32,
    pub last_message: Option<String>,
    pub last_message_time: Option<String>,
}

impl ChatSummary {
    /// A one-to-one conversation
    pub fn direct(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_group: false,
            participants: Vec::new(),
            unread_count: 0,
            last_message: None,
            last_message_time: None,
        }
    }

    /// A group conversation with the given members
    pub fn group(
        id: impl Into<String>,
        name: impl Into<String>,
        participants: Vec<Participant>,
    ) -> Self {
        Self {
            is_group: true,
            participants,
            ..Self::direct(id, name)
        }
    }
}

/// Read access to conversations plus the unread counter
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// All known conversations
    async fn list_chats(&self) -> StoreResult<Vec<ChatSummary>>;

    /// One conversation, if it exists
    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<ChatSummary>>;

    /// Increment a conversation's unread counter, returning the new value
    async fn increment_unread(&self, chat_id: &str) -> StoreResult<u32>;
}

/// Use case that persists an incoming message and updates its chat
#[async_trait]
pub trait MessageReceiver: Send + Sync {
    async fn receive_message(&self, frame: MessageFrame) -> StoreResult<MessageFrame>;
}
