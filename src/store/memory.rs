//! In-Memory Store
//!
//! Each conversation sits behind its own mutex so read-modify-write
//! updates to one chat are serialized while different chats proceed
//! independently.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::{ChatStore, ChatSummary, MessageReceiver, Participant, StoreError, StoreResult};
use crate::transport::{demo_chat_id, MessageFrame};

/// Chats and their messages held in process memory
#[derive(Default)]
pub struct MemoryStore {
    chats: RwLock<HashMap<String, Arc<Mutex<ChatSummary>>>>,
    messages: RwLock<HashMap<String, Vec<MessageFrame>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the conversations demo traffic is addressed to
    pub async fn seeded(local_user_id: &str) -> Self {
        let store = Self::new();
        let me = Participant::new(local_user_id, "Me");

        store
            .insert_chat(ChatSummary::direct(demo_chat_id(1), "Ada Lovelace"))
            .await;
        store
            .insert_chat(ChatSummary::group(
                demo_chat_id(2),
                "Compiler Club",
                vec![
                    me.clone(),
                    Participant::new("user_linus", "Linus"),
                    Participant::new("user_grace", "Grace"),
                ],
            ))
            .await;
        store
            .insert_chat(ChatSummary::group(demo_chat_id(3), "Weekend Plans", vec![me]))
            .await;

        store
    }

    /// Add or replace a conversation
    pub async fn insert_chat(&self, chat: ChatSummary) {
        self.chats
            .write()
            .await
            .insert(chat.id.clone(), Arc::new(Mutex::new(chat)));
    }

    /// Messages persisted for a conversation, oldest first
    pub async fn messages(&self, chat_id: &str) -> Vec<MessageFrame> {
        self.messages
            .read()
            .await
            .get(chat_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn chat_entry(&self, chat_id: &str) -> StoreResult<Arc<Mutex<ChatSummary>>> {
        self.chats
            .read()
            .await
            .get(chat_id)
            .cloned()
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.to_string()))
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn list_chats(&self) -> StoreResult<Vec<ChatSummary>> {
        let entries: Vec<_> = self.chats.read().await.values().cloned().collect();

        let mut chats = Vec::with_capacity(entries.len());
        for entry in entries {
            chats.push(entry.lock().await.clone());
        }
        chats.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(chats)
    }

    async fn get_chat(&self, chat_id: &str) -> StoreResult<Option<ChatSummary>> {
        let entry = self.chats.read().await.get(chat_id).cloned();
        match entry {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn increment_unread(&self, chat_id: &str) -> StoreResult<u32> {
        let entry = self.chat_entry(chat_id).await?;
        let mut chat = entry.lock().await;
        chat.unread_count += 1;
        Ok(chat.unread_count)
    }
}

#[async_trait]
impl MessageReceiver for MemoryStore {
    async fn receive_message(&self, frame: MessageFrame) -> StoreResult<MessageFrame> {
        let entry = self.chat_entry(&frame.chat_id).await?;
        let mut chat = entry.lock().await;

        chat.last_message = Some(frame.text.clone());
        chat.last_message_time = Some(frame.time.clone());
        self.messages
            .write()
            .await
            .entry(frame.chat_id.clone())
            .or_default()
            .push(frame.clone());

        tracing::trace!(chat_id = %frame.chat_id, message_id = %frame.message_id, "Message stored");
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_receive_updates_chat() {
        let store = MemoryStore::new();
        store.insert_chat(ChatSummary::direct("c1", "Bo")).await;

        let frame = MessageFrame::compose("c1", "hi there", "u2", "Bo");
        let stored = store.receive_message(frame.clone()).await.unwrap();
        assert_eq!(stored, frame);

        let chat = store.get_chat("c1").await.unwrap().unwrap();
        assert_eq!(chat.last_message.as_deref(), Some("hi there"));
        assert_eq!(store.messages("c1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_receive_unknown_chat_fails() {
        let store = MemoryStore::new();
        let frame = MessageFrame::compose("nope", "hi", "u2", "Bo");
        assert_eq!(
            store.receive_message(frame).await,
            Err(StoreError::ChatNotFound("nope".to_string()))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        store.insert_chat(ChatSummary::direct("hot", "Hot")).await;
        store.insert_chat(ChatSummary::direct("cold", "Cold")).await;

        let mut tasks = Vec::new();
        for i in 0..100 {
            let store = Arc::clone(&store);
            let chat = if i % 4 == 0 { "cold" } else { "hot" };
            tasks.push(tokio::spawn(async move {
                store.increment_unread(chat).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let hot = store.get_chat("hot").await.unwrap().unwrap();
        let cold = store.get_chat("cold").await.unwrap().unwrap();
        assert_eq!(hot.unread_count, 75);
        assert_eq!(cold.unread_count, 25);
    }

    #[tokio::test]
    async fn test_increment_waits_for_chat_lock() {
        let store = Arc::new(MemoryStore::new());
        store.insert_chat(ChatSummary::direct("hot", "Hot")).await;

        let entry = store.chat_entry("hot").await.unwrap();
        let held = entry.lock().await;

        let pending = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.increment_unread("hot").await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished());
        assert_eq!(held.unread_count, 0);

        drop(held);
        assert_eq!(pending.await.unwrap(), Ok(1));
    }

    #[tokio::test]
    async fn test_seeded_store_covers_demo_chats() {
        let store = MemoryStore::seeded("me").await;
        let chats = store.list_chats().await.unwrap();
        assert_eq!(chats.len(), 3);
        assert!(chats.iter().all(|c| c.id.starts_with("demo-chat-")));
        assert!(chats.iter().any(|c| c.is_group));
    }
}
