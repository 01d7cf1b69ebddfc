//! Per-chat session state
//!
//! A session records which conversation and step a chat is currently at.
//! All access goes through [`SessionStore::lock`], which hands out an
//! exclusive guard per chat id: two turns for the same chat never interleave,
//! while different chats proceed in parallel.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Chat identifier as assigned by the transport
pub type ChatId = i64;

/// Where a chat currently is inside a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub conversation_id: String,
    pub current_step_id: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(conversation_id: impl Into<String>, step_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            current_step_id: step_id.into(),
            started_at: now,
            updated_at: now,
        }
    }
}

type Slot = Arc<AsyncMutex<Option<Session>>>;

/// In-memory session map with per-chat mutual exclusion
#[derive(Default)]
pub struct SessionStore {
    slots: Mutex<HashMap<ChatId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive access to a chat's session.
    ///
    /// Held for a whole turn; other turns for the same chat wait here.
    pub async fn lock(&self, chat_id: ChatId) -> SessionGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(slots.entry(chat_id).or_default())
        };
        let guard = Arc::clone(&slot).lock_owned().await;
        SessionGuard {
            store: self,
            chat_id,
            slot,
            guard,
        }
    }

    /// Number of chats with a live session or a turn in progress
    pub fn active_chats(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Drop a chat's slot once nobody else is holding or waiting on it
    fn release(&self, chat_id: ChatId, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        // Store, this guard's slot, and the owned guard itself
        if Arc::strong_count(slot) <= 3 {
            slots.remove(&chat_id);
        }
    }
}

/// Exclusive access to one chat's session for the duration of a turn
pub struct SessionGuard<'a> {
    store: &'a SessionStore,
    chat_id: ChatId,
    slot: Slot,
    guard: OwnedMutexGuard<Option<Session>>,
}

impl SessionGuard<'_> {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn get(&self) -> Option<&Session> {
        self.guard.as_ref()
    }

    /// Point the chat at a step, keeping the original start time
    pub fn set(&mut self, conversation_id: &str, step_id: &str) {
        match self.guard.as_mut() {
            Some(session) if session.conversation_id == conversation_id => {
                session.current_step_id = step_id.to_string();
                session.updated_at = Utc::now();
            }
            _ => *self.guard = Some(Session::new(conversation_id, step_id)),
        }
    }

    pub fn delete(&mut self) -> Option<Session> {
        self.guard.take()
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.guard.is_none() {
            self.store.release(self.chat_id, &self.slot);
        }
    }
}
