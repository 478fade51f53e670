//! Conversation store
//!
//! Owns every thread of one user plus the "current" thread selection.
//! The full thread list is written to durable storage after each mutation;
//! write failures are logged and otherwise ignored.

use crate::chat::models::{derive_title, Message, MessageRole, NewMessage, Thread, ThreadId};
use crate::state::Storage;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key holding the serialized thread list
pub const THREADS_KEY: &str = "chat-threads";

/// In-memory thread set backed by durable storage
pub struct ConversationStore {
    /// Threads in insertion order, newest created first
    threads: Vec<Thread>,
    /// Id of the current thread; always refers to a member of `threads`
    current: Option<ThreadId>,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("threads", &self.threads.len())
            .field("current", &self.current)
            .finish()
    }
}

impl ConversationStore {
    /// Open the store, restoring any previously saved threads
    ///
    /// Missing, unreadable or malformed state yields an empty store. When
    /// threads are restored, the first one becomes current. Of several
    /// threads sharing an id only the first is kept.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let mut threads = match storage.get_item(THREADS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Thread>>(&json) {
                Ok(threads) => threads,
                Err(e) => {
                    warn!(error = %e, "Failed to parse stored threads, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored threads, starting empty");
                Vec::new()
            }
        };

        let restored = threads.len();
        let mut seen = HashSet::new();
        threads.retain(|t| seen.insert(t.id.clone()));
        if threads.len() < restored {
            warn!(
                dropped = restored - threads.len(),
                "Stored threads contained duplicate ids, keeping the first of each"
            );
        }

        let current = threads.first().map(|t| t.id.clone());
        debug!(count = threads.len(), "Conversation store opened");

        Self {
            threads,
            current,
            storage,
        }
    }

    /// All threads in storage order
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    /// Look up a thread by id
    pub fn thread(&self, id: &str) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// The current thread, if any
    pub fn current_thread(&self) -> Option<&Thread> {
        self.current.as_deref().and_then(|id| self.thread(id))
    }

    /// Id of the current thread, if any
    pub fn current_thread_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Threads in presentation order: pinned first, then newest first
    pub fn sorted_threads(&self) -> Vec<&Thread> {
        let mut threads: Vec<&Thread> = self.threads.iter().collect();
        threads.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        threads
    }

    /// Create an empty thread, make it current and return its id
    pub fn create_thread(&mut self) -> ThreadId {
        let thread = Thread::new(format!("New chat {}", self.threads.len() + 1));
        let id = thread.id.clone();
        self.threads.insert(0, thread);
        self.current = Some(id.clone());
        self.persist();
        id
    }

    /// Make the thread with `id` current; unknown ids are ignored
    pub fn select_thread(&mut self, id: &str) {
        if self.thread(id).is_some() {
            self.current = Some(id.to_string());
        }
    }

    /// Delete the thread with `id`; unknown ids are ignored
    ///
    /// Deleting the current thread moves the selection to the most recently
    /// created survivor, or clears it when none remain.
    pub fn delete_thread(&mut self, id: &str) {
        let Some(index) = self.threads.iter().position(|t| t.id == id) else {
            return;
        };
        self.threads.remove(index);

        if self.current.as_deref() == Some(id) {
            self.current = self
                .threads
                .iter()
                .reduce(|newest, t| if t.created_at > newest.created_at { t } else { newest })
                .map(|t| t.id.clone());
        }
        self.persist();
    }

    /// Flip the pinned flag of the thread with `id`; unknown ids are ignored
    pub fn toggle_pin_thread(&mut self, id: &str) {
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == id) {
            thread.pinned = !thread.pinned;
            self.persist();
        }
    }

    /// Append a message to the current thread
    ///
    /// Does nothing and returns `None` when no thread is current.
    pub fn add_message(&mut self, message: NewMessage) -> Option<Message> {
        let Some(id) = self.current.clone() else {
            debug!("add_message called without a current thread, ignoring");
            return None;
        };
        self.add_message_to(&id, message)
    }

    /// Append a message to the thread with `id`
    ///
    /// A thread's title is derived exactly once: when its first message is
    /// appended and that message comes from the user.
    pub fn add_message_to(&mut self, id: &str, message: NewMessage) -> Option<Message> {
        let thread = self.threads.iter_mut().find(|t| t.id == id)?;

        let is_first_user_message =
            thread.messages.is_empty() && message.role == MessageRole::User;
        let created = Message::new(message.role, message.content);
        thread.messages.push(created.clone());
        if is_first_user_message {
            thread.title = derive_title(&created.content);
        }

        self.persist();
        Some(created)
    }

    /// Replace the title of the thread with `id`; unknown ids are ignored
    pub fn update_thread_title(&mut self, id: &str, title: &str) {
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == id) {
            thread.title = title.to_string();
            self.persist();
        }
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.threads) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize threads");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(THREADS_KEY, &json) {
            warn!(error = %e, "Failed to persist threads");
        }
    }
}
