//! In-memory state and turn-taking contract for the active conversation.
//!
//! A session moves between three states: `Idle` after creation, load, or a
//! successful turn; `AwaitingCompletion` while a request is in flight; and
//! `Idle` with [`ChatSession::is_dirty`] set after a failed turn, where the
//! in-memory list is one user message ahead of the durable record. The
//! divergence heals at the next successful save. `&mut self` on
//! [`ChatSession::submit_turn`] serializes submissions, so rapid
//! double-submission from a presentation layer cannot interleave list
//! mutation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::llm::CompletionBackend;

use super::config::ChatConfig;
use super::errors::ChatResult;
use super::ids::ConversationId;
use super::message::Message;
use super::store::{ConversationHandle, ConversationStore};

/// The active conversation: its identifier, message list, and the
/// operations that extend it one turn at a time.
pub struct ChatSession {
    store: Arc<dyn ConversationStore>,
    backend: Arc<dyn CompletionBackend>,
    handle: ConversationHandle,
    messages: Vec<Message>,
    model: String,
    temperature: f32,
    dirty: bool,
}

impl ChatSession {
    /// Start a brand-new conversation holding only the configured system
    /// message.
    ///
    /// # Errors
    /// Returns [`crate::chat::ChatError::StorageWrite`] if the record cannot
    /// be created.
    pub fn start_new(
        store: Arc<dyn ConversationStore>,
        backend: Arc<dyn CompletionBackend>,
        config: &ChatConfig,
    ) -> ChatResult<Self> {
        let messages = vec![Message::system(config.system_prompt.clone())];
        let handle = store.create(&messages)?;
        info!("Started conversation {}", handle.id());
        Ok(Self {
            store,
            backend,
            handle,
            messages,
            model: config.model.clone(),
            temperature: config.temperature,
            dirty: false,
        })
    }

    /// Resume a previously persisted conversation.
    ///
    /// # Errors
    /// Propagates [`crate::chat::ChatError::StorageNotFound`] and
    /// [`crate::chat::ChatError::StorageCorrupt`] from the store so the
    /// presentation layer can fall back to starting a new conversation.
    pub fn resume(
        store: Arc<dyn ConversationStore>,
        backend: Arc<dyn CompletionBackend>,
        config: &ChatConfig,
        id: &ConversationId,
    ) -> ChatResult<Self> {
        let (messages, handle) = store.load(id)?;
        info!("Resumed conversation {} ({} messages)", id, messages.len());
        Ok(Self {
            store,
            backend,
            handle,
            messages,
            model: config.model.clone(),
            temperature: config.temperature,
            dirty: false,
        })
    }

    /// Submit one user turn and return the assistant reply.
    ///
    /// Whitespace-only input is a no-op returning `Ok(None)`: nothing is
    /// appended and neither the store nor the backend is contacted.
    ///
    /// On success the list grows by exactly two messages (`user` then
    /// `assistant`) and the record is rewritten, so disk equals memory. On
    /// backend failure the user message stays appended (not rolled back),
    /// nothing is persisted, and the session is dirty until the next
    /// successful turn; the turn is not retried automatically. A failed
    /// save likewise leaves the session dirty, with both turn messages
    /// unsaved.
    ///
    /// # Errors
    /// Returns [`crate::chat::ChatError::CompletionService`] if the request
    /// fails, or [`crate::chat::ChatError::StorageWrite`] if the follow-up
    /// save fails.
    pub fn submit_turn(&mut self, user_text: &str) -> ChatResult<Option<String>> {
        if user_text.trim().is_empty() {
            debug!("Ignoring empty user input");
            return Ok(None);
        }

        self.messages.push(Message::user(user_text));

        let reply =
            match self
                .backend
                .complete(&self.messages, &self.model, self.temperature)
            {
                Ok(reply) => reply,
                Err(e) => {
                    self.dirty = true;
                    return Err(e);
                }
            };

        self.messages.push(Message::assistant(reply.clone()));
        // Memory is ahead of disk from here until the save lands.
        self.dirty = true;
        self.store.save(&self.handle, &self.messages)?;
        self.dirty = false;
        debug!(
            "Turn complete on {}: {} messages",
            self.handle.id(),
            self.messages.len()
        );
        Ok(Some(reply))
    }

    /// Identifier of the active conversation.
    #[must_use]
    pub const fn id(&self) -> &ConversationId {
        self.handle.id()
    }

    /// The full in-memory message list, system preamble included.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The messages a presentation layer should render: everything after
    /// the system preamble.
    #[must_use]
    pub fn visible_messages(&self) -> &[Message] {
        self.messages.get(1..).unwrap_or_default()
    }

    /// Whether the in-memory list is ahead of the durable record because
    /// the last turn failed before its save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}
