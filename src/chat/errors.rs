//! Error types for the chat core.

use thiserror::Error;

use super::ids::ConversationId;

/// Chat core error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// No record exists for the requested conversation identifier.
    #[error("conversation not found: {0}")]
    StorageNotFound(ConversationId),
    /// A record exists but its content cannot be parsed as a message list.
    #[error("conversation record corrupt ({id}): {reason}")]
    StorageCorrupt {
        /// Identifier of the unreadable record.
        id: ConversationId,
        /// Parser or reader diagnostic.
        reason: String,
    },
    /// I/O failure while creating or rewriting a record.
    #[error("storage write failed: {0}")]
    StorageWrite(#[from] std::io::Error),
    /// Non-success status or transport failure from the completion service.
    ///
    /// Carries a human-readable cause; the presentation layer shows it in
    /// place of an assistant reply.
    #[error("completion service error: {0}")]
    CompletionService(String),
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;
