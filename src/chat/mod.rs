//! Core chat types: messages, identifiers, configuration, persistence, and
//! the turn-taking session.

pub mod config;
pub mod errors;
pub mod ids;
pub mod message;
pub mod session;
pub mod store;

pub use config::ChatConfig;
pub use errors::{ChatError, ChatResult};
pub use ids::{ConversationId, ConversationIdParseError};
pub use message::{Message, Role, RoleParseError};
pub use session::ChatSession;
pub use store::{ConversationHandle, ConversationStore, FileConversationStore};
