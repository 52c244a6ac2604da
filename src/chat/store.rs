//! File-backed conversation persistence.
//!
//! One conversation per record, named `chat_<id>.json` under a single
//! storage root. Records hold the pretty-printed JSON array of messages and
//! nothing else; the directory listing is the conversation index, with no
//! separate index file to drift out of sync.
//!
//! No locking or transactional guarantee: two sessions saving the same
//! identifier race and the last write wins. Single-user, single-process
//! usage is assumed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::errors::{ChatError, ChatResult};
use super::ids::ConversationId;
use super::message::Message;

/// Record file name prefix.
const RECORD_PREFIX: &str = "chat_";
/// Record file name suffix.
const RECORD_SUFFIX: &str = ".json";

/// Pairs a conversation identifier with its durable location.
///
/// Only the store hands these out, so `save` can never write to a location
/// that was not allocated by `create` or observed by `load`.
#[derive(Debug, Clone)]
pub struct ConversationHandle {
    id: ConversationId,
    path: PathBuf,
}

impl ConversationHandle {
    /// The conversation identifier.
    #[must_use]
    pub const fn id(&self) -> &ConversationId {
        &self.id
    }

    /// The record path on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Durable persistence of conversations plus listing of known identifiers.
pub trait ConversationStore: Send + Sync {
    /// Allocate a fresh identifier and write `initial_messages` as a new
    /// record.
    ///
    /// # Errors
    /// Returns [`ChatError::StorageWrite`] if the storage root is not
    /// writable.
    fn create(&self, initial_messages: &[Message]) -> ChatResult<ConversationHandle>;

    /// Read the full message list for an existing identifier.
    ///
    /// # Errors
    /// Returns [`ChatError::StorageNotFound`] for an unknown identifier, or
    /// [`ChatError::StorageCorrupt`] if the record cannot be read or parsed
    /// as a message list.
    fn load(&self, id: &ConversationId) -> ChatResult<(Vec<Message>, ConversationHandle)>;

    /// Overwrite the record at `handle` with the full current message list.
    ///
    /// A full rewrite, not an append: after a successful call the durable
    /// state equals the in-memory state. A failed save leaves the in-memory
    /// state untouched and the caller may retry.
    ///
    /// # Errors
    /// Returns [`ChatError::StorageWrite`] on I/O failure.
    fn save(&self, handle: &ConversationHandle, messages: &[Message]) -> ChatResult<()>;

    /// Enumerate all conversations in the storage namespace, sorted by
    /// identifier. Empty, never an error, when none exist.
    fn list_identifiers(&self) -> Vec<ConversationId>;
}

/// [`ConversationStore`] backed by one JSON file per conversation.
pub struct FileConversationStore {
    root: PathBuf,
}

impl FileConversationStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    ///
    /// # Errors
    /// Returns [`ChatError::StorageWrite`] if the root cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> ChatResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Record path for `id`.
    fn record_path(&self, id: &ConversationId) -> PathBuf {
        self.root
            .join(format!("{RECORD_PREFIX}{id}{RECORD_SUFFIX}"))
    }

    /// Serialize `messages` the way the record format expects.
    fn encode(messages: &[Message]) -> ChatResult<String> {
        // Pretty-printed so records stay hand-inspectable.
        serde_json::to_string_pretty(messages)
            .map_err(|e| ChatError::StorageWrite(io::Error::other(e)))
    }

    /// Derive an identifier from a record file name, if it is one of ours.
    fn id_from_file_name(name: &str) -> Option<ConversationId> {
        let token = name
            .strip_prefix(RECORD_PREFIX)?
            .strip_suffix(RECORD_SUFFIX)?;
        token.parse().ok()
    }
}

impl ConversationStore for FileConversationStore {
    fn create(&self, initial_messages: &[Message]) -> ChatResult<ConversationHandle> {
        // Re-draw on the unlikely collision with an existing record.
        let mut id = ConversationId::new();
        let mut path = self.record_path(&id);
        while path.exists() {
            id = ConversationId::new();
            path = self.record_path(&id);
        }

        fs::write(&path, Self::encode(initial_messages)?)?;
        debug!("Created conversation record: {}", path.display());
        Ok(ConversationHandle { id, path })
    }

    fn load(&self, id: &ConversationId) -> ChatResult<(Vec<Message>, ConversationHandle)> {
        let path = self.record_path(id);
        let raw = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ChatError::StorageNotFound(id.clone())
            } else {
                ChatError::StorageCorrupt {
                    id: id.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let messages: Vec<Message> =
            serde_json::from_str(&raw).map_err(|e| ChatError::StorageCorrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;

        debug!("Loaded {} messages from {}", messages.len(), path.display());
        Ok((
            messages,
            ConversationHandle {
                id: id.clone(),
                path,
            },
        ))
    }

    fn save(&self, handle: &ConversationHandle, messages: &[Message]) -> ChatResult<()> {
        let encoded = Self::encode(messages)?;
        fs::write(&handle.path, encoded)?;
        debug!(
            "Saved {} messages to {}",
            messages.len(),
            handle.path.display()
        );
        Ok(())
    }

    fn list_identifiers(&self) -> Vec<ConversationId> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read storage root {}: {e}", self.root.display());
                return Vec::new();
            }
        };

        let mut ids: Vec<ConversationId> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(Self::id_from_file_name)
            })
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Role;
    use core::str::FromStr;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn temp_store() -> Result<(tempfile::TempDir, FileConversationStore), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let store = FileConversationStore::new(dir.path().join("chats"))?;
        Ok((dir, store))
    }

    #[test]
    fn test_create_persists_single_system_message() -> TestResult {
        let (_dir, store) = temp_store()?;
        let handle = store.create(&[Message::system("preamble")])?;

        let (messages, _) = store.load(handle.id())?;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "preamble");
        Ok(())
    }

    #[test]
    fn test_save_then_load_round_trips() -> TestResult {
        let (_dir, store) = temp_store()?;
        let handle = store.create(&[Message::system("preamble")])?;

        let messages = vec![
            Message::system("preamble"),
            Message::user("Hello"),
            Message::assistant("Hi there"),
        ];
        store.save(&handle, &messages)?;

        let (loaded, _) = store.load(handle.id())?;
        assert_eq!(loaded, messages);
        Ok(())
    }

    #[test]
    fn test_load_then_resave_is_idempotent() -> TestResult {
        let (_dir, store) = temp_store()?;
        let handle = store.create(&[Message::system("preamble")])?;
        store.save(&handle, &[Message::system("preamble"), Message::user("hi")])?;

        let (first, reloaded_handle) = store.load(handle.id())?;
        store.save(&reloaded_handle, &first)?;
        let (second, _) = store.load(handle.id())?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_list_identifiers_sorted_and_complete() -> TestResult {
        let (_dir, store) = temp_store()?;
        let mut created = Vec::new();
        for _ in 0..3 {
            let handle = store.create(&[Message::system("preamble")])?;
            created.push(handle.id().clone());
        }

        let listed = store.list_identifiers();
        assert_eq!(listed.len(), 3);
        let mut expected = created;
        expected.sort();
        assert_eq!(listed, expected);
        Ok(())
    }

    #[test]
    fn test_list_identifiers_empty_store() -> TestResult {
        let (_dir, store) = temp_store()?;
        assert!(store.list_identifiers().is_empty());
        Ok(())
    }

    #[test]
    fn test_list_ignores_foreign_files() -> TestResult {
        let (dir, store) = temp_store()?;
        fs::write(dir.path().join("chats").join("notes.txt"), "x")?;
        fs::write(dir.path().join("chats").join("chat_.json"), "[]")?;
        assert!(store.list_identifiers().is_empty());
        Ok(())
    }

    #[test]
    fn test_load_unknown_id_is_not_found() -> TestResult {
        let (_dir, store) = temp_store()?;
        let id = ConversationId::from_str("0badc0de")?;
        let result = store.load(&id);
        assert!(matches!(
            result,
            Err(ChatError::StorageNotFound(ref missing)) if *missing == id
        ));
        Ok(())
    }

    #[test]
    fn test_load_corrupt_record() -> TestResult {
        let (_dir, store) = temp_store()?;
        let handle = store.create(&[Message::system("preamble")])?;
        fs::write(handle.path(), "not json at all")?;

        let result = store.load(handle.id());
        assert!(matches!(
            result,
            Err(ChatError::StorageCorrupt { ref id, .. }) if id == handle.id()
        ));
        Ok(())
    }
}
