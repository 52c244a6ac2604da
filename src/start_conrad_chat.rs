//! Startup helpers for the Conrad chat client.
//!
//! This is the presentation glue around the core: it initializes logging,
//! reads configuration from the environment, opens the store, and drives a
//! small terminal REPL. The completion call itself is dispatched to a
//! blocking worker so the input thread of control never sits on the network
//! round trip.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::chat::{
    ChatConfig, ChatError, ChatSession, ConversationId, ConversationStore, FileConversationStore,
    Role,
};
use crate::llm::{ChatCompletionsClient, CompletionBackend};

/// Run the chat client.
///
/// # Returns
/// `ExitCode::SUCCESS` on clean exit, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Conrad chat v{}", env!("CARGO_PKG_VERSION"));

    let config = ChatConfig::from_env();
    if config.api_key.is_empty() {
        // Not fatal: the service rejects the request and the rejection is
        // shown in place of a reply.
        tracing::warn!("CONRAD_API_KEY is not set; completion requests will be rejected");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_repl(config)) {
        tracing::error!("Chat client error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Open the store and client, pick the starting conversation, and loop on
/// user input until end of input or `/quit`.
async fn run_repl(config: ChatConfig) -> Result<()> {
    let store: Arc<dyn ConversationStore> = Arc::new(
        FileConversationStore::new(config.storage_dir.clone())
            .context("failed to open conversation storage")?,
    );
    let backend: Arc<dyn CompletionBackend> = Arc::new(
        ChatCompletionsClient::new(&config).context("failed to build completion client")?,
    );

    let mut session = initial_session(&store, &backend, &config)?;
    println!("Conversation {}  (/new /list /open <id> /quit)", session.id());
    render_history(&session);

    let mut lines = io::stdin().lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush prompt")?;

        let Some(line) = lines.next() else { break };
        let line = line.context("failed to read input")?;
        let input = line.trim();

        match input {
            "" => {}
            "/quit" | "/exit" => break,
            "/list" => {
                for id in store.list_identifiers() {
                    println!("{id}");
                }
            }
            "/new" => {
                session = ChatSession::start_new(store.clone(), backend.clone(), &config)?;
                println!("Started conversation {}", session.id());
            }
            _ => {
                if let Some(arg) = open_argument(input) {
                    if let Some(opened) = open_command(arg, &store, &backend, &config)? {
                        session = opened;
                        println!("Conversation {}", session.id());
                        render_history(&session);
                    }
                } else {
                    session = submit_on_worker(session, input.to_string()).await?;
                }
            }
        }
    }

    Ok(())
}

/// Extract the argument of an `/open` command, or `None` when `input` is
/// not an `/open` command at all. The command word must stand alone:
/// `/openabc` is ordinary chat text.
fn open_argument(input: &str) -> Option<&str> {
    let rest = input.strip_prefix("/open")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Resume the most recent conversation, or start a new one when the store
/// is empty or the latest record is unreadable.
fn initial_session(
    store: &Arc<dyn ConversationStore>,
    backend: &Arc<dyn CompletionBackend>,
    config: &ChatConfig,
) -> Result<ChatSession> {
    if let Some(last) = store.list_identifiers().last() {
        match ChatSession::resume(store.clone(), backend.clone(), config, last) {
            Ok(session) => return Ok(session),
            Err(e @ (ChatError::StorageNotFound(_) | ChatError::StorageCorrupt { .. })) => {
                tracing::warn!("Could not resume {last}: {e}; starting a new conversation");
            }
            Err(e) => return Err(e.into()),
        }
    }
    ChatSession::start_new(store.clone(), backend.clone(), config).map_err(Into::into)
}

/// Handle `/open <id>`: `Ok(Some)` on success or fallback, `Ok(None)` when
/// the argument is unusable and the current session should stay active.
fn open_command(
    arg: &str,
    store: &Arc<dyn ConversationStore>,
    backend: &Arc<dyn CompletionBackend>,
    config: &ChatConfig,
) -> Result<Option<ChatSession>> {
    let id: ConversationId = match arg.parse() {
        Ok(id) => id,
        Err(e) => {
            println!("{e}");
            return Ok(None);
        }
    };

    match ChatSession::resume(store.clone(), backend.clone(), config, &id) {
        Ok(session) => Ok(Some(session)),
        Err(e @ (ChatError::StorageNotFound(_) | ChatError::StorageCorrupt { .. })) => {
            // Propagation policy: unreadable records fall back to a fresh
            // conversation instead of leaving the user with nothing.
            println!("{e}; starting a new conversation");
            ChatSession::start_new(store.clone(), backend.clone(), config)
                .map(Some)
                .map_err(Into::into)
        }
        Err(e) => Err(e.into()),
    }
}

/// Run one turn on a blocking worker and print the reply, or the error text
/// in its place. The session's own contract stays synchronous.
async fn submit_on_worker(session: ChatSession, text: String) -> Result<ChatSession> {
    let (session, result) = tokio::task::spawn_blocking(move || {
        let mut session = session;
        let result = session.submit_turn(&text);
        (session, result)
    })
    .await
    .context("completion worker panicked")?;

    match result {
        Ok(Some(reply)) => println!("Conrad: {reply}\n"),
        Ok(None) => {}
        // Shown in place of an assistant reply; the user message stays in
        // memory and is persisted with the next successful turn.
        Err(e) => println!("Conrad: {e}\n"),
    }

    Ok(session)
}

/// Print the visible history the way the sidebar view renders it: the
/// system preamble is skipped.
fn render_history(session: &ChatSession) {
    for message in session.visible_messages() {
        match message.role {
            Role::User => println!("You: {}", message.content),
            Role::Assistant => println!("Conrad: {}", message.content),
            Role::System => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_argument_with_identifier() {
        assert_eq!(open_argument("/open a1b2c3d4"), Some("a1b2c3d4"));
    }

    #[test]
    fn test_open_argument_without_identifier() {
        assert_eq!(open_argument("/open"), Some(""));
        assert_eq!(open_argument("/open   "), Some(""));
    }

    #[test]
    fn test_open_prefix_without_word_break_is_chat_text() {
        assert_eq!(open_argument("/openabc"), None);
        assert_eq!(open_argument("/opened the door"), None);
    }

    #[test]
    fn test_plain_text_is_not_an_open_command() {
        assert_eq!(open_argument("hello"), None);
        assert_eq!(open_argument("tell me about /open"), None);
    }
}
