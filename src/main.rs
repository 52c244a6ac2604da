//! Binary entrypoint that launches the Conrad chat client.

use std::process::ExitCode;

use conrad_chat::start_conrad_chat;

/// Start the terminal chat client.
fn main() -> ExitCode {
    start_conrad_chat::run()
}
