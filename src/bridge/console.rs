/*
 * The `console` channel: scripts forward their console output here (via the
 * console-override shim on the script side) and it lands in the host log.
 * Fire-and-forget; no response is generated.
 */
use crate::bridge::types::{ChannelHandler, HostCommand};
use serde_json::Value as JsonValue;

pub const CONSOLE_CHANNEL: &str = "console";

pub struct ConsoleChannel {}

impl ConsoleChannel {
    pub fn new() -> Self {
        ConsoleChannel {}
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHandler for ConsoleChannel {
    fn handle_message(&mut self, body: &JsonValue) -> Vec<HostCommand> {
        match body.as_str() {
            Some(text) => log::info!("ScriptConsole: {text}"),
            None => log::warn!("ConsoleChannel: Non-string body dropped: {body}"),
        }
        Vec::new()
    }
}
