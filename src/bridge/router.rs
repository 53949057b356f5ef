/*
 * This module routes incoming script envelopes to the handler registered for
 * their channel name. The registry is a plain lookup with no queuing and no
 * retries; an envelope for an unknown channel is logged and dropped rather
 * than surfaced as an error, so older and newer script payloads can coexist
 * with the host. Host events are broadcast to every registered handler.
 */
use crate::bridge::types::{ChannelHandler, HostCommand, HostEvent, ScriptMessage};
use std::collections::HashMap;

pub struct MessageRouter {
    handlers: HashMap<String, Box<dyn ChannelHandler>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        MessageRouter {
            handlers: HashMap::new(),
        }
    }

    /*
     * Registers a handler under a channel name. Registering the same name
     * twice replaces the previous handler.
     */
    pub fn register_handler(&mut self, name: &str, handler: Box<dyn ChannelHandler>) {
        if self.handlers.insert(name.to_string(), handler).is_some() {
            log::warn!("MessageRouter: Handler for channel '{name}' replaced.");
        } else {
            log::debug!("MessageRouter: Registered handler for channel '{name}'.");
        }
    }

    /*
     * Dispatches one envelope to its channel handler and returns the host
     * commands it produced. Unknown channels are dropped with a log entry.
     */
    pub fn route_message(&mut self, message: &ScriptMessage) -> Vec<HostCommand> {
        match self.handlers.get_mut(&message.name) {
            Some(handler) => handler.handle_message(&message.body),
            None => {
                log::warn!("MessageRouter: No handler found for channel '{}'.", message.name);
                Vec::new()
            }
        }
    }

    /*
     * Broadcasts a host event to all handlers, collecting any commands they
     * produce. Handlers that do not care about the event return nothing.
     */
    pub fn dispatch_host_event(&mut self, event: &HostEvent) -> Vec<HostCommand> {
        let mut commands = Vec::new();
        for handler in self.handlers.values_mut() {
            commands.extend(handler.handle_host_event(event));
        }
        commands
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}
