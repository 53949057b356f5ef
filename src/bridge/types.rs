/*
 * This module defines the data types that cross the script/host boundary.
 * Inbound, a `ScriptMessage` envelope names a channel and carries a JSON
 * body. Outbound, channel handlers emit `HostCommand`s for the host to
 * execute on its UI/script context — most importantly evaluating generated
 * callback source inside the scripting environment. `HostEvent` carries
 * host-side notifications (window lifecycle, picker completion) back into
 * the handlers. The `ChannelHandler` trait is what the router dispatches to.
 */

use serde::Deserialize;
use std::path::PathBuf;

// An opaque identifier for a native window, managed by the host.
//
// Handlers use this to address the presenting surface for interactive
// requests (the import file picker) without knowing native handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub(crate) usize);

impl WindowId {
    pub fn new(raw: usize) -> Self {
        WindowId(raw)
    }
}

/*
 * The message unit arriving from the scripting side: a channel name plus a
 * dynamically-typed JSON body. Fields of the body are optional per command
 * and are validated by the receiving channel handler, never here.
 */
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptMessage {
    pub name: String,
    #[serde(default)]
    pub body: serde_json::Value,
}

// Commands sent from channel handlers to the host for execution.
//
// `EvaluateScript` is the response path of the bridge: the host must run the
// generated statement inside the scripting environment, on the script's own
// execution context.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    EvaluateScript {
        source: String,
    },
    PresentFilePicker {
        window_id: WindowId,
        title: String,
        allowed_extensions: Vec<String>,
    },
    OpenUrl {
        url: String,
        in_app: bool,
        animated: bool,
    },
}

// Host-side notifications delivered into the bridge. The picker completion
// carries `None` when the user cancelled.
#[derive(Debug, Clone)]
pub enum HostEvent {
    MainWindowReady {
        window_id: WindowId,
    },
    WindowDestroyed {
        window_id: WindowId,
    },
    FilePickerCompleted {
        window_id: WindowId,
        result: Option<Vec<PathBuf>>,
    },
}

// --- Trait for channel handlers ---

// A handler owns one named channel. The router calls `handle_message` for
// every envelope addressed to that channel; host events are broadcast to all
// handlers, and the default implementation ignores them.
pub trait ChannelHandler: Send {
    // Processes one envelope body and returns the commands the host should
    // execute, in order. A handler must not panic on malformed bodies; it
    // reports failures through its own channel callbacks or logs and drops.
    fn handle_message(&mut self, body: &serde_json::Value) -> Vec<HostCommand>;

    fn handle_host_event(&mut self, event: &HostEvent) -> Vec<HostCommand> {
        let _ = event;
        Vec::new()
    }
}
