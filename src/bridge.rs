/*
 * This module is the script/host boundary: the envelope and command types,
 * the channel router, the response emitter, and the per-channel handlers.
 * The `files` channel is the substantial one (sandboxed file-system RPC);
 * console/device/browser are stateless pass-throughs. Unit tests for the
 * files dispatcher are in `files_tests.rs`.
 */
pub mod browser;
pub mod console;
pub mod device;
pub mod files;
pub mod response;
pub mod router;
pub mod types;


pub use files::{FILES_CHANNEL, FilesChannel};
pub use router::MessageRouter;
pub use types::{ChannelHandler, HostCommand, HostEvent, ScriptMessage, WindowId};
