// src/main.rs

mod bridge;
mod core;

use crate::bridge::browser::{BROWSER_CHANNEL, BrowserChannel};
use crate::bridge::console::{CONSOLE_CHANNEL, ConsoleChannel};
use crate::bridge::device::{DEVICE_CHANNEL, DeviceChannel, StaticDeviceStatusProvider};
use crate::bridge::{
    FILES_CHANNEL, FilesChannel, HostCommand, HostEvent, MessageRouter, ScriptMessage, WindowId,
};
use crate::core::SandboxLayout;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

const HOST_APP_NAME: &str = "ScriptHost";

/*
 * Initializes the terminal logger exactly once. Tests call this too, so the
 * guard must tolerate repeated invocation.
 */
pub fn initialize_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let config = simplelog::ConfigBuilder::new()
            .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
            .build();
        let _ = simplelog::TermLogger::init(
            log::LevelFilter::Debug,
            config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        );
    });
}

/*
 * Line-oriented host loop, standing in for the embedding application: each
 * input line is one envelope (`{"name": "...", "body": {...}}`), and every
 * generated callback invocation is written to stdout — where a real host
 * would evaluate it inside the scripting environment. A picker request reads
 * one extra line of whitespace-separated paths; an empty line cancels.
 */
fn run_host_loop(router: &mut MessageRouter, window_id: WindowId) -> io::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "quit" {
            break;
        }
        match serde_json::from_str::<ScriptMessage>(trimmed) {
            Ok(message) => {
                let commands = router.route_message(&message);
                execute_commands(router, &stdin, window_id, commands)?;
            }
            Err(e) => log::warn!("Host: Dropping line that is not an envelope: {e}"),
        }
    }
    Ok(())
}

fn execute_commands(
    router: &mut MessageRouter,
    stdin: &io::Stdin,
    window_id: WindowId,
    commands: Vec<HostCommand>,
) -> io::Result<()> {
    for command in commands {
        match command {
            HostCommand::EvaluateScript { source } => println!("{source}"),
            HostCommand::OpenUrl { url, in_app, .. } => {
                log::info!("Host: Would open {url} (in-app: {in_app}).");
            }
            HostCommand::PresentFilePicker {
                title,
                allowed_extensions,
                ..
            } => {
                eprintln!(
                    "[{title}] paths separated by spaces ({}); empty line cancels:",
                    allowed_extensions.join(", ")
                );
                let mut selection_line = String::new();
                stdin.read_line(&mut selection_line)?;
                let paths: Vec<PathBuf> = selection_line
                    .split_whitespace()
                    .map(PathBuf::from)
                    .collect();
                let result = if paths.is_empty() { None } else { Some(paths) };
                let follow_ups = router
                    .dispatch_host_event(&HostEvent::FilePickerCompleted { window_id, result });
                for follow_up in follow_ups {
                    if let HostCommand::EvaluateScript { source } = follow_up {
                        println!("{source}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    initialize_logging();

    let Some(layout) = SandboxLayout::from_host_defaults(HOST_APP_NAME) else {
        log::error!("Host: Could not derive the sandbox layout; exiting.");
        std::process::exit(1);
    };

    let mut router = MessageRouter::new();
    router.register_handler(FILES_CHANNEL, Box::new(FilesChannel::new(layout.clone())));
    router.register_handler(CONSOLE_CHANNEL, Box::new(ConsoleChannel::new()));
    router.register_handler(
        DEVICE_CHANNEL,
        Box::new(DeviceChannel::new(Arc::new(StaticDeviceStatusProvider {}))),
    );
    router.register_handler(BROWSER_CHANNEL, Box::new(BrowserChannel::new()));

    // The console surface acts as the presenting window of this host.
    let window_id = WindowId::new(1);
    let startup_commands = router.dispatch_host_event(&HostEvent::MainWindowReady { window_id });
    let stdin = io::stdin();
    execute_commands(&mut router, &stdin, window_id, startup_commands)?;

    log::info!("Host: Ready. One envelope per line; 'quit' exits.");
    run_host_loop(&mut router, window_id)
}
