/*
 * The `browser` channel: asks the host to open a URL, either in an in-app
 * browser sheet or in the system browser. Pure pass-through; a missing or
 * non-string url is logged and dropped.
 */
use crate::bridge::types::{ChannelHandler, HostCommand};
use serde::Deserialize;
use serde_json::Value as JsonValue;

pub const BROWSER_CHANNEL: &str = "browser";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenUrlRequest {
    url: String,
    #[serde(default)]
    in_app: bool,
    #[serde(default = "default_animated")]
    animated: bool,
}

fn default_animated() -> bool {
    true
}

pub struct BrowserChannel {}

impl BrowserChannel {
    pub fn new() -> Self {
        BrowserChannel {}
    }
}

impl Default for BrowserChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHandler for BrowserChannel {
    fn handle_message(&mut self, body: &JsonValue) -> Vec<HostCommand> {
        match serde_json::from_value::<OpenUrlRequest>(body.clone()) {
            Ok(request) => vec![HostCommand::OpenUrl {
                url: request.url,
                in_app: request.in_app,
                animated: request.animated,
            }],
            Err(e) => {
                log::warn!("BrowserChannel: Dropping request without a usable url: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_url_defaults() {
        let mut channel = BrowserChannel::new();
        let commands =
            channel.handle_message(&serde_json::json!({ "url": "https://example.com" }));
        assert_eq!(
            commands,
            vec![HostCommand::OpenUrl {
                url: "https://example.com".to_string(),
                in_app: false,
                animated: true,
            }]
        );
    }

    #[test]
    fn test_missing_url_is_dropped() {
        let mut channel = BrowserChannel::new();
        assert!(
            channel
                .handle_message(&serde_json::json!({ "inApp": true }))
                .is_empty()
        );
    }
}
