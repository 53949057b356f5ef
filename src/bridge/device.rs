/*
 * The `device` channel: a one-shot status query. Any message on the channel
 * answers with a snapshot of the host device delivered to the fixed
 * `device.receive` callback. The snapshot itself comes from a
 * `DeviceStatusProvider` the host injects, so the bridge stays free of
 * platform probing.
 */
use crate::bridge::response::{CallbackPayload, emit};
use crate::bridge::types::{ChannelHandler, HostCommand};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub const DEVICE_CHANNEL: &str = "device";
const RECEIVE_CALLBACK: &str = "receive";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub system_name: String,
    pub system_version: String,
    pub battery_level: f32,
    pub battery_state: String,
    pub interface_style: String,
}

pub trait DeviceStatusProvider: Send + Sync {
    fn snapshot(&self) -> DeviceSnapshot;
}

/*
 * Provider for hosts without battery or appearance reporting: identifies
 * the OS and leaves the dynamic fields as "unknown".
 */
pub struct StaticDeviceStatusProvider {}

impl DeviceStatusProvider for StaticDeviceStatusProvider {
    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            system_name: std::env::consts::OS.to_string(),
            system_version: String::new(),
            battery_level: -1.0,
            battery_state: "unknown".to_string(),
            interface_style: "unspecified".to_string(),
        }
    }
}

pub struct DeviceChannel {
    provider: Arc<dyn DeviceStatusProvider>,
}

impl DeviceChannel {
    pub fn new(provider: Arc<dyn DeviceStatusProvider>) -> Self {
        DeviceChannel { provider }
    }
}

impl ChannelHandler for DeviceChannel {
    fn handle_message(&mut self, _body: &JsonValue) -> Vec<HostCommand> {
        let snapshot = self.provider.snapshot();
        match serde_json::to_string(&snapshot) {
            Ok(json) => vec![emit(
                DEVICE_CHANNEL,
                RECEIVE_CALLBACK,
                CallbackPayload::Json(json),
            )],
            Err(e) => {
                log::error!("DeviceChannel: Could not encode device snapshot: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::types::HostCommand;

    struct FixedProvider;

    impl DeviceStatusProvider for FixedProvider {
        fn snapshot(&self) -> DeviceSnapshot {
            DeviceSnapshot {
                system_name: "testOS".to_string(),
                system_version: "1.2".to_string(),
                battery_level: 0.5,
                battery_state: "charging".to_string(),
                interface_style: "dark".to_string(),
            }
        }
    }

    #[test]
    fn test_device_query_answers_on_receive_callback() {
        let mut channel = DeviceChannel::new(Arc::new(FixedProvider));
        let commands = channel.handle_message(&JsonValue::Null);
        assert_eq!(commands.len(), 1);
        let HostCommand::EvaluateScript { source } = &commands[0] else {
            panic!("Expected an EvaluateScript command");
        };
        assert!(source.starts_with("device.receive(JSON.parse('"));
        assert!(source.contains("\"systemName\":\"testOS\""));
        assert!(source.contains("\"batteryState\":\"charging\""));
    }
}
