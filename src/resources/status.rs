use super::{merge_object, record};
use crate::http_client::{Payload, ResponseFormat};
use crate::resource::{Resource, ResourceKind};
use crate::state::Record;
use anyhow::Result;
use serde_json::{Value, json};

/// Network and runtime status, `/status`
pub struct Status;

impl Status {
    pub const ENDPOINT: &'static str = "/status";

    pub fn resource() -> Resource<Self> {
        Resource::new(Status, defaults())
    }
}

impl ResourceKind for Status {
    type State = Record;

    const NAME: &'static str = "status";
    const FORMAT: ResponseFormat = ResponseFormat::Json;

    fn endpoint(&self, _state: &Record) -> String {
        Self::ENDPOINT.to_string()
    }

    fn apply(&self, payload: Payload, state: &mut Record) -> Result<bool> {
        merge_object(payload, state)
    }
}

pub fn defaults() -> Record {
    record(json!({
        "mode": "ERR",
        "networks": [],
        "rssi": [],
        "srssi": "",
        "ipaddress": "",
        "packets_sent": "",
        "packets_success": "",
        "emoncms_connected": "",
        "mqtt_connected": "",
        "free_heap": "",
        "rtc_set": false,
    }))
}

impl Resource<Status> {
    pub fn mode(&self) -> String {
        self.state().text("mode")
    }

    pub fn is_wifi_client(&self) -> bool {
        is_wifi_client(&self.mode())
    }

    pub fn is_wifi_access_point(&self) -> bool {
        is_wifi_access_point(&self.mode())
    }

    pub fn full_mode(&self) -> String {
        full_mode(&self.mode())
    }

    /// True only when the device explicitly reports its clock as unset
    pub fn clock_unset(&self) -> bool {
        self.state().field("rtc_set") == Some(Value::Bool(false))
    }

    pub fn ip_address(&self) -> Option<String> {
        Some(self.state().text("ipaddress")).filter(|ip| !ip.is_empty())
    }
}

pub fn is_wifi_client(mode: &str) -> bool {
    matches!(mode, "STA" | "STA+AP")
}

pub fn is_wifi_access_point(mode: &str) -> bool {
    matches!(mode, "AP" | "STA+AP")
}

/// Human-readable label for a WiFi mode
pub fn full_mode(mode: &str) -> String {
    match mode {
        "AP" => "Access Point (AP)".to_string(),
        "STA" => "Client (STA)".to_string(),
        "STA+AP" => "Client + Access Point (STA+AP)".to_string(),
        other => format!("Unknown ({other})"),
    }
}
