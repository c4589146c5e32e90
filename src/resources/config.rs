use super::{merge_object, record};
use crate::http_client::{Payload, ResponseFormat};
use crate::resource::{Resource, ResourceKind};
use crate::state::Record;
use anyhow::Result;
use serde_json::json;

/// Device configuration, `/config`
pub struct Config;

impl Config {
    pub const ENDPOINT: &'static str = "/config";

    pub fn resource() -> Resource<Self> {
        Resource::new(Config, defaults())
    }
}

impl ResourceKind for Config {
    type State = Record;

    const NAME: &'static str = "config";
    const FORMAT: ResponseFormat = ResponseFormat::Json;

    fn endpoint(&self, _state: &Record) -> String {
        Self::ENDPOINT.to_string()
    }

    fn apply(&self, payload: Payload, state: &mut Record) -> Result<bool> {
        merge_object(payload, state)
    }
}

/// Field values shown before the device has answered.
///
/// Secrets (`pass`, `emoncms_apikey`, `mqtt_pass`, `www_password`) are never
/// returned by the device and only ever hold what the user typed.
pub fn defaults() -> Record {
    record(json!({
        "ssid": "",
        "pass": "",
        "emoncms_server": "emoncms.org",
        "emoncms_path": "",
        "emoncms_apikey": "",
        "emoncms_node": "",
        "emoncms_fingerprint": "",
        "mqtt_server": "",
        "mqtt_topic": "",
        "mqtt_feed_prefix": "",
        "mqtt_user": "",
        "mqtt_pass": "",
        "www_username": "",
        "www_password": "",
        "postInterval": "",
        "vcalA": "",
        "icalA": "",
        "vcalB": "",
        "icalB": "",
        "chanA_VrefSet": "",
        "chanB_VrefSet": "",
        "channelA_gain": "",
        "channelB_gain": "",
        "R1_A": "",
        "R2_A": "",
        "R1_B": "",
        "R2_B": "",
        "Rshunt_A": "",
        "Rshunt_B": "",
        "AmpOffset_A": "",
        "AmpOffset_B": "",
        "VoltOffset_A": "",
        "VoltOffset_B": "",
        "BattType": "",
        "BattCapacity": "",
        "BattCapHr": "",
        "BattNom": "",
        "BattVoltsAlarmHigh": "",
        "BattVoltsAlarmLow": "",
        "BattPeukert": "",
        "BattTempCo": "",
        "espflash": "",
        "version": "0.0.0",
    }))
}
