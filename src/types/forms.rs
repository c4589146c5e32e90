//! Request forms for the save actions
//!
//! Each form is filled from the Config record, validated locally with
//! `serde_valid` and sent as a form-encoded body.

use crate::http_client::FormBody;
use crate::state::{Record, StateContainer, value_text};
use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_valid::Validate;

pub const API_KEY_LENGTH: usize = 32;
pub const FINGERPRINT_LENGTH: usize = 59;

/// A save action's form
pub trait SaveForm: Validate {
    /// Name used in log lines
    const ACTION: &'static str;
    const ENDPOINT: &'static str;
    /// Shown when the request itself fails
    const FAILURE_NOTICE: &'static str;

    fn from_config(config: &StateContainer<Record>) -> Self;

    fn body(&self) -> Result<FormBody>;

    /// Local validation; the error carries the message meant for the user
    fn check(&self) -> Result<()> {
        validate_form(self)
    }
}

/// Run the derived rules and surface the first message
fn validate_form<T: Validate + ?Sized>(form: &T) -> Result<()> {
    form.validate()
        .map_err(|errors| anyhow!(first_message(&errors)))
}

/// WiFi network to join
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct NetworkForm {
    #[validate(min_length = 1, message = "Please select network")]
    pub ssid: String,
    pub pass: String,
}

impl SaveForm for NetworkForm {
    const ACTION: &'static str = "save network";
    const ENDPOINT: &'static str = "/savenetwork";
    const FAILURE_NOTICE: &'static str = "Failed to save WiFi config";

    fn from_config(config: &StateContainer<Record>) -> Self {
        Self {
            ssid: config.text("ssid"),
            pass: config.text("pass"),
        }
    }

    fn body(&self) -> Result<FormBody> {
        to_form(self)
    }
}

/// Credentials protecting the device web UI
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct AdminForm {
    pub user: String,
    pub pass: String,
}

impl SaveForm for AdminForm {
    const ACTION: &'static str = "save admin";
    const ENDPOINT: &'static str = "/saveadmin";
    const FAILURE_NOTICE: &'static str = "Failed to save Admin config";

    fn from_config(config: &StateContainer<Record>) -> Self {
        Self {
            user: config.text("www_username"),
            pass: config.text("www_password"),
        }
    }

    fn body(&self) -> Result<FormBody> {
        to_form(self)
    }
}

/// Wire name and Config field of every acquisition/calibration parameter
pub const CALIBRATION_FIELDS: &[(&str, &str)] = &[
    ("interval", "postInterval"),
    ("vcalA", "vcalA"),
    ("icalA", "icalA"),
    ("vcalB", "vcalB"),
    ("icalB", "icalB"),
    ("chanA_VrefSet", "chanA_VrefSet"),
    ("chanB_VrefSet", "chanB_VrefSet"),
    ("channelA_gain", "channelA_gain"),
    ("channelB_gain", "channelB_gain"),
    ("R1_A", "R1_A"),
    ("R2_A", "R2_A"),
    ("R1_B", "R1_B"),
    ("R2_B", "R2_B"),
    ("Rshunt_A", "Rshunt_A"),
    ("Rshunt_B", "Rshunt_B"),
    ("AmpOffset_A", "AmpOffset_A"),
    ("AmpOffset_B", "AmpOffset_B"),
    ("VoltOffset_A", "VoltOffset_A"),
    ("VoltOffset_B", "VoltOffset_B"),
    ("BattType", "BattType"),
    ("BattCapacity", "BattCapacity"),
    ("BattCapHr", "BattCapHr"),
    ("BattNom", "BattNom"),
    ("BattVoltsAlarmHigh", "BattVoltsAlarmHigh"),
    ("BattVoltsAlarmLow", "BattVoltsAlarmLow"),
    ("BattPeukert", "BattPeukert"),
    ("BattTempCo", "BattTempCo"),
];

/// Acquisition interval, channel calibration and battery parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct CalibrationForm {
    pub fields: FormBody,
}

impl SaveForm for CalibrationForm {
    const ACTION: &'static str = "save calibration";
    const ENDPOINT: &'static str = "/savedc";
    const FAILURE_NOTICE: &'static str = "Failed to save config";

    fn from_config(config: &StateContainer<Record>) -> Self {
        let fields = config.read(|record| {
            CALIBRATION_FIELDS
                .iter()
                .map(|(wire, key)| {
                    let value = record.get(*key).map(value_text).unwrap_or_default();
                    (wire.to_string(), value)
                })
                .collect()
        });
        Self { fields }
    }

    fn body(&self) -> Result<FormBody> {
        Ok(self.fields.clone())
    }
}

const EMONCMS_SERVER_AND_NODE: &str = "Please enter Emoncms server and node";

/// Emoncms metering service connection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct EmoncmsForm {
    #[validate(min_length = 1, message = "Please enter Emoncms server and node")]
    pub server: String,
    pub path: String,
    #[validate(min_length = 32, message = "Please enter valid Emoncms apikey")]
    #[validate(max_length = 32, message = "Please enter valid Emoncms apikey")]
    pub apikey: String,
    #[validate(min_length = 1, message = "Please enter Emoncms server and node")]
    pub node: String,
    /// SHA-1 fingerprint in colon-separated hex, or empty to skip pinning
    #[validate(pattern = r"^(|.{59})$", message = "Please enter valid SSL SHA-1 fingerprint")]
    pub fingerprint: String,
}

impl SaveForm for EmoncmsForm {
    const ACTION: &'static str = "save emoncms";
    const ENDPOINT: &'static str = "/saveemoncms";
    const FAILURE_NOTICE: &'static str = "Failed to save Emoncms config";

    /// Server and node are reported together, ahead of the key and fingerprint
    fn check(&self) -> Result<()> {
        ensure!(
            !self.server.is_empty() && !self.node.is_empty(),
            EMONCMS_SERVER_AND_NODE
        );
        validate_form(self)
    }

    fn from_config(config: &StateContainer<Record>) -> Self {
        Self {
            server: config.text("emoncms_server"),
            path: config.text("emoncms_path"),
            apikey: config.text("emoncms_apikey"),
            node: config.text("emoncms_node"),
            fingerprint: config.text("emoncms_fingerprint"),
        }
    }

    fn body(&self) -> Result<FormBody> {
        to_form(self)
    }
}

/// MQTT broker connection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct MqttForm {
    #[validate(min_length = 1, message = "Please enter MQTT server")]
    pub server: String,
    pub topic: String,
    pub prefix: String,
    pub user: String,
    pub pass: String,
}

impl SaveForm for MqttForm {
    const ACTION: &'static str = "save mqtt";
    const ENDPOINT: &'static str = "/savemqtt";
    const FAILURE_NOTICE: &'static str = "Failed to save MQTT config";

    fn from_config(config: &StateContainer<Record>) -> Self {
        Self {
            server: config.text("mqtt_server"),
            topic: config.text("mqtt_topic"),
            prefix: config.text("mqtt_feed_prefix"),
            user: config.text("mqtt_user"),
            pass: config.text("mqtt_pass"),
        }
    }

    fn body(&self) -> Result<FormBody> {
        to_form(self)
    }
}

/// Flatten a serializable struct into form pairs, in field order
pub fn to_form<T: Serialize>(value: &T) -> Result<FormBody> {
    match serde_json::to_value(value).context("failed to serialize form")? {
        Value::Object(fields) => Ok(fields
            .iter()
            .map(|(name, value)| (name.clone(), value_text(value)))
            .collect()),
        other => Err(anyhow!("form must serialize to an object, got {other}")),
    }
}

fn first_message(errors: &serde_valid::validation::Errors) -> String {
    fn find(value: &Value) -> Option<String> {
        match value {
            Value::String(message) => Some(message.clone()),
            Value::Array(items) => items.iter().find_map(find),
            Value::Object(fields) => fields.values().find_map(find),
            _ => None,
        }
    }

    serde_json::to_value(errors)
        .ok()
        .and_then(|value| find(&value))
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> StateContainer<Record> {
        match value {
            Value::Object(map) => StateContainer::new(map),
            _ => panic!("config must be an object"),
        }
    }

    fn emoncms(apikey: &str, fingerprint: &str) -> EmoncmsForm {
        EmoncmsForm {
            server: "emoncms.org".to_string(),
            path: "/emoncms".to_string(),
            apikey: apikey.to_string(),
            node: "emondc".to_string(),
            fingerprint: fingerprint.to_string(),
        }
    }

    mod emoncms_validation {
        use super::*;

        #[test]
        fn accepts_32_character_api_key() {
            assert!(emoncms(&"a".repeat(API_KEY_LENGTH), "").check().is_ok());
        }

        #[test]
        fn rejects_31_character_api_key() {
            let result = emoncms(&"a".repeat(31), "").check();
            assert!(result.is_err());
        }

        #[test]
        fn rejects_33_character_api_key() {
            assert!(emoncms(&"a".repeat(33), "").check().is_err());
        }

        #[test]
        fn accepts_59_character_fingerprint() {
            let form = emoncms(&"a".repeat(32), &"f".repeat(FINGERPRINT_LENGTH));
            assert!(form.check().is_ok());
        }

        #[test]
        fn rejects_short_fingerprint() {
            let form = emoncms(&"a".repeat(32), "AB:CD");
            assert!(form.check().is_err());
        }

        #[test]
        fn missing_node_is_reported_before_bad_api_key() {
            let mut form = emoncms("short", "");
            form.node.clear();

            let err = form.check().unwrap_err();
            assert_eq!(err.to_string(), "Please enter Emoncms server and node");
        }

        #[test]
        fn bad_api_key_is_reported_before_bad_fingerprint() {
            let err = emoncms("short", "AB:CD").check().unwrap_err();
            assert_eq!(err.to_string(), "Please enter valid Emoncms apikey");
        }

        #[test]
        fn bad_fingerprint_is_reported_last() {
            let err = emoncms(&"a".repeat(API_KEY_LENGTH), "AB:CD").check().unwrap_err();
            assert_eq!(err.to_string(), "Please enter valid SSL SHA-1 fingerprint");
        }

        #[test]
        fn rejects_empty_node() {
            let mut form = emoncms(&"a".repeat(32), "");
            form.node.clear();
            assert!(form.check().is_err());
        }
    }

    #[test]
    fn network_requires_ssid() {
        let form = NetworkForm {
            ssid: String::new(),
            pass: "secret".to_string(),
        };
        assert!(form.check().is_err());
    }

    #[test]
    fn mqtt_requires_server() {
        assert!(MqttForm::default().check().is_err());
    }

    #[test]
    fn admin_has_no_local_rules() {
        assert!(AdminForm::default().check().is_ok());
    }

    #[test]
    fn forms_read_their_config_fields() {
        let config = config(json!({
            "mqtt_server": "broker.local",
            "mqtt_topic": "emondc",
            "mqtt_feed_prefix": "dc_",
            "mqtt_user": "me",
            "mqtt_pass": "pw",
            "www_username": "admin",
        }));

        let mqtt = MqttForm::from_config(&config);
        assert_eq!(mqtt.prefix, "dc_");
        assert_eq!(
            mqtt.body().unwrap(),
            vec![
                ("server".to_string(), "broker.local".to_string()),
                ("topic".to_string(), "emondc".to_string()),
                ("prefix".to_string(), "dc_".to_string()),
                ("user".to_string(), "me".to_string()),
                ("pass".to_string(), "pw".to_string()),
            ]
        );

        let admin = AdminForm::from_config(&config);
        assert_eq!(admin.user, "admin");
        assert_eq!(admin.pass, "");
    }

    #[test]
    fn calibration_maps_post_interval_to_interval() {
        let config = config(json!({"postInterval": "10", "vcalA": "1.000"}));
        let body = CalibrationForm::from_config(&config).body().unwrap();

        assert_eq!(body.len(), CALIBRATION_FIELDS.len());
        assert_eq!(body[0], ("interval".to_string(), "10".to_string()));
        assert_eq!(body[1], ("vcalA".to_string(), "1.000".to_string()));
        assert_eq!(body[2], ("icalA".to_string(), String::new()));
    }
}
