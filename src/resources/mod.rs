//! The five device resources and their payload transforms

pub mod config;
pub mod last_values;
pub mod logs;
pub mod status;
pub mod storage;

use crate::http_client::Payload;
use crate::resource::Resource;
use crate::state::{Record, merge_record};
use anyhow::{Result, bail};
use serde_json::Value;

pub use config::Config;
pub use last_values::LastValues;
pub use logs::{LogBook, Logs};
pub use status::Status;
pub use storage::{Listing, Storage};

pub type ConfigResource = Resource<Config>;
pub type StatusResource = Resource<Status>;
pub type LastValuesResource = Resource<LastValues>;
pub type LogsResource = Resource<Logs>;
pub type StorageResource = Resource<Storage>;

/// Merge a JSON object payload into a record
fn merge_object(payload: Payload, state: &mut Record) -> Result<bool> {
    match payload.into_json()? {
        Value::Object(snapshot) => Ok(merge_record(state, snapshot)),
        other => bail!("expected a JSON object, got {other}"),
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(fields) => fields,
        _ => Record::new(),
    }
}
