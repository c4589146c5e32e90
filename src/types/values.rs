use serde::{Deserialize, Serialize};

/// One named reading from the last-values feed, unit suffix included
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Measurement {
    pub key: String,
    pub value: String,
}

impl Measurement {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
