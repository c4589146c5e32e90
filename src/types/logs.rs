use serde::{Deserialize, Serialize};

/// Raw device output captured at one point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    /// ISO-8601 capture time
    pub timestamp: String,
    pub log: String,
}
