use crate::clock::now_iso8601;
use crate::http_client::{Payload, ResponseFormat};
use crate::resource::{Resource, ResourceKind};
use crate::types::LogEntry;
use anyhow::Result;

pub const DEFAULT_LOG_CAPACITY: usize = 500;

/// Device output history, built from successive `/lastvalues` texts
pub struct Logs {
    capacity: usize,
}

/// Captured output plus the raw text last seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBook {
    pub entries: Vec<LogEntry>,
    pub last_seen: String,
}

impl Logs {
    pub const ENDPOINT: &'static str = "/lastvalues";

    /// `capacity` bounds the number of kept entries; the oldest go first
    pub fn new(capacity: usize) -> Self {
        Logs {
            capacity: capacity.max(1),
        }
    }

    pub fn resource(capacity: usize) -> Resource<Self> {
        Resource::new(Logs::new(capacity), LogBook::default())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Logs {
    fn default() -> Self {
        Logs::new(DEFAULT_LOG_CAPACITY)
    }
}

impl ResourceKind for Logs {
    type State = LogBook;

    const NAME: &'static str = "logs";
    const FORMAT: ResponseFormat = ResponseFormat::Text;

    fn endpoint(&self, _state: &LogBook) -> String {
        Self::ENDPOINT.to_string()
    }

    fn apply(&self, payload: Payload, state: &mut LogBook) -> Result<bool> {
        let text = payload.into_text()?;
        if text == state.last_seen {
            return Ok(false);
        }

        let timestamp = now_iso8601()?;
        state.entries.push(LogEntry {
            timestamp,
            log: text.clone(),
        });
        if state.entries.len() > self.capacity {
            let excess = state.entries.len() - self.capacity;
            state.entries.drain(..excess);
        }
        state.last_seen = text;

        Ok(true)
    }
}
