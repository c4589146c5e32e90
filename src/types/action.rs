use serde::{Deserialize, Serialize};

/// Progress of one user-initiated save action
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionState {
    pub fetching: bool,
    pub succeeded: bool,
}

impl ActionState {
    /// State at the start of a request
    pub fn started() -> Self {
        Self {
            fetching: true,
            succeeded: false,
        }
    }

    /// State once the request settled
    pub fn settled(succeeded: bool) -> Self {
        Self {
            fetching: false,
            succeeded,
        }
    }
}
