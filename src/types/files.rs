use serde::{Deserialize, Serialize};

/// One entry of an SD card directory listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub directory: bool,
    /// Device path of the entry, e.g. `/sd/datalog.csv`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl FileEntry {
    pub fn is_visible_file(&self) -> bool {
        !self.hidden && !self.directory
    }
}
