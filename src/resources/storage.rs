use crate::http_client::{Payload, ResponseFormat};
use crate::resource::{Resource, ResourceKind};
use crate::types::FileEntry;
use anyhow::{Context, Result};

/// SD card directory listing, `/sd<dir>`
pub struct Storage;

/// Current directory and its two derived orderings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub dir: String,
    /// Every entry, ascending by name
    pub files: Vec<FileEntry>,
    /// Plain files only (no hidden entries, no directories), descending by name
    pub visible: Vec<FileEntry>,
}

impl Default for Listing {
    fn default() -> Self {
        Listing {
            dir: "/".to_string(),
            files: Vec::new(),
            visible: Vec::new(),
        }
    }
}

impl Storage {
    pub const ENDPOINT_PREFIX: &'static str = "/sd";

    pub fn resource() -> Resource<Self> {
        Resource::new(Storage, Listing::default())
    }
}

impl ResourceKind for Storage {
    type State = Listing;

    const NAME: &'static str = "storage";
    const FORMAT: ResponseFormat = ResponseFormat::Json;

    fn endpoint(&self, state: &Listing) -> String {
        format!("{}{}", Self::ENDPOINT_PREFIX, state.dir)
    }

    fn apply(&self, payload: Payload, state: &mut Listing) -> Result<bool> {
        let entries: Vec<FileEntry> =
            serde_json::from_value(payload.into_json()?).context("failed to parse listing")?;
        let (files, visible) = order_listing(entries);

        if state.files == files && state.visible == visible {
            return Ok(false);
        }
        state.files = files;
        state.visible = visible;
        Ok(true)
    }
}

impl Resource<Storage> {
    pub fn dir(&self) -> String {
        self.state().read(|listing| listing.dir.clone())
    }

    /// Point the listing at `dir`; returns whether it moved
    pub fn set_dir(&self, dir: &str) -> bool {
        let dir = normalize_dir(dir);
        self.state().update(|listing| {
            if listing.dir == dir {
                false
            } else {
                listing.dir = dir;
                true
            }
        })
    }
}

/// Full listing ascending by name, plus visible files descending by name
pub fn order_listing(mut entries: Vec<FileEntry>) -> (Vec<FileEntry>, Vec<FileEntry>) {
    entries.sort_by(|left, right| left.name.cmp(&right.name));

    let mut visible: Vec<FileEntry> = entries
        .iter()
        .filter(|entry| entry.is_visible_file())
        .cloned()
        .collect();
    visible.sort_by(|left, right| right.name.cmp(&left.name));

    (entries, visible)
}

fn normalize_dir(dir: &str) -> String {
    format!("/{}", dir.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedClient;
    use serde_json::json;

    fn entry(name: &str, hidden: bool, directory: bool) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            hidden,
            directory,
            ..Default::default()
        }
    }

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn orders_and_filters_listing() {
        let (files, visible) = order_listing(vec![
            entry("b", false, false),
            entry("a", true, false),
            entry("c", false, true),
        ]);

        assert_eq!(names(&files), vec!["a", "b", "c"]);
        assert_eq!(names(&visible), vec!["b"]);
    }

    #[test]
    fn visible_files_sort_descending() {
        let (_, visible) = order_listing(vec![
            entry("2020-07-01.csv", false, false),
            entry("2020-09-01.csv", false, false),
            entry("2020-08-01.csv", false, false),
        ]);

        assert_eq!(
            names(&visible),
            vec!["2020-09-01.csv", "2020-08-01.csv", "2020-07-01.csv"]
        );
    }

    #[test]
    fn endpoint_follows_directory() {
        let storage = Storage::resource();
        assert_eq!(storage.state().read(|l| Storage.endpoint(l)), "/sd/");

        assert!(storage.set_dir("logs"));
        assert_eq!(storage.dir(), "/logs");
        assert!(!storage.set_dir("/logs"));
    }

    #[tokio::test]
    async fn update_reads_firmware_listing_format() {
        let client = ScriptedClient::new();
        client.respond_json(
            "/sd/",
            json!([
                {"name": "datalog.csv", "url": "/sd/datalog.csv", "directory": false,
                 "hidden": false, "size": 2048, "create": "2020-09-01 08:00:00",
                 "modified": "2020-09-02 08:00:00"},
                {"name": ".Trash", "url": "/sd/.Trash", "directory": true, "hidden": true},
            ]),
        );
        let storage = Storage::resource();

        assert!(storage.update(&client).await);

        let listing = storage.state().get();
        assert_eq!(names(&listing.files), vec![".Trash", "datalog.csv"]);
        assert_eq!(names(&listing.visible), vec!["datalog.csv"]);
        assert_eq!(listing.visible[0].size, Some(2048));
    }

    #[tokio::test]
    async fn object_payload_is_rejected() {
        let client = ScriptedClient::new();
        client.respond_json("/sd/", json!({"type": 3, "size": 1024}));
        let storage = Storage::resource();

        assert!(!storage.update(&client).await);
        assert!(storage.state().get().files.is_empty());
    }
}
