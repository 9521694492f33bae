use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::info;

use crate::db::DocumentStore;

use super::hub::{Hub, HubHandle, HubSettings};

/// Longest accepted room identifier.
pub const MAX_ROOM_ID_LEN: usize = 128;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid room id '{0}'")]
pub struct InvalidRoomId(pub String);

/// Room ids double as file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_room_id(room_id: &str) -> Result<(), InvalidRoomId> {
    let ok = !room_id.is_empty()
        && room_id.len() <= MAX_ROOM_ID_LEN
        && room_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(InvalidRoomId(room_id.to_string()))
    }
}

/// Maps each room to its own hub and document store.
#[derive(Debug)]
pub struct HubRegistry {
    data_dir: PathBuf,
    settings: HubSettings,
    hubs: Mutex<HashMap<String, HubHandle>>,
}

impl HubRegistry {
    pub fn new(data_dir: impl Into<PathBuf>, settings: HubSettings) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings,
            hubs: Mutex::new(HashMap::new()),
        }
    }

    /// The store backing `room_id`, whether or not its hub is running.
    pub fn store_for(&self, room_id: &str) -> Result<DocumentStore, InvalidRoomId> {
        validate_room_id(room_id)?;
        Ok(DocumentStore::new(self.data_dir.join(format!("{room_id}.txt"))))
    }

    /// The running hub for `room_id`, starting it on first use.
    pub fn get_or_open(&self, room_id: &str) -> Result<HubHandle, InvalidRoomId> {
        let store = self.store_for(room_id)?;
        let mut hubs = self.hubs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(hub) = hubs.get(room_id) {
            return Ok(hub.clone());
        }

        info!(room = %room_id, path = %store.path().display(), "Opening room");
        let hub = Hub::spawn(room_id, store, &self.settings);
        hubs.insert(room_id.to_string(), hub.clone());
        Ok(hub)
    }

    /// Handles of every open room
    pub fn rooms(&self) -> Vec<HubHandle> {
        let hubs = self.hubs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        hubs.values().cloned().collect()
    }
}
