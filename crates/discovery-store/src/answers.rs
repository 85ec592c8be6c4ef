use std::fs;
use std::path::Path;

use discovery_core::{
    FormState, Snapshot, Timestamp, decode_answers, encode_answers, export_json, import_json,
};

use crate::error::{Result, StoreError};
use crate::store::Storage;

pub const ANSWERS_KEY: &str = "aro_discovery_answers";
pub const TIMESTAMP_KEY: &str = "aro_discovery_timestamp";

/// Sole reader and writer of the persisted answer snapshot.
///
/// Every save replaces the whole snapshot and its timestamp in one write;
/// nothing is merged.
pub struct AnswerStore<S: Storage> {
    storage: S,
}

impl<S: Storage> AnswerStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persist every non-empty answer currently in the form.
    pub fn save(&self, form: &FormState) -> Result<Timestamp> {
        let saved_at = Timestamp::now();
        self.save_snapshot(&form.snapshot(), saved_at)?;
        Ok(saved_at)
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot, saved_at: Timestamp) -> Result<()> {
        let json = encode_answers(snapshot)
            .map_err(|e| StoreError::InvalidData(format!("failed to encode answers: {e}")))?;
        let stamp = saved_at.to_iso8601();
        self.storage
            .set_items(&[(ANSWERS_KEY, json.as_str()), (TIMESTAMP_KEY, stamp.as_str())])?;
        tracing::debug!("saved {} answers at {stamp}", snapshot.len());
        Ok(())
    }

    /// The last saved snapshot, or `None` when nothing is stored or the
    /// stored payload cannot be decoded.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let Some(json) = self.storage.get_item(ANSWERS_KEY)? else {
            return Ok(None);
        };
        match decode_answers(&json) {
            Ok(snapshot) => {
                tracing::debug!("loaded {} stored answers", snapshot.len());
                Ok(Some(snapshot))
            }
            Err(e) => {
                tracing::warn!("ignoring unreadable saved answers: {e}");
                Ok(None)
            }
        }
    }

    pub fn last_saved_at(&self) -> Result<Option<Timestamp>> {
        let Some(raw) = self.storage.get_item(TIMESTAMP_KEY)? else {
            return Ok(None);
        };
        match raw.parse::<Timestamp>() {
            Ok(ts) => Ok(Some(ts)),
            Err(e) => {
                tracing::warn!("ignoring saved timestamp: {e}");
                Ok(None)
            }
        }
    }

    // --- Portable export ---

    pub fn export_json_string(&self) -> Result<String> {
        let snapshot = self.load()?.unwrap_or_default();
        let saved_at = self.last_saved_at()?;
        export_json(&snapshot, saved_at)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }

    pub fn export_json_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json_string()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Replace the stored answers with an export document. Unlike
    /// [`AnswerStore::load`], a malformed document is an error.
    pub fn import_json_str(&self, json: &str) -> Result<Snapshot> {
        let (snapshot, _exported_at) = import_json(json)?;
        self.save_snapshot(&snapshot, Timestamp::now())?;
        Ok(snapshot)
    }

    pub fn import_json_file(&self, path: &Path) -> Result<Snapshot> {
        let json = fs::read_to_string(path)?;
        self.import_json_str(&json)
    }
}
