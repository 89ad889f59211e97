//! Durable whole-state snapshot.
//!
//! The store's persistent record is a single JSON file holding the current
//! language and every cached translation. Writes are whole-state: the file is
//! serialized from scratch on every mutation, written to a sibling temp file,
//! then renamed over the old snapshot so readers never see a half-written
//! record.
//!
//! The record carries a `schemaVersion` field. Loading is gated on the
//! supported version: a mismatched or missing version discards the snapshot
//! with a warning instead of misreading it. Snapshots written before the
//! field existed deserialize as version 0 and are discarded the same way.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Snapshot schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "language-store.json";

/// The on-disk record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Schema version of this record
    pub schema_version: u32,

    /// Current language code (e.g., "hi")
    pub current_language: String,

    /// When this snapshot was written
    pub updated_at: DateTime<Utc>,

    /// Cached translations: key → language code → translated text
    pub translations: BTreeMap<String, BTreeMap<String, String>>,
}

impl PersistedState {
    /// Build a current-version record stamped with the current time.
    pub fn new(
        current_language: &str,
        translations: BTreeMap<String, BTreeMap<String, String>>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            current_language: current_language.to_string(),
            updated_at: Utc::now(),
            translations,
        }
    }
}

/// Probe used to read the version field before trusting the rest.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    #[serde(default)]
    schema_version: u32,
}

/// Handle to the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Create a handle for an explicit file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create a handle for the default file name inside a data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SNAPSHOT_FILE),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// # Returns
    /// * `Ok(Some(state))` for a readable, current-version snapshot
    /// * `Ok(None)` when the file is missing, unparseable, or carries an
    ///   unsupported version (the latter two log a warning)
    /// * `Err` only for I/O failures other than the file not existing
    pub async fn load(&self) -> Result<Option<PersistedState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot file, starting fresh");
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read snapshot file {}", self.path.display())
                });
            }
        };

        let probe: VersionProbe = match serde_json::from_str(&raw) {
            Ok(probe) => probe,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Snapshot file is not valid JSON, discarding"
                );
                return Ok(None);
            }
        };

        if probe.schema_version != SCHEMA_VERSION {
            warn!(
                path = %self.path.display(),
                found = probe.schema_version,
                supported = SCHEMA_VERSION,
                "Snapshot schema version is unsupported, discarding"
            );
            return Ok(None);
        }

        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Snapshot record is malformed, discarding"
                );
                Ok(None)
            }
        }
    }

    /// Write the whole record, replacing any previous snapshot.
    ///
    /// The record lands in a sibling temp file first and is renamed into
    /// place, so a crash mid-write leaves the previous snapshot intact.
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create snapshot directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(state).context("Failed to serialize snapshot")?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serialized.as_bytes())
            .await
            .with_context(|| format!("Failed to write snapshot temp file {}", tmp_path.display()))?;

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| {
                format!("Failed to move snapshot into place at {}", self.path.display())
            })?;

        debug!(
            path = %self.path.display(),
            keys = state.translations.len(),
            "Snapshot written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> PersistedState {
        let mut slots = BTreeMap::new();
        slots.insert("hi".to_string(), "अपना खाता बनाएं".to_string());
        let mut translations = BTreeMap::new();
        translations.insert("signup.title".to_string(), slots);
        PersistedState::new("hi", translations)
    }

    // ==================== Save / Load ====================

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        let state = sample_state();
        snapshot.save(&state).await.unwrap();

        let loaded = snapshot.load().await.unwrap().expect("snapshot should load");
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.current_language, "hi");
        assert_eq!(loaded.translations["signup.title"]["hi"], "अपना खाता बनाएं");
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        let loaded = snapshot.load().await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_creates_data_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("state").join("lang");
        let snapshot = SnapshotFile::in_dir(&nested);

        snapshot.save(&sample_state()).await.unwrap();
        assert!(snapshot.path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        snapshot.save(&sample_state()).await.unwrap();

        let second = PersistedState::new("mr", BTreeMap::new());
        snapshot.save(&second).await.unwrap();

        let loaded = snapshot.load().await.unwrap().unwrap();
        assert_eq!(loaded.current_language, "mr");
        assert!(loaded.translations.is_empty());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        snapshot.save(&sample_state()).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {:?}", leftovers);
    }

    // ==================== Version Gating ====================

    #[tokio::test]
    async fn test_load_discards_future_schema_version() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        let raw = r#"{
            "schemaVersion": 99,
            "currentLanguage": "hi",
            "updatedAt": "2026-08-23T10:00:00Z",
            "translations": {}
        }"#;
        std::fs::write(snapshot.path(), raw).unwrap();

        let loaded = snapshot.load().await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_discards_record_without_version() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        // A record written before the version field existed
        let raw = r#"{
            "currentLanguage": "hi",
            "translations": { "signup.title": { "hi": "x" } }
        }"#;
        std::fs::write(snapshot.path(), raw).unwrap();

        let loaded = snapshot.load().await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_discards_corrupt_json() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        std::fs::write(snapshot.path(), "{ not json").unwrap();

        let loaded = snapshot.load().await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_discards_malformed_current_version_record() {
        let dir = tempdir().unwrap();
        let snapshot = SnapshotFile::in_dir(dir.path());

        // Right version, wrong field types
        let raw = r#"{
            "schemaVersion": 1,
            "currentLanguage": 42,
            "updatedAt": "2026-08-23T10:00:00Z",
            "translations": {}
        }"#;
        std::fs::write(snapshot.path(), raw).unwrap();

        let loaded = snapshot.load().await.unwrap();
        assert!(loaded.is_none());
    }

    // ==================== Record Shape ====================

    #[test]
    fn test_serialized_field_names_are_camel_case() {
        let state = sample_state();
        let json = serde_json::to_string(&state).unwrap();

        assert!(json.contains("\"schemaVersion\":1"));
        assert!(json.contains("\"currentLanguage\":\"hi\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"translations\""));
    }

    #[test]
    fn test_new_record_uses_current_schema_version() {
        let state = PersistedState::new("en", BTreeMap::new());
        assert_eq!(state.schema_version, SCHEMA_VERSION);
        assert_eq!(state.current_language, "en");
    }
}
