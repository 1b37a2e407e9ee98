//! JSON file repository for activity snapshots.
//!
//! # Responsibility
//! - Encode/decode the full store as a JSON object of date keys to arrays
//!   of `{time, title, description}` objects.
//! - Move malformed files aside on request so they are never overwritten.
//!
//! # Invariants
//! - A missing file reads as `Ok(None)`, not as an error.
//! - Decoding is strict: unknown fields, bad keys/times, repeated date
//!   keys and empty arrays are `RepoError::Malformed`.
//! - Writes are plain overwrites (no temp file, no backup).

use crate::model::activity::{Activity, DateKey};
use crate::store::activity_store::ActivityStore;
use chrono::Utc;
use log::{error, info, warn};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Store file used when no explicit path is configured.
pub const DEFAULT_STORE_FILE: &str = "activities.dat";

const QUARANTINE_SUFFIX: &str = "corrupt";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for snapshot reads, writes and quarantine moves.
#[derive(Debug)]
pub enum RepoError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        path: PathBuf,
        message: String,
    },
    Serialize(serde_json::Error),
    /// Save blocked because the persisted file was never read successfully.
    Refused {
        path: PathBuf,
        reason: String,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Malformed { path, message } => {
                write!(f, "malformed activity file `{}`: {message}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to encode activities: {err}"),
            Self::Refused { path, reason } => write!(
                f,
                "refusing to overwrite unread activity file `{}` ({reason}); reload or force a save",
                path.display()
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { .. } | Self::Refused { .. } => None,
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Whole-snapshot persistence contract for activity stores.
pub trait ActivityRepository {
    /// Where the snapshot lives, for diagnostics.
    fn location(&self) -> &Path;
    /// Reads the persisted snapshot; `Ok(None)` when nothing is persisted yet.
    fn read(&self) -> RepoResult<Option<ActivityStore>>;
    /// Replaces the persisted snapshot with `store`.
    fn write(&self, store: &ActivityStore) -> RepoResult<()>;
    /// Moves the current snapshot aside and returns where it went.
    fn quarantine(&self) -> RepoResult<PathBuf>;
}

/// Single-file JSON repository.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for JsonFileRepository {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_FILE)
    }
}

impl ActivityRepository for JsonFileRepository {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RepoResult<Option<ActivityStore>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            // Non UTF-8 bytes are a content problem, not a transport one.
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                return Err(RepoError::Malformed {
                    path: self.path.clone(),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(self.io_error(err)),
        };

        decode_store(&text)
            .map(Some)
            .map_err(|message| RepoError::Malformed {
                path: self.path.clone(),
                message,
            })
    }

    fn write(&self, store: &ActivityStore) -> RepoResult<()> {
        let started_at = Instant::now();
        let text = encode_store(store)?;
        if let Err(err) = std::fs::write(&self.path, text) {
            error!(
                "event=store_save module=repo status=error path={} duration_ms={} error={}",
                self.path.display(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(self.io_error(err));
        }
        info!(
            "event=store_save module=repo status=ok path={} dates={} records={} duration_ms={}",
            self.path.display(),
            store.date_count(),
            store.record_count(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn quarantine(&self) -> RepoResult<PathBuf> {
        let target = quarantine_path(&self.path, Utc::now().timestamp_millis());
        std::fs::rename(&self.path, &target).map_err(|err| self.io_error(err))?;
        warn!(
            "event=store_quarantine module=repo status=ok path={} backup={}",
            self.path.display(),
            target.display()
        );
        Ok(target)
    }
}

/// Encodes the full store as pretty-printed JSON with a trailing newline.
pub fn encode_store(store: &ActivityStore) -> RepoResult<String> {
    let mut text = serde_json::to_string_pretty(store.days())?;
    text.push('\n');
    Ok(text)
}

/// Decodes and validates a persisted snapshot.
///
/// Returns a human-readable message describing the first violation.
pub fn decode_store(text: &str) -> Result<ActivityStore, String> {
    let StrictDays(days) = serde_json::from_str(text).map_err(|err| err.to_string())?;
    Ok(ActivityStore::from_days(days))
}

/// Wire mapping that rejects repeated and empty dates instead of merging.
struct StrictDays(BTreeMap<DateKey, Vec<Activity>>);

impl<'de> Deserialize<'de> for StrictDays {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(StrictDaysVisitor)
    }
}

struct StrictDaysVisitor;

impl<'de> Visitor<'de> for StrictDaysVisitor {
    type Value = StrictDays;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("an object of date keys to non-empty activity arrays")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut days = BTreeMap::new();
        while let Some((date, activities)) = access.next_entry::<DateKey, Vec<Activity>>()? {
            if activities.is_empty() {
                return Err(serde::de::Error::custom(format!(
                    "empty activity list under `{date}`"
                )));
            }
            if days.insert(date, activities).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "date `{date}` appears more than once"
                )));
            }
        }
        Ok(StrictDays(days))
    }
}

fn quarantine_path(path: &Path, stamp_ms: i64) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_STORE_FILE.to_string());
    path.with_file_name(format!("{file_name}.{QUARANTINE_SUFFIX}-{stamp_ms}"))
}

#[cfg(test)]
mod tests {
    use super::{decode_store, encode_store, quarantine_path};
    use crate::model::activity::{ClockTime, DateKey};
    use crate::store::activity_store::ActivityStore;
    use std::path::{Path, PathBuf};

    #[test]
    fn encode_emits_expected_wire_shape() {
        let mut store = ActivityStore::new();
        let date = DateKey::from_ymd(2024, 1, 1).unwrap();
        store.add(date, ClockTime::new(9, 15), "Standup", "daily sync");

        let text = encode_store(&store).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "2024-01-01": [
                    {"time": "09:15", "title": "Standup", "description": "daily sync"}
                ]
            })
        );
    }

    #[test]
    fn decode_accepts_empty_object() {
        let store = decode_store("{}").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn decode_rejects_shape_violations() {
        let cases = [
            ("[]", "top-level array"),
            (r#"{"2024-01-01": {}}"#, "object instead of array"),
            (r#"{"2024-01-01": []}"#, "empty array"),
            (r#"{"Jan 1": [{"time": "09:00", "title": "t", "description": ""}]}"#, "bad key"),
            (r#"{"2024-01-01": [{"time": "9am", "title": "t", "description": ""}]}"#, "bad time"),
            (r#"{"2024-01-01": [{"time": "09:00", "title": "t"}]}"#, "missing field"),
            (
                r#"{"2024-01-01": [{"time": "09:00", "title": "t", "description": "", "x": 1}]}"#,
                "unknown field",
            ),
            ("{'2024-01-01': []}", "python literal"),
            (
                r#"{"2024-01-01": [{"time": "09:00", "title": "a", "description": ""}],
                    "2024-01-01": [{"time": "10:00", "title": "b", "description": ""}]}"#,
                "repeated date key",
            ),
        ];
        for (text, label) in cases {
            assert!(decode_store(text).is_err(), "{label} should be rejected");
        }
    }

    #[test]
    fn decode_reports_repeated_date_key() {
        let text = r#"{"2024-01-01": [{"time": "09:00", "title": "a", "description": ""}],
                       "2024-01-01": [{"time": "10:00", "title": "b", "description": ""}]}"#;

        let message = decode_store(text).unwrap_err();
        assert!(
            message.contains("`2024-01-01` appears more than once"),
            "unexpected message: {message}"
        );
    }

    #[test]
    fn quarantine_path_appends_suffix_next_to_original() {
        let target = quarantine_path(Path::new("data/activities.dat"), 1_700_000_000_000);
        assert_eq!(
            target,
            PathBuf::from("data/activities.dat.corrupt-1700000000000")
        );
    }
}
