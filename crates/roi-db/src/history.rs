//! Write history of database artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use roi_core::serde::{from_json_slice, to_canonical_json_bytes};
use roi_core::{ErrorInfo, RoiError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

/// Format of ledger timestamps and archive suffixes.
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S%.6f";

/// Last write of one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// UTC write stamp in [`STAMP_FORMAT`].
    pub timestamp: String,
    /// Hex SHA-256 of the written artifact.
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    databases: BTreeMap<String, LedgerEntry>,
}

/// Database name to last-write mapping persisted next to the databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl HistoryLedger {
    /// Loads the ledger at `path`; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, RoiError> {
        let entries = if path.is_file() {
            let bytes = fs::read(path).map_err(|err| RoiError::io("ledger_read", path, err))?;
            let file: LedgerFile = from_json_slice(&bytes)
                .map_err(|err| err.with_context("path", path.display().to_string()))?;
            file.databases
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "history ledger loaded");
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// File the ledger is persisted to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry of a database, if it was ever written.
    pub fn entry(&self, name: &str) -> Option<&LedgerEntry> {
        self.entries.get(name)
    }

    /// Entries sorted by database name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of tracked databases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamp for a new write of `name`, strictly after its previous stamp.
    pub fn next_stamp(&self, name: &str, now: DateTime<Utc>) -> String {
        let mut stamp = now.naive_utc();
        if let Some(previous) = self.entry(name).and_then(|entry| parse_stamp(&entry.timestamp)) {
            if stamp <= previous {
                stamp = previous + Duration::microseconds(1);
            }
        }
        stamp.format(STAMP_FORMAT).to_string()
    }

    /// Records a write.
    pub fn record(&mut self, name: &str, timestamp: String, sha256: String) {
        self.entries
            .insert(name.to_string(), LedgerEntry { timestamp, sha256 });
    }

    /// Persists the ledger by replacing its file atomically.
    pub fn save(&self) -> Result<(), RoiError> {
        let file = LedgerFile {
            databases: self.entries.clone(),
        };
        let bytes = to_canonical_json_bytes(&file)?;
        replace_file(&self.path, &bytes)
    }

    /// Whether the artifact at `primary` still hashes to the recorded value.
    ///
    /// An untracked name or a missing artifact does not verify.
    pub fn verify(&self, name: &str, primary: &Path) -> Result<bool, RoiError> {
        let Some(entry) = self.entry(name) else {
            return Ok(false);
        };
        if !primary.is_file() {
            return Ok(false);
        }
        let bytes = fs::read(primary).map_err(|err| RoiError::io("database_read", primary, err))?;
        Ok(sha256_hex(&bytes) == entry.sha256)
    }
}

/// Parses a ledger stamp.
pub fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
}

/// Hex SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Writes `bytes` to a temporary file beside `path` and renames it into place.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), RoiError> {
    let tmp = staged_file(path, bytes)?;
    tmp.persist(path).map_err(|err| RoiError::io("persist", path, err.error))?;
    Ok(())
}

/// Stages `bytes` in a temporary file in the directory of `path`.
pub(crate) fn staged_file(path: &Path, bytes: &[u8]) -> Result<NamedTempFile, RoiError> {
    let parent = path.parent().ok_or_else(|| {
        RoiError::Io(
            ErrorInfo::new("no_parent", "artifact path has no parent directory")
                .with_context("path", path.display().to_string()),
        )
    })?;
    fs::create_dir_all(parent).map_err(|err| RoiError::io("mkdir", parent, err))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|err| RoiError::io("tempfile", parent, err))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|err| RoiError::io("tempfile_write", tmp.path(), err))?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamps_increase_even_when_the_clock_does_not() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).single().expect("time");
        let mut ledger = HistoryLedger {
            path: PathBuf::from("/tmp/ledger.json"),
            entries: BTreeMap::new(),
        };
        let first = ledger.next_stamp("aseg_fa_beta_nomask", now);
        assert_eq!(first, "20240309-140500.000000");
        ledger.record("aseg_fa_beta_nomask", first.clone(), String::new());
        let second = ledger.next_stamp("aseg_fa_beta_nomask", now);
        assert_eq!(second, "20240309-140500.000001");
        assert!(parse_stamp(&second) > parse_stamp(&first));
    }
}
