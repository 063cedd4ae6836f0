//! Tab-delimited database artifacts and the archive-then-replace write.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use roi_core::{ErrorInfo, ProjectLayout, RoiError};
use tracing::{info, warn};

use crate::assemble::Database;
use crate::history::{sha256_hex, staged_file, HistoryLedger};

/// Result of a database write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Primary artifact path.
    pub path: PathBuf,
    /// Where the superseded artifact was moved, if one existed.
    pub archived: Option<PathBuf>,
    /// Stamp recorded in the ledger.
    pub timestamp: String,
    /// Hex SHA-256 of the written bytes.
    pub sha256: String,
}

/// Renders the header and rows as tab-delimited text.
pub fn render_tsv(database: &Database) -> Result<Vec<u8>, RoiError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(database.header())
        .map_err(|err| wrap_csv("database_header", err))?;
    for row in database.rows() {
        let mut record = vec![
            row.subject.clone(),
            row.region.clone(),
            row.base_size.to_string(),
            row.final_size.to_string(),
        ];
        record.extend(row.values.iter().map(f64::to_string));
        writer
            .write_record(&record)
            .map_err(|err| wrap_csv("database_row", err))?;
    }
    writer.into_inner().map_err(|err| {
        RoiError::Serde(ErrorInfo::new("database_flush", err.error().to_string()))
    })
}

/// Writes a database at the current time.
pub fn write_database(layout: &ProjectLayout, database: &Database) -> Result<WriteOutcome, RoiError> {
    write_database_at(layout, database, Utc::now())
}

/// Writes a database, archiving the version it replaces.
///
/// The new content is staged in the database directory first. The previous
/// primary artifact is then moved to `.old/<name>_<previous stamp>.txt`
/// (suffixed `-<n>` if that archive already exists), the
/// staged file is renamed over the primary path and the ledger is replaced.
/// A crash between the archive move and the ledger write leaves the primary
/// path briefly absent while the ledger still names the previous stamp.
pub fn write_database_at(
    layout: &ProjectLayout,
    database: &Database,
    now: DateTime<Utc>,
) -> Result<WriteOutcome, RoiError> {
    let name = database.name();
    let bytes = render_tsv(database)?;
    let sha256 = sha256_hex(&bytes);
    let primary = layout.database_path(name);
    let staged = staged_file(&primary, &bytes)?;

    let mut ledger = HistoryLedger::load(&layout.ledger_path())?;
    let timestamp = ledger.next_stamp(name, now);
    let mut archived = None;
    if let Some(previous) = ledger.entry(name) {
        let archive_dir = layout.archive_dir();
        fs::create_dir_all(&archive_dir)
            .map_err(|err| RoiError::io("archive_mkdir", &archive_dir, err))?;
        let target = free_archive_path(&archive_dir, name, &previous.timestamp);
        match fs::rename(&primary, &target) {
            Ok(()) => {
                info!(database = %name, archive = %target.display(), "previous database archived");
                archived = Some(target);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(database = %name, path = %primary.display(), "previous database missing; nothing to archive");
            }
            Err(err) => return Err(RoiError::io("archive_move", &primary, err)),
        }
    }

    staged
        .persist(&primary)
        .map_err(|err| RoiError::io("persist", &primary, err.error))?;
    ledger.record(name, timestamp.clone(), sha256.clone());
    ledger.save()?;
    info!(database = %name, path = %primary.display(), rows = database.len(), "database written");

    Ok(WriteOutcome {
        path: primary,
        archived,
        timestamp,
        sha256,
    })
}

/// `<name>_<stamp>.txt`, or `<name>_<stamp>-<n>.txt` with the first free `n`
/// when an earlier interrupted write already left that archive behind.
fn free_archive_path(archive_dir: &Path, name: &str, stamp: &str) -> PathBuf {
    let target = archive_dir.join(format!("{name}_{stamp}.txt"));
    if !target.exists() {
        return target;
    }
    (1u32..)
        .map(|n| archive_dir.join(format!("{name}_{stamp}-{n}.txt")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(target)
}

fn wrap_csv(code: &str, err: csv::Error) -> RoiError {
    RoiError::Serde(ErrorInfo::new(code, err.to_string()))
}
