//! Publication ledger: a JSON array of records, one per published site.
//!
//! The document is read in full, extended in memory and rewritten in full. Two things
//! keep concurrent runs from losing each other's records:
//!
//! - an exclusive `flock` on a sidecar `<ledger>.lock` file held across the whole
//!   read-modify-write, and
//! - the new document is written to a temp file in the same directory and renamed over
//!   the old one, so readers see either the old or the new document. The replacement
//!   keeps the old file's permissions.
//!
//! A missing, unreadable or non-array document is treated as empty. Existing elements
//! are carried over as raw JSON values, so records in older shapes survive untouched.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::LedgerError;

/// One publication record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub name: String,
    pub url: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entry` and return the number of records now in the ledger.
    pub fn append(&self, entry: &LedgerEntry) -> Result<usize, LedgerError> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| self.io(e))?;

        let lock = self.lock()?;

        let mut records = self.read_records();
        records.push(serde_json::to_value(entry)?);

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io(e))?;
        serde_json::to_writer_pretty(&mut tmp, &records)?;
        tmp.write_all(b"\n").map_err(|e| self.io(e))?;
        self.carry_permissions(tmp.as_file())?;
        tmp.as_file().sync_all().map_err(|e| self.io(e))?;
        tmp.persist(&self.path).map_err(|e| self.io(e.error))?;

        // Released on drop as well; an explicit unlock surfaces nothing useful on failure.
        let _ = lock.unlock();

        info!(
            ledger = %self.path.display(),
            name = %entry.name,
            url = %entry.url,
            records = records.len(),
            "[LEDGER] Publication recorded"
        );
        Ok(records.len())
    }

    /// Well-formed records in ledger order; malformed elements are skipped.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.read_records()
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "[LEDGER] Skipping record in an older or unknown shape");
                    None
                }
            })
            .collect()
    }

    fn read_records(&self) -> Vec<Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(ledger = %self.path.display(), "[LEDGER] No ledger yet, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(ledger = %self.path.display(), error = %e, "[LEDGER] Unreadable ledger, starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(ledger = %self.path.display(), error = %e, "[LEDGER] Malformed ledger, starting empty");
                Vec::new()
            }
        }
    }

    /// Temp files are created 0600; give the replacement the old ledger's mode, or a
    /// world-readable 0644 when there is no ledger yet.
    fn carry_permissions(&self, tmp: &File) -> Result<(), LedgerError> {
        let permissions = match fs::metadata(&self.path) {
            Ok(meta) => meta.permissions(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match new_ledger_permissions() {
                Some(permissions) => permissions,
                None => return Ok(()),
            },
            Err(e) => return Err(self.io(e)),
        };
        tmp.set_permissions(permissions).map_err(|e| self.io(e))
    }

    fn lock(&self) -> Result<File, LedgerError> {
        let mut lock_path = self.path.clone().into_os_string();
        lock_path.push(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| self.io(e))?;
        file.lock_exclusive().map_err(|e| self.io(e))?;
        Ok(file)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn io(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(unix)]
fn new_ledger_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_ledger_permissions() -> Option<fs::Permissions> {
    None
}
