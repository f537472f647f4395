//! Persisted list of work items that exhausted their retries.
//!
//! The journal is plain text, one source path per line. During a run it only grows, one line per
//! failure, and every append opens and closes the file so a crash loses at most the entry being
//! written. Once per run, after failed items have been replayed, the journal is rewritten to
//! exactly the entries that are still failing.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::write_atomically;
use crate::{Error, Result};

/// Handle to a journal file. Holds no open file between calls.
#[derive(Debug, Clone)]
pub struct FailureJournal {
    path: PathBuf,
}

impl FailureJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the journaled items in their recorded order.
    ///
    /// A missing journal is an empty one. Blank lines are ignored and repeated entries are kept
    /// once, at their first position. Entries are otherwise taken verbatim, CRLF endings aside.
    pub fn load(&self) -> Result<Vec<PathBuf>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::journal(&self.path, err)),
        };

        let mut seen = HashSet::new();
        let entries = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter(|line| seen.insert(*line))
            .map(PathBuf::from)
            .collect();
        Ok(entries)
    }

    /// Append one failed item.
    pub fn append_failure(&self, item: &Path) -> Result<()> {
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| Error::journal(&self.path, err))?;
        writeln!(file, "{}", item.display()).map_err(|err| Error::journal(&self.path, err))?;
        file.sync_data()
            .map_err(|err| Error::journal(&self.path, err))?;

        debug!(journal = %self.path.display(), item = %item.display(), "journaled failure");
        Ok(())
    }

    /// Replace the journal's contents with exactly `remaining`, in order.
    ///
    /// The file always exists afterwards, empty when nothing is left.
    pub fn compact(&self, remaining: &[PathBuf]) -> Result<()> {
        self.ensure_parent()?;

        let mut contents = String::new();
        for item in remaining {
            contents.push_str(&item.display().to_string());
            contents.push('\n');
        }
        write_atomically(&self.path, contents.as_bytes())
            .map_err(|err| Error::journal(&self.path, err))?;

        debug!(
            journal = %self.path.display(),
            remaining = remaining.len(),
            "compacted failure journal"
        );
        Ok(())
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                std::fs::create_dir_all(dir).map_err(|err| Error::journal(&self.path, err))
            }
            _ => Ok(()),
        }
    }
}
