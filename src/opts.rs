use std::path::PathBuf;
use std::time::Duration;

use crate::document::{DocumentFormat, StyleConfig};
use crate::{Error, Result};

/// Default chunk size, in characters.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 8000;

/// Default number of attempts per work item.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Options for splitting transcripts into chunk files.
#[derive(Debug, Clone)]
pub struct SplitOpts {
    /// Maximum chunk length in characters. A single segment longer than this still becomes its
    /// own chunk.
    pub threshold: usize,

    /// Format the chunk files are written in.
    pub format: DocumentFormat,

    /// Cosmetic style applied to chunk files.
    pub style: StyleConfig,
}

impl Default for SplitOpts {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CHUNK_THRESHOLD,
            format: DocumentFormat::default(),
            style: StyleConfig::chunk(),
        }
    }
}

/// Options for one pipeline run over a folder of chunk files.
///
/// This is library-level configuration, not CLI flags. The CLI maps user input into this type so
/// tests and other frontends can build it directly.
#[derive(Debug, Clone)]
pub struct RelayOpts {
    /// Folder holding the chunk files to transform.
    pub input_dir: PathBuf,

    /// Folder the transformed documents are written to. Its contents decide where a resumed run
    /// picks up.
    pub output_dir: PathBuf,

    /// Failure journal for this folder.
    pub journal_path: PathBuf,

    /// System prompt sent with every chunk.
    pub prompt: String,

    /// Attempts per work item before it is journaled.
    pub max_attempts: u32,

    /// Pause between attempts on the same item. Zero means retry immediately.
    pub retry_delay: Duration,

    /// Format of both the inputs and the outputs.
    pub format: DocumentFormat,

    /// Cosmetic style applied to outputs.
    pub style: StyleConfig,
}

impl RelayOpts {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        journal_path: impl Into<PathBuf>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            journal_path: journal_path.into(),
            prompt: prompt.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
            format: DocumentFormat::default(),
            style: StyleConfig::report(),
        }
    }

    /// Check the options before any work item is touched.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::setup("max_attempts must be at least 1"));
        }
        if !self.input_dir.is_dir() {
            return Err(Error::setup(format!(
                "input folder '{}' does not exist",
                self.input_dir.display()
            )));
        }
        if self.prompt.trim().is_empty() {
            return Err(Error::setup("prompt is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let opts = RelayOpts::new("in", "out", "log/j", "p");
        assert_eq!(opts.max_attempts, 3);
        assert_eq!(opts.retry_delay, Duration::ZERO);
        assert_eq!(SplitOpts::default().threshold, 8000);
    }

    #[test]
    fn validate_rejects_missing_input_and_zero_attempts() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let missing = RelayOpts::new(dir.path().join("nope"), dir.path(), "j", "p");
        assert!(missing.validate().unwrap_err().is_setup());

        let mut zero = RelayOpts::new(dir.path(), dir.path(), "j", "p");
        zero.max_attempts = 0;
        assert!(zero.validate().unwrap_err().is_setup());

        let ok = RelayOpts::new(dir.path(), dir.path(), "j", "p");
        ok.validate()?;
        Ok(())
    }
}
