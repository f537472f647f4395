//! Document collaborators: how transcripts and chunks are read from and written to disk.
//!
//! Parsing rich-text formats is not this crate's job. Everything here goes through the
//! [`DocumentCodec`] trait so another format can be plugged in without touching the pipeline.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::json_codec::JsonCodec;
use crate::text_codec::TextCodec;

/// Purely cosmetic styling applied when a document is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub font_family: String,
    pub east_asian_font_family: String,
    pub point_size: f32,
}

impl StyleConfig {
    /// Style used for chunk files produced by the splitter.
    pub fn chunk() -> Self {
        Self::uniform("Microsoft YaHei", 11.0)
    }

    /// Style used for rewritten outputs and reports.
    pub fn report() -> Self {
        Self::uniform("DengXian", 11.0)
    }

    fn uniform(family: &str, point_size: f32) -> Self {
        Self {
            font_family: family.to_string(),
            east_asian_font_family: family.to_string(),
            point_size,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::report()
    }
}

/// Reads and writes one document format.
pub trait DocumentCodec {
    /// File extensions (without the dot) this codec owns. The first one is used for new files.
    fn extensions(&self) -> &'static [&'static str];

    /// Read the document as an ordered list of trimmed paragraphs.
    ///
    /// Blank paragraphs are kept (as empty strings) so callers that care about paragraph
    /// boundaries can see them.
    fn read_paragraphs(&self, path: &Path) -> Result<Vec<String>>;

    /// Write `text` as a document, one paragraph per line.
    fn write_document(&self, path: &Path, text: &str, style: &StyleConfig) -> Result<()>;

    /// Whether `path` has one of this codec's extensions (case-insensitive).
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// The extension used when this codec creates a file.
    fn primary_extension(&self) -> &'static str {
        self.extensions().first().copied().unwrap_or("txt")
    }
}

/// The document formats that ship with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DocumentFormat {
    /// Plain UTF-8 text, one paragraph per line.
    #[default]
    Text,

    /// JSON document that also carries the style configuration.
    Json,
}

impl DocumentFormat {
    /// Build the codec for this format.
    pub fn codec(self) -> Box<dyn DocumentCodec + Send + Sync> {
        match self {
            DocumentFormat::Text => Box::new(TextCodec),
            DocumentFormat::Json => Box::new(JsonCodec),
        }
    }
}

/// Join the non-blank paragraphs of a document with newlines.
///
/// This is the text a work item sends to the transformation service.
pub fn join_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `contents` next to `path` and move it into place.
///
/// The pipeline counts any file in the output directory as done, so a half-written file must
/// never appear under its final name.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_paragraphs_drops_blank_and_trims() {
        let paragraphs = vec![
            "  first ".to_string(),
            String::new(),
            "   ".to_string(),
            "second".to_string(),
        ];
        assert_eq!(join_paragraphs(&paragraphs), "first\nsecond");
    }

    #[test]
    fn handles_matches_extension_case_insensitively() {
        let codec = DocumentFormat::Text.codec();
        assert!(codec.handles(Path::new("a/b_1.txt")));
        assert!(codec.handles(Path::new("a/b_1.TXT")));
        assert!(!codec.handles(Path::new("a/b_1.json")));
        assert!(!codec.handles(Path::new("a/b_1")));
    }

    #[test]
    fn write_atomically_replaces_existing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("out.txt");

        write_atomically(&path, b"one")?;
        write_atomically(&path, b"two")?;

        assert_eq!(std::fs::read_to_string(&path)?, "two");
        let leftovers = std::fs::read_dir(path.parent().unwrap())?.count();
        assert_eq!(leftovers, 1);
        Ok(())
    }
}
