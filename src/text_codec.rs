use std::path::Path;

use anyhow::{Context, Result};

use crate::document::{DocumentCodec, StyleConfig, write_atomically};

/// Plain UTF-8 text documents: one paragraph per line.
///
/// Styling is cosmetic and has nowhere to live in a text file, so it is dropped on write.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl DocumentCodec for TextCodec {
    fn extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn read_paragraphs(&self, path: &Path) -> Result<Vec<String>> {
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let text = String::from_utf8(raw)
            .with_context(|| format!("'{}' is not valid UTF-8", path.display()))?;

        Ok(text.lines().map(|line| line.trim().to_string()).collect())
    }

    fn write_document(&self, path: &Path, text: &str, _style: &StyleConfig) -> Result<()> {
        write_atomically(path, text.as_bytes())
            .with_context(|| format!("failed to write '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_trimmed_lines_in_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "  a \r\n\nb\n")?;

        let paragraphs = TextCodec.read_paragraphs(&path)?;
        assert_eq!(paragraphs, vec!["a", "", "b"]);
        Ok(())
    }

    #[test]
    fn rejects_non_utf8_input() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00])?;

        let err = TextCodec.read_paragraphs(&path).unwrap_err();
        assert!(format!("{err:#}").contains("UTF-8"));
        Ok(())
    }

    #[test]
    fn write_then_read_keeps_text() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.txt");
        TextCodec.write_document(&path, "x\ny\n", &StyleConfig::default())?;
        assert_eq!(std::fs::read_to_string(&path)?, "x\ny\n");
        Ok(())
    }
}
