use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentCodec, StyleConfig, write_atomically};

/// A document stored as JSON so its style travels with the text.
///
/// Example:
/// ```json
/// {
///   "style": { "font_family": "DengXian", "east_asian_font_family": "DengXian", "point_size": 11.0 },
///   "paragraphs": ["Host 00:00:01", "hello"]
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[derive(Debug, Serialize, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    style: Option<StyleConfig>,
    paragraphs: Vec<String>,
}

impl DocumentCodec for JsonCodec {
    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn read_paragraphs(&self, path: &Path) -> Result<Vec<String>> {
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let doc: JsonDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("'{}' is not a JSON document", path.display()))?;

        Ok(doc
            .paragraphs
            .into_iter()
            .map(|p| p.trim().to_string())
            .collect())
    }

    fn write_document(&self, path: &Path, text: &str, style: &StyleConfig) -> Result<()> {
        let doc = JsonDocument {
            style: Some(style.clone()),
            paragraphs: text.split('\n').map(str::to_string).collect(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        write_atomically(path, &bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_style_alongside_paragraphs() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.json");
        JsonCodec.write_document(&path, "one\ntwo", &StyleConfig::chunk())?;

        let parsed: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
        assert_eq!(parsed["style"]["font_family"], "Microsoft YaHei");
        assert_eq!(parsed["paragraphs"][1], "two");

        assert_eq!(JsonCodec.read_paragraphs(&path)?, vec!["one", "two"]);
        Ok(())
    }

    #[test]
    fn style_is_optional_on_read() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"paragraphs":[" a ",""]}"#)?;
        assert_eq!(JsonCodec.read_paragraphs(&path)?, vec!["a", ""]);
        Ok(())
    }

    #[test]
    fn garbage_is_reported_as_malformed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "not json")?;
        let err = JsonCodec.read_paragraphs(&path).unwrap_err();
        assert!(format!("{err:#}").contains("not a JSON document"));
        Ok(())
    }
}
