use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Where one folder's files live under a working root (usually `./files`).
///
/// ```text
/// <root>/LiveStreamerText/          raw transcripts
/// <root>/out/Text/<folder>/         chunk files
/// <root>/out/AI/<folder>/           rewritten chunks
/// <root>/prompt/prompt.txt          system prompt
/// <root>/log/<folder>.failed        failure journal
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prompt_path: PathBuf,
    pub journal_path: PathBuf,
}

impl Layout {
    pub fn resolve(root: &Path, folder: &str) -> Result<Self> {
        let folder = folder.trim();
        if folder.is_empty() || folder.contains(['/', '\\']) || folder == "." || folder == ".." {
            return Err(Error::setup(format!("invalid folder name '{folder}'")));
        }

        Ok(Self {
            input_dir: chunk_root(root).join(folder),
            output_dir: root.join("out").join("AI").join(folder),
            prompt_path: root.join("prompt").join("prompt.txt"),
            journal_path: root.join("log").join(format!("{folder}.failed")),
        })
    }
}

/// Folder holding raw transcripts waiting to be split.
pub fn transcript_root(root: &Path) -> PathBuf {
    root.join("LiveStreamerText")
}

/// Folder the splitter writes chunk folders into.
pub fn chunk_root(root: &Path) -> PathBuf {
    root.join("out").join("Text")
}

/// Read the system prompt. A missing or unreadable prompt file is a setup error.
pub fn load_prompt(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::setup(format!(
            "prompt file '{}' does not exist",
            path.display()
        )));
    }
    std::fs::read_to_string(path).map_err(|err| {
        Error::setup(format!("failed to read prompt '{}': {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_folder_paths() -> anyhow::Result<()> {
        let layout = Layout::resolve(Path::new("files"), "stream-01")?;
        assert_eq!(layout.input_dir, PathBuf::from("files/out/Text/stream-01"));
        assert_eq!(layout.output_dir, PathBuf::from("files/out/AI/stream-01"));
        assert_eq!(layout.prompt_path, PathBuf::from("files/prompt/prompt.txt"));
        assert_eq!(layout.journal_path, PathBuf::from("files/log/stream-01.failed"));
        Ok(())
    }

    #[test]
    fn rejects_folder_names_that_escape_the_root() {
        for bad in ["", "  ", "..", "a/b", "a\\b"] {
            assert!(Layout::resolve(Path::new("files"), bad).unwrap_err().is_setup());
        }
    }

    #[test]
    fn missing_prompt_is_a_setup_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = load_prompt(&dir.path().join("prompt.txt")).unwrap_err();
        assert!(err.is_setup());

        std::fs::write(dir.path().join("prompt.txt"), "rewrite this")?;
        assert_eq!(load_prompt(&dir.path().join("prompt.txt"))?, "rewrite this");
        Ok(())
    }
}
