//! Rewrites the per-type counts in a review report's summary section.
//!
//! A report lists issues under headers like `错误类型1：语气词` with one `原文：` line per
//! occurrence. The summary (after a paragraph starting with `总结`, up to the next blank
//! paragraph) states `语气词：共出现N次`; the rewriter replaces `N` with the real count.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::document::{DocumentCodec, StyleConfig};
use crate::progress::list_inputs;
use crate::{Error, Result};

const SUMMARY_MARKER: &str = "总结";
const OCCURRENCE_MARKER: &str = "原文：";

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^错误类型\d+：").expect("valid header regex"))
}

/// Count occurrences per error type, in the order the types first appear.
pub fn count_error_types(text: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines().map(str::trim) {
        if header_regex().is_match(line) {
            let name = line
                .split_once('：')
                .map(|(_, rest)| rest.trim())
                .unwrap_or_default()
                .to_string();
            let idx = match counts.iter().position(|(known, _)| *known == name) {
                Some(idx) => idx,
                None => {
                    counts.push((name, 0));
                    counts.len() - 1
                }
            };
            current = Some(idx);
        } else if line.contains(OCCURRENCE_MARKER) {
            if let Some(idx) = current {
                counts[idx].1 += 1;
            }
        }
    }

    counts
}

/// Rewrite summary counts in place. Returns how many paragraphs changed.
pub fn rewrite_summary(paragraphs: &mut [String], counts: &[(String, usize)]) -> usize {
    let patterns: Vec<(Regex, String)> = counts
        .iter()
        .filter_map(|(name, count)| {
            let pattern = format!("{}：共出现\\d+次", regex::escape(name));
            match Regex::new(&pattern) {
                Ok(re) => Some((re, format!("{name}：共出现{count}次"))),
                Err(err) => {
                    warn!(error_type = %name, error = %err, "skipping unmatchable error type");
                    None
                }
            }
        })
        .collect();

    let mut in_summary = false;
    let mut changed = 0;
    for paragraph in paragraphs.iter_mut() {
        if paragraph.starts_with(SUMMARY_MARKER) {
            in_summary = true;
            continue;
        }
        if !in_summary {
            continue;
        }
        if paragraph.trim().is_empty() {
            break;
        }

        let mut updated = paragraph.clone();
        for (re, replacement) in &patterns {
            updated = re
                .replace_all(&updated, regex::NoExpand(replacement))
                .into_owned();
        }
        if updated != *paragraph {
            *paragraph = updated;
            changed += 1;
        }
    }

    changed
}

/// Recount one report and write the result to `out_dir` under the same file name.
pub fn recount_file(input: &Path, out_dir: &Path, codec: &dyn DocumentCodec) -> Result<PathBuf> {
    let mut paragraphs = codec.read_paragraphs(input)?;
    let counts = count_error_types(&paragraphs.join("\n"));
    let changed = rewrite_summary(&mut paragraphs, &counts);

    let name = input
        .file_name()
        .ok_or_else(|| Error::msg(format!("no usable file name: '{}'", input.display())))?;
    std::fs::create_dir_all(out_dir)?;
    let output = out_dir.join(name);
    codec.write_document(&output, &paragraphs.join("\n"), &StyleConfig::report())?;

    info!(
        input = %input.display(),
        error_types = counts.len(),
        changed,
        "recounted report"
    );
    Ok(output)
}

/// Recount every report in `input_dir`. Reports that fail are logged and returned.
pub fn recount_folder(
    input_dir: &Path,
    out_dir: &Path,
    codec: &dyn DocumentCodec,
) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(Error::setup(format!(
            "report folder '{}' does not exist",
            input_dir.display()
        )));
    }

    let mut failed = Vec::new();
    for input in list_inputs(input_dir, codec.extensions())? {
        if let Err(err) = recount_file(&input, out_dir, codec) {
            warn!(input = %input.display(), error = %err, "failed to recount report");
            failed.push(input);
        }
    }
    Ok(failed)
}
