//! Turns transcript lines into speaker-turn segments.
//!
//! A transcript line such as `Host 01:02:03` (some non-digit text immediately followed by an
//! `HH:MM:SS` timestamp) opens a new segment. Every other line belongs to the segment that is
//! currently open.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// A boundary-delimited run of transcript lines.
///
/// `text` holds every line followed by `\n`, so concatenating segments in order reproduces the
/// transcript's non-blank lines exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
}

impl Segment {
    /// Length in characters (not bytes). This is what chunk thresholds are measured in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The line that opened this segment.
    pub fn first_line(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }
}

fn boundary_regex() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"^\D+\d{2}:\d{2}:\d{2}").expect("valid boundary regex"))
}

/// Whether `line` opens a new segment.
pub fn is_boundary(line: &str) -> bool {
    boundary_regex().is_match(line)
}

/// Split an ordered stream of lines into segments.
///
/// Lines are trimmed and blank lines are skipped entirely. Lines before the first boundary form
/// a leading segment of their own. Empty input yields no segments.
pub fn segment_lines<I, S>(lines: I) -> Vec<Segment>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut segments = Vec::new();
    let mut current = String::new();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if is_boundary(line) && !current.is_empty() {
            segments.push(Segment {
                text: std::mem::take(&mut current),
            });
        }

        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        segments.push(Segment { text: current });
    }

    segments
}
