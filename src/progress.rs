//! Progress recovery from the output directory.
//!
//! There is no separate "done" ledger: a chunk counts as processed once its output file exists.
//! The highest number embedded in those output names is where a resumed run picks up.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::Result;

/// Split `s` into alternating runs of digits and non-digits.
///
/// `"x_10.txt"` becomes `["x_", "10", ".txt"]`.
pub fn tokens(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;

    for (idx, ch) in s.char_indices() {
        let is_digit = ch.is_ascii_digit();
        if prev_digit.is_some_and(|prev| prev != is_digit) {
            out.push(&s[start..idx]);
            start = idx;
        }
        prev_digit = Some(is_digit);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// All runs of ASCII digits in `s`, in order.
pub fn digit_runs(s: &str) -> impl Iterator<Item = &str> {
    tokens(s)
        .into_iter()
        .filter(|t| t.bytes().all(|b| b.is_ascii_digit()))
}

/// Parse a digit run, saturating instead of overflowing.
fn run_value(run: &str) -> u64 {
    run.parse().unwrap_or(u64::MAX)
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two digit runs by numeric value without parsing them.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}

/// Natural ("alphanumeric-aware") string ordering.
///
/// Both strings are tokenized into digit and non-digit runs. Tokens are compared left to right,
/// numerically when both are digit runs and lexically otherwise. `x_2` therefore sorts before
/// `x_10`. Strings that tie token-for-token (e.g. `x_01` vs `x_1`) fall back to plain ordering
/// so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = tokens(a);
    let right = tokens(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = if is_numeric(l) && is_numeric(r) {
            cmp_numeric(l, r)
        } else {
            l.cmp(r)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

fn file_name_str(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

/// [`natural_cmp`] on file names, with the full path as a tiebreak.
pub fn natural_cmp_paths(a: &Path, b: &Path) -> Ordering {
    natural_cmp(file_name_str(a), file_name_str(b)).then_with(|| a.cmp(b))
}

/// The sequence number embedded in a file name: its last digit run.
pub fn sequence_number(path: &Path) -> Option<u64> {
    digit_runs(file_name_str(path)).last().map(run_value)
}

/// Highest sequence number among the files in `output_dir` whose extension is in `extensions`.
///
/// Returns 0 if the directory is missing, empty, or holds no numbered files.
pub fn compute_resume_point(output_dir: &Path, extensions: &[&str]) -> Result<u64> {
    if !output_dir.is_dir() {
        return Ok(0);
    }

    let mut max = 0;
    for entry in std::fs::read_dir(output_dir)? {
        let path = entry?.path();
        if !path.is_file() || !has_extension(&path, extensions) {
            continue;
        }
        if let Some(seq) = sequence_number(&path) {
            max = max.max(seq);
        }
    }
    Ok(max)
}

/// Inputs that still need processing, in natural order.
///
/// An input is kept when any digit run in its file name is strictly greater than
/// `processed_max`.
pub fn select_remaining<I>(inputs: I, processed_max: u64) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut remaining: Vec<PathBuf> = inputs
        .into_iter()
        .filter(|path| digit_runs(file_name_str(path)).any(|run| run_value(run) > processed_max))
        .collect();
    remaining.sort_by(|a, b| natural_cmp_paths(a, b));
    remaining
}

/// Files in `dir` (non-recursive) with one of `extensions`, in natural order.
pub fn list_inputs(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            inputs.push(path);
        }
    }
    inputs.sort_by(|a, b| natural_cmp_paths(a, b));
    Ok(inputs)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_alternate_digit_and_text_runs() {
        assert_eq!(tokens("x_10.txt"), vec!["x_", "10", ".txt"]);
        assert_eq!(tokens("12ab3"), vec!["12", "ab", "3"]);
        assert_eq!(tokens(""), Vec::<&str>::new());
        assert_eq!(tokens("直播_2"), vec!["直播_", "2"]);
    }

    #[test]
    fn natural_order_sorts_numbers_numerically() {
        let mut names = vec!["x_2.docx", "x_10.docx", "x_1.docx"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["x_1.docx", "x_2.docx", "x_10.docx"]);
    }

    #[test]
    fn natural_order_is_lexical_for_text_and_total_for_ties() {
        assert_eq!(natural_cmp("a_1", "b_1"), Ordering::Less);
        assert_eq!(natural_cmp("x_1", "x_1"), Ordering::Equal);
        assert_ne!(natural_cmp("x_01", "x_1"), Ordering::Equal);
        assert_eq!(natural_cmp("x", "x_1"), Ordering::Less);
        // Mixed numeric/text tokens compare lexically.
        assert_eq!(natural_cmp("1a", "a1"), "1".cmp("a"));
    }

    #[test]
    fn huge_numbers_compare_without_overflow() {
        assert_eq!(
            natural_cmp("x_99999999999999999999999", "x_100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn sequence_number_uses_last_digit_run() {
        assert_eq!(sequence_number(Path::new("out/live2024_7.txt")), Some(7));
        assert_eq!(sequence_number(Path::new("notes.txt")), None);
    }

    #[test]
    fn resume_point_is_max_over_matching_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["t_1.txt", "t_3.txt", "t_2.txt", "t_9.json", "readme.txt"] {
            std::fs::write(dir.path().join(name), "x")?;
        }
        std::fs::create_dir(dir.path().join("sub_50.txt"))?;

        assert_eq!(compute_resume_point(dir.path(), &["txt"])?, 3);
        assert_eq!(compute_resume_point(dir.path(), &["json"])?, 9);
        Ok(())
    }

    #[test]
    fn resume_point_is_zero_for_missing_or_empty_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(compute_resume_point(dir.path(), &["txt"])?, 0);
        assert_eq!(compute_resume_point(&dir.path().join("nope"), &["txt"])?, 0);
        Ok(())
    }

    #[test]
    fn select_remaining_skips_processed_and_orders_naturally() {
        let inputs: Vec<PathBuf> = [5, 1, 4, 2, 3]
            .iter()
            .map(|n| PathBuf::from(format!("in/t_{n}.txt")))
            .collect();

        let remaining = select_remaining(inputs, 3);
        assert_eq!(
            remaining,
            vec![PathBuf::from("in/t_4.txt"), PathBuf::from("in/t_5.txt")]
        );
    }

    #[test]
    fn select_remaining_keeps_everything_from_zero() {
        let inputs = vec![PathBuf::from("t_10.txt"), PathBuf::from("t_2.txt")];
        assert_eq!(
            select_remaining(inputs, 0),
            vec![PathBuf::from("t_2.txt"), PathBuf::from("t_10.txt")]
        );
    }

    #[test]
    fn list_inputs_filters_by_extension() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["t_10.txt", "t_2.txt", "t_3.json"] {
            std::fs::write(dir.path().join(name), "x")?;
        }
        let inputs = list_inputs(dir.path(), &["txt"])?;
        let names: Vec<&str> = inputs.iter().map(|p| file_name_str(p)).collect();
        assert_eq!(names, vec!["t_2.txt", "t_10.txt"]);
        Ok(())
    }
}
