//! Packs segments into size-bounded chunks and writes them as numbered chunk files.
//!
//! Chunk `N` of transcript `base` is written as `{base}_{N}.{ext}`. That trailing number is what
//! the pipeline later uses to order work and to decide where a resumed run picks up.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::document::DocumentCodec;
use crate::opts::SplitOpts;
use crate::progress::natural_cmp_paths;
use crate::segments::{Segment, segment_lines};
use crate::{Error, Result};

/// An ordered group of whole segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position in emission order.
    pub seq: usize,

    /// Concatenated segment text.
    pub text: String,

    /// How many segments were packed into this chunk.
    pub segment_count: usize,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Greedily pack `segments` into chunks of at most `threshold` characters.
///
/// Segments are never split or reordered. A segment longer than `threshold` becomes a chunk on
/// its own.
pub fn pack(segments: &[Segment], threshold: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;
    let mut buffer_segments = 0usize;

    for segment in segments {
        let segment_len = segment.char_len();

        if buffer_segments > 0 && buffer_len + segment_len > threshold {
            chunks.push(Chunk {
                seq: chunks.len() + 1,
                text: std::mem::take(&mut buffer),
                segment_count: buffer_segments,
            });
            buffer_len = 0;
            buffer_segments = 0;
        }

        buffer.push_str(&segment.text);
        buffer_len += segment_len;
        buffer_segments += 1;
    }

    if buffer_segments > 0 {
        chunks.push(Chunk {
            seq: chunks.len() + 1,
            text: buffer,
            segment_count: buffer_segments,
        });
    }

    chunks
}

/// File name for chunk `seq` of transcript `base`.
pub fn chunk_file_name(base: &str, seq: usize, ext: &str) -> String {
    format!("{base}_{seq}.{ext}")
}

/// Write every chunk into `out_dir` and return the written paths in sequence order.
pub fn write_chunks(
    chunks: &[Chunk],
    base: &str,
    out_dir: &Path,
    codec: &dyn DocumentCodec,
    opts: &SplitOpts,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let ext = codec.primary_extension();
    let mut written = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let path = out_dir.join(chunk_file_name(base, chunk.seq, ext));
        codec.write_document(&path, &chunk.text, &opts.style)?;
        debug!(
            path = %path.display(),
            chars = chunk.char_len(),
            segments = chunk.segment_count,
            "wrote chunk"
        );
        written.push(path);
    }

    remove_stale_chunks(base, out_dir, codec, chunks.len())?;
    Ok(written)
}

/// Delete `{base}_{N}` chunk files with `N > keep` left behind by an earlier split.
fn remove_stale_chunks(
    base: &str,
    out_dir: &Path,
    codec: &dyn DocumentCodec,
    keep: usize,
) -> Result<()> {
    let prefix = format!("{base}_");
    for entry in std::fs::read_dir(out_dir)? {
        let path = entry?.path();
        if !path.is_file() || !codec.handles(&path) {
            continue;
        }
        let seq = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix(prefix.as_str()))
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .map(|digits| digits.parse::<usize>().unwrap_or(usize::MAX));
        if seq.is_some_and(|seq| seq > keep) {
            std::fs::remove_file(&path)?;
            debug!(path = %path.display(), "removed stale chunk");
        }
    }
    Ok(())
}

/// Split one transcript into chunk files under `out_root/{base}/`.
pub fn split_transcript(input: &Path, out_root: &Path, opts: &SplitOpts) -> Result<Vec<PathBuf>> {
    let codec = opts.format.codec();

    let base = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| Error::msg(format!("no usable file name: '{}'", input.display())))?;

    let paragraphs = codec.read_paragraphs(input)?;
    let segments = segment_lines(&paragraphs);
    let chunks = pack(&segments, opts.threshold);

    let out_dir = out_root.join(base);
    let written = write_chunks(&chunks, base, &out_dir, codec.as_ref(), opts)?;

    info!(
        input = %input.display(),
        segments = segments.len(),
        chunks = chunks.len(),
        "split transcript"
    );
    Ok(written)
}

/// Outcome of splitting a whole folder.
#[derive(Debug, Default)]
pub struct SplitReport {
    pub transcripts: usize,
    pub chunks: usize,
    pub failed: Vec<PathBuf>,
}

/// Split every transcript in `input_dir` (non-recursive) into `out_root`.
///
/// A transcript that cannot be split is logged and skipped; the rest of the folder still runs.
pub fn split_folder(input_dir: &Path, out_root: &Path, opts: &SplitOpts) -> Result<SplitReport> {
    if !input_dir.is_dir() {
        return Err(Error::setup(format!(
            "transcript folder '{}' does not exist",
            input_dir.display()
        )));
    }

    let codec = opts.format.codec();
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && codec.handles(&path) {
            inputs.push(path);
        }
    }
    inputs.sort_by(|a, b| natural_cmp_paths(a, b));

    let mut report = SplitReport::default();
    for input in inputs {
        match split_transcript(&input, out_root, opts) {
            Ok(written) => {
                report.transcripts += 1;
                report.chunks += written.len();
            }
            Err(err) => {
                warn!(input = %input.display(), error = %err, "failed to split transcript");
                report.failed.push(input);
            }
        }
    }

    Ok(report)
}
