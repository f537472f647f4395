// Splits every transcript in a folder into numbered chunk files small enough for one service
// call each.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use scribe_relay::SplitOpts;
use scribe_relay::chunker::split_folder;
use scribe_relay::document::DocumentFormat;
use scribe_relay::layout::{chunk_root, transcript_root};
use scribe_relay::opts::DEFAULT_CHUNK_THRESHOLD;

#[derive(Parser, Debug)]
#[command(name = "split-transcripts")]
#[command(about = "Split transcripts into speaker-turn chunks", long_about = None)]
struct Args {
    /// Working root (transcripts are read from `<root>/LiveStreamerText`).
    #[arg(long, default_value = "./files")]
    root: PathBuf,

    /// Read transcripts from this folder instead.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write chunk folders here instead of `<root>/out/Text`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Maximum chunk size in characters.
    #[arg(long, default_value_t = DEFAULT_CHUNK_THRESHOLD)]
    threshold: usize,

    /// Document format of transcripts and chunks.
    #[arg(long, value_enum, default_value_t = DocumentFormat::Text)]
    format: DocumentFormat,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool,
}

fn main() {
    scribe_relay::init_logging();
    let args = Args::parse();

    if let Err(err) = run(args) {
        error!(error = ?err, "split-transcripts failed");
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}

fn run(args: Args) -> Result<()> {
    let input = args.input.unwrap_or_else(|| transcript_root(&args.root));
    let out = args.out.unwrap_or_else(|| chunk_root(&args.root));

    if !args.yes && !confirm(&input)? {
        println!("Cancelled. Put the transcripts in '{}' and run again.", input.display());
        return Ok(());
    }

    let opts = SplitOpts {
        threshold: args.threshold,
        format: args.format,
        ..SplitOpts::default()
    };

    let report = split_folder(&input, &out, &opts)?;
    println!(
        "Split {} transcript(s) into {} chunk(s) under '{}'.",
        report.transcripts,
        report.chunks,
        out.display()
    );
    for failed in &report.failed {
        println!("  failed: {}", failed.display());
    }
    Ok(())
}

fn confirm(input: &std::path::Path) -> Result<bool> {
    print!(
        "Are the transcripts to split in '{}'? [y/N] ",
        input.display()
    );
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_8000_characters() {
        let args = Args::try_parse_from(["split-transcripts", "-y"]).expect("parse args");
        assert_eq!(args.threshold, 8000);
        assert!(args.yes);
        assert!(args.input.is_none());
    }

    #[test]
    fn run_splits_folder_without_prompting() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = transcript_root(dir.path());
        std::fs::create_dir_all(&input)?;
        std::fs::write(input.join("live.txt"), "A 00:00:01\nhello\nB 00:00:02\nbye\n")?;

        let args = Args::try_parse_from([
            "split-transcripts",
            "-y",
            "--threshold",
            "12",
            "--root",
            dir.path().to_str().expect("utf-8 temp path"),
        ])?;
        run(args)?;

        let chunk_dir = chunk_root(dir.path()).join("live");
        assert!(chunk_dir.join("live_1.txt").is_file());
        assert!(chunk_dir.join("live_2.txt").is_file());
        Ok(())
    }
}
