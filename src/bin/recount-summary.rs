// Fixes the per-type counts in the summary section of review reports.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use scribe_relay::document::DocumentFormat;
use scribe_relay::recount::recount_folder;

#[derive(Parser, Debug)]
#[command(name = "recount-summary")]
#[command(about = "Recount error types in report summaries", long_about = None)]
struct Args {
    /// Folder holding the reports.
    #[arg(long, default_value = "./files/LiveStreamerReport")]
    input: PathBuf,

    /// Folder the corrected reports are written to.
    #[arg(long, default_value = "./files/out/Report")]
    out: PathBuf,

    /// Document format of the reports.
    #[arg(long, value_enum, default_value_t = DocumentFormat::Text)]
    format: DocumentFormat,
}

fn main() {
    scribe_relay::init_logging();
    let args = Args::parse();

    if let Err(err) = run(&args) {
        error!(error = ?err, "recount-summary failed");
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}

fn run(args: &Args) -> Result<()> {
    let codec = args.format.codec();
    let failed = recount_folder(&args.input, &args.out, codec.as_ref())?;

    if failed.is_empty() {
        println!("Reports written to '{}'.", args.out.display());
    } else {
        println!("{} report(s) could not be recounted:", failed.len());
        for path in failed {
            println!("  {}", path.display());
        }
    }
    Ok(())
}
