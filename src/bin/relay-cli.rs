// Rewrites one folder of chunk files through an OpenAI-compatible chat endpoint.
//
// Exit codes: 0 when the failure journal is empty afterwards, 1 when some items are still
// failing, 2 when the run could not start (or the journal could not be written).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{error, warn};

use scribe_relay::chat_client::{ChatClient, ChatClientOpts, DEFAULT_BASE_URL, DEFAULT_MODEL};
use scribe_relay::document::DocumentFormat;
use scribe_relay::layout::{Layout, load_prompt};
use scribe_relay::opts::DEFAULT_MAX_ATTEMPTS;
use scribe_relay::{Pipeline, RelayOpts, RunReport};

const EXIT_PARTIAL: i32 = 1;
const EXIT_FATAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "relay-cli")]
#[command(about = "Rewrite a folder of transcript chunks, resuming where the last run stopped")]
struct Params {
    /// Folder name under `<root>/out/Text`. Asked for interactively when omitted.
    folder: Option<String>,

    /// Working root holding `out/`, `prompt/` and `log/`.
    #[arg(long, default_value = "./files")]
    root: PathBuf,

    /// Prompt file (defaults to `<root>/prompt/prompt.txt`).
    #[arg(long = "prompt")]
    prompt_path: Option<PathBuf>,

    /// Attempts per chunk before it is journaled.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Pause between attempts on the same chunk, in milliseconds.
    #[arg(long, default_value_t = 0)]
    retry_delay_ms: u64,

    /// Document format of the chunk files.
    #[arg(long, value_enum, default_value_t = DocumentFormat::Text)]
    format: DocumentFormat,

    /// API key for the chat endpoint.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model name.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    scribe_relay::init_logging();
    let params = Params::parse();

    let stop = Arc::new(AtomicBool::new(false));
    let ctrl_c_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current chunk");
            ctrl_c_stop.store(true, Ordering::SeqCst);
        }
    });

    // The blocking HTTP client must be created and dropped off the async runtime.
    let outcome = tokio::task::spawn_blocking(move || run(params, stop))
        .await
        .map_err(|err| anyhow!("pipeline task panicked: {err}"))
        .and_then(|res| res);

    match &outcome {
        Ok(report) => print_summary(report),
        Err(err) => {
            error!(error = ?err, "relay-cli failed");
            eprintln!("error: {err:#}");
        }
    }
    std::process::exit(exit_code(&outcome));
}

fn exit_code(outcome: &Result<RunReport>) -> i32 {
    match outcome {
        Ok(report) if report.is_clean() => 0,
        Ok(_) => EXIT_PARTIAL,
        Err(_) => EXIT_FATAL,
    }
}

fn run(params: Params, stop: Arc<AtomicBool>) -> Result<RunReport> {
    let folder = match params.folder {
        Some(folder) => folder,
        None => ask_folder()?,
    };

    let layout = Layout::resolve(&params.root, &folder)?;
    let prompt_path = params.prompt_path.unwrap_or(layout.prompt_path);
    let prompt = load_prompt(&prompt_path)?;

    let mut opts = RelayOpts::new(
        layout.input_dir,
        layout.output_dir,
        layout.journal_path,
        prompt,
    );
    opts.max_attempts = params.max_attempts;
    opts.retry_delay = Duration::from_millis(params.retry_delay_ms);
    opts.format = params.format;

    let client = ChatClient::new(ChatClientOpts {
        base_url: params.base_url,
        model: params.model,
        api_key: params.api_key,
        timeout: Duration::from_secs(params.timeout_secs),
    })?;

    let pipeline = Pipeline::new(opts, client)?.with_stop_flag(stop);
    let report = pipeline
        .run()
        .with_context(|| format!("run over folder '{folder}' failed"))?;
    Ok(report)
}

fn ask_folder() -> Result<String> {
    print!("Folder to process: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_summary(report: &RunReport) {
    println!(
        "Done: {} rewritten, {} recovered from earlier failures, {} failed, {} still pending.",
        report.succeeded,
        report.recovered,
        report.failed + report.replay_failed,
        report.pending_failures,
    );
    if report.cancelled {
        println!(
            "Stopped early; {} chunk(s) were not attempted. Run again to continue.",
            report.not_attempted
        );
    }
}
