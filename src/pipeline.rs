//! Resumable batch driver.
//!
//! A run moves through four stages:
//!
//! 1. `ReplayFailures`: every journaled item whose source still exists is retried first. The
//!    journal is then compacted to whatever is still failing.
//! 2. `DiscoverRemaining`: the output folder is scanned for the highest finished sequence
//!    number; only inputs past it (and not still failing) are selected.
//! 3. `ProcessRemaining`: selected items run in natural order. A failure is journaled the
//!    moment it happens, so a crash never loses earlier failures.
//! 4. `Done`.
//!
//! Per-item problems never stop the batch. Only setup problems and journal I/O are fatal.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, info_span, warn};

use crate::document::{DocumentCodec, join_paragraphs};
use crate::error::FailureKind;
use crate::journal::FailureJournal;
use crate::opts::RelayOpts;
use crate::progress::{compute_resume_point, list_inputs, select_remaining};
use crate::retry::RetryExecutor;
use crate::transformer::Transformer;
use crate::Result;

/// One chunk file and where its rewritten version goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl WorkItem {
    /// Pair `source` with the same file name under `output_dir`.
    pub fn new(source: impl Into<PathBuf>, output_dir: &Path) -> Self {
        let source = source.into();
        let output = match source.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir.join(&source),
        };
        Self { source, output }
    }

    /// Short label for logs.
    pub fn name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

/// Driver state. Each stage carries what the next one needs.
#[derive(Debug)]
enum Stage {
    ReplayFailures,
    DiscoverRemaining {
        still_failing: Vec<PathBuf>,
    },
    ProcessRemaining {
        still_failing: Vec<PathBuf>,
        items: Vec<WorkItem>,
    },
    Done {
        still_failing: Vec<PathBuf>,
    },
}

/// Counts for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Journaled items that succeeded on replay.
    pub recovered: usize,
    /// Journaled items that failed again on replay.
    pub replay_failed: usize,
    /// Journal entries dropped because the source is gone or the output already exists.
    pub dropped_stale: usize,
    /// New items that succeeded.
    pub succeeded: usize,
    /// New items that were journaled.
    pub failed: usize,
    /// Items that were selected but not attempted because the run was stopped.
    pub not_attempted: usize,
    /// Whether the run was stopped early.
    pub cancelled: bool,
    /// Entries in the journal when the run ended.
    pub pending_failures: usize,
}

impl RunReport {
    /// True when the journal is empty after the run.
    pub fn is_clean(&self) -> bool {
        self.pending_failures == 0
    }
}

/// Sequential, resumable pipeline over one folder of chunk files.
pub struct Pipeline<T: Transformer> {
    opts: RelayOpts,
    executor: RetryExecutor<T>,
    codec: Box<dyn DocumentCodec + Send + Sync>,
    journal: FailureJournal,
    stop: Arc<AtomicBool>,
}

impl<T: Transformer> Pipeline<T> {
    /// Validate `opts` and build a pipeline. Fails with a setup error before anything is written.
    pub fn new(opts: RelayOpts, transformer: T) -> Result<Self> {
        opts.validate()?;

        let executor =
            RetryExecutor::new(transformer, opts.max_attempts).with_delay(opts.retry_delay);
        let codec = opts.format.codec();
        let journal = FailureJournal::new(&opts.journal_path);

        Ok(Self {
            opts,
            executor,
            codec,
            journal,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Use a different document codec for both inputs and outputs.
    pub fn with_codec(mut self, codec: Box<dyn DocumentCodec + Send + Sync>) -> Self {
        self.codec = codec;
        self
    }

    /// Share an externally owned stop flag (for example one flipped by a Ctrl-C handler).
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that stops the run after the current item when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn journal(&self) -> &FailureJournal {
        &self.journal
    }

    pub fn opts(&self) -> &RelayOpts {
        &self.opts
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run every stage to completion (or until stopped).
    pub fn run(&self) -> Result<RunReport> {
        let span = info_span!("relay_run", input = %self.opts.input_dir.display());
        let _guard = span.enter();

        std::fs::create_dir_all(&self.opts.output_dir)?;

        let mut report = RunReport::default();
        let mut stage = Stage::ReplayFailures;

        let still_failing = loop {
            stage = match stage {
                Stage::ReplayFailures => {
                    let still_failing = self.replay_failures(&mut report)?;
                    if report.cancelled {
                        Stage::Done { still_failing }
                    } else {
                        Stage::DiscoverRemaining { still_failing }
                    }
                }
                Stage::DiscoverRemaining { still_failing } => {
                    let items = self.discover_remaining(&still_failing)?;
                    Stage::ProcessRemaining {
                        still_failing,
                        items,
                    }
                }
                Stage::ProcessRemaining {
                    still_failing,
                    items,
                } => {
                    self.process_remaining(&items, &mut report)?;
                    Stage::Done { still_failing }
                }
                Stage::Done { still_failing } => break still_failing,
            };
        };

        report.pending_failures = still_failing.len() + report.failed;
        info!(
            recovered = report.recovered,
            replay_failed = report.replay_failed,
            dropped_stale = report.dropped_stale,
            succeeded = report.succeeded,
            failed = report.failed,
            not_attempted = report.not_attempted,
            cancelled = report.cancelled,
            pending_failures = report.pending_failures,
            "run finished"
        );
        Ok(report)
    }

    /// Retry every journaled item, then compact the journal to what is still failing.
    ///
    /// Iterates over the loaded snapshot and builds a fresh list, so removing an entry never
    /// shifts the one after it.
    fn replay_failures(&self, report: &mut RunReport) -> Result<Vec<PathBuf>> {
        let journaled = self.journal.load()?;
        if !journaled.is_empty() {
            info!(entries = journaled.len(), "replaying journaled failures");
        }

        let mut still_failing = Vec::with_capacity(journaled.len());
        for (idx, source) in journaled.iter().enumerate() {
            if self.stopped() {
                report.cancelled = true;
                report.not_attempted += journaled.len() - idx;
                still_failing.extend_from_slice(&journaled[idx..]);
                break;
            }

            let item = WorkItem::new(source, &self.opts.output_dir);
            if !item.source.is_file() {
                warn!(
                    item = %item.source.display(),
                    "dropping journal entry: source no longer exists"
                );
                report.dropped_stale += 1;
                continue;
            }
            if item.output.exists() {
                info!(item = %item.name(), "dropping journal entry: output already exists");
                report.dropped_stale += 1;
                continue;
            }

            match self.process_item(&item) {
                Ok(_) => report.recovered += 1,
                Err(kind) => {
                    warn!(item = %item.name(), error = %kind, "replay failed");
                    report.replay_failed += 1;
                    still_failing.push(source.clone());
                }
            }
        }

        self.journal.compact(&still_failing)?;
        Ok(still_failing)
    }

    /// Inputs past the highest finished sequence number, minus items still failing.
    fn discover_remaining(&self, still_failing: &[PathBuf]) -> Result<Vec<WorkItem>> {
        let exts = self.codec.extensions();
        let processed_max = compute_resume_point(&self.opts.output_dir, exts)?;
        let inputs = list_inputs(&self.opts.input_dir, exts)?;
        let total = inputs.len();

        let failing: HashSet<OsString> = still_failing
            .iter()
            .filter_map(|path| path.file_name().map(|name| name.to_os_string()))
            .collect();

        // Base names with digits of their own (dates, stream ids) can pass the sequence
        // filter even when finished, so an existing output always wins.
        let (remaining, already_done): (Vec<WorkItem>, Vec<WorkItem>) =
            select_remaining(inputs, processed_max)
                .into_iter()
                .filter(|path| {
                    path.file_name()
                        .is_none_or(|name| !failing.contains(name))
                })
                .map(|path| WorkItem::new(path, &self.opts.output_dir))
                .partition(|item| !item.output.exists());

        info!(
            processed_max,
            inputs = total,
            remaining = remaining.len(),
            already_done = already_done.len(),
            "discovered remaining work"
        );
        Ok(remaining)
    }

    fn process_remaining(&self, items: &[WorkItem], report: &mut RunReport) -> Result<()> {
        for (idx, item) in items.iter().enumerate() {
            if self.stopped() {
                report.cancelled = true;
                report.not_attempted += items.len() - idx;
                info!(not_attempted = items.len() - idx, "stop requested; ending run");
                break;
            }

            info!(item = %item.name(), position = idx + 1, of = items.len(), "processing");
            match self.process_item(item) {
                Ok(_) => report.succeeded += 1,
                Err(kind) => {
                    warn!(item = %item.name(), error = %kind, "item failed; journaling");
                    self.journal.append_failure(&item.source)?;
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Read, transform and write a single item.
    pub fn process_item(&self, item: &WorkItem) -> std::result::Result<PathBuf, FailureKind> {
        let paragraphs =
            self.codec
                .read_paragraphs(&item.source)
                .map_err(|err| FailureKind::MalformedInput {
                    path: item.source.clone(),
                    reason: format!("{err:#}"),
                })?;

        let text = join_paragraphs(&paragraphs);
        if text.is_empty() {
            return Err(FailureKind::MalformedInput {
                path: item.source.clone(),
                reason: "document has no text".to_string(),
            });
        }

        let rewritten = self
            .executor
            .transform(&item.name(), &self.opts.prompt, &text)?;

        self.codec
            .write_document(&item.output, rewritten.trim(), &self.opts.style)
            .map_err(|err| FailureKind::OutputWrite {
                path: item.output.clone(),
                reason: format!("{err:#}"),
            })?;

        Ok(item.output.clone())
    }
}
