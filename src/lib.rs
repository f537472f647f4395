//! `scribe-relay`: resumable batch rewriting of long transcripts.
//!
//! Long transcripts do not fit in a single call to a size-limited text service. This crate:
//! - splits transcripts into speaker-turn segments and packs them into numbered chunk files
//! - sends each chunk through the service with a fixed retry budget
//! - resumes interrupted runs from what is already in the output folder, replaying earlier
//!   failures before moving the frontier forward
//!
//! Everything runs sequentially. The output folder and the failure journal are the only state
//! that survives between runs.

// High-level API (most consumers should start here).
pub mod opts;
pub mod pipeline;

// Splitting transcripts into chunk files.
pub mod chunker;
pub mod segments;

// Resume bookkeeping.
pub mod journal;
pub mod progress;

// Calling the transformation service.
pub mod retry;
pub mod transformer;

#[cfg(feature = "service")]
pub mod chat_client;

// Document formats and folder layout.
pub mod document;
pub mod json_codec;
pub mod layout;
pub mod text_codec;

// Report summary recounting.
pub mod recount;

// Logging configuration.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, FailureKind, Result};
pub use opts::{RelayOpts, SplitOpts};
pub use pipeline::{Pipeline, RunReport, WorkItem};
pub use transformer::Transformer;

#[cfg(feature = "logging")]
pub use logging::init as init_logging;
