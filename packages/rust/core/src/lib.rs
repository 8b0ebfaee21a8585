//! Core pipeline orchestration and domain logic for rfctrans.
//!
//! This crate ties together fetching, translation, rendering and storage
//! into the end-to-end workflows behind each CLI mode (e.g., [`process`],
//! [`run_continuous`], [`summarize`]).

pub mod continuous;
pub mod index_pages;
pub mod pipeline;
pub mod restore;
pub mod status;
pub mod summarize;
pub mod translate;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use continuous::{BatchReport, CONTINUOUS_MIN_RFC, Window, run_batch, run_continuous};
pub use index_pages::{make_index, make_index_draft};
pub use pipeline::{Outcome, ProgressReporter, SilentProgress, process};
pub use restore::make_json;
pub use status::{StatusReport, fetch_status};
pub use summarize::{ChatModel, Confirm, ModelTier, OpenAiChat, summarize};
pub use translate::{GoogleTranslator, Translator, translate_rfc, translate_sample};
pub use workspace::Workspace;
