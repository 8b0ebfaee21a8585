//! Shared types, error model, and configuration for rfctrans.
//!
//! This crate is the foundation depended on by all other rfctrans crates.
//! It provides:
//! - [`RfcTransError`]: the unified error type
//! - Domain types ([`RfcId`], [`RfcDocument`], [`TranslatedDocument`],
//!   [`SummaryRecord`], [`IndexSnapshot`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OpenAiConfig, PathsConfig, SourcesConfig, TranslatorConfig, config_dir,
    config_file_path, load_config, load_config_from, validate_api_key, validate_config,
};
pub use error::{Result, RfcTransError};
pub use types::{
    DocumentMeta, IndexSnapshot, Paragraph, PublishedDate, RfcDocument, RfcId, RfcStatus,
    Section, SummaryRecord, TranslatedDocument, TranslatedParagraph, TranslatedSection,
    TranslatedText, parse_month, parse_rfc_list, strip_rfc_prefix,
};
