//! Application configuration for rfctrans.
//!
//! Lookup order: an explicit `--config` path, `./rfctrans.toml`, then
//! `~/.rfctrans/rfctrans.toml`. Missing files fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, RfcTransError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "rfctrans.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".rfctrans";

// ---------------------------------------------------------------------------
// Config structs (matching rfctrans.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Artifact locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Remote RFC sources.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Machine translation endpoint.
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Chat-completion settings used by summarization.
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root of the JSON artifacts (`data/<bucket>/rfcN.json`).
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root of the generated HTML (`html/rfcN.html`).
    #[serde(default = "default_html_dir")]
    pub html_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            html_dir: default_html_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_html_dir() -> PathBuf {
    PathBuf::from("html")
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Base URL serving `rfcN.txt` and `rfcN.xml`.
    #[serde(default = "default_rfc_base_url")]
    pub rfc_base_url: String,

    /// Base URL serving `draft-*.txt`.
    #[serde(default = "default_draft_base_url")]
    pub draft_base_url: String,

    /// Master index document.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            rfc_base_url: default_rfc_base_url(),
            draft_base_url: default_draft_base_url(),
            index_url: default_index_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourcesConfig {
    /// Sources rooted at a single base URL (used against mock servers).
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            rfc_base_url: format!("{base}/rfc"),
            draft_base_url: format!("{base}/archive/id"),
            index_url: format!("{base}/rfc-index.xml"),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn rfc_txt_url(&self, number: u32) -> String {
        format!("{}/rfc{number}.txt", self.rfc_base_url.trim_end_matches('/'))
    }

    pub fn rfc_xml_url(&self, number: u32) -> String {
        format!("{}/rfc{number}.xml", self.rfc_base_url.trim_end_matches('/'))
    }

    pub fn draft_txt_url(&self, name: &str) -> String {
        format!("{}/{name}.txt", self.draft_base_url.trim_end_matches('/'))
    }

    /// Public page of an RFC, linked from rendered pages.
    pub fn rfc_html_url(&self, number: u32) -> String {
        format!("{}/rfc{number}.html", self.rfc_base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_rfc_base_url() -> String {
    "https://www.rfc-editor.org/rfc".into()
}
fn default_draft_base_url() -> String {
    "https://www.ietf.org/archive/id".into()
}
fn default_index_url() -> String {
    "https://www.rfc-editor.org/rfc-index.xml".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[translator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Google-translate compatible `translate_a/single` endpoint.
    #[serde(default = "default_translator_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    /// Pause between requests, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translator_endpoint(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_translator_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".into()
}
fn default_source_lang() -> String {
    "en".into()
}
fn default_target_lang() -> String {
    "ja".into()
}
fn default_delay_ms() -> u64 {
    500
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// OpenAI-compatible API root (`<base>/chat/completions`).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used when `--chatgpt` is not given.
    #[serde(default = "default_model")]
    pub default_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_openai_base_url(),
            default_model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the per-user config directory (`~/.rfctrans/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RfcTransError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Resolve which config file to read, if any.
pub fn config_file_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(Some(local));
    }

    let user = config_dir()?.join(CONFIG_FILE_NAME);
    Ok(user.exists().then_some(user))
}

/// Load the application config. Returns defaults if no file is found.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match config_file_path(explicit)? {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RfcTransError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        RfcTransError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;

    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Check that every configured URL is absolute.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let urls = [
        ("sources.rfc_base_url", &config.sources.rfc_base_url),
        ("sources.draft_base_url", &config.sources.draft_base_url),
        ("sources.index_url", &config.sources.index_url),
        ("translator.endpoint", &config.translator.endpoint),
        ("openai.base_url", &config.openai.base_url),
    ];
    for (key, value) in urls {
        Url::parse(value)
            .map_err(|e| RfcTransError::config(format!("{key} is not a valid URL ({value}): {e}")))?;
    }
    Ok(())
}

/// Read the chat API key from the env var named in the config.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(RfcTransError::config(format!(
            "chat API key not found. Set the {var_name} environment variable."
        ))),
    }
}
