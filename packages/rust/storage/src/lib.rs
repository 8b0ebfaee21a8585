//! Flat-file artifact store.
//!
//! Every artifact is keyed by RFC identifier:
//!
//! ```text
//! data/
//! ├── 8000/
//! │   ├── rfc8446.json            normalized document
//! │   ├── rfc8446-trans.json      translated document
//! │   └── summary/
//! │       └── rfc8446-summary.json
//! └── draft/
//!     ├── draft-ietf-tls-esni-14.json
//!     └── draft-ietf-tls-esni-14-trans.json
//! html/
//! ├── index.html
//! ├── rfc8446.html
//! ├── rfc9999-not-found.html
//! ├── data-rfc-list.json          index snapshot
//! ├── group-rfcs.json
//! └── draft/
//!     ├── index.html
//!     └── draft-ietf-tls-esni-14.html
//! ```
//!
//! Writes go through a temp file and a rename. There is no locking: a single
//! invocation at a time is assumed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use rfctrans_shared::{
    IndexSnapshot, PathsConfig, Result, RfcDocument, RfcId, RfcTransError, SummaryRecord,
    TranslatedDocument,
};

const DRAFT_DIR: &str = "draft";
const SNAPSHOT_FILE: &str = "data-rfc-list.json";
const WG_GROUPS_FILE: &str = "group-rfcs.json";

/// Handle to the local artifact directories.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
    html_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>, html_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            html_dir: html_dir.into(),
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(paths.data_dir.clone(), paths.html_dir.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// `data/8000` for RFC 8446, `data/0000` for RFC 793, `data/draft` for drafts.
    fn data_bucket(&self, id: &RfcId) -> PathBuf {
        match id {
            RfcId::Numbered(n) => self.data_dir.join(format!("{:04}", n / 1000 * 1000)),
            RfcId::Draft(_) => self.data_dir.join(DRAFT_DIR),
        }
    }

    pub fn document_path(&self, id: &RfcId) -> PathBuf {
        self.data_bucket(id).join(format!("{}.json", id.file_stem()))
    }

    pub fn translation_path(&self, id: &RfcId) -> PathBuf {
        self.data_bucket(id).join(format!("{}-trans.json", id.file_stem()))
    }

    pub fn summary_path(&self, number: u32) -> PathBuf {
        self.data_bucket(&RfcId::number(number))
            .join("summary")
            .join(format!("rfc{number}-summary.json"))
    }

    fn html_bucket(&self, id: &RfcId) -> PathBuf {
        match id {
            RfcId::Numbered(_) => self.html_dir.clone(),
            RfcId::Draft(_) => self.html_dir.join(DRAFT_DIR),
        }
    }

    pub fn page_path(&self, id: &RfcId) -> PathBuf {
        self.html_bucket(id).join(format!("{}.html", id.file_stem()))
    }

    pub fn not_found_path(&self, id: &RfcId) -> PathBuf {
        self.html_bucket(id)
            .join(format!("{}-not-found.html", id.file_stem()))
    }

    pub fn index_page_path(&self) -> PathBuf {
        self.html_dir.join("index.html")
    }

    pub fn draft_index_page_path(&self) -> PathBuf {
        self.html_dir.join(DRAFT_DIR).join("index.html")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.html_dir.join(SNAPSHOT_FILE)
    }

    pub fn wg_groups_path(&self) -> PathBuf {
        self.html_dir.join(WG_GROUPS_FILE)
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    pub fn has_document(&self, id: &RfcId) -> bool {
        self.document_path(id).exists()
    }

    pub fn load_document(&self, id: &RfcId) -> Result<Option<RfcDocument>> {
        read_json(&self.document_path(id))
    }

    pub fn save_document(&self, doc: &RfcDocument) -> Result<PathBuf> {
        let path = self.document_path(&doc.id);
        write_json(&path, doc)?;
        Ok(path)
    }

    pub fn load_translation(&self, id: &RfcId) -> Result<Option<TranslatedDocument>> {
        read_json(&self.translation_path(id))
    }

    pub fn save_translation(&self, trans: &TranslatedDocument) -> Result<PathBuf> {
        let path = self.translation_path(&trans.id);
        write_json(&path, trans)?;
        Ok(path)
    }

    pub fn load_summary(&self, number: u32) -> Result<Option<SummaryRecord>> {
        read_json(&self.summary_path(number))
    }

    pub fn save_summary(&self, record: &SummaryRecord) -> Result<PathBuf> {
        let path = self.summary_path(record.number);
        write_json(&path, record)?;
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // HTML
    // -----------------------------------------------------------------------

    pub fn write_page(&self, id: &RfcId, html: &str) -> Result<PathBuf> {
        let path = self.page_path(id);
        write_atomic(&path, html.as_bytes())?;
        Ok(path)
    }

    pub fn read_page(&self, id: &RfcId) -> Result<Option<String>> {
        let path = self.page_path(id);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| RfcTransError::io(&path, e))
    }

    /// Record a terminal "does not exist" outcome as an empty page.
    pub fn write_not_found(&self, id: &RfcId) -> Result<PathBuf> {
        let path = self.not_found_path(id);
        write_atomic(&path, b"")?;
        Ok(path)
    }

    pub fn write_index_page(&self, html: &str) -> Result<PathBuf> {
        let path = self.index_page_path();
        write_atomic(&path, html.as_bytes())?;
        Ok(path)
    }

    pub fn write_draft_index_page(&self, html: &str) -> Result<PathBuf> {
        let path = self.draft_index_page_path();
        write_atomic(&path, html.as_bytes())?;
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Index snapshot
    // -----------------------------------------------------------------------

    pub fn load_snapshot(&self) -> Result<Option<IndexSnapshot>> {
        read_json(&self.snapshot_path())
    }

    pub fn save_snapshot(&self, snapshot: &IndexSnapshot) -> Result<PathBuf> {
        let path = self.snapshot_path();
        write_json(&path, snapshot)?;
        Ok(path)
    }

    pub fn save_wg_groups(&self, groups: &BTreeMap<String, Vec<u32>>) -> Result<PathBuf> {
        let path = self.wg_groups_path();
        write_json(&path, groups)?;
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// RFC numbers already processed locally: a rendered page or a not-found marker exists.
    pub fn local_rfc_numbers(&self) -> Result<BTreeSet<u32>> {
        static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^rfc([0-9]+)(?:-not-found)?\.html$").expect("valid regex")
        });

        let mut numbers = BTreeSet::new();
        for name in list_file_names(&self.html_dir)? {
            if let Some(caps) = PAGE_RE.captures(&name) {
                if let Ok(n) = caps[1].parse() {
                    numbers.insert(n);
                }
            }
        }
        debug!(count = numbers.len(), "scanned local pages");
        Ok(numbers)
    }

    /// Every document with a translation artifact, numbered RFCs ascending then drafts.
    pub fn translated_ids(&self) -> Result<Vec<RfcId>> {
        static TRANS_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^(rfc([0-9]+)|draft-.+)-trans\.json$").expect("valid regex")
        });

        let mut numbered = BTreeSet::new();
        let mut drafts = BTreeSet::new();

        for bucket in list_dir_names(&self.data_dir)? {
            for name in list_file_names(&self.data_dir.join(&bucket))? {
                let Some(caps) = TRANS_RE.captures(&name) else {
                    continue;
                };
                match caps.get(2) {
                    Some(num) => {
                        if let Ok(n) = num.as_str().parse::<u32>() {
                            numbered.insert(n);
                        }
                    }
                    None => {
                        drafts.insert(caps[1].to_string());
                    }
                }
            }
        }

        Ok(numbered
            .into_iter()
            .map(RfcId::Numbered)
            .chain(drafts.into_iter().map(RfcId::Draft))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read a JSON artifact; a missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| RfcTransError::io(path, e))?;
    let value = serde_json::from_str(&content).map_err(|e| {
        RfcTransError::validation(format!("invalid JSON in {}: {e}", path.display()))
    })?;
    Ok(Some(value))
}

/// Write a JSON artifact (pretty-printed, UTF-8).
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| RfcTransError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| RfcTransError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| RfcTransError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| RfcTransError::io(path, e))?;
    Ok(())
}

fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    list_entries(dir, false)
}

fn list_dir_names(dir: &Path) -> Result<Vec<String>> {
    list_entries(dir, true)
}

fn list_entries(dir: &Path, want_dirs: bool) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| RfcTransError::io(dir, e))? {
        let entry = entry.map_err(|e| RfcTransError::io(dir, e))?;
        if entry.path().is_dir() == want_dirs {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}
