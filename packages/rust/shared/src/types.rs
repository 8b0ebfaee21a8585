//! Core domain types: RFC identifiers and the persisted JSON artifacts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RfcTransError};

// ---------------------------------------------------------------------------
// RfcId
// ---------------------------------------------------------------------------

/// A reference to a published RFC or to an Internet-Draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RfcId {
    /// A published RFC, e.g. `8446`.
    Numbered(u32),
    /// An Internet-Draft, e.g. `draft-ietf-tls-esni-14`.
    Draft(String),
}

impl RfcId {
    pub fn number(n: u32) -> Self {
        Self::Numbered(n)
    }

    pub fn draft(name: impl Into<String>) -> Self {
        Self::Draft(name.into())
    }

    /// Canonical identifier: the unpadded number, or the draft name.
    pub fn id(&self) -> String {
        match self {
            Self::Numbered(n) => n.to_string(),
            Self::Draft(name) => name.clone(),
        }
    }

    /// The RFC number, for threshold and range comparisons. Drafts have none.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Numbered(n) => Some(*n),
            Self::Draft(_) => None,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft(_))
    }

    /// File stem used for every artifact of this document (`rfc8446`, `draft-…`).
    pub fn file_stem(&self) -> String {
        match self {
            Self::Numbered(n) => format!("rfc{n}"),
            Self::Draft(name) => name.clone(),
        }
    }
}

impl fmt::Display for RfcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numbered(n) => write!(f, "{n}"),
            Self::Draft(name) => f.write_str(name),
        }
    }
}

impl FromStr for RfcId {
    type Err = RfcTransError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token.starts_with("draft-") {
            return Ok(Self::Draft(token.to_string()));
        }
        token
            .parse::<u32>()
            .map(Self::Numbered)
            .map_err(|e| RfcTransError::validation(format!("invalid RFC number '{token}': {e}")))
    }
}

impl Serialize for RfcId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id())
    }
}

impl<'de> Deserialize<'de> for RfcId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated list such as `8446,8447, 9000`.
pub fn parse_rfc_list(list: &str) -> Result<Vec<RfcId>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Turn `RFC0793` / `RFC793` into `793`; other tokens are returned unchanged.
pub fn strip_rfc_prefix(doc_id: &str) -> String {
    static RFC_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^RFC0*([0-9]+)$").expect("valid regex"));
    match RFC_RE.captures(doc_id.trim()) {
        Some(caps) => caps[1].to_string(),
        None => doc_id.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Publication date
// ---------------------------------------------------------------------------

/// Month-granular publication date, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublishedDate {
    pub year: i32,
    pub month: u32,
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

impl PublishedDate {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Build from a year and a month given as a number (`"8"`) or a name (`"August"`).
    pub fn from_parts(year: &str, month: &str) -> Option<Self> {
        let year = year.trim().parse().ok()?;
        let month = parse_month(month)?;
        Some(Self { year, month })
    }

    pub fn month_name(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

/// Parse a month number or an English month name (full or three-letter).
pub fn parse_month(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = raw.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower) || lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

// ---------------------------------------------------------------------------
// RfcDocument (normalized, source-agnostic)
// ---------------------------------------------------------------------------

/// Status metadata carried by the document itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obsoletes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<String>,
    /// e.g. `Standards Track`, `Informational`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Working group acronym.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wg: Option<String>,
}

/// One paragraph of body text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Leading indentation in columns.
    #[serde(default)]
    pub indent: u16,
    pub text: String,
    /// Preformatted content (figures, code, tables): rendered as-is, never translated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub raw: bool,
}

impl Paragraph {
    pub fn text(indent: u16, text: impl Into<String>) -> Self {
        Self {
            indent,
            text: text.into(),
            raw: false,
        }
    }

    pub fn raw(indent: u16, text: impl Into<String>) -> Self {
        Self {
            indent,
            text: text.into(),
            raw: true,
        }
    }
}

/// A titled section of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable anchor id (`1`, `4.2.1`, `abstract`, `appendix-a`).
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

/// The normalized representation of one RFC, produced by either fetch strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfcDocument {
    pub id: RfcId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishedDate>,
    #[serde(default)]
    pub meta: DocumentMeta,
    pub sections: Vec<Section>,
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// TranslatedDocument
// ---------------------------------------------------------------------------

/// An original string and its (possibly pending) translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedText {
    pub text: String,
    #[serde(default)]
    pub translated: Option<String>,
}

impl TranslatedText {
    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translated: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.translated.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedParagraph {
    #[serde(default)]
    pub indent: u16,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub raw: bool,
    pub text: String,
    #[serde(default)]
    pub translated: Option<String>,
}

impl TranslatedParagraph {
    /// Raw paragraphs are never translated, so they are never pending.
    pub fn is_pending(&self) -> bool {
        !self.raw && self.translated.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedSection {
    pub id: String,
    pub title: TranslatedText,
    pub paragraphs: Vec<TranslatedParagraph>,
}

/// Parallel translated copy of an [`RfcDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedDocument {
    pub id: RfcId,
    pub title: TranslatedText,
    pub sections: Vec<TranslatedSection>,
    /// Name of the translation backend.
    pub translator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_at: Option<DateTime<Utc>>,
}

impl TranslatedDocument {
    /// A translation skeleton with every entry pending.
    pub fn pending(source: &RfcDocument, translator: &str) -> Self {
        Self {
            id: source.id.clone(),
            title: TranslatedText::pending(&source.title),
            sections: source
                .sections
                .iter()
                .map(|s| TranslatedSection {
                    id: s.id.clone(),
                    title: TranslatedText::pending(&s.title),
                    paragraphs: s
                        .paragraphs
                        .iter()
                        .map(|p| TranslatedParagraph {
                            indent: p.indent,
                            raw: p.raw,
                            text: p.text.clone(),
                            translated: None,
                        })
                        .collect(),
                })
                .collect(),
            translator: translator.to_string(),
            translated_at: None,
        }
    }

    /// Whether this translation still corresponds section-by-section to `source`.
    pub fn mirrors(&self, source: &RfcDocument) -> bool {
        self.id == source.id
            && self.sections.len() == source.sections.len()
            && self.sections.iter().zip(&source.sections).all(|(t, s)| {
                t.id == s.id
                    && t.paragraphs.len() == s.paragraphs.len()
                    && t.paragraphs.iter().zip(&s.paragraphs).all(|(tp, sp)| tp.text == sp.text)
            })
    }

    /// Number of text entries still waiting for a translation.
    pub fn pending_count(&self) -> usize {
        let title = usize::from(self.title.is_pending());
        let sections: usize = self
            .sections
            .iter()
            .map(|s| {
                usize::from(!s.title.text.is_empty() && s.title.is_pending())
                    + s.paragraphs.iter().filter(|p| p.is_pending()).count()
            })
            .sum();
        title + sections
    }

    pub fn is_complete(&self) -> bool {
        self.pending_count() == 0
    }
}

// ---------------------------------------------------------------------------
// SummaryRecord
// ---------------------------------------------------------------------------

/// A chat-model summary of one RFC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub number: u32,
    /// Canonical model name that produced the summary.
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub summary: Vec<String>,
}

// ---------------------------------------------------------------------------
// IndexSnapshot
// ---------------------------------------------------------------------------

/// Status metadata of one RFC, as listed in the master index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RfcStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obsoletes: Vec<String>,
    #[serde(default, rename = "obsoleted-by", skip_serializing_if = "Vec::is_empty")]
    pub obsoleted_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<String>,
    #[serde(default, rename = "updated-by", skip_serializing_if = "Vec::is_empty")]
    pub updated_by: Vec<String>,
    /// Camel-cased status, e.g. `Proposed Standard`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wg: Option<String>,
}

/// RFC number → status, rebuilt wholesale from the master index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexSnapshot(pub BTreeMap<u32, RfcStatus>);

impl IndexSnapshot {
    pub fn get(&self, number: u32) -> Option<&RfcStatus> {
        self.0.get(&number)
    }

    /// Every RFC number listed remotely, ascending.
    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Working group acronym → RFC numbers.
    pub fn group_by_wg(&self) -> BTreeMap<String, Vec<u32>> {
        let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (number, status) in &self.0 {
            if let Some(wg) = &status.wg {
                groups.entry(wg.clone()).or_default().push(*number);
            }
        }
        groups
    }
}
