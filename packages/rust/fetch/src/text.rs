//! Plain-text strategy: paginated legacy RFC / Internet-Draft text → [`RfcDocument`].
//!
//! The text format has no markup, so structure is recovered heuristically:
//! page furniture is stripped, paragraphs are split on blank lines, headings
//! are recognised by numbering or by well-known names, and anything that
//! looks laid out by hand (figures, tables, the table of contents) is kept
//! as a raw paragraph.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, instrument};

use rfctrans_shared::{
    DocumentMeta, Paragraph, PublishedDate, Result, RfcDocument, RfcId, RfcTransError, Section,
};

/// `RFC 8446                           TLS                          August 2018`
static PAGE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:RFC \d+|Internet-Draft)\s{2,}.*\S\s{2,}.*\d{4}\s*$").expect("valid regex")
});

/// `Rescorla                     Standards Track                    [Page 1]`
static PAGE_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S.*\s\[Page \d+\]\s*$").expect("valid regex"));

static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+(\S.*)$").expect("valid regex"));

static APPENDIX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Appendix\s+([A-Z](?:\.\d+)*)\.?\s*(?:[.:-]\s*)?(.*)$").expect("valid regex")
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{4})",
    )
    .expect("valid regex")
});

static NUMBER_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\s*,\s*\d+)*)").expect("valid regex"));

static FIGURE_MARKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\||\+-|-\+|={3,}|-{4,}|\.{4,}|<-+|-+>|::=").expect("valid regex")
});

static INTERNAL_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S {4,}\S").expect("valid regex"));

/// Unnumbered headings that appear in nearly every RFC.
const KNOWN_HEADINGS: &[&str] = &[
    "Abstract",
    "Status of This Memo",
    "Status of this Memo",
    "Copyright Notice",
    "Copyright Statement",
    "Table of Contents",
    "Acknowledgments",
    "Acknowledgements",
    "Contributors",
    "Author's Address",
    "Authors' Addresses",
    "Editor's Address",
    "Editors' Addresses",
    "Full Copyright Statement",
    "Intellectual Property",
    "Intellectual Property Statement",
    "Index",
    "Normative References",
    "Informative References",
    "References",
];

/// Sections whose paragraphs are never prose.
const RAW_SECTIONS: &[&str] = &[
    "table-of-contents",
    "author-s-address",
    "authors-addresses",
    "editor-s-address",
    "editors-addresses",
    "index",
];

/// Parse the plain-text rendering of an RFC or draft.
#[instrument(skip(text), fields(%id, len = text.len()))]
pub fn parse_rfc_text(text: &str, id: &RfcId) -> Result<RfcDocument> {
    let lines = strip_pagination(text);
    let blocks = split_blocks(&lines);

    let mut blocks = blocks.into_iter().peekable();
    let header = blocks
        .next()
        .ok_or_else(|| RfcTransError::parse(format!("{id}: document is empty")))?;
    let meta = header_meta(&header);
    let published = header_date(&header);

    let title_block = blocks
        .next_if(|b| heading(b).is_none())
        .ok_or_else(|| RfcTransError::parse(format!("{id}: no title after the header block")))?;
    let title = join_lines(title_lines(&title_block.lines));

    let mut sections: Vec<Section> = Vec::new();
    for block in blocks {
        if let Some((section_id, heading_title, rest)) = heading(&block) {
            sections.push(Section {
                id: section_id,
                title: heading_title,
                paragraphs: Vec::new(),
            });
            if let Some(rest) = rest {
                push_paragraph(&mut sections, rest);
            }
            continue;
        }
        push_paragraph(&mut sections, block);
    }

    for section in &mut sections {
        if RAW_SECTIONS.contains(&section.id.as_str()) {
            for paragraph in &mut section.paragraphs {
                paragraph.raw = true;
            }
        }
    }

    dedup_ids(&mut sections);

    debug!(sections = sections.len(), "parsed RFC text");
    Ok(RfcDocument {
        id: id.clone(),
        title,
        published,
        meta,
        sections,
        fetched_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Drop form feeds, page headers and page footers.
///
/// A paragraph interrupted by a page break is stitched back together when
/// the line before the break does not end a sentence.
fn strip_pagination(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut in_break = false;

    for raw in text.lines() {
        let line = raw.replace('\u{c}', "");
        let line = line.trim_end();

        if PAGE_FOOTER.is_match(line) {
            while out.last().is_some_and(|l| l.is_empty()) {
                out.pop();
            }
            in_break = true;
            continue;
        }

        if in_break {
            if line.is_empty() || PAGE_HEADER.is_match(line) {
                continue;
            }
            in_break = false;
            let continues = out
                .last()
                .is_some_and(|prev| !ends_sentence(prev) && leading_spaces(line) > 0);
            if !continues {
                out.push(String::new());
            }
        } else if PAGE_HEADER.is_match(line) && !out.is_empty() {
            continue;
        }

        out.push(line.to_string());
    }
    out
}

fn ends_sentence(line: &str) -> bool {
    line.trim_end().ends_with(['.', ':', ';', ')', ']', '"'])
}

// ---------------------------------------------------------------------------
// Blocks and paragraphs
// ---------------------------------------------------------------------------

/// A run of non-blank lines.
#[derive(Debug, Clone)]
struct Block {
    lines: Vec<String>,
}

fn split_blocks(lines: &[String]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(Block {
                    lines: std::mem::take(&mut current),
                });
            }
        } else {
            current.push(line.clone());
        }
    }
    if !current.is_empty() {
        blocks.push(Block { lines: current });
    }
    blocks
}

fn leading_spaces(line: &str) -> u16 {
    let n = line.len() - line.trim_start_matches(' ').len();
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn min_indent(lines: &[String]) -> u16 {
    lines.iter().map(|l| leading_spaces(l)).min().unwrap_or(0)
}

/// Title block without the `draft-...` name line drafts print under the title.
fn title_lines(lines: &[String]) -> &[String] {
    match lines.split_last() {
        Some((last, rest)) if !rest.is_empty() && last.trim().starts_with("draft-") => rest,
        _ => lines,
    }
}

fn join_lines(lines: &[String]) -> String {
    lines
        .iter()
        .flat_map(|l| l.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a block is laid out by hand rather than flowed prose.
fn looks_preformatted(lines: &[String]) -> bool {
    if lines
        .iter()
        .any(|l| FIGURE_MARKS.is_match(l) || INTERNAL_GAP.is_match(l.trim_start()))
    {
        return true;
    }
    let levels: BTreeSet<u16> = lines.iter().map(|l| leading_spaces(l)).collect();
    levels.len() > 2
}

fn to_paragraph(block: Block) -> Paragraph {
    let indent = min_indent(&block.lines);
    if looks_preformatted(&block.lines) {
        let text = block
            .lines
            .iter()
            .map(|l| l.get(usize::from(indent)..).unwrap_or("").trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        Paragraph::raw(indent, text)
    } else {
        Paragraph::text(indent, join_lines(&block.lines))
    }
}

fn push_paragraph(sections: &mut Vec<Section>, block: Block) {
    if sections.is_empty() {
        sections.push(Section {
            id: "preamble".into(),
            title: String::new(),
            paragraphs: Vec::new(),
        });
    }
    if let Some(section) = sections.last_mut() {
        section.paragraphs.push(to_paragraph(block));
    }
}

// ---------------------------------------------------------------------------
// Headings
// ---------------------------------------------------------------------------

/// Recognise a heading on the first line of `block`.
///
/// Returns the section id, the title, and the remainder of the block when
/// body text follows the heading without a blank line.
fn heading(block: &Block) -> Option<(String, String, Option<Block>)> {
    let first = block.lines.first()?;
    if leading_spaces(first) != 0 {
        return None;
    }
    let first = first.trim();

    let (id, title) = if let Some(caps) = NUMBERED_HEADING.captures(first) {
        // Numbered rows of a flush-left table are not headings.
        if INTERNAL_GAP.is_match(first) || caps[1].len() > 12 {
            return None;
        }
        (caps[1].to_string(), caps[2].trim().to_string())
    } else if let Some(caps) = APPENDIX_HEADING.captures(first) {
        (
            format!("appendix-{}", caps[1].to_lowercase()),
            caps[2].trim().to_string(),
        )
    } else if KNOWN_HEADINGS.contains(&first) {
        (slug(first), first.to_string())
    } else {
        return None;
    };

    let rest: Vec<String> = block.lines[1..].to_vec();
    let rest = (!rest.is_empty()).then_some(Block { lines: rest });
    Some((id, title, rest))
}

fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn dedup_ids(sections: &mut [Section]) {
    let mut seen = std::collections::HashSet::new();
    for section in sections.iter_mut() {
        let base = section.id.clone();
        let mut n = 2;
        while !seen.insert(section.id.clone()) {
            section.id = format!("{base}-{n}");
            n += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Header block
// ---------------------------------------------------------------------------

fn header_meta(header: &Block) -> DocumentMeta {
    let mut meta = DocumentMeta::default();
    for line in &header.lines {
        let left = left_column(line);
        if let Some(rest) = left.strip_prefix("Obsoletes:") {
            meta.obsoletes = numbers(rest);
        } else if let Some(rest) = left.strip_prefix("Updates:") {
            meta.updates = numbers(rest);
        } else if let Some(rest) = left.strip_prefix("Category:") {
            let category = rest.trim();
            if !category.is_empty() {
                meta.category = Some(category.to_string());
            }
        } else if let Some(rest) = left.strip_prefix("Intended status:") {
            let category = rest.trim();
            if !category.is_empty() {
                meta.category = Some(category.to_string());
            }
        }
    }
    meta
}

/// The two-column header is separated by a wide gap.
fn left_column(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.find("   ") {
        Some(pos) => trimmed[..pos].trim_end(),
        None => trimmed.trim_end(),
    }
}

fn numbers(raw: &str) -> Vec<String> {
    NUMBER_LIST
        .captures(raw)
        .map(|caps| {
            caps[1]
                .split(',')
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// The publication date is the last `Month YYYY` in the header block.
fn header_date(header: &Block) -> Option<PublishedDate> {
    header
        .lines
        .iter()
        .filter_map(|l| DATE.captures_iter(l).last())
        .last()
        .and_then(|caps| PublishedDate::from_parts(&caps[2], &caps[1]))
}
