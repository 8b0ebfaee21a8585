//! Bilingual HTML pages and index pages.
//!
//! Rendering is a pure function of its inputs: no timestamps, no hash-map
//! iteration, so identical inputs produce byte-identical output.
//!
//! Every paragraph becomes a row that a later `--make-json` pass can read
//! back:
//!
//! ```html
//! <div class="row" data-section="1" data-paragraph="0">
//!   <p class="text en">…</p>
//!   <p class="text ja">…</p>
//! </div>
//! ```

mod html;
pub mod index;

use tracing::{debug, instrument};

use rfctrans_shared::{
    RfcDocument, RfcId, RfcTransError, Result, SourcesConfig, SummaryRecord, TranslatedDocument,
    TranslatedParagraph, TranslatedSection,
};

use html::{close_document, esc, link, open_document, rfc_links};

pub use index::{IndexEntry, render_draft_index, render_index};

/// `data-section` of the document title row.
pub const TITLE_SECTION: &str = "title";

/// `data-paragraph` of section heading rows.
pub const HEADING_PARAGRAPH: &str = "title";

/// Render the bilingual page for one document.
///
/// Fails when `trans` no longer mirrors `doc` section by section.
#[instrument(skip_all, fields(id = %doc.id))]
pub fn render_page(
    doc: &RfcDocument,
    trans: &TranslatedDocument,
    summary: Option<&SummaryRecord>,
    sources: &SourcesConfig,
) -> Result<String> {
    if !trans.mirrors(doc) {
        return Err(RfcTransError::validation(format!(
            "translation of {} does not match its source document",
            doc.id
        )));
    }

    // Drafts live one directory below the RFC pages.
    let up = if doc.id.is_draft() { "../" } else { "" };
    let label = document_label(&doc.id);
    let page_title = match &trans.title.translated {
        Some(t) => format!("{label} - {t}"),
        None => format!("{label} - {}", doc.title),
    };

    let mut html = String::new();
    open_document(&mut html, &page_title, &format!("{up}style.css"));

    navigation(&mut html, &doc.id, sources, "header");
    html.push_str("<main>\n");

    html.push_str(&format!(
        "<div class=\"row title\" data-section=\"{TITLE_SECTION}\" data-paragraph=\"{HEADING_PARAGRAPH}\">\n"
    ));
    html.push_str(&format!(
        "<h1 class=\"text en\">{}: {}</h1>\n",
        esc(&label),
        esc(&doc.title)
    ));
    html.push_str(&format!(
        "<h1 class=\"text ja\">{}</h1>\n",
        esc(trans.title.translated.as_deref().unwrap_or_default())
    ));
    html.push_str("</div>\n");

    metadata(&mut html, doc);

    if let Some(summary) = summary {
        summary_block(&mut html, summary);
    }

    for section in &trans.sections {
        section_block(&mut html, section);
    }

    html.push_str("</main>\n");
    navigation(&mut html, &doc.id, sources, "footer");
    close_document(&mut html);

    debug!(bytes = html.len(), "page rendered");
    Ok(html)
}

/// `RFC 8446`, or the draft name.
pub fn document_label(id: &RfcId) -> String {
    match id {
        RfcId::Numbered(n) => format!("RFC {n}"),
        RfcId::Draft(name) => name.clone(),
    }
}

/// Heading text as printed in the original: `4.2. Title`, `Appendix A. Title`.
pub fn heading_label(section_id: &str, title: &str) -> String {
    if section_id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{section_id}. {title}")
    } else if let Some(rest) = section_id.strip_prefix("appendix-") {
        format!("Appendix {}. {title}", rest.to_uppercase())
    } else {
        title.to_string()
    }
}

fn navigation(html: &mut String, id: &RfcId, sources: &SourcesConfig, tag: &str) {
    let original = match id {
        RfcId::Numbered(n) => sources.rfc_html_url(*n),
        RfcId::Draft(name) => sources.draft_txt_url(name),
    };
    html.push_str(&format!("<{tag} class=\"nav\">\n"));
    html.push_str(&link("index.html", "Index"));
    html.push_str(" | ");
    html.push_str(&link(&original, "Original"));
    html.push_str(&format!("\n</{tag}>\n"));
}

fn metadata(html: &mut String, doc: &RfcDocument) {
    let mut items = Vec::new();
    let prefix = if doc.id.is_draft() { "../" } else { "" };

    if !doc.meta.obsoletes.is_empty() {
        items.push(format!(
            "Obsoletes: {}",
            rfc_links(&doc.meta.obsoletes, prefix)
        ));
    }
    if !doc.meta.updates.is_empty() {
        items.push(format!("Updates: {}", rfc_links(&doc.meta.updates, prefix)));
    }
    if let Some(category) = &doc.meta.category {
        items.push(format!("Category: {}", esc(category)));
    }
    if let Some(wg) = &doc.meta.wg {
        items.push(format!("Working Group: {}", esc(wg)));
    }
    if let Some(date) = &doc.published {
        items.push(format!("Published: {} {}", date.month_name(), date.year));
    }

    if items.is_empty() {
        return;
    }
    html.push_str("<ul class=\"meta\">\n");
    for item in items {
        html.push_str(&format!("<li>{item}</li>\n"));
    }
    html.push_str("</ul>\n");
}

fn summary_block(html: &mut String, summary: &SummaryRecord) {
    html.push_str(&format!(
        "<section class=\"summary\" data-model=\"{}\">\n",
        esc(&summary.model)
    ));
    html.push_str(&format!("<h2>Summary ({})</h2>\n", esc(&summary.model)));
    for paragraph in &summary.summary {
        html.push_str(&format!("<p>{}</p>\n", esc(paragraph)));
    }
    html.push_str("</section>\n");
}

fn section_block(html: &mut String, section: &TranslatedSection) {
    let sid = esc(&section.id);
    html.push_str(&format!(
        "<section id=\"section-{sid}\" data-section=\"{sid}\">\n"
    ));

    if !section.title.text.is_empty() {
        html.push_str(&format!(
            "<div class=\"row heading\" data-section=\"{sid}\" data-paragraph=\"{HEADING_PARAGRAPH}\">\n"
        ));
        html.push_str(&format!(
            "<h2 class=\"text en\">{}</h2>\n",
            esc(&heading_label(&section.id, &section.title.text))
        ));
        let translated = section
            .title
            .translated
            .as_deref()
            .map(|t| heading_label(&section.id, t))
            .unwrap_or_default();
        html.push_str(&format!("<h2 class=\"text ja\">{}</h2>\n", esc(&translated)));
        html.push_str("</div>\n");
    }

    for (i, paragraph) in section.paragraphs.iter().enumerate() {
        paragraph_row(html, &sid, i, paragraph);
    }

    html.push_str("</section>\n");
}

fn paragraph_row(html: &mut String, sid: &str, index: usize, paragraph: &TranslatedParagraph) {
    let indent = paragraph.indent;
    if paragraph.raw {
        html.push_str(&format!(
            "<div class=\"row raw\" data-section=\"{sid}\" data-paragraph=\"{index}\" data-indent=\"{indent}\">\n"
        ));
        html.push_str(&format!(
            "<pre class=\"text en\">{}</pre>\n",
            esc(&paragraph.text)
        ));
        html.push_str("</div>\n");
        return;
    }

    let pending = if paragraph.translated.is_none() {
        " pending"
    } else {
        ""
    };
    html.push_str(&format!(
        "<div class=\"row\" data-section=\"{sid}\" data-paragraph=\"{index}\" data-indent=\"{indent}\">\n"
    ));
    html.push_str(&format!("<p class=\"text en\">{}</p>\n", esc(&paragraph.text)));
    html.push_str(&format!(
        "<p class=\"text ja{pending}\">{}</p>\n",
        esc(paragraph.translated.as_deref().unwrap_or_default())
    ));
    html.push_str("</div>\n");
}
