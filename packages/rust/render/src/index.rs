//! Listing pages: `index.html` for RFCs, `draft/index.html` for drafts.

use tracing::instrument;

use rfctrans_shared::{IndexSnapshot, RfcId};

use crate::html::{close_document, esc, link, open_document, rfc_links};

/// One translated document as shown on a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: RfcId,
    pub title: String,
    pub translated_title: Option<String>,
}

impl IndexEntry {
    fn display_title(&self) -> &str {
        self.translated_title.as_deref().unwrap_or(&self.title)
    }
}

/// Render `html/index.html`: newest RFC first, annotated with status from
/// the master index snapshot when one is available.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn render_index(entries: &[IndexEntry], snapshot: Option<&IndexSnapshot>) -> String {
    let mut rows: Vec<(u32, &IndexEntry)> = entries
        .iter()
        .filter_map(|e| e.id.as_number().map(|n| (n, e)))
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0));

    let mut html = String::new();
    open_document(&mut html, "RFC translations", "style.css");
    html.push_str("<main>\n<h1>RFC translations</h1>\n");
    html.push_str(&format!("<p class=\"count\">{} documents</p>\n", rows.len()));
    html.push_str("<table class=\"rfc-index\">\n");
    html.push_str(
        "<thead><tr><th>RFC</th><th>Title</th><th>Status</th><th>Obsoleted by</th><th>WG</th></tr></thead>\n",
    );
    html.push_str("<tbody>\n");

    for (number, entry) in rows {
        let status = snapshot.and_then(|s| s.get(number));
        let obsoleted = status.is_some_and(|s| !s.obsoleted_by.is_empty());

        html.push_str(&format!(
            "<tr data-rfc=\"{number}\"{}>",
            if obsoleted { " class=\"obsoleted\"" } else { "" }
        ));
        html.push_str(&format!(
            "<td>{}</td>",
            link(&format!("rfc{number}.html"), &format!("RFC {number}"))
        ));
        html.push_str(&format!(
            "<td title=\"{}\">{}</td>",
            esc(&entry.title),
            esc(entry.display_title())
        ));
        html.push_str(&format!(
            "<td>{}</td>",
            esc(status
                .and_then(|s| s.current_status.as_deref())
                .unwrap_or_default())
        ));
        html.push_str(&format!(
            "<td>{}</td>",
            status
                .map(|s| rfc_links(&s.obsoleted_by, ""))
                .unwrap_or_default()
        ));
        html.push_str(&format!(
            "<td>{}</td>",
            esc(status.and_then(|s| s.wg.as_deref()).unwrap_or_default())
        ));
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n</main>\n");
    close_document(&mut html);
    html
}

/// Render `html/draft/index.html`, drafts ordered by name.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn render_draft_index(entries: &[IndexEntry]) -> String {
    let mut drafts: Vec<(&str, &IndexEntry)> = entries
        .iter()
        .filter_map(|e| match &e.id {
            RfcId::Draft(name) => Some((name.as_str(), e)),
            RfcId::Numbered(_) => None,
        })
        .collect();
    drafts.sort_by(|a, b| a.0.cmp(b.0));

    let mut html = String::new();
    open_document(&mut html, "Internet-Draft translations", "../style.css");
    html.push_str("<main>\n<h1>Internet-Draft translations</h1>\n");
    html.push_str(&format!("<p>{}</p>\n", link("../index.html", "RFC translations")));
    html.push_str("<ul class=\"draft-index\">\n");
    for (name, entry) in drafts {
        html.push_str(&format!(
            "<li>{} {}</li>\n",
            link(&format!("{name}.html"), name),
            esc(entry.display_title())
        ));
    }
    html.push_str("</ul>\n</main>\n");
    close_document(&mut html);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfctrans_shared::RfcStatus;

    fn entries() -> Vec<IndexEntry> {
        vec![
            IndexEntry {
                id: RfcId::number(5246),
                title: "TLS 1.2".into(),
                translated_title: Some("TLS 1.2 日本語".into()),
            },
            IndexEntry {
                id: RfcId::number(8446),
                title: "TLS 1.3".into(),
                translated_title: None,
            },
            IndexEntry {
                id: RfcId::draft("draft-b"),
                title: "B & co".into(),
                translated_title: None,
            },
            IndexEntry {
                id: RfcId::draft("draft-a"),
                title: "A".into(),
                translated_title: Some("エー".into()),
            },
        ]
    }

    #[test]
    fn index_lists_newest_first_with_status() {
        let mut snapshot = IndexSnapshot::default();
        snapshot.0.insert(
            5246,
            RfcStatus {
                obsoleted_by: vec!["8446".into()],
                current_status: Some("Proposed Standard".into()),
                wg: Some("tls".into()),
                ..Default::default()
            },
        );

        let html = render_index(&entries(), Some(&snapshot));
        let newest = html.find("data-rfc=\"8446\"").unwrap();
        let older = html.find("data-rfc=\"5246\"").unwrap();
        assert!(newest < older);
        assert!(html.contains("<tr data-rfc=\"5246\" class=\"obsoleted\">"));
        assert!(html.contains("TLS 1.2 日本語"));
        assert!(html.contains("<td>Proposed Standard</td>"));
        assert!(html.contains("<a href=\"rfc8446.html\">RFC 8446</a></td><td>tls</td>"));
        assert!(!html.contains("draft-a"));
        assert!(html.contains("2 documents"));
    }

    #[test]
    fn index_without_snapshot_has_empty_status() {
        let html = render_index(&entries(), None);
        assert!(html.contains("<td>TLS 1.3</td>") || html.contains(">TLS 1.3</td>"));
        assert!(!html.contains("obsoleted"));
    }

    #[test]
    fn draft_index_sorted_by_name() {
        let html = render_draft_index(&entries());
        let a = html.find("draft-a.html").unwrap();
        let b = html.find("draft-b.html").unwrap();
        assert!(a < b);
        assert!(html.contains("エー"));
        assert!(html.contains("B &amp; co"));
        assert!(!html.contains("rfc8446"));
    }
}
