//! Master index (`rfc-index.xml`) → [`IndexSnapshot`].

use tracing::{debug, instrument};

use rfctrans_shared::{IndexSnapshot, Result, RfcStatus, strip_rfc_prefix};

use crate::xml::XmlElement;

/// Parse the RFC Editor master index.
///
/// Only `rfc-entry` records with an `RFCnnnn` doc-id are kept; BCP, FYI,
/// STD and not-issued entries are skipped.
#[instrument(skip(xml), fields(len = xml.len()))]
pub fn parse_rfc_index(xml: &str) -> Result<IndexSnapshot> {
    let root = XmlElement::parse(xml)?;
    let mut snapshot = IndexSnapshot::default();

    for entry in root.children_named("rfc-entry") {
        let Some(number) = entry
            .child("doc-id")
            .map(|d| strip_rfc_prefix(&d.normalized_text()))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };

        let status = RfcStatus {
            title: entry
                .child("title")
                .map(XmlElement::normalized_text)
                .filter(|t| !t.is_empty()),
            obsoletes: doc_ids(entry, "obsoletes"),
            obsoleted_by: doc_ids(entry, "obsoleted-by"),
            updates: doc_ids(entry, "updates"),
            updated_by: doc_ids(entry, "updated-by"),
            current_status: entry
                .child("current-status")
                .map(|s| camel_case(&s.normalized_text()))
                .filter(|s| !s.is_empty()),
            wg: entry
                .child("wg_acronym")
                .map(XmlElement::normalized_text)
                .filter(|wg| !wg.is_empty() && !wg.contains(' ')),
        };
        snapshot.0.insert(number, status);
    }

    debug!(entries = snapshot.len(), "parsed master index");
    Ok(snapshot)
}

/// `<obsoletes><doc-id>RFC0793</doc-id>…</obsoletes>` → `["793", …]`.
fn doc_ids(entry: &XmlElement, list: &str) -> Vec<String> {
    entry
        .child(list)
        .map(|l| {
            l.children_named("doc-id")
                .map(|d| strip_rfc_prefix(&d.normalized_text()))
                .collect()
        })
        .unwrap_or_default()
}

/// `PROPOSED STANDARD` → `Proposed Standard`.
pub fn camel_case(status: &str) -> String {
    status
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rfc-index xmlns="https://www.rfc-editor.org/rfc-index">
  <bcp-entry><doc-id>BCP0014</doc-id></bcp-entry>
  <rfc-entry>
    <doc-id>RFC0793</doc-id>
    <title>Transmission Control Protocol</title>
    <obsoleted-by><doc-id>RFC9293</doc-id></obsoleted-by>
    <updated-by><doc-id>RFC1122</doc-id><doc-id>RFC3168</doc-id></updated-by>
    <current-status>INTERNET STANDARD</current-status>
    <wg_acronym>NON WORKING GROUP</wg_acronym>
  </rfc-entry>
  <rfc-not-issued-entry><doc-id>RFC0001x</doc-id></rfc-not-issued-entry>
  <rfc-entry>
    <doc-id>RFC8446</doc-id>
    <title>The Transport Layer Security (TLS) Protocol Version 1.3</title>
    <obsoletes><doc-id>RFC5077</doc-id><doc-id>RFC5246</doc-id></obsoletes>
    <updates><doc-id>RFC5705</doc-id></updates>
    <current-status>PROPOSED STANDARD</current-status>
    <wg_acronym>tls</wg_acronym>
  </rfc-entry>
</rfc-index>"#;

    #[test]
    fn parses_rfc_entries_only() {
        let snapshot = parse_rfc_index(SAMPLE).unwrap();
        assert_eq!(snapshot.numbers().collect::<Vec<_>>(), vec![793, 8446]);
    }

    #[test]
    fn maps_relations_and_status() {
        let snapshot = parse_rfc_index(SAMPLE).unwrap();

        let tcp = snapshot.get(793).unwrap();
        assert_eq!(tcp.obsoleted_by, vec!["9293"]);
        assert_eq!(tcp.updated_by, vec!["1122", "3168"]);
        assert_eq!(tcp.current_status.as_deref(), Some("Internet Standard"));
        assert_eq!(tcp.wg, None, "acronyms with spaces are dropped");

        let tls = snapshot.get(8446).unwrap();
        assert_eq!(tls.obsoletes, vec!["5077", "5246"]);
        assert_eq!(tls.updates, vec!["5705"]);
        assert_eq!(tls.current_status.as_deref(), Some("Proposed Standard"));
        assert_eq!(tls.wg.as_deref(), Some("tls"));
        assert_eq!(
            tls.title.as_deref(),
            Some("The Transport Layer Security (TLS) Protocol Version 1.3")
        );
    }

    #[test]
    fn camel_cases_status() {
        assert_eq!(camel_case("BEST CURRENT PRACTICE"), "Best Current Practice");
        assert_eq!(camel_case("UNKNOWN"), "Unknown");
        assert_eq!(camel_case(""), "");
    }
}
