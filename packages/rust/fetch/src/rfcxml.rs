//! Structured-XML strategy: RFCXML v3 source → [`RfcDocument`].

use chrono::Utc;
use tracing::{debug, instrument};

use rfctrans_shared::{
    DocumentMeta, Paragraph, PublishedDate, Result, RfcDocument, RfcId, RfcTransError, Section,
};

use crate::xml::{XmlElement, XmlNode, collapse_whitespace};

/// Indent of body paragraphs, matching the plain-text layout.
const BODY_INDENT: u16 = 3;

/// Indent added per list or quote level.
const NEST_INDENT: u16 = 3;

/// Parse RFCXML v3 into the normalized document shape.
#[instrument(skip(xml), fields(%id, len = xml.len()))]
pub fn parse_rfc_xml(xml: &str, id: &RfcId) -> Result<RfcDocument> {
    let root = XmlElement::parse(xml)?;
    if root.name != "rfc" {
        return Err(RfcTransError::parse(format!(
            "expected <rfc> root element, found <{}>",
            root.name
        )));
    }

    let front = root
        .child("front")
        .ok_or_else(|| RfcTransError::parse("missing <front>"))?;

    let title = front
        .child("title")
        .map(XmlElement::normalized_text)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RfcTransError::parse("missing <front><title>"))?;

    let mut sections = Vec::new();

    if let Some(abstract_el) = front.child("abstract") {
        let mut paragraphs = Vec::new();
        blocks(abstract_el, BODY_INDENT, &mut paragraphs);
        sections.push(Section {
            id: "abstract".into(),
            title: "Abstract".into(),
            paragraphs,
        });
    }

    for note in front.children_named("note") {
        let title = note
            .child("name")
            .map(XmlElement::normalized_text)
            .unwrap_or_else(|| "Note".into());
        let mut paragraphs = Vec::new();
        blocks(note, BODY_INDENT, &mut paragraphs);
        sections.push(Section {
            id: slug(&title),
            title,
            paragraphs,
        });
    }

    let mut counter = Vec::new();
    if let Some(middle) = root.child("middle") {
        walk_sections(middle, &mut counter, &mut sections);
    }
    if let Some(back) = root.child("back") {
        walk_sections(back, &mut counter, &mut sections);
    }

    dedup_ids(&mut sections);

    let document = RfcDocument {
        id: id.clone(),
        title,
        published: published_date(&root),
        meta: document_meta(&root),
        sections,
        fetched_at: Utc::now(),
    };

    debug!(sections = document.sections.len(), "parsed RFC XML");
    Ok(document)
}

/// Publication month from `/rfc/front/date`, if present and well-formed.
pub fn published_date(root: &XmlElement) -> Option<PublishedDate> {
    let date = root.path(&["front", "date"])?;
    PublishedDate::from_parts(date.attr("year")?, date.attr("month")?)
}

fn document_meta(root: &XmlElement) -> DocumentMeta {
    DocumentMeta {
        obsoletes: number_list(root.attr("obsoletes")),
        updates: number_list(root.attr("updates")),
        category: root.attr("category").map(category_name),
        status: None,
        wg: root
            .path(&["front", "workgroup"])
            .map(XmlElement::normalized_text)
            .filter(|w| !w.is_empty()),
    }
}

/// `"5077, 5246,6961"` → `["5077", "5246", "6961"]`.
fn number_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split([',', ' '])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn category_name(code: &str) -> String {
    match code {
        "std" => "Standards Track".into(),
        "bcp" => "Best Current Practice".into(),
        "info" => "Informational".into(),
        "exp" => "Experimental".into(),
        "historic" => "Historic".into(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Flatten nested `<section>` and `<references>` elements in document order.
fn walk_sections(parent: &XmlElement, counter: &mut Vec<u32>, out: &mut Vec<Section>) {
    for element in parent.elements() {
        match element.name.as_str() {
            "section" => {
                bump(counter);
                let title = element.child("name").map(prose).unwrap_or_default();
                let mut paragraphs = Vec::new();
                blocks(element, BODY_INDENT, &mut paragraphs);
                out.push(Section {
                    id: section_id(element, counter),
                    title,
                    paragraphs,
                });

                counter.push(0);
                walk_sections(element, counter, out);
                counter.pop();
            }
            "references" => {
                bump(counter);
                let title = element
                    .child("name")
                    .map(XmlElement::normalized_text)
                    .unwrap_or_else(|| "References".into());
                let paragraphs = element
                    .children_named("reference")
                    .map(|r| Paragraph::raw(BODY_INDENT, reference_line(r)))
                    .collect();
                out.push(Section {
                    id: section_id(element, counter),
                    title,
                    paragraphs,
                });

                counter.push(0);
                walk_sections(element, counter, out);
                counter.pop();
            }
            _ => {}
        }
    }
}

fn bump(counter: &mut Vec<u32>) {
    match counter.last_mut() {
        Some(last) => *last += 1,
        None => counter.push(1),
    }
}

/// `pn="section-4.2"` → `4.2`, `pn="section-appendix.a"` → `appendix-a`;
/// positional numbering when `pn` is absent.
fn section_id(element: &XmlElement, counter: &[u32]) -> String {
    if let Some(pn) = element.attr("pn") {
        let stripped = pn.strip_prefix("section-").unwrap_or(pn);
        return match stripped.strip_prefix("appendix.") {
            Some(rest) => format!("appendix-{rest}").to_lowercase(),
            None => stripped.to_lowercase(),
        };
    }
    if let Some(anchor) = element.attr("anchor") {
        return anchor.to_lowercase();
    }
    counter
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
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

fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `[RFC8446]  Rescorla, E., "The Transport Layer Security ...", RFC 8446, August 2018.`
fn reference_line(reference: &XmlElement) -> String {
    let anchor = reference.attr("anchor").unwrap_or("?");
    let front = reference.child("front");

    let authors: Vec<String> = front
        .map(|f| {
            f.children_named("author")
                .filter_map(|a| {
                    a.attr("surname")
                        .map(String::from)
                        .or_else(|| a.child("organization").map(XmlElement::normalized_text))
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let title = front
        .and_then(|f| f.child("title"))
        .map(XmlElement::normalized_text)
        .unwrap_or_default();

    let series: Vec<String> = reference
        .children_named("seriesInfo")
        .chain(front.into_iter().flat_map(|f| f.children_named("seriesInfo")))
        .filter_map(|s| Some(format!("{} {}", s.attr("name")?, s.attr("value")?)))
        .collect();

    let mut line = format!("[{anchor}]  ");
    if !authors.is_empty() {
        line.push_str(&authors.join(", "));
        line.push_str(", ");
    }
    line.push_str(&format!("\"{title}\""));
    for s in series {
        line.push_str(", ");
        line.push_str(&s);
    }
    line.push('.');
    line
}

// ---------------------------------------------------------------------------
// Block content
// ---------------------------------------------------------------------------

/// Convert the block-level children of `parent` into paragraphs.
fn blocks(parent: &XmlElement, indent: u16, out: &mut Vec<Paragraph>) {
    for element in parent.elements() {
        block(element, indent, out);
    }
}

fn block(element: &XmlElement, indent: u16, out: &mut Vec<Paragraph>) {
    match element.name.as_str() {
        "t" => push_text(out, indent, prose(element)),
        "ul" | "ol" => list(element, indent, out),
        "dl" => {
            for item in element.elements() {
                match item.name.as_str() {
                    "dt" => push_text(out, indent, prose(item)),
                    "dd" => item_content(item, indent + NEST_INDENT, None, out),
                    _ => {}
                }
            }
        }
        "artwork" if element.attr("type") == Some("svg") => {}
        "artset" => {
            // Same figure in several formats: keep the plain-text one.
            let artworks: Vec<&XmlElement> = element.children_named("artwork").collect();
            let chosen = artworks
                .iter()
                .find(|a| a.attr("type") == Some("ascii-art"))
                .or_else(|| artworks.iter().find(|a| a.attr("type") != Some("svg")));
            if let Some(art) = chosen {
                block(art, indent, out);
            }
        }
        "artwork" | "sourcecode" => {
            let art = trim_blank_lines(&element.text());
            if !art.is_empty() {
                out.push(Paragraph::raw(indent + NEST_INDENT, art));
            }
        }
        "figure" => {
            for child in element.elements() {
                if child.name != "name" {
                    block(child, indent, out);
                }
            }
            if let Some(name) = element.child("name") {
                push_text(out, indent, prose(name));
            }
        }
        "table" => {
            let table = table_text(element);
            if !table.is_empty() {
                out.push(Paragraph::raw(indent + NEST_INDENT, table));
            }
        }
        "blockquote" | "aside" => blocks(element, indent + NEST_INDENT, out),
        // Handled by the section walker, or not content.
        "name" | "section" | "references" | "iref" | "anchor-alias" => {}
        _ => push_text(out, indent, prose(element)),
    }
}

/// Flowed text of `element`, with inline references spelled out.
fn prose(element: &XmlElement) -> String {
    let mut out = String::new();
    inline_text(element, &mut out);
    collapse_whitespace(&out)
}

fn inline_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(e) => match e.name.as_str() {
                "xref" => out.push_str(&xref_text(e)),
                "eref" => out.push_str(&eref_text(e)),
                "iref" => {}
                _ => inline_text(e, out),
            },
        }
    }
}

/// `<xref target="RFC2119"/>` → `[RFC2119]`; an xref with content keeps it.
fn xref_text(xref: &XmlElement) -> String {
    let own = prose(xref);
    if !own.is_empty() {
        return own;
    }
    xref.attr("derivedContent")
        .filter(|c| !c.is_empty())
        .or_else(|| xref.attr("target"))
        .map(|label| format!("[{label}]"))
        .unwrap_or_default()
}

/// `<eref target="https://x" brackets="angle"/>` → `<https://x>`.
fn eref_text(eref: &XmlElement) -> String {
    let own = prose(eref);
    if !own.is_empty() {
        return own;
    }
    let target = eref.attr("target").unwrap_or_default();
    match eref.attr("brackets") {
        Some("angle") if !target.is_empty() => format!("<{target}>"),
        _ => target.to_string(),
    }
}

fn list(element: &XmlElement, indent: u16, out: &mut Vec<Paragraph>) {
    let ordered = element.name == "ol";
    let start: usize = element
        .attr("start")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    for (i, item) in element.children_named("li").enumerate() {
        let marker = if ordered {
            format!("{}.", start + i)
        } else {
            "*".to_string()
        };
        item_content(item, indent, Some(marker), out);
    }
}

/// Emit a list item or definition body, prefixing the first paragraph with `marker`.
fn item_content(item: &XmlElement, indent: u16, marker: Option<String>, out: &mut Vec<Paragraph>) {
    let first = out.len();
    let has_blocks = item
        .elements()
        .any(|e| matches!(e.name.as_str(), "t" | "ul" | "ol" | "dl" | "artwork" | "artset" | "sourcecode" | "figure"));

    if has_blocks {
        blocks(item, indent, out);
    } else {
        push_text(out, indent, prose(item));
    }

    if let (Some(marker), Some(paragraph)) = (marker, out.get_mut(first)) {
        if !paragraph.raw {
            paragraph.text = format!("{marker}  {}", paragraph.text);
        }
    }
}

fn push_text(out: &mut Vec<Paragraph>, indent: u16, text: String) {
    if !text.is_empty() {
        out.push(Paragraph::text(indent, text));
    }
}

fn table_text(table: &XmlElement) -> String {
    let mut rows = Vec::new();
    for part in table.elements() {
        let row_elements: Vec<&XmlElement> = match part.name.as_str() {
            "thead" | "tbody" | "tfoot" => part.children_named("tr").collect(),
            "tr" => vec![part],
            _ => continue,
        };
        for tr in row_elements {
            let cells: Vec<String> = tr
                .elements()
                .filter(|c| c.name == "td" || c.name == "th")
                .map(prose)
                .collect();
            rows.push(format!("| {} |", cells.join(" | ")));
        }
    }
    rows.join("\n")
}

/// Drop leading/trailing blank lines and trailing spaces, keep inner layout.
fn trim_blank_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE rfc [
  <!ENTITY nbsp "&#160;">
]>
<rfc xmlns:xi="http://www.w3.org/2001/XInclude" number="8700" obsoletes="5077, 5246" updates="6066" category="std" submissionType="IETF">
  <front>
    <title abbrev="Example">An Example
      Protocol</title>
    <date month="December" year="2019"/>
    <workgroup>tls</workgroup>
    <abstract pn="section-abstract">
      <t>This document specifies an example&nbsp;protocol.</t>
    </abstract>
  </front>
  <middle>
    <section pn="section-1">
      <name>Introduction</name>
      <t>First   paragraph
         wraps.</t>
      <ul>
        <li>one</li>
        <li><t>two</t></li>
      </ul>
      <section pn="section-1.1">
        <name>Terminology</name>
        <t>The key words "MUST" ...</t>
      </section>
    </section>
    <section pn="section-2">
      <name>Wire Format</name>
      <figure>
        <name>Header</name>
        <artwork><![CDATA[
   +--------+
   | header |
   +--------+
]]></artwork>
      </figure>
      <sourcecode>struct { uint8 x; } X;</sourcecode>
    </section>
  </middle>
  <back>
    <references pn="section-3">
      <name>Normative References</name>
      <reference anchor="RFC2119">
        <front>
          <title>Key words for use in RFCs</title>
          <author surname="Bradner"/>
        </front>
        <seriesInfo name="RFC" value="2119"/>
      </reference>
    </references>
    <section pn="section-appendix.a">
      <name>Changes</name>
      <t>None.</t>
    </section>
  </back>
</rfc>"#;

    fn parse() -> RfcDocument {
        parse_rfc_xml(SAMPLE, &RfcId::number(8700)).expect("parse sample")
    }

    #[test]
    fn extracts_front_matter() {
        let doc = parse();
        assert_eq!(doc.title, "An Example Protocol");
        assert_eq!(doc.published, Some(PublishedDate::new(2019, 12)));
        assert_eq!(doc.meta.obsoletes, vec!["5077", "5246"]);
        assert_eq!(doc.meta.updates, vec!["6066"]);
        assert_eq!(doc.meta.category.as_deref(), Some("Standards Track"));
        assert_eq!(doc.meta.wg.as_deref(), Some("tls"));
    }

    #[test]
    fn flattens_sections_in_order() {
        let doc = parse();
        let ids: Vec<&str> = doc.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["abstract", "1", "1.1", "2", "3", "appendix-a"]);
        assert_eq!(doc.sections[1].title, "Introduction");
        assert_eq!(
            doc.sections[0].paragraphs[0].text,
            "This document specifies an example protocol."
        );
    }

    #[test]
    fn converts_blocks() {
        let doc = parse();
        let intro = &doc.sections[1].paragraphs;
        assert_eq!(intro[0].text, "First paragraph wraps.");
        assert_eq!(intro[1].text, "*  one");
        assert_eq!(intro[2].text, "*  two");
        // nested section content is not duplicated into its parent
        assert_eq!(intro.len(), 3);

        let wire = &doc.sections[3].paragraphs;
        assert!(wire[0].raw);
        assert!(wire[0].text.contains("| header |"));
        assert!(!wire[0].text.starts_with('\n'));
        assert_eq!(wire[1].text, "Header");
        assert!(!wire[1].raw);
        assert!(wire[2].raw);
    }

    #[test]
    fn references_are_raw() {
        let doc = parse();
        let refs = &doc.sections[4];
        assert_eq!(refs.title, "Normative References");
        assert!(refs.paragraphs[0].raw);
        assert_eq!(
            refs.paragraphs[0].text,
            "[RFC2119]  Bradner, \"Key words for use in RFCs\", RFC 2119."
        );
    }

    #[test]
    fn inline_references_keep_their_labels() {
        let xml = r#"<rfc><front><title>T</title></front><middle><section pn="section-1">
            <name>Terminology</name>
            <t>The key words are described in <xref target="BCP14" derivedContent="BCP 14"/>
               <xref target="RFC2119" derivedContent="RFC2119"/> and
               <xref target="RFC8174"/>. See <eref target="https://example.com/x" brackets="angle"/>,
               <eref target="https://example.com/y">the registry</eref> and
               <xref target="sec-2" format="none">Section 2</xref>.</t>
            </section></middle></rfc>"#;
        let doc = parse_rfc_xml(xml, &RfcId::number(9000)).unwrap();
        assert_eq!(
            doc.sections[0].paragraphs[0].text,
            "The key words are described in [BCP 14] [RFC2119] and [RFC8174]. \
             See <https://example.com/x>, the registry and Section 2."
        );
    }

    #[test]
    fn artset_keeps_only_ascii_art() {
        let xml = r#"<rfc><front><title>T</title></front><middle><section pn="section-1">
            <name>Layout</name>
            <figure><name>Box</name><artset>
              <artwork type="svg"><svg><text>A</text></svg></artwork>
              <artwork type="ascii-art">
+---+
| A |
+---+
</artwork>
            </artset></figure>
            </section></middle></rfc>"#;
        let doc = parse_rfc_xml(xml, &RfcId::number(9000)).unwrap();
        let paragraphs = &doc.sections[0].paragraphs;
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].raw);
        assert_eq!(paragraphs[0].text, "+---+\n| A |\n+---+");
        assert_eq!(paragraphs[1].text, "Box");
        assert!(!paragraphs[1].raw);
    }

    #[test]
    fn rejects_non_rfc_root() {
        let err = parse_rfc_xml("<html><body/></html>", &RfcId::number(1)).unwrap_err();
        assert!(err.to_string().contains("<rfc>"));
    }

    #[test]
    fn positional_ids_without_pn() {
        let xml = r#"<rfc><front><title>T</title></front><middle>
            <section><name>A</name><section><name>B</name></section></section>
            <section><name>C</name></section></middle></rfc>"#;
        let doc = parse_rfc_xml(xml, &RfcId::number(9000)).unwrap();
        let ids: Vec<&str> = doc.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "1.1", "2"]);
        assert_eq!(doc.published, None);
    }
}
