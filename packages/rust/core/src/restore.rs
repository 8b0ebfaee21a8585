//! `--make-json`: read hand-corrected translations back out of a rendered page.

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

use rfctrans_render::{HEADING_PARAGRAPH, TITLE_SECTION, heading_label};
use rfctrans_shared::{Result, RfcId, RfcTransError, TranslatedDocument};
use rfctrans_storage::ArtifactStore;

/// Rebuild the translation artifact of `id` from `html/<id>.html`.
///
/// Rows are matched by `data-section` / `data-paragraph`; rows that do not
/// match the source document are ignored. An empty translated cell becomes
/// pending again.
#[instrument(skip(store), fields(%id))]
pub fn make_json(store: &ArtifactStore, id: &RfcId) -> Result<TranslatedDocument> {
    let source = store
        .load_document(id)?
        .ok_or_else(|| RfcTransError::MissingSourceDocument(id.id()))?;
    let html = store.read_page(id)?.ok_or_else(|| {
        RfcTransError::validation(format!("no rendered page for {id}, run --make first"))
    })?;

    let mut trans = match store.load_translation(id)? {
        Some(t) if t.mirrors(&source) => t,
        _ => TranslatedDocument::pending(&source, "manual"),
    };

    let page = Html::parse_document(&html);
    let rows = selector("div.row[data-section][data-paragraph]")?;
    let ja = selector(".text.ja")?;

    let mut updated = 0usize;
    for row in page.select(&rows) {
        let element = row.value();
        let (Some(section_id), Some(paragraph)) =
            (element.attr("data-section"), element.attr("data-paragraph"))
        else {
            continue;
        };
        let Some(cell) = row.select(&ja).next() else {
            continue;
        };
        let text = cell.text().collect::<String>().trim().to_string();
        let value = (!text.is_empty()).then_some(text);

        if section_id == TITLE_SECTION && paragraph == HEADING_PARAGRAPH {
            trans.title.translated = value;
            updated += 1;
            continue;
        }

        let Some(section) = trans.sections.iter_mut().find(|s| s.id == section_id) else {
            warn!(section = section_id, "row for unknown section ignored");
            continue;
        };

        if paragraph == HEADING_PARAGRAPH {
            let prefix = heading_label(&section.id, "");
            section.title.translated =
                value.map(|v| v.strip_prefix(&prefix).map(str::to_string).unwrap_or(v));
            updated += 1;
            continue;
        }

        let target = paragraph
            .parse::<usize>()
            .ok()
            .and_then(|i| section.paragraphs.get_mut(i));
        match target {
            Some(p) if !p.raw => {
                p.translated = value;
                updated += 1;
            }
            Some(_) => {}
            None => debug!(section = section_id, paragraph, "row without a paragraph ignored"),
        }
    }

    let path = store.save_translation(&trans)?;
    info!(rows = updated, path = %path.display(), "translation rebuilt from page");
    Ok(trans)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| RfcTransError::parse(format!("invalid selector {css}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_document;
    use rfctrans_render::render_page;
    use rfctrans_shared::SourcesConfig;

    #[test]
    fn round_trips_edited_page() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("data"), dir.path().join("html"));
        let doc = sample_document(8446);
        store.save_document(&doc).unwrap();

        let mut trans = TranslatedDocument::pending(&doc, "echo");
        trans.title.translated = Some("TLS プロトコル".into());
        trans.sections[1].title.translated = Some("はじめに".into());
        trans.sections[1].paragraphs[0].translated = Some("機械翻訳".into());
        let html = render_page(&doc, &trans, None, &SourcesConfig::default()).unwrap();
        // Hand correction on the rendered page.
        let edited = html.replace("機械翻訳", "人手で修正した訳 &amp; 注記");
        store.write_page(&doc.id, &edited).unwrap();

        let rebuilt = make_json(&store, &doc.id).unwrap();
        assert_eq!(rebuilt.title.translated.as_deref(), Some("TLS プロトコル"));
        assert_eq!(rebuilt.sections[1].title.translated.as_deref(), Some("はじめに"));
        assert_eq!(
            rebuilt.sections[1].paragraphs[0].translated.as_deref(),
            Some("人手で修正した訳 & 注記")
        );
        assert_eq!(rebuilt.sections[1].paragraphs[1].translated, None);
        assert_eq!(rebuilt.sections[0].paragraphs[0].translated, None);

        let stored = store.load_translation(&doc.id).unwrap().unwrap();
        assert_eq!(stored, rebuilt);
    }

    #[test]
    fn missing_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("data"), dir.path().join("html"));
        let doc = sample_document(8446);
        store.save_document(&doc).unwrap();
        assert!(matches!(
            make_json(&store, &doc.id).unwrap_err(),
            RfcTransError::Validation { .. }
        ));
    }
}
