//! Resumable machine translation of stored documents.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use rfctrans_shared::{Result, RfcId, RfcTransError, TranslatedDocument, TranslatorConfig};
use rfctrans_storage::ArtifactStore;

use crate::pipeline::ProgressReporter;

/// A text translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Backend name recorded in translation artifacts.
    fn name(&self) -> &str;

    async fn translate(&self, text: &str) -> Result<String>;
}

/// Client for a Google-translate compatible `translate_a/single` endpoint.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
    source_lang: String,
    target_lang: String,
    delay: Duration,
}

impl GoogleTranslator {
    pub fn new(client: Client, config: &TranslatorConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| RfcTransError::Translation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RfcTransError::Translation(format!(
                "translation endpoint returned HTTP {status}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RfcTransError::Translation(format!("invalid response body: {e}")))?;

        let translated = join_segments(&json)?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(translated)
    }
}

/// Concatenate the translated segments of `[[["out","in",..],..],..]`.
fn join_segments(json: &serde_json::Value) -> Result<String> {
    let segments = json
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| RfcTransError::Translation("unexpected response shape".into()))?;

    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(RfcTransError::Translation("empty translation".into()));
    }
    Ok(text)
}

/// Collapse wrapped lines so the backend sees one sentence stream.
fn unwrap_lines(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Translate the stored source of `id`, resuming any partial translation.
///
/// The translation is persisted after the title and after every section
/// that changed, so an interrupted run picks up where it stopped.
#[instrument(skip(store, translator, progress), fields(%id))]
pub async fn translate_rfc(
    store: &ArtifactStore,
    translator: &dyn Translator,
    id: &RfcId,
    force: bool,
    progress: &dyn ProgressReporter,
) -> Result<TranslatedDocument> {
    let source = store
        .load_document(id)?
        .ok_or_else(|| RfcTransError::MissingSourceDocument(id.id()))?;

    let mut trans = match store.load_translation(id)? {
        Some(existing) if !force && existing.mirrors(&source) => {
            if existing.is_complete() {
                debug!("translation already complete");
                return Ok(existing);
            }
            info!(pending = existing.pending_count(), "resuming partial translation");
            existing
        }
        Some(_) if !force => {
            warn!("stored translation no longer matches the source, starting over");
            TranslatedDocument::pending(&source, translator.name())
        }
        _ => TranslatedDocument::pending(&source, translator.name()),
    };

    info!(pending = trans.pending_count(), "translating");

    if trans.title.is_pending() {
        let title = translator.translate(&unwrap_lines(&trans.title.text)).await?;
        trans.title.translated = Some(title);
        store.save_translation(&trans)?;
    }

    let total = trans.sections.len();
    for i in 0..total {
        let section = &mut trans.sections[i];
        let mut changed = false;

        if !section.title.text.is_empty() && section.title.is_pending() {
            let title = translator.translate(&section.title.text).await?;
            section.title.translated = Some(title);
            changed = true;
        }

        for paragraph in section.paragraphs.iter_mut().filter(|p| p.is_pending()) {
            let translated = translator.translate(&unwrap_lines(&paragraph.text)).await?;
            paragraph.translated = Some(translated);
            changed = true;
        }

        if changed {
            store.save_translation(&trans)?;
        }
        progress.section_translated(i + 1, total);
    }

    trans.translated_at = Some(Utc::now());
    let path = store.save_translation(&trans)?;
    info!(path = %path.display(), "translation saved");
    Ok(trans)
}

/// Sentences used by `--transtest`.
const SAMPLE_TEXTS: &[&str] = &[
    "This document specifies version 1.3 of the Transport Layer Security (TLS) protocol.",
    "TLS allows client/server applications to communicate over the Internet in a way \
     that is designed to prevent eavesdropping, tampering, and message forgery.",
    "The key words \"MUST\", \"MUST NOT\", \"REQUIRED\", \"SHALL\", and \"SHALL NOT\" in \
     this document are to be interpreted as described in BCP 14.",
];

/// Translate a fixed sample through the backend without touching any artifact.
#[instrument(skip(translator))]
pub async fn translate_sample(translator: &dyn Translator) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(SAMPLE_TEXTS.len());
    for text in SAMPLE_TEXTS {
        let translated = translator.translate(&unwrap_lines(text)).await?;
        pairs.push(((*text).to_string(), translated));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use crate::testing::{EchoTranslator, FailingTranslator, sample_document};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(dir: &std::path::Path) -> ArtifactStore {
        ArtifactStore::new(dir.join("data"), dir.join("html"))
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = translate_rfc(
            &store(dir.path()),
            &EchoTranslator::default(),
            &RfcId::number(1),
            false,
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RfcTransError::MissingSourceDocument(ref id) if id == "1"));
    }

    #[tokio::test]
    async fn translates_everything_but_raw_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let doc = sample_document(8446);
        store.save_document(&doc).unwrap();

        let translator = EchoTranslator::default();
        let trans = translate_rfc(&store, &translator, &doc.id, false, &SilentProgress)
            .await
            .unwrap();

        assert!(trans.is_complete());
        assert!(trans.translated_at.is_some());
        assert_eq!(trans.title.translated.as_deref(), Some("[ja] The TLS Protocol"));
        let figure = &trans.sections[1].paragraphs[1];
        assert!(figure.raw);
        assert_eq!(figure.translated, None);
        // wrapped lines are joined
        assert!(translator.inputs().contains(&"first line second line".to_string()));
        assert!(!translator.inputs().iter().any(|t| t.contains('+')));

        let stored = store.load_translation(&doc.id).unwrap().unwrap();
        assert_eq!(stored, trans);
    }

    #[tokio::test]
    async fn complete_translation_is_not_redone() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let doc = sample_document(8446);
        store.save_document(&doc).unwrap();

        let first = EchoTranslator::default();
        translate_rfc(&store, &first, &doc.id, false, &SilentProgress).await.unwrap();

        let second = EchoTranslator::default();
        translate_rfc(&store, &second, &doc.id, false, &SilentProgress).await.unwrap();
        assert!(second.inputs().is_empty());

        let forced = EchoTranslator::default();
        translate_rfc(&store, &forced, &doc.id, true, &SilentProgress).await.unwrap();
        assert_eq!(forced.inputs().len(), first.inputs().len());
    }

    #[tokio::test]
    async fn partial_translation_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let doc = sample_document(8446);
        store.save_document(&doc).unwrap();

        // Fails on the second call: only the title is persisted.
        let failing = FailingTranslator::after(1);
        assert!(
            translate_rfc(&store, &failing, &doc.id, false, &SilentProgress)
                .await
                .is_err()
        );
        let partial = store.load_translation(&doc.id).unwrap().unwrap();
        assert!(partial.title.translated.is_some());
        assert!(!partial.is_complete());

        let resumed = EchoTranslator::default();
        let trans = translate_rfc(&store, &resumed, &doc.id, false, &SilentProgress)
            .await
            .unwrap();
        assert!(trans.is_complete());
        assert!(!resumed.inputs().contains(&"The TLS Protocol".to_string()));
        assert_eq!(trans.title.translated.as_deref(), Some("[ja] The TLS Protocol"));
    }

    #[tokio::test]
    async fn google_translator_joins_segments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/translate_a/single"))
            .and(query_param("client", "gtx"))
            .and(query_param("sl", "en"))
            .and(query_param("tl", "ja"))
            .and(query_param("dt", "t"))
            .and(query_param("q", "Hello. World."))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                [["こんにちは。", "Hello.", null], ["世界。", "World.", null]],
                null,
                "en"
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = TranslatorConfig {
            endpoint: format!("{}/translate_a/single", server.uri()),
            delay_ms: 0,
            ..Default::default()
        };
        let translator = GoogleTranslator::new(Client::new(), &config);
        let out = translator.translate("Hello. World.").await.unwrap();
        assert_eq!(out, "こんにちは。世界。");
    }

    #[tokio::test]
    async fn google_translator_rejects_bad_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": 1})))
            .mount(&server)
            .await;

        let config = TranslatorConfig {
            endpoint: server.uri(),
            delay_ms: 0,
            ..Default::default()
        };
        let err = GoogleTranslator::new(Client::new(), &config)
            .translate("x")
            .await
            .unwrap_err();
        assert!(matches!(err, RfcTransError::Translation(_)));
    }

    #[tokio::test]
    async fn sample_translation_pairs_inputs_with_outputs() {
        let translator = EchoTranslator::default();
        let pairs = translate_sample(&translator).await.unwrap();
        assert_eq!(pairs.len(), SAMPLE_TEXTS.len());
        assert_eq!(pairs[0].1, format!("[ja] {}", pairs[0].0));
        assert!(!translator.inputs()[1].contains("  "));
    }
}
