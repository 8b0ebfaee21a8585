//! Per-RFC pipeline: fetch → translate → render.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use rfctrans_fetch::{FetchOptions, FetchOutcome};
use rfctrans_render::render_page;
use rfctrans_shared::{Result, RfcId, RfcTransError, TranslatedDocument};

use crate::translate::translate_rfc;
use crate::workspace::Workspace;

/// Terminal state of one RFC in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fetched, translated and rendered.
    Done,
    /// The remote source does not exist; a not-found marker was written.
    NotFound,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, name: &str);
    /// Called after each section of a translation.
    fn section_translated(&self, current: usize, total: usize);
    /// Called when one RFC reaches a terminal state.
    fn finished(&self, id: &RfcId, outcome: Outcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn section_translated(&self, _current: usize, _total: usize) {}
    fn finished(&self, _id: &RfcId, _outcome: Outcome) {}
}

/// Fetch stage.
pub async fn fetch(
    ws: &Workspace,
    id: &RfcId,
    opts: FetchOptions,
    progress: &dyn ProgressReporter,
) -> Result<FetchOutcome> {
    progress.phase(&format!("Fetching {}", label(id)));
    ws.fetcher().fetch(id, opts).await
}

/// Translate stage.
pub async fn translate(
    ws: &Workspace,
    id: &RfcId,
    force: bool,
    progress: &dyn ProgressReporter,
) -> Result<TranslatedDocument> {
    progress.phase(&format!("Translating {}", label(id)));
    translate_rfc(ws.store(), ws.translator(), id, force, progress).await
}

/// Render stage: write the bilingual page from stored artifacts.
#[instrument(skip(ws, progress), fields(%id))]
pub fn render(ws: &Workspace, id: &RfcId, progress: &dyn ProgressReporter) -> Result<PathBuf> {
    progress.phase(&format!("Rendering {}", label(id)));
    let store = ws.store();

    let doc = store
        .load_document(id)?
        .ok_or_else(|| RfcTransError::MissingSourceDocument(id.id()))?;
    let trans = store
        .load_translation(id)?
        .ok_or_else(|| RfcTransError::MissingTranslation(id.id()))?;
    let summary = match id.as_number() {
        Some(n) => store.load_summary(n)?,
        None => None,
    };

    let html = render_page(&doc, &trans, summary.as_ref(), &ws.config().sources)?;
    let path = store.write_page(id, &html)?;
    info!(path = %path.display(), "page written");
    Ok(path)
}

/// Run every stage for one RFC.
///
/// A missing remote source ends the RFC as [`Outcome::NotFound`] and leaves
/// an empty `-not-found.html` marker; every other error propagates.
#[instrument(skip(ws, opts, progress), fields(%id))]
pub async fn process(
    ws: &Workspace,
    id: &RfcId,
    opts: FetchOptions,
    progress: &dyn ProgressReporter,
) -> Result<Outcome> {
    info!("processing");

    let outcome = match run_stages(ws, id, opts, progress).await {
        Ok(()) => Outcome::Done,
        Err(e) if e.is_not_found() => {
            warn!(error = %e, "RFC not found upstream");
            let marker = ws.store().write_not_found(id)?;
            info!(path = %marker.display(), "not-found marker written");
            Outcome::NotFound
        }
        Err(e) => return Err(e),
    };

    progress.finished(id, outcome);
    Ok(outcome)
}

async fn run_stages(
    ws: &Workspace,
    id: &RfcId,
    opts: FetchOptions,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    fetch(ws, id, opts, progress).await?;
    // A changed source invalidates the old translation on its own.
    translate(ws, id, false, progress).await?;
    render(ws, id, progress)?;
    Ok(())
}

fn label(id: &RfcId) -> String {
    rfctrans_render::document_label(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RFC_TEXT, sample_document, workspace};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn full_pipeline_writes_page() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rfc/rfc791.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RFC_TEXT))
            .mount(&server)
            .await;

        let ws = workspace(dir.path(), &server);
        let id = RfcId::number(791);
        let outcome = process(&ws, &id, FetchOptions::default(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Done);
        let html = ws.store().read_page(&id).unwrap().unwrap();
        assert!(html.contains("[ja] INTERNET PROTOCOL"));
        assert!(ws.store().translation_path(&id).exists());
    }

    #[tokio::test]
    async fn not_found_writes_empty_marker() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/rfc/rfc9999.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ws = workspace(dir.path(), &server);
        let id = RfcId::number(9999);
        let outcome = process(&ws, &id, FetchOptions::default(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::NotFound);
        let marker = dir.path().join("html").join("rfc9999-not-found.html");
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "");
        assert!(!ws.store().page_path(&id).exists());
    }

    #[tokio::test]
    async fn other_errors_propagate() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ws = workspace(dir.path(), &server);
        let err = process(&ws, &RfcId::number(791), FetchOptions::default(), &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, RfcTransError::Network(_)));
        assert!(!ws.store().not_found_path(&RfcId::number(791)).exists());
    }

    #[tokio::test]
    async fn render_requires_translation() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path(), &server);

        let doc = sample_document(8446);
        ws.store().save_document(&doc).unwrap();
        let err = render(&ws, &doc.id, &SilentProgress).unwrap_err();
        assert!(matches!(err, RfcTransError::MissingTranslation(_)));

        let err = render(&ws, &RfcId::number(1), &SilentProgress).unwrap_err();
        assert!(matches!(err, RfcTransError::MissingSourceDocument(_)));
    }
}
