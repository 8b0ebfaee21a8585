//! Fetching RFC sources and the master index.
//!
//! This crate provides:
//! - [`FetchStrategy`]: picks plain text or structured XML for an [`RfcId`]
//! - [`Fetcher`]: cache-aware download, parse and persist of one document
//! - [`text`], [`rfcxml`], [`index`]: the parsers behind each source kind

mod http;
pub mod index;
pub mod rfcxml;
pub mod text;
pub mod xml;

use reqwest::Client;
use tracing::{debug, info, instrument};

use rfctrans_shared::{IndexSnapshot, Result, RfcDocument, RfcId, SourcesConfig};
use rfctrans_storage::ArtifactStore;

pub use http::build_client;
pub use index::parse_rfc_index;
pub use rfcxml::parse_rfc_xml;
pub use text::parse_rfc_text;

/// First RFC number published with an RFCXML v3 source.
pub const XML_SOURCE_THRESHOLD: u32 = 8650;

/// How a document is obtained from the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    Text,
    Xml,
}

impl FetchStrategy {
    /// Drafts and older RFCs are plain text; newer RFCs use XML unless
    /// `force_text` is set.
    pub fn select(id: &RfcId, force_text: bool) -> Self {
        match id {
            RfcId::Draft(_) => Self::Text,
            RfcId::Numbered(n) if *n >= XML_SOURCE_THRESHOLD && !force_text => Self::Xml,
            RfcId::Numbered(_) => Self::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Ignore the stored artifact and download again.
    pub force: bool,
    /// Use the plain-text source even where XML exists.
    pub force_text: bool,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub document: RfcDocument,
    pub strategy: FetchStrategy,
    /// `true` when the stored artifact was returned without network access.
    pub from_cache: bool,
}

/// Downloads and normalizes documents into an [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    sources: SourcesConfig,
    store: ArtifactStore,
}

impl Fetcher {
    pub fn new(client: Client, sources: SourcesConfig, store: ArtifactStore) -> Self {
        Self {
            client,
            sources,
            store,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn sources(&self) -> &SourcesConfig {
        &self.sources
    }

    /// Return the normalized document for `id`, downloading it if needed.
    #[instrument(skip(self), fields(%id))]
    pub async fn fetch(&self, id: &RfcId, opts: FetchOptions) -> Result<FetchOutcome> {
        let strategy = FetchStrategy::select(id, opts.force_text);

        if !opts.force {
            if let Some(document) = self.store.load_document(id)? {
                debug!(?strategy, "document already fetched, using stored copy");
                return Ok(FetchOutcome {
                    document,
                    strategy,
                    from_cache: true,
                });
            }
        }

        info!(?strategy, "fetching RFC source");
        let document = match (strategy, id) {
            (FetchStrategy::Xml, RfcId::Numbered(n)) => self.fetch_xml_document(*n).await?,
            (_, RfcId::Numbered(n)) => {
                let url = self.sources.rfc_txt_url(*n);
                let body = http::get_document(&self.client, &url, id).await?;
                parse_rfc_text(&body, id)?
            }
            (_, RfcId::Draft(name)) => {
                let url = self.sources.draft_txt_url(name);
                let body = http::get_document(&self.client, &url, id).await?;
                parse_rfc_text(&body, id)?
            }
        };

        let path = self.store.save_document(&document)?;
        info!(
            path = %path.display(),
            sections = document.sections.len(),
            "RFC source saved"
        );

        Ok(FetchOutcome {
            document,
            strategy,
            from_cache: false,
        })
    }

    /// Download and parse the XML source of RFC `number` without persisting it.
    pub async fn fetch_xml_document(&self, number: u32) -> Result<RfcDocument> {
        let id = RfcId::number(number);
        let url = self.sources.rfc_xml_url(number);
        let body = http::get_document(&self.client, &url, &id).await?;
        parse_rfc_xml(&body, &id)
    }

    /// Download and parse the master index.
    #[instrument(skip(self))]
    pub async fn fetch_index(&self) -> Result<IndexSnapshot> {
        info!(url = %self.sources.index_url, "fetching master index");
        let body = http::get_resource(&self.client, &self.sources.index_url).await?;
        parse_rfc_index(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfctrans_shared::RfcTransError;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RFC_TEXT: &str = "\
Network Working Group                                          J. Postel
Request for Comments: 791                                            ISI
                                                          September 1981

                           INTERNET PROTOCOL

1.  INTRODUCTION

   The Internet Protocol is designed for use in interconnected systems.
";

    const RFC_XML: &str = r#"<rfc number="9000" category="std">
  <front><title>QUIC</title><date year="2021" month="May"/></front>
  <middle><section pn="section-1"><name>Overview</name><t>QUIC is a transport.</t></section></middle>
</rfc>"#;

    fn fetcher(server: &MockServer, dir: &std::path::Path) -> Fetcher {
        let client = build_client(Duration::from_secs(5)).unwrap();
        let store = ArtifactStore::new(dir.join("data"), dir.join("html"));
        Fetcher::new(client, SourcesConfig::rooted_at(&server.uri()), store)
    }

    #[test]
    fn strategy_thresholds() {
        assert_eq!(FetchStrategy::select(&RfcId::number(8649), false), FetchStrategy::Text);
        assert_eq!(FetchStrategy::select(&RfcId::number(8650), false), FetchStrategy::Xml);
        assert_eq!(FetchStrategy::select(&RfcId::number(9000), true), FetchStrategy::Text);
        assert_eq!(
            FetchStrategy::select(&RfcId::draft("draft-ietf-tls-esni-14"), false),
            FetchStrategy::Text
        );
    }

    #[tokio::test]
    async fn fetches_text_and_persists() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/rfc/rfc791.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RFC_TEXT))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let id = RfcId::number(791);
        let outcome = fetcher.fetch(&id, FetchOptions::default()).await.unwrap();

        assert_eq!(outcome.strategy, FetchStrategy::Text);
        assert!(!outcome.from_cache);
        assert_eq!(outcome.document.title, "INTERNET PROTOCOL");
        assert!(fetcher.store().has_document(&id));
    }

    #[tokio::test]
    async fn fetches_xml_for_new_rfcs() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/rfc/rfc9000.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RFC_XML))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let outcome = fetcher
            .fetch(&RfcId::number(9000), FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.strategy, FetchStrategy::Xml);
        assert_eq!(outcome.document.title, "QUIC");
        assert_eq!(outcome.document.sections[0].id, "1");
    }

    #[tokio::test]
    async fn cache_hit_performs_no_request() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RFC_TEXT))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let id = RfcId::number(791);
        let cached = parse_rfc_text(RFC_TEXT, &id).unwrap();
        fetcher.store().save_document(&cached).unwrap();

        let outcome = fetcher.fetch(&id, FetchOptions::default()).await.unwrap();
        assert!(outcome.from_cache);
        assert_eq!(outcome.document, cached);
    }

    #[tokio::test]
    async fn force_overwrites_stored_document() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/rfc/rfc791.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RFC_TEXT))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let id = RfcId::number(791);
        let mut stale = parse_rfc_text(RFC_TEXT, &id).unwrap();
        stale.title = "STALE".into();
        fetcher.store().save_document(&stale).unwrap();

        let opts = FetchOptions {
            force: true,
            ..Default::default()
        };
        let outcome = fetcher.fetch(&id, opts).await.unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(outcome.document.title, "INTERNET PROTOCOL");

        let stored = fetcher.store().load_document(&id).unwrap().unwrap();
        assert_eq!(stored.title, "INTERNET PROTOCOL");
    }

    #[tokio::test]
    async fn missing_rfc_is_not_found() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/rfc/rfc9999.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let err = fetcher
            .fetch(&RfcId::number(9999), FetchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RfcTransError::RfcNotFound(ref id) if id == "9999"));
        assert!(!fetcher.store().has_document(&RfcId::number(9999)));
    }

    #[tokio::test]
    async fn server_error_is_network_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let err = fetcher
            .fetch(&RfcId::number(791), FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RfcTransError::Network(_)));
    }

    #[tokio::test]
    async fn fetches_draft_text() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/archive/id/draft-ietf-example-00.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RFC_TEXT))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher(&server, dir.path());
        let id = RfcId::draft("draft-ietf-example-00");
        let outcome = fetcher.fetch(&id, FetchOptions::default()).await.unwrap();
        assert_eq!(outcome.document.id, id);
    }

    #[tokio::test]
    async fn fetches_master_index() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/rfc-index.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<rfc-index><rfc-entry><doc-id>RFC8446</doc-id></rfc-entry></rfc-index>",
            ))
            .mount(&server)
            .await;

        let snapshot = fetcher(&server, dir.path()).fetch_index().await.unwrap();
        assert_eq!(snapshot.numbers().collect::<Vec<_>>(), vec![8446]);
    }
}
