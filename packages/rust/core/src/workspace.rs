//! Everything a pipeline run needs, built once and passed by reference.

use reqwest::Client;

use rfctrans_fetch::{Fetcher, build_client};
use rfctrans_shared::{AppConfig, Result};
use rfctrans_storage::ArtifactStore;

use crate::translate::{GoogleTranslator, Translator};

/// Config, artifact store, HTTP client and translation backend.
pub struct Workspace {
    config: AppConfig,
    client: Client,
    store: ArtifactStore,
    fetcher: Fetcher,
    translator: Box<dyn Translator>,
}

impl Workspace {
    /// Build the workspace with the configured translation endpoint.
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = build_client(config.sources.timeout())?;
        let store = ArtifactStore::from_config(&config.paths);
        let fetcher = Fetcher::new(client.clone(), config.sources.clone(), store.clone());
        let translator = GoogleTranslator::new(client.clone(), &config.translator);

        Ok(Self {
            config,
            client,
            store,
            fetcher,
            translator: Box::new(translator),
        })
    }

    /// Replace the translation backend.
    pub fn with_translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }
}
