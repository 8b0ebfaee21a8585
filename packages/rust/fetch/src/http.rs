//! HTTP plumbing shared by the fetch strategies.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use rfctrans_shared::{Result, RfcId, RfcTransError};

/// User-Agent string for every remote request.
pub(crate) const USER_AGENT: &str = concat!("rfctrans/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
        .build()
        .map_err(|e| RfcTransError::Network(format!("failed to build HTTP client: {e}")))
}

/// GET a document belonging to `id`; 404 and 410 mean the document does not exist.
pub(crate) async fn get_document(client: &Client, url: &str, id: &RfcId) -> Result<String> {
    debug!(%url, %id, "fetching document");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RfcTransError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Err(RfcTransError::RfcNotFound(id.id()));
    }
    if !status.is_success() {
        return Err(RfcTransError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| RfcTransError::Network(format!("{url}: body read failed: {e}")))
}

/// GET an auxiliary resource (index, etc.) where every failure is a network error.
pub(crate) async fn get_resource(client: &Client, url: &str) -> Result<String> {
    debug!(%url, "fetching resource");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| RfcTransError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RfcTransError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| RfcTransError::Network(format!("{url}: body read failed: {e}")))
}
