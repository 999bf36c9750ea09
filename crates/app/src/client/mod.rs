//! HTTP transport for the metadata service
//!
//! ```text
//! GET {remote}/metadata/{address}?typeId={n}   -> envelope JSON
//! PUT {remote}/metadata/{address}              <- envelope JSON
//! ```
//!
//! Status codes are folded into [`RemoteStoreError`] here and nowhere else.

mod error;

pub use error::HttpStoreError;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, header::HeaderValue, Client, Response, StatusCode};
use url::Url;

use common::crypto::PublicKey;
use common::envelope::MetadataEnvelope;
use common::remote::{RemoteStore, RemoteStoreError};

#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    pub remote: Url,
    client: Client,
}

impl HttpRemoteStore {
    pub fn new(remote: &Url) -> Result<Self, HttpStoreError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Document URL for `address`, keeping any path prefix of the remote
    pub fn endpoint(&self, address: &PublicKey) -> Result<Url, HttpStoreError> {
        let mut url = self.remote.clone();
        url.path_segments_mut()
            .map_err(|_| HttpStoreError::InvalidRemote(self.remote.to_string()))?
            .pop_if_empty()
            .push("metadata")
            .push(&address.to_hex());
        Ok(url)
    }
}

/// Map a non-success response onto the store's outcome classes
pub fn classify_status(status: StatusCode, body: String) -> RemoteStoreError<HttpStoreError> {
    match status {
        StatusCode::NOT_FOUND => RemoteStoreError::NotFound,
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => RemoteStoreError::Conflict,
        s if s.is_client_error() => RemoteStoreError::Rejected(format!("{}: {}", s, body)),
        s => RemoteStoreError::Provider(HttpStoreError::HttpStatus(s, body)),
    }
}

async fn failure(response: Response) -> RemoteStoreError<HttpStoreError> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, body)
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    type Error = HttpStoreError;

    async fn get(
        &self,
        address: &PublicKey,
        type_id: i32,
    ) -> Result<MetadataEnvelope, RemoteStoreError<Self::Error>> {
        let mut url = self.endpoint(address)?;
        url.query_pairs_mut()
            .append_pair("typeId", &type_id.to_string());

        tracing::debug!(%url, "GET metadata");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(HttpStoreError::from)?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        Ok(response
            .json::<MetadataEnvelope>()
            .await
            .map_err(HttpStoreError::from)?)
    }

    async fn put(
        &self,
        address: &PublicKey,
        envelope: MetadataEnvelope,
    ) -> Result<(), RemoteStoreError<Self::Error>> {
        let url = self.endpoint(address)?;

        tracing::debug!(%url, type_id = envelope.type_id, "PUT metadata");
        let response = self
            .client
            .put(url)
            .json(&envelope)
            .send()
            .await
            .map_err(HttpStoreError::from)?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        Ok(())
    }
}
