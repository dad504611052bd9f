//! HTTP object-store protocol mapping.
//!
//! The remote store is a generic "create/read/replace object by id" service:
//!
//! - `GET /objects/{id}` returns the stored object or 404
//! - `PUT /objects/{id}` replaces it, 404 when absent, 429 when throttled
//! - `POST /objects` creates a new object and returns its id
//!
//! The actual HTTP library is abstracted behind [`HttpClient`] so tests can
//! run against a stub and embedders can bring their own client.

use crate::client::{ChannelId, RemoteChannel, RemoteObject};
use crate::error::{ChannelError, ChannelResult};
use edusync_core::Snapshot;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implementations perform one request and report transport failures as a
/// message string; status interpretation stays in [`ObjectStoreChannel`].
pub trait HttpClient: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: &str) -> Result<HttpResponse, String>;

    /// Sends a PUT request with a JSON body.
    fn put(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, String>;

    /// Sends a POST request with a JSON body.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, String>;
}

/// The HTTP object-store implementation of [`RemoteChannel`].
pub struct ObjectStoreChannel<C: HttpClient> {
    base_url: String,
    object_name: String,
    client: C,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
struct StoredObject {
    data: Snapshot,
}

impl<C: HttpClient> ObjectStoreChannel<C> {
    /// Creates a channel client.
    ///
    /// `base_url` is the objects endpoint (e.g. `https://store.example.com/objects`);
    /// `object_name` is the display label written into every `{name, data}` body.
    pub fn new(base_url: impl Into<String>, object_name: impl Into<String>, client: C) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            object_name: object_name.into(),
            client,
        }
    }

    /// Returns the objects endpoint this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn body_for(&self, snapshot: &Snapshot) -> ChannelResult<Vec<u8>> {
        let object = RemoteObject {
            name: self.object_name.clone(),
            data: snapshot.clone(),
        };
        Ok(serde_json::to_vec(&object)?)
    }
}

fn check_status(status: u16) -> ChannelResult<()> {
    match status {
        200 | 201 => Ok(()),
        404 => Err(ChannelError::NotFound),
        429 => Err(ChannelError::RateLimited),
        other => Err(ChannelError::Status(other)),
    }
}

fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
}

impl<C: HttpClient> RemoteChannel for ObjectStoreChannel<C> {
    fn fetch_snapshot(&self, id: &ChannelId) -> ChannelResult<Snapshot> {
        // Shared stores sit behind caches; the query parameter forces a
        // fresh read the same way the web clients do.
        let url = format!("{}/{}?nocache={}", self.base_url, id, cache_buster());
        let response = self.client.get(&url).map_err(ChannelError::Transport)?;
        check_status(response.status)?;

        let stored: StoredObject = serde_json::from_slice(&response.body)?;
        Ok(stored.data)
    }

    fn replace_snapshot(&self, id: &ChannelId, snapshot: &Snapshot) -> ChannelResult<()> {
        let url = format!("{}/{}", self.base_url, id);
        let body = self.body_for(snapshot)?;
        let response = self.client.put(&url, body).map_err(ChannelError::Transport)?;
        check_status(response.status)
    }

    fn create_channel(&self, snapshot: &Snapshot) -> ChannelResult<ChannelId> {
        let body = self.body_for(snapshot)?;
        let response = self
            .client
            .post(&self.base_url, body)
            .map_err(ChannelError::Transport)?;
        check_status(response.status)?;

        let created: CreateResponse = serde_json::from_slice(&response.body)?;
        tracing::info!(channel = %created.id, "provisioned remote channel");
        Ok(ChannelId::new(created.id))
    }
}

/// Blocking `reqwest` implementation of [`HttpClient`].
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns the builder's message when the TLS backend cannot initialize.
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { client })
    }

    fn convert(response: reqwest::blocking::Response) -> Result<HttpResponse, String> {
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, String> {
        let response = self.client.get(url).send().map_err(|e| e.to_string())?;
        Self::convert(response)
    }

    fn put(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| e.to_string())?;
        Self::convert(response)
    }

    fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, String> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| e.to_string())?;
        Self::convert(response)
    }
}
