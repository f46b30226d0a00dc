#![doc = "HTTP gateway: the real transport behind the core `Gateway` trait."]
//
//! # Wiki HTTP Gateway
//!
//! [`HttpGateway`] sends every request to `{url}{path}` with the
//! `X-Shopware-Token` header taken from [`Credentials`]. Bodies go out as JSON,
//! media uploads as a single-part multipart form.
//!
//! Responses are decoded as JSON; an empty body becomes `null`. Any non-2xx
//! status is reported as [`SyncError::Http`] with the body text attached, and
//! failures before a response arrives are [`SyncError::Transport`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, error};

use wiki_sync_core::contract::Gateway;
use wiki_sync_core::{Result, SyncError};

use crate::load_config::Credentials;

pub const TOKEN_HEADER: &str = "X-Shopware-Token";

pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            client: Client::new(),
            base_url: credentials.url.trim_end_matches('/').to_owned(),
            token: credentials.token.clone(),
        }
    }

    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(TOKEN_HEADER, &self.token)
    }

    async fn send(&self, method: &'static str, path: &str, request: RequestBuilder) -> Result<Value> {
        debug!(method, path, "Sending wiki request");
        let response = request.send().await.map_err(|e| {
            error!(method, path, error = %e, "Wiki request failed before a response");
            SyncError::Transport(format!("{method} {path}: {e}"))
        })?;
        decode(method, path, response).await
    }
}

async fn decode(method: &'static str, path: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SyncError::Transport(format!("{method} {path}: reading body: {e}")))?;

    if !status.is_success() {
        error!(method, path, status = status.as_u16(), "Wiki returned an error status");
        return Err(SyncError::Http {
            method,
            path: path.to_owned(),
            status: status.as_u16(),
            body,
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| SyncError::protocol(format!("{method} {path}"), format!("response is not JSON: {e}")))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get(&self, path: &str) -> Result<Value> {
        self.send("GET", path, self.build_request(Method::GET, path)).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let request = self.build_request(Method::POST, path).json(&body);
        self.send("POST", path, request).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value> {
        let request = self.build_request(Method::PUT, path).json(&body);
        self.send("PUT", path, request).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send("DELETE", path, self.build_request(Method::DELETE, path))
            .await
            .map(|_| ())
    }

    async fn post_multipart(&self, path: &str, part_name: &str, bytes: Vec<u8>) -> Result<Value> {
        let file_name = part_name.rsplit('/').next().unwrap_or(part_name).to_owned();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part(part_name.to_owned(), part);
        let request = self.build_request(Method::POST, path).multipart(form);
        self.send("POST", path, request).await
    }
}
