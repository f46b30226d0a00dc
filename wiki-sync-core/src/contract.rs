//! # contract: the transport seam between sync logic and the wiki backend
//!
//! This module defines a single trait ([`Gateway`]) through which every request
//! to the wiki REST API flows. The sync logic never talks HTTP directly; it
//! hands relative paths and JSON bodies to a gateway and gets JSON back.
//!
//! ## Implementations
//! - The CLI crate provides the real client (reqwest, token header, base url).
//! - [`crate::test_support::FakeWiki`] simulates the backend in memory.
//! - `MockGateway` (generated by `mockall`) is available for call-level assertions.
//!
//! ## Contract
//! - `path` is always relative to the configured base url and starts with `/`.
//! - Non-2xx answers surface as [`crate::error::SyncError::Http`], connection
//!   problems as [`crate::error::SyncError::Transport`].
//! - An empty 2xx body decodes to `Value::Null`.
//! - Calls are issued one at a time; callers await each response before
//!   sending the next request.

use async_trait::async_trait;
use serde_json::Value;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::Result;

/// Authenticated request/response transport to the wiki REST API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET path`, returning the decoded JSON body.
    async fn get(&self, path: &str) -> Result<Value>;

    /// `POST path` with a JSON body.
    async fn post(&self, path: &str, body: Value) -> Result<Value>;

    /// `PUT path` with a JSON body.
    async fn put(&self, path: &str, body: Value) -> Result<Value>;

    /// `DELETE path`. The response body is ignored.
    async fn delete(&self, path: &str) -> Result<()>;

    /// `POST path` as multipart form data with a single part named `part_name`.
    async fn post_multipart(&self, path: &str, part_name: &str, bytes: Vec<u8>) -> Result<Value>;
}
