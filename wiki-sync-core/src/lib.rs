#![doc = "wiki-sync-core: reconciliation logic for pushing generated docs into the wiki."]

//! This crate holds everything that decides *what* to send to the wiki: the
//! category tree resolver, the subtree collector used for cleanup, the article
//! and category update rules, and the pass orchestrator.
//!
//! Transport lives behind [`contract::Gateway`]; the CLI crate supplies the real
//! HTTP implementation, tests use [`test_support::FakeWiki`] or `MockGateway`.
//!
//! # Usage
//! Classify the input with [`path::ingest`], then hand the entries to
//! [`synchronise::synchronise`] together with a gateway and a [`config::SyncConfig`].

pub mod articles;
pub mod categories;
pub mod config;
pub mod contract;
pub mod error;
pub mod model;
pub mod path;
pub mod snapshot;
pub mod synchronise;
pub mod tree;

#[cfg(any(test, feature = "test-export-mocks"))]
pub mod test_support;

pub use config::SyncConfig;
pub use contract::Gateway;
pub use error::{Result, SyncError};
pub use synchronise::{prune, synchronise, PruneReport, SyncPhase, SyncReport};
