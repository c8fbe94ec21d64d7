//! Tenant lifecycle and configuration loading.
//!
//! Composes the registry, the namespace and the remote KV store into the
//! operations exposed over HTTP: registering a domain, managing subdomains and
//! property files, and loading configuration into the remote store.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod service;

mod prelude;

// vim: ts=4
