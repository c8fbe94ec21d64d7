//! DKV is a multi-tenant configuration namespace service.
//!
//! # Features
//!
//! - Tenants register a domain and receive an opaque token
//! - Each token owns a directory of property files, optionally split into
//!   subdomains
//! - Property files are flattened and pushed to a remote KV store (Consul)
//!   under the token (and subdomain) prefix
//! - A built-in default configuration tree is synced under `default/`

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and adapter traits from dkv-types
pub use dkv_types::error;
pub use dkv_types::kv_adapter;
pub use dkv_types::namespace_adapter;
pub use dkv_types::registry_adapter;
pub use dkv_types::types;
pub use dkv_types::utils;

// Feature crate re-exports
pub use dkv_config as sync;
pub use dkv_tenant as tenant;

// Local modules
pub mod app;
pub mod config;
pub mod prelude;
pub mod routes;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
