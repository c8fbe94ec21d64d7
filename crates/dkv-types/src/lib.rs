//! Shared types, adapter traits, and core utilities for the DKV service.
//!
//! This crate holds what the service crates and every adapter implementation
//! agree on: the error type, the tenant data model and the three adapter
//! traits (registry, namespace, remote KV store).

#![forbid(unsafe_code)]

pub mod error;
pub mod kv_adapter;
pub mod namespace_adapter;
pub mod prelude;
pub mod registry_adapter;
pub mod types;
pub mod utils;

// vim: ts=4
