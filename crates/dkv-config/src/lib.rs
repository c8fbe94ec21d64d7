//! Property file ingestion and remote KV synchronization.
//!
//! Property files below a tenant namespace are flattened into a [`PropertyMap`]
//! by [`ingest`] and pushed to the remote store by [`sync`].
//!
//! [`PropertyMap`]: dkv_types::types::PropertyMap

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod handler;
pub mod ingest;
pub mod properties;
pub mod sync;

mod prelude;

// vim: ts=4
