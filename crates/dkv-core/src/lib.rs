//! Core infrastructure of the DKV service.
//!
//! Holds the application state handed to every handler and service function,
//! so that the feature crates can share it without depending on the server crate.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod prelude;

pub use app::{Adapters, App, AppBuilderOpts, AppState, VERSION};

// vim: ts=4
