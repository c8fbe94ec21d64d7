//! Adapter for the remote key-value store that receives synchronized configuration
use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait KvAdapter: Debug + Send + Sync {
	/// Writes a single key
	async fn put(&self, key: &str, value: &str) -> ClResult<()>;

	/// Reads a single key. A missing key is `Ok(None)`.
	async fn get(&self, key: &str) -> ClResult<Option<Box<str>>>;

	/// Lists keys starting with `prefix`. An empty prefix lists the whole store.
	async fn list(&self, prefix: &str) -> ClResult<Vec<Box<str>>>;

	/// Deletes a single key. Deleting a missing key succeeds.
	async fn delete(&self, key: &str) -> ClResult<()>;

	/// Liveness check run before the service starts accepting requests
	async fn check_health(&self) -> ClResult<()>;
}

// vim: ts=4
