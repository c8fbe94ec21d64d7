//! Adapter that manages the per-tenant directory tree
use async_trait::async_trait;
use axum::body::Bytes;
use futures_core::Stream;
use std::{fmt::Debug, path::PathBuf, pin::Pin};
use tokio::io::AsyncRead;

use crate::prelude::*;

pub type FileStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

#[async_trait]
pub trait NamespaceAdapter: Debug + Send + Sync {
	/// Resolves a namespace path to its location on the local filesystem.
	///
	/// The result is only used for ingestion and must never be shown to callers.
	fn local_path(&self, path: &ConfigPath<'_>) -> ClResult<PathBuf>;

	/// Creates the directory of a tenant
	async fn create_tenant_dir(&self, token: &str) -> ClResult<()>;

	/// Creates a subdomain directory inside an existing tenant directory
	async fn create_subdomain_dir(&self, token: &str, subdomain: &str) -> ClResult<()>;

	/// Recursively removes a tenant directory. A missing directory is not an error.
	async fn remove_tenant_dir(&self, token: &str) -> ClResult<()>;

	/// Recursively removes a subdomain directory. A missing directory is not an error.
	async fn remove_subdomain_dir(&self, token: &str, subdomain: &str) -> ClResult<()>;

	/// Lists the subdomain directories of a tenant
	async fn list_subdomains(&self, token: &str) -> ClResult<Vec<Box<str>>>;

	/// Creates (or truncates) a file and fills it from a stream, returns the size written
	async fn create_file_stream(
		&self,
		path: &ConfigPath<'_>,
		stream: &mut (dyn AsyncRead + Send + Unpin),
	) -> ClResult<u64>;

	/// Opens a file for streaming to the caller
	async fn read_file_stream(&self, path: &ConfigPath<'_>) -> ClResult<FileStream>;

	/// Removes a single file
	async fn remove_file(&self, path: &ConfigPath<'_>) -> ClResult<()>;
}

// vim: ts=4
