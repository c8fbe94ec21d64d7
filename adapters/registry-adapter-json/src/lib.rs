//! Tenant registry stored as one JSON document.
//!
//! The file holds an array of `{"token": ..., "service": ...}` objects. Every
//! mutation reads the whole array, applies one change and replaces the whole
//! file (write to a temporary sibling, then rename). Mutations are serialized
//! by a lock held for the full read + write cycle.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{
	fs::{File, create_dir_all, rename},
	io::AsyncWriteExt,
	sync::Mutex,
};

use dkv::{prelude::*, registry_adapter::RegistryAdapter};

fn io_error(op: &str, err: &std::io::Error) -> Error {
	Error::IoError(format!("registry {} failed: {}", op, err.kind()))
}

/// Parses a registry document.
///
/// `null`, an empty file and the blank placeholder record written by older
/// releases all decode to an empty registry.
pub fn decode(raw: &[u8]) -> ClResult<Vec<TenantRecord>> {
	if raw.iter().all(u8::is_ascii_whitespace) {
		return Ok(Vec::new());
	}
	let records: Option<Vec<TenantRecord>> = serde_json::from_slice(raw)
		.map_err(|err| Error::Parse(format!("registry document: {}", err)))?;
	Ok(records.unwrap_or_default().into_iter().filter(|r| !r.is_placeholder()).collect())
}

/// Serializes a registry document. An empty registry is written as `[]`.
pub fn encode(records: &[TenantRecord]) -> ClResult<Vec<u8>> {
	Ok(serde_json::to_vec(records)?)
}

#[derive(Debug)]
pub struct RegistryAdapterJson {
	path: Box<Path>,
	write_lock: Mutex<()>,
}

impl RegistryAdapterJson {
	/// Opens the registry, creating an empty document if the file does not exist yet
	pub async fn new(path: impl Into<Box<Path>>) -> ClResult<Self> {
		let path: Box<Path> = path.into();
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			create_dir_all(parent).await.map_err(|err| io_error("init", &err))?;
		}
		let adapter = Self { path, write_lock: Mutex::new(()) };
		match tokio::fs::metadata(&adapter.path).await {
			Ok(_) => {
				let records = adapter.read().await?;
				info!("Registry loaded: {} tenants", records.len());
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				info!("Registry file missing, creating an empty one");
				adapter.write(&[]).await?;
			}
			Err(err) => return Err(io_error("init", &err)),
		}
		Ok(adapter)
	}

	fn tmp_path(&self) -> PathBuf {
		let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
		name.push(".tmp");
		self.path.with_file_name(name)
	}

	async fn read(&self) -> ClResult<Vec<TenantRecord>> {
		let raw = tokio::fs::read(&self.path).await.map_err(|err| io_error("read", &err))?;
		decode(&raw)
	}

	async fn write(&self, records: &[TenantRecord]) -> ClResult<()> {
		let raw = encode(records)?;
		let tmp_path = self.tmp_path();

		let res = async {
			let mut file = File::create(&tmp_path).await?;
			file.write_all(&raw).await?;
			file.sync_all().await?;
			rename(&tmp_path, &self.path).await
		}
		.await;
		if let Err(err) = res {
			let _ = tokio::fs::remove_file(&tmp_path).await;
			return Err(io_error("write", &err));
		}
		Ok(())
	}
}

#[async_trait]
impl RegistryAdapter for RegistryAdapterJson {
	async fn list(&self) -> ClResult<Vec<TenantRecord>> {
		self.read().await
	}

	async fn append(&self, record: TenantRecord) -> ClResult<()> {
		let _guard = self.write_lock.lock().await;
		let mut records = self.read().await?;
		if records.iter().any(|r| r.domain == record.domain) {
			return Err(Error::Conflict(format!("domain '{}' is already registered", record.domain)));
		}
		if records.iter().any(|r| r.token == record.token) {
			return Err(Error::Conflict("token is already registered".into()));
		}
		records.push(record);
		self.write(&records).await
	}

	async fn remove_by_token(&self, token: &str) -> ClResult<()> {
		let _guard = self.write_lock.lock().await;
		let records = self.read().await?;
		let before = records.len();
		let remaining: Vec<TenantRecord> =
			records.into_iter().filter(|r| r.token.as_ref() != token).collect();
		if remaining.len() == before {
			return Err(Error::NotFound(
				"service not found, check the token or whether the service is registered".into(),
			));
		}
		self.write(&remaining).await
	}
}


// vim: ts=4
