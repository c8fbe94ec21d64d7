use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{
	DirBuilder, File, OpenOptions, create_dir_all, metadata, read_dir, remove_dir_all, rename,
};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use dkv::{
	namespace_adapter::{FileStream, NamespaceAdapter},
	prelude::*,
	utils::generate_token,
};

/// Owner and group may read, write and traverse; nobody else has access
pub const NAMESPACE_MODE: u32 = 0o770;

/// Directory below the mount root where uploads are written before they are
/// renamed into place. Never a valid token.
pub const STAGING_DIR: &str = ".staging";

/// Calculates the path of a namespace entry below the mount root
fn entry_path(base_dir: &Path, path: &ConfigPath<'_>) -> ClResult<PathBuf> {
	path.validate()?;
	if path.token == STAGING_DIR {
		return Err(Error::ValidationError(format!("invalid token: {:?}", path.token)));
	}
	let mut full = PathBuf::from(base_dir);
	for segment in path.segments() {
		full.push(segment);
	}
	Ok(full)
}

#[cfg(unix)]
async fn restrict(path: &Path) -> std::io::Result<()> {
	use std::os::unix::fs::PermissionsExt;
	tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(NAMESPACE_MODE)).await
}

#[cfg(not(unix))]
async fn restrict(_path: &Path) -> std::io::Result<()> {
	Ok(())
}

async fn make_dir(path: &Path) -> std::io::Result<()> {
	let mut builder = DirBuilder::new();
	#[cfg(unix)]
	builder.mode(NAMESPACE_MODE);
	builder.create(path).await?;
	// mkdir honours the umask
	restrict(path).await
}

/// Writes `stream` to a new file at `staged` and returns the number of bytes
async fn write_staged(
	staged: &Path,
	stream: &mut (dyn AsyncRead + Send + Unpin),
	rel: &str,
) -> ClResult<u64> {
	let mut opts = OpenOptions::new();
	opts.create_new(true).write(true);
	#[cfg(unix)]
	opts.mode(NAMESPACE_MODE);
	let mut file = opts.open(staged).await.map_err(|err| Error::from_io(&err, rel))?;

	let size = tokio::io::copy(stream, &mut file)
		.await
		.map_err(|err| Error::IoError(format!("{}: upload failed: {}", rel, err.kind())))?;
	file.flush().await.map_err(|err| Error::from_io(&err, rel))?;
	file.sync_all().await.map_err(|err| Error::from_io(&err, rel))?;
	Ok(size)
}

async fn remove_tree(full: &Path, rel: &ConfigPath<'_>) -> ClResult<()> {
	match remove_dir_all(full).await {
		Ok(()) => Ok(()),
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
			debug!("remove {}: already absent", rel);
			Ok(())
		}
		Err(err) => Err(Error::from_io(&err, &rel.to_string())),
	}
}

#[derive(Debug)]
pub struct NamespaceAdapterFs {
	base_dir: Box<Path>,
}

impl NamespaceAdapterFs {
	pub async fn new(base_dir: Box<Path>) -> ClResult<Self> {
		let staging = base_dir.join(STAGING_DIR);
		create_dir_all(&staging)
			.await
			.map_err(|err| Error::IoError(format!("cannot create mount root: {}", err.kind())))?;
		restrict(&staging)
			.await
			.map_err(|err| Error::IoError(format!("cannot create mount root: {}", err.kind())))?;
		Ok(Self { base_dir })
	}

	async fn require_dir(&self, path: &ConfigPath<'_>) -> ClResult<()> {
		match metadata(entry_path(&self.base_dir, path)?).await {
			Ok(meta) if meta.is_dir() => Ok(()),
			_ => Err(Error::NotFound(format!("{} does not exist", path))),
		}
	}
}

#[async_trait]
impl NamespaceAdapter for NamespaceAdapterFs {
	fn local_path(&self, path: &ConfigPath<'_>) -> ClResult<PathBuf> {
		entry_path(&self.base_dir, path)
	}

	async fn create_tenant_dir(&self, token: &str) -> ClResult<()> {
		let rel = ConfigPath::tenant(token);
		let full = entry_path(&self.base_dir, &rel)?;
		make_dir(&full).await.map_err(|err| Error::from_io(&err, &rel.to_string()))?;
		info!("created tenant directory {}", rel);
		Ok(())
	}

	async fn create_subdomain_dir(&self, token: &str, subdomain: &str) -> ClResult<()> {
		let rel = ConfigPath::subdomain(token, subdomain);
		let full = entry_path(&self.base_dir, &rel)?;
		self.require_dir(&ConfigPath::tenant(token)).await?;
		make_dir(&full).await.map_err(|err| Error::from_io(&err, &rel.to_string()))?;
		info!("created subdomain directory {}", rel);
		Ok(())
	}

	async fn remove_tenant_dir(&self, token: &str) -> ClResult<()> {
		let rel = ConfigPath::tenant(token);
		remove_tree(&entry_path(&self.base_dir, &rel)?, &rel).await?;
		info!("removed tenant directory {}", rel);
		Ok(())
	}

	async fn remove_subdomain_dir(&self, token: &str, subdomain: &str) -> ClResult<()> {
		let rel = ConfigPath::subdomain(token, subdomain);
		remove_tree(&entry_path(&self.base_dir, &rel)?, &rel).await?;
		info!("removed subdomain directory {}", rel);
		Ok(())
	}

	async fn list_subdomains(&self, token: &str) -> ClResult<Vec<Box<str>>> {
		let rel = ConfigPath::tenant(token);
		let full = entry_path(&self.base_dir, &rel)?;
		let mut dir = read_dir(&full).await.map_err(|err| Error::from_io(&err, &rel.to_string()))?;

		let mut subdomains = Vec::new();
		while let Some(entry) =
			dir.next_entry().await.map_err(|err| Error::from_io(&err, &rel.to_string()))?
		{
			let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
			let name = entry.file_name();
			if let (true, Some(name)) = (is_dir, name.to_str()) {
				subdomains.push(name.into());
			}
		}
		subdomains.sort();
		Ok(subdomains)
	}

	async fn create_file_stream(
		&self,
		path: &ConfigPath<'_>,
		stream: &mut (dyn AsyncRead + Send + Unpin),
	) -> ClResult<u64> {
		if path.filename.is_none() {
			return Err(Error::ValidationError("filename not set".into()));
		}
		let full = entry_path(&self.base_dir, path)?;
		self.require_dir(&ConfigPath { filename: None, ..*path }).await?;

		let rel = path.to_string();
		let staged = self.base_dir.join(STAGING_DIR).join(format!("{}.part", generate_token()));
		let res: ClResult<u64> = async {
			let size = write_staged(&staged, stream, &rel).await?;
			rename(&staged, &full).await.map_err(|err| Error::from_io(&err, &rel))?;
			Ok(size)
		}
		.await;
		if res.is_err() {
			let _ = tokio::fs::remove_file(&staged).await;
		}
		let size = res?;

		info!("stored {} ({} bytes)", rel, size);
		Ok(size)
	}

	async fn read_file_stream(&self, path: &ConfigPath<'_>) -> ClResult<FileStream> {
		if path.filename.is_none() {
			return Err(Error::ValidationError("filename not set".into()));
		}
		let full = entry_path(&self.base_dir, path)?;
		let rel = path.to_string();
		match metadata(&full).await {
			Ok(meta) if meta.is_file() => {}
			Ok(_) => return Err(Error::NotFound(format!("{} is not a file", rel))),
			Err(err) => return Err(Error::from_io(&err, &rel)),
		}
		let file = File::open(&full).await.map_err(|err| Error::from_io(&err, &rel))?;
		Ok(Box::pin(ReaderStream::new(file)))
	}

	async fn remove_file(&self, path: &ConfigPath<'_>) -> ClResult<()> {
		if path.filename.is_none() {
			return Err(Error::ValidationError("filename not set".into()));
		}
		let full = entry_path(&self.base_dir, path)?;
		let rel = path.to_string();
		tokio::fs::remove_file(&full).await.map_err(|err| Error::from_io(&err, &rel))?;
		info!("removed {}", rel);
		Ok(())
	}
}


// vim: ts=4
