//! Property ingestion
//!
//! Turns property files into a flat [`PropertyMap`]. Directory entries are
//! visited in ascending name order and later files override keys of earlier
//! ones.
//!
//! Every function takes the local path to read plus a namespace-relative
//! label. Only the label ever appears in errors.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use dkv_types::namespace_adapter::NamespaceAdapter;

use crate::prelude::*;
use crate::properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
	File,
	Dir,
	Other,
}

async fn entry_kind(entry: &tokio::fs::DirEntry) -> std::io::Result<EntryKind> {
	let file_type = entry.file_type().await?;
	if file_type.is_file() {
		Ok(EntryKind::File)
	} else if file_type.is_dir() {
		Ok(EntryKind::Dir)
	} else if file_type.is_symlink() {
		// Linked files are read, linked directories are not descended into
		let meta = tokio::fs::metadata(entry.path()).await?;
		Ok(if meta.is_file() { EntryKind::File } else { EntryKind::Other })
	} else {
		Ok(EntryKind::Other)
	}
}

/// Entries of a directory sorted by name
async fn sorted_entries(path: &Path, label: &str) -> ClResult<Vec<(String, PathBuf, EntryKind)>> {
	let mut dir = tokio::fs::read_dir(path).await.map_err(|err| Error::from_io(&err, label))?;
	let mut entries = Vec::new();
	while let Some(entry) = dir.next_entry().await.map_err(|err| Error::from_io(&err, label))? {
		let name = entry.file_name().to_string_lossy().into_owned();
		let kind = entry_kind(&entry)
			.await
			.map_err(|err| Error::from_io(&err, &format!("{}/{}", label, name)))?;
		entries.push((name, entry.path(), kind));
	}
	entries.sort_by(|a, b| a.0.cmp(&b.0));
	Ok(entries)
}

/// Parses a single property file
pub async fn ingest_one(path: &Path, label: &str) -> ClResult<PropertyMap> {
	let data = tokio::fs::read(path).await.map_err(|err| Error::from_io(&err, label))?;
	let map = properties::parse(&data).map_err(|err| match err {
		Error::Parse(msg) => Error::Parse(format!("{}: {}", label, msg)),
		err => err,
	})?;
	debug!("ingested {} keys from {}", map.len(), label);
	Ok(map)
}

/// Parses every regular file directly inside `path`
pub async fn ingest_directory(path: &Path, label: &str) -> ClResult<PropertyMap> {
	let mut map = PropertyMap::new();
	for (name, entry_path, kind) in sorted_entries(path, label).await? {
		if kind == EntryKind::File {
			map.extend(ingest_one(&entry_path, &format!("{}/{}", label, name)).await?);
		}
	}
	Ok(map)
}

fn walk<'a>(
	path: PathBuf,
	label: String,
	map: &'a mut PropertyMap,
) -> Pin<Box<dyn Future<Output = ClResult<()>> + Send + 'a>> {
	Box::pin(async move {
		for (name, entry_path, kind) in sorted_entries(&path, &label).await? {
			let entry_label = format!("{}/{}", label, name);
			match kind {
				EntryKind::File => map.extend(ingest_one(&entry_path, &entry_label).await?),
				EntryKind::Dir => walk(entry_path, entry_label, map).await?,
				EntryKind::Other => debug!("skipping {}", entry_label),
			}
		}
		Ok(())
	})
}

/// Parses every regular file below `path` at any depth
pub async fn ingest_tree(path: &Path, label: &str) -> ClResult<PropertyMap> {
	let mut map = PropertyMap::new();
	walk(path.to_path_buf(), label.to_string(), &mut map).await?;
	Ok(map)
}

/// Ingests the part of a tenant namespace selected by `path`:
///
/// - with a filename: exactly that file (inside the subdomain if one is set)
/// - subdomain only: the files of the subdomain directory, non-recursively
/// - neither: the whole tenant tree, recursively
pub async fn ingest_selection(
	namespace: &dyn NamespaceAdapter,
	path: &ConfigPath<'_>,
) -> ClResult<PropertyMap> {
	let local = namespace.local_path(path)?;
	let label = path.to_string();
	match (path.subdomain, path.filename) {
		(_, Some(_)) => ingest_one(&local, &label).await,
		(Some(_), None) => ingest_directory(&local, &label).await,
		(None, None) => ingest_tree(&local, &label).await,
	}
}

// vim: ts=4
