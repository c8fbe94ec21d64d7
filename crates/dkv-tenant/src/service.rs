//! Tenant service
//!
//! Every operation validates its input, consults the registry and then drives
//! the namespace and the remote store. Failures are returned as they are.
//! Multi-step operations are not rolled back when a later step fails.

use tokio::io::AsyncRead;

use dkv_config::{ingest, sync};
use dkv_types::namespace_adapter::FileStream;
use dkv_types::types::{DEFAULT_TOKEN, validate_segment};
use dkv_types::utils::generate_token;

use crate::prelude::*;

/// Label of the built-in configuration tree in errors and logs
const DEFAULT_LABEL: &str = "default";

async fn require_registered(app: &App, token: &str) -> ClResult<()> {
	validate_segment("token", token)?;
	if !app.registry_adapter.find_by_token(token).await? {
		return Err(Error::NotFound(format!("token '{}' is not registered", token)));
	}
	Ok(())
}

fn require_filename<'a>(path: &ConfigPath<'a>) -> ClResult<&'a str> {
	path.filename.ok_or_else(|| Error::ValidationError("filename not set".into()))
}

// Registration //
//**************//

/// Registers a domain and returns its new token
pub async fn register(app: &App, domain: &str) -> ClResult<Box<str>> {
	if domain.is_empty() {
		return Err(Error::ValidationError("domain not set".into()));
	}
	if domain == DEFAULT_TOKEN {
		return Err(Error::ValidationError(format!("'{}' is a reserved name", DEFAULT_TOKEN)));
	}

	let _guard = app.registration_lock.lock().await;
	if app.registry_adapter.find_by_domain(domain).await? {
		return Err(Error::Conflict(format!("domain '{}' is already registered", domain)));
	}

	let token = generate_token();
	app.namespace_adapter.create_tenant_dir(&token).await?;
	app.registry_adapter.append(TenantRecord::new(token.as_str(), domain)).await?;
	info!("registered domain {} with token {}", domain, token);
	Ok(token.into())
}

pub async fn get_tenant(app: &App, token: &str) -> ClResult<TenantRecord> {
	validate_segment("token", token)?;
	app.registry_adapter
		.get_by_token(token)
		.await?
		.ok_or_else(|| Error::NotFound(format!("no domain registered for token '{}'", token)))
}

/// Removes the registry record first, then the namespace directory
pub async fn remove_tenant(app: &App, token: &str) -> ClResult<()> {
	if token == DEFAULT_TOKEN {
		return Err(Error::PermissionDenied("the default namespace cannot be removed".into()));
	}
	validate_segment("token", token)?;
	app.registry_adapter.remove_by_token(token).await?;
	app.namespace_adapter.remove_tenant_dir(token).await?;
	info!("removed tenant {}", token);
	Ok(())
}

// Subdomains //
//************//

pub async fn create_subdomain(app: &App, token: &str, subdomain: &str) -> ClResult<()> {
	require_registered(app, token).await?;
	app.namespace_adapter.create_subdomain_dir(token, subdomain).await?;
	info!("created subdomain {} for {}", subdomain, token);
	Ok(())
}

pub async fn list_subdomains(app: &App, token: &str) -> ClResult<Vec<Box<str>>> {
	require_registered(app, token).await?;
	app.namespace_adapter.list_subdomains(token).await
}

pub async fn remove_subdomain(app: &App, token: &str, subdomain: &str) -> ClResult<()> {
	require_registered(app, token).await?;
	app.namespace_adapter.remove_subdomain_dir(token, subdomain).await?;
	info!("removed subdomain {} of {}", subdomain, token);
	Ok(())
}

// Property files //
//****************//

/// Stores a property file in a tenant (or subdomain) directory, replacing any
/// previous content. Returns the number of bytes written.
pub async fn upload_file(
	app: &App,
	path: &ConfigPath<'_>,
	data: &mut (dyn AsyncRead + Send + Unpin),
) -> ClResult<u64> {
	require_filename(path)?;
	require_registered(app, path.token).await?;
	let size = app.namespace_adapter.create_file_stream(path, data).await?;
	info!("uploaded {} ({} bytes)", path, size);
	Ok(size)
}

pub async fn fetch_file(app: &App, path: &ConfigPath<'_>) -> ClResult<FileStream> {
	require_filename(path)?;
	app.namespace_adapter.read_file_stream(path).await
}

pub async fn remove_file(app: &App, path: &ConfigPath<'_>) -> ClResult<()> {
	require_filename(path)?;
	app.namespace_adapter.remove_file(path).await?;
	info!("removed {}", path);
	Ok(())
}

// Loading //
//*********//

/// Ingests the selected part of a tenant namespace and pushes it to the
/// remote store. Returns the number of keys written.
pub async fn load_config(app: &App, path: &ConfigPath<'_>) -> ClResult<usize> {
	path.validate()?;

	let _guard = app.load_lock.lock().await;
	let map = ingest::ingest_selection(app.namespace_adapter.as_ref(), path).await?;
	let prefix = sync::key_prefix(path.token, path.subdomain);
	let written = sync::push(app.kv_adapter.as_ref(), &prefix, &map).await?;
	info!("loaded configuration of {} ({} keys)", path, written);
	Ok(written)
}

/// Ingests the built-in configuration tree and pushes it under `default/`
pub async fn load_default_config(app: &App) -> ClResult<usize> {
	let _guard = app.load_lock.lock().await;
	let map = ingest::ingest_tree(&app.opts.default_config_dir, DEFAULT_LABEL).await?;
	let prefix = sync::key_prefix(DEFAULT_TOKEN, None);
	let written = sync::push(app.kv_adapter.as_ref(), &prefix, &map).await?;
	info!("loaded default configuration ({} keys)", written);
	Ok(written)
}

// vim: ts=4
