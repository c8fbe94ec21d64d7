//! App builder - constructs and runs the DKV application

use std::sync::Arc;

use crate::kv_adapter::KvAdapter;
use crate::namespace_adapter::NamespaceAdapter;
use crate::prelude::*;
use crate::registry_adapter::RegistryAdapter;
use crate::routes;
pub use dkv_core::app::{Adapters, App, AppBuilderOpts, AppState, VERSION};

pub struct AppBuilder {
	opts: AppBuilderOpts,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A subscriber may already be installed (tests, embedding applications)
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder { opts: AppBuilderOpts::default(), adapters: Adapters::default() }
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn default_config_dir(&mut self, dir: impl Into<Box<std::path::Path>>) -> &mut Self {
		self.opts.default_config_dir = dir.into();
		self
	}
	pub fn max_upload_bytes(&mut self, max_upload_bytes: usize) -> &mut Self {
		self.opts.max_upload_bytes = max_upload_bytes;
		self
	}

	// Adapters
	pub fn registry_adapter(&mut self, registry_adapter: Arc<dyn RegistryAdapter>) -> &mut Self {
		self.adapters.registry_adapter = Some(registry_adapter);
		self
	}
	pub fn namespace_adapter(&mut self, namespace_adapter: Arc<dyn NamespaceAdapter>) -> &mut Self {
		self.adapters.namespace_adapter = Some(namespace_adapter);
		self
	}
	pub fn kv_adapter(&mut self, kv_adapter: Arc<dyn KvAdapter>) -> &mut Self {
		self.adapters.kv_adapter = Some(kv_adapter);
		self
	}

	/// Checks the adapters and the remote store, then builds the shared state
	pub async fn build(self) -> ClResult<App> {
		let Some(registry_adapter) = self.adapters.registry_adapter else {
			error!("FATAL: No registry adapter configured");
			return Err(Error::ConfigError("No registry adapter configured".to_string()));
		};
		let Some(namespace_adapter) = self.adapters.namespace_adapter else {
			error!("FATAL: No namespace adapter configured");
			return Err(Error::ConfigError("No namespace adapter configured".to_string()));
		};
		let Some(kv_adapter) = self.adapters.kv_adapter else {
			error!("FATAL: No KV adapter configured");
			return Err(Error::ConfigError("No KV adapter configured".to_string()));
		};

		if let Err(err) = kv_adapter.check_health().await {
			error!("FATAL: Datastore health check failed: {}", err);
			return Err(match err {
				Error::ServiceUnavailable(msg) => Error::ServiceUnavailable(msg),
				err => Error::ServiceUnavailable(format!("datastore health check failed: {}", err)),
			});
		}
		info!("Datastore is reachable");

		Ok(AppState::new(self.opts, registry_adapter, namespace_adapter, kv_adapter))
	}

	pub async fn run(self) -> ClResult<()> {
		info!(" ____  _  ____     __");
		info!("|  _ \\| |/ /\\ \\   / /");
		info!("| | | | ' /  \\ \\ / /");
		info!("| |_| | . \\   \\ V /");
		info!("|____/|_|\\_\\   \\_/");
		info!("V{}", VERSION);
		info!("");

		let app = self.build().await?;
		let router = routes::init(app.clone());

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await.map_err(|e| {
			error!("FATAL: Cannot listen on {}: {}", app.opts.listen, e);
			Error::ConfigError(format!("Cannot listen on {}: {}", app.opts.listen, e))
		})?;
		info!("Listening on HTTP {}", app.opts.listen);

		axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
		info!("Shut down");
		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!("Cannot listen for shutdown signal: {}", err);
		std::future::pending::<()>().await;
	}
}

// vim: ts=4
