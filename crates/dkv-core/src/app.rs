//! App state type

use std::{path::Path, path::PathBuf, sync::Arc};

use dkv_types::kv_adapter::KvAdapter;
use dkv_types::namespace_adapter::NamespaceAdapter;
use dkv_types::registry_adapter::RegistryAdapter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upload size limit when none is configured
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub struct AppState {
	pub opts: AppBuilderOpts,

	pub registry_adapter: Arc<dyn RegistryAdapter>,
	pub namespace_adapter: Arc<dyn NamespaceAdapter>,
	pub kv_adapter: Arc<dyn KvAdapter>,

	/// Held from the start of ingestion until the last key is pushed
	pub load_lock: tokio::sync::Mutex<()>,
	/// Held across the domain check, directory creation and registry append
	pub registration_lock: tokio::sync::Mutex<()>,
}

impl AppState {
	pub fn new(
		opts: AppBuilderOpts,
		registry_adapter: Arc<dyn RegistryAdapter>,
		namespace_adapter: Arc<dyn NamespaceAdapter>,
		kv_adapter: Arc<dyn KvAdapter>,
	) -> App {
		Arc::new(AppState {
			opts,
			registry_adapter,
			namespace_adapter,
			kv_adapter,
			load_lock: tokio::sync::Mutex::new(()),
			registration_lock: tokio::sync::Mutex::new(()),
		})
	}
}

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState").field("opts", &self.opts).finish_non_exhaustive()
	}
}

pub type App = Arc<AppState>;

#[derive(Default)]
pub struct Adapters {
	pub registry_adapter: Option<Arc<dyn RegistryAdapter>>,
	pub namespace_adapter: Option<Arc<dyn NamespaceAdapter>>,
	pub kv_adapter: Option<Arc<dyn KvAdapter>>,
}

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Configuration tree synced under the `default/` prefix
	pub default_config_dir: Box<Path>,
	pub max_upload_bytes: usize,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		AppBuilderOpts {
			listen: "0.0.0.0:8080".into(),
			default_config_dir: PathBuf::from("./configurations").into(),
			max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
		}
	}
}

// vim: ts=4
