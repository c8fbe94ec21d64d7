use std::{process::ExitCode, sync::Arc};

use dkv::AppBuilder;
use dkv::config::{Config, Datastore};
use dkv::kv_adapter::KvAdapter;
use dkv::prelude::*;
use dkv_kv_adapter_consul::KvAdapterConsul;
use dkv_kv_adapter_memory::KvAdapterMemory;
use dkv_namespace_adapter_fs::NamespaceAdapterFs;
use dkv_registry_adapter_json::RegistryAdapterJson;

async fn start() -> ClResult<()> {
	let mut builder = AppBuilder::new();
	let config = Config::from_env()?;
	info!("Configuration: {:?}", config);

	let registry = RegistryAdapterJson::new(config.registry_path.clone()).await?;
	let namespace = NamespaceAdapterFs::new(config.mount_path.clone().into()).await?;
	let kv: Arc<dyn KvAdapter> = match &config.datastore {
		Datastore::Consul { address } => {
			Arc::new(KvAdapterConsul::new(address, config.datastore_timeout)?)
		}
		Datastore::Memory => {
			warn!("Using the in-memory datastore, synced configuration is lost on exit");
			Arc::new(KvAdapterMemory::new())
		}
	};

	builder
		.listen(config.listen)
		.default_config_dir(config.default_config_dir)
		.max_upload_bytes(config.max_upload_bytes)
		.registry_adapter(Arc::new(registry))
		.namespace_adapter(Arc::new(namespace))
		.kv_adapter(kv);
	builder.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
	match start().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("FATAL: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
