//! Tenant service tests
//!
//! Runs the service against the JSON registry and the filesystem namespace in a
//! temporary directory, with the in-memory store standing in for the remote KV
//! store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tempfile::TempDir;

use dkv_core::app::{AppBuilderOpts, AppState};
use dkv_core::App;
use dkv_kv_adapter_memory::KvAdapterMemory;
use dkv_namespace_adapter_fs::NamespaceAdapterFs;
use dkv_registry_adapter_json::RegistryAdapterJson;
use dkv_tenant::service;
use dkv_types::error::{ClResult, Error};
use dkv_types::kv_adapter::KvAdapter;
use dkv_types::types::{ConfigPath, DEFAULT_TOKEN};

struct TestApp {
	app: App,
	kv: Arc<KvAdapterMemory>,
	temp: TempDir,
}

impl TestApp {
	fn mount(&self) -> std::path::PathBuf {
		self.temp.path().join("mount")
	}

	fn kv_pairs(&self) -> Vec<(String, String)> {
		self.kv.snapshot().into_iter().map(|(k, v)| (k.into(), v.into())).collect()
	}
}

async fn create_test_app() -> TestApp {
	let temp = TempDir::new().expect("Failed to create temp directory");
	let kv = Arc::new(KvAdapterMemory::new());
	let app = create_app_with_kv(&temp, kv.clone()).await;
	TestApp { app, kv, temp }
}

async fn create_app_with_kv(temp: &TempDir, kv: Arc<dyn KvAdapter>) -> App {
	let registry = RegistryAdapterJson::new(temp.path().join("data/token_service_map.json"))
		.await
		.expect("Failed to create registry");
	let namespace = NamespaceAdapterFs::new(temp.path().join("mount").into())
		.await
		.expect("Failed to create namespace");

	let opts = AppBuilderOpts {
		default_config_dir: temp.path().join("configurations").into(),
		..AppBuilderOpts::default()
	};
	AppState::new(opts, Arc::new(registry), Arc::new(namespace), kv)
}

async fn upload(app: &App, path: ConfigPath<'_>, content: &str) {
	let mut data = content.as_bytes();
	service::upload_file(app, &path, &mut data).await.expect("upload");
}

#[tokio::test]
async fn test_register_creates_record_and_directory() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");

	assert_ne!(token.as_ref(), DEFAULT_TOKEN);
	assert!(t.mount().join(token.as_ref()).is_dir());

	let record = service::get_tenant(&t.app, &token).await.expect("get");
	assert_eq!(record.domain.as_ref(), "acme");
}

#[tokio::test]
async fn test_register_twice_conflicts() {
	let t = create_test_app().await;
	service::register(&t.app, "acme").await.expect("register");

	let res = service::register(&t.app, "acme").await;
	assert!(matches!(res, Err(Error::Conflict(_))));

	let records = t.app.registry_adapter.list().await.expect("list");
	assert_eq!(records.iter().filter(|r| r.domain.as_ref() == "acme").count(), 1);
}

#[tokio::test]
async fn test_register_distinct_tokens() {
	let t = create_test_app().await;
	let a = service::register(&t.app, "acme").await.expect("register");
	let b = service::register(&t.app, "globex").await.expect("register");
	assert_ne!(a, b);
}

#[tokio::test]
async fn test_register_rejects_empty_and_reserved() {
	let t = create_test_app().await;
	assert!(matches!(service::register(&t.app, "").await, Err(Error::ValidationError(_))));
	assert!(matches!(
		service::register(&t.app, DEFAULT_TOKEN).await,
		Err(Error::ValidationError(_))
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_of_same_domain() {
	let t = create_test_app().await;
	let mut handles = Vec::new();
	for _ in 0..8 {
		let app = t.app.clone();
		handles.push(tokio::spawn(async move { service::register(&app, "acme").await }));
	}

	let mut ok = 0;
	for handle in handles {
		if handle.await.expect("join").is_ok() {
			ok += 1;
		}
	}
	assert_eq!(ok, 1);
	// Losers never create a directory
	let dirs = std::fs::read_dir(t.mount())
		.expect("read mount")
		.filter_map(Result::ok)
		.filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
		.count();
	assert_eq!(dirs, 1);
}

#[tokio::test]
async fn test_remove_tenant() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");
	service::remove_tenant(&t.app, &token).await.expect("remove");

	assert!(!t.mount().join(token.as_ref()).exists());
	assert!(t.app.registry_adapter.list().await.expect("list").is_empty());
	assert!(matches!(service::get_tenant(&t.app, &token).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_remove_unknown_tenant() {
	let t = create_test_app().await;
	service::register(&t.app, "acme").await.expect("register");
	let before = t.app.registry_adapter.list().await.expect("list");

	let res = service::remove_tenant(&t.app, "3f1c0a4e-0000-4000-8000-000000000000").await;
	assert!(matches!(res, Err(Error::NotFound(_))));
	assert_eq!(t.app.registry_adapter.list().await.expect("list"), before);
}

#[tokio::test]
async fn test_remove_default_tenant_denied() {
	let t = create_test_app().await;
	let res = service::remove_tenant(&t.app, DEFAULT_TOKEN).await;
	assert!(matches!(res, Err(Error::PermissionDenied(_))));
}

#[tokio::test]
async fn test_subdomain_lifecycle() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");

	service::create_subdomain(&t.app, &token, "west").await.expect("create");
	service::create_subdomain(&t.app, &token, "east").await.expect("create");
	let subdomains = service::list_subdomains(&t.app, &token).await.expect("list");
	let expected: Vec<Box<str>> = vec!["east".into(), "west".into()];
	assert_eq!(subdomains, expected);

	service::remove_subdomain(&t.app, &token, "west").await.expect("remove");
	assert!(!t.mount().join(token.as_ref()).join("west").exists());
}

#[tokio::test]
async fn test_subdomain_requires_registered_token() {
	let t = create_test_app().await;
	assert!(matches!(
		service::create_subdomain(&t.app, "unknown", "west").await,
		Err(Error::NotFound(_))
	));
	assert!(matches!(
		service::remove_subdomain(&t.app, "unknown", "west").await,
		Err(Error::NotFound(_))
	));
	assert!(!t.mount().join("unknown").exists());
}

#[tokio::test]
async fn test_upload_fetch_remove_file() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");
	let path = ConfigPath::file(&token, None, "app.properties");
	upload(&t.app, path, "a=1\n").await;

	let mut stream = service::fetch_file(&t.app, &path).await.expect("fetch");
	let mut content = Vec::new();
	while let Some(chunk) = stream.next().await {
		content.extend_from_slice(&chunk.expect("chunk"));
	}
	assert_eq!(content, b"a=1\n");

	service::remove_file(&t.app, &path).await.expect("remove");
	assert!(matches!(service::remove_file(&t.app, &path).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_upload_requires_registered_token_and_filename() {
	let t = create_test_app().await;
	let mut data: &[u8] = b"a=1";
	let res = service::upload_file(&t.app, &ConfigPath::file("unknown", None, "a.properties"), &mut data)
		.await;
	assert!(matches!(res, Err(Error::NotFound(_))));

	let token = service::register(&t.app, "acme").await.expect("register");
	let res = service::upload_file(&t.app, &ConfigPath::tenant(&token), &mut data).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_load_subdomain_concatenates_prefix() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");
	service::create_subdomain(&t.app, &token, "west").await.expect("subdomain");
	upload(&t.app, ConfigPath::file(&token, Some("west"), "net.properties"), "host=1.2.3.4\n").await;

	let written = service::load_config(&t.app, &ConfigPath::subdomain(&token, "west"))
		.await
		.expect("load");
	assert_eq!(written, 1);
	assert_eq!(t.kv_pairs(), vec![(format!("{}/westhost", token), "1.2.3.4".to_string())]);
}

#[tokio::test]
async fn test_load_whole_tenant_tree() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");
	service::create_subdomain(&t.app, &token, "west").await.expect("subdomain");
	upload(&t.app, ConfigPath::file(&token, None, "a.properties"), "x=top\n").await;
	upload(&t.app, ConfigPath::file(&token, Some("west"), "b.properties"), "y=sub\n").await;

	let written = service::load_config(&t.app, &ConfigPath::tenant(&token)).await.expect("load");
	assert_eq!(written, 2);
	assert_eq!(
		t.kv_pairs(),
		vec![(format!("{}/x", token), "top".to_string()), (format!("{}/y", token), "sub".to_string())]
	);
}

#[tokio::test]
async fn test_load_single_file() {
	let t = create_test_app().await;
	let token = service::register(&t.app, "acme").await.expect("register");
	upload(&t.app, ConfigPath::file(&token, None, "a.properties"), "a=1\n").await;
	upload(&t.app, ConfigPath::file(&token, None, "b.properties"), "b=2\n").await;

	service::load_config(&t.app, &ConfigPath::file(&token, None, "b.properties"))
		.await
		.expect("load");
	assert_eq!(t.kv_pairs(), vec![(format!("{}/b", token), "2".to_string())]);
}

#[tokio::test]
async fn test_load_without_directory_leaves_store_untouched() {
	let t = create_test_app().await;
	let res = service::load_config(&t.app, &ConfigPath::tenant("no-such-token")).await;
	assert!(matches!(res, Err(Error::NotFound(_) | Error::IoError(_))));
	assert!(t.kv_pairs().is_empty());
}

#[tokio::test]
async fn test_load_default_config() {
	let t = create_test_app().await;
	let dir = t.temp.path().join("configurations");
	std::fs::create_dir_all(dir.join("db")).expect("mkdir");
	std::fs::write(dir.join("app.properties"), "name=dkv\n").expect("write");
	std::fs::write(dir.join("db/pool.properties"), "size=10\n").expect("write");

	let written = service::load_default_config(&t.app).await.expect("load");
	assert_eq!(written, 2);
	assert_eq!(
		t.kv_pairs(),
		vec![
			("default/name".to_string(), "dkv".to_string()),
			("default/size".to_string(), "10".to_string())
		]
	);
}

/// Remote store that records write order and yields on every write
#[derive(Debug, Default)]
struct SlowKv {
	written: Mutex<Vec<String>>,
}

#[async_trait]
impl KvAdapter for SlowKv {
	async fn put(&self, key: &str, _value: &str) -> ClResult<()> {
		self.written.lock().expect("lock").push(key.to_string());
		tokio::time::sleep(Duration::from_millis(2)).await;
		Ok(())
	}

	async fn get(&self, _key: &str) -> ClResult<Option<Box<str>>> {
		Ok(None)
	}

	async fn list(&self, _prefix: &str) -> ClResult<Vec<Box<str>>> {
		Ok(Vec::new())
	}

	async fn delete(&self, _key: &str) -> ClResult<()> {
		Ok(())
	}

	async fn check_health(&self) -> ClResult<()> {
		Ok(())
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_do_not_interleave() {
	let temp = TempDir::new().expect("Failed to create temp directory");
	let kv = Arc::new(SlowKv::default());
	let app = create_app_with_kv(&temp, kv.clone()).await;

	let props: String = (0..10).map(|i| format!("key{}=v{}\n", i, i)).collect();
	let a = service::register(&app, "acme").await.expect("register");
	let b = service::register(&app, "globex").await.expect("register");
	upload(&app, ConfigPath::file(&a, None, "a.properties"), &props).await;
	upload(&app, ConfigPath::file(&b, None, "b.properties"), &props).await;
	let dir = temp.path().join("configurations");
	std::fs::create_dir_all(&dir).expect("mkdir");
	std::fs::write(dir.join("app.properties"), &props).expect("write");

	let path_a = ConfigPath::tenant(&a);
	let path_b = ConfigPath::tenant(&b);
	let (ra, rb, rd) = tokio::join!(
		service::load_config(&app, &path_a),
		service::load_config(&app, &path_b),
		service::load_default_config(&app),
	);
	assert_eq!(ra.expect("load a"), 10);
	assert_eq!(rb.expect("load b"), 10);
	assert_eq!(rd.expect("load default"), 10);

	// Each load writes its keys as one contiguous run
	let written = kv.written.lock().expect("lock").clone();
	assert_eq!(written.len(), 30);
	let mut runs: Vec<&str> =
		written.iter().map(|key| key.split('/').next().unwrap_or_default()).collect();
	runs.dedup();
	assert_eq!(runs.len(), 3, "writes interleaved: {:?}", written);
}

// vim: ts=4
