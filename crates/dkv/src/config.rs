//! Process configuration read from environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::prelude::*;

pub const DEFAULT_DATASTORE_PORT: u16 = 8500;
pub const DEFAULT_DATASTORE_TIMEOUT_SECS: u64 = 10;

/// Remote KV store selected with `DATASTORE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datastore {
	/// Consul agent at `DATASTORE_IP:DATASTORE_PORT`
	Consul { address: String },
	/// Process-local store, contents are lost on exit
	Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub datastore: Datastore,
	pub datastore_timeout: Duration,
	pub mount_path: PathBuf,
	pub registry_path: PathBuf,
	pub default_config_dir: PathBuf,
	pub listen: String,
	pub max_upload_bytes: usize,
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>, default: T) -> ClResult<T> {
	match value {
		None => Ok(default),
		Some(value) => value
			.trim()
			.parse()
			.map_err(|_| Error::ConfigError(format!("invalid value for {}: '{}'", name, value))),
	}
}

impl Config {
	pub fn from_env() -> ClResult<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`. Empty values count as unset.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClResult<Self> {
		let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

		let datastore = match var("DATASTORE").map(|v| v.trim().to_ascii_lowercase()).as_deref() {
			None => {
				return Err(Error::ConfigError(
					"DATASTORE not set, expected 'consul' or 'memory'".into(),
				));
			}
			Some("consul") => {
				let Some(ip) = var("DATASTORE_IP") else {
					return Err(Error::ConfigError("DATASTORE_IP not set".into()));
				};
				let port = parse_var("DATASTORE_PORT", var("DATASTORE_PORT"), DEFAULT_DATASTORE_PORT)?;
				Datastore::Consul { address: format!("{}:{}", ip.trim(), port) }
			}
			Some("memory") => Datastore::Memory,
			Some(other) => {
				return Err(Error::ConfigError(format!("unsupported DATASTORE '{}'", other)));
			}
		};

		let timeout_secs = parse_var(
			"DATASTORE_TIMEOUT_SECS",
			var("DATASTORE_TIMEOUT_SECS"),
			DEFAULT_DATASTORE_TIMEOUT_SECS,
		)?;
		if timeout_secs == 0 {
			return Err(Error::ConfigError("DATASTORE_TIMEOUT_SECS must be positive".into()));
		}

		Ok(Config {
			datastore,
			datastore_timeout: Duration::from_secs(timeout_secs),
			mount_path: var("MOUNTPATH").unwrap_or_else(|| "./mountpath".into()).into(),
			registry_path: var("REGISTRY_PATH")
				.unwrap_or_else(|| "./data/token_service_map.json".into())
				.into(),
			default_config_dir: var("DEFAULT_CONFIG_DIR")
				.unwrap_or_else(|| "./configurations".into())
				.into(),
			listen: var("LISTEN").unwrap_or_else(|| "0.0.0.0:8080".into()),
			max_upload_bytes: parse_var(
				"MAX_UPLOAD_BYTES",
				var("MAX_UPLOAD_BYTES"),
				dkv_core::app::DEFAULT_MAX_UPLOAD_BYTES,
			)?,
		})
	}
}


// vim: ts=4
