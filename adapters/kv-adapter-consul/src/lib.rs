//! Remote KV store adapter speaking the Consul HTTP KV API.

use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{Method, StatusCode, body::Bytes};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use url::Url;

use dkv::{kv_adapter::KvAdapter, prelude::*};

pub const DEFAULT_PORT: u16 = 8500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KvAdapterConsul {
	base: Url,
	client: Client<HttpConnector, Full<Bytes>>,
	timeout: Duration,
}

impl std::fmt::Debug for KvAdapterConsul {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KvAdapterConsul")
			.field("base", &self.base.as_str())
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

/// Parses the configured agent address (`host:port` or an `http://` URL)
pub fn parse_address(address: &str) -> ClResult<Url> {
	let address = address.trim();
	if address.is_empty() {
		return Err(Error::ConfigError("datastore address not set".into()));
	}
	let with_scheme = if address.contains("://") {
		address.to_string()
	} else {
		format!("http://{}", address)
	};
	let url = Url::parse(&with_scheme)
		.map_err(|err| Error::ConfigError(format!("invalid datastore address '{}': {}", address, err)))?;
	if url.scheme() != "http" || url.host_str().is_none() {
		return Err(Error::ConfigError(format!("unsupported datastore address '{}'", address)));
	}
	Ok(url)
}

impl KvAdapterConsul {
	pub fn new(address: &str, timeout: Duration) -> ClResult<Self> {
		let base = parse_address(address)?;
		let client = Client::builder(TokioExecutor::new()).build_http();
		info!("Consul datastore at {}", base);
		Ok(Self { base, client, timeout })
	}

	/// URL of a key below `/v1/kv/`. Every `/`-separated part of the key is
	/// percent-encoded as its own path segment.
	pub fn kv_url(&self, key: &str, query: Option<&str>) -> ClResult<Url> {
		let mut url = self.base.clone();
		url.path_segments_mut()
			.map_err(|()| Error::ConfigError("datastore address cannot be a base URL".into()))?
			.clear()
			.push("v1")
			.push("kv")
			.extend(key.split('/'));
		url.set_query(query);
		Ok(url)
	}

	fn status_url(&self) -> ClResult<Url> {
		self.base
			.join("/v1/status/leader")
			.map_err(|err| Error::ConfigError(format!("invalid datastore address: {}", err)))
	}

	async fn request(&self, method: Method, url: &Url, body: Bytes) -> ClResult<(StatusCode, Bytes)> {
		let req = hyper::Request::builder()
			.method(method)
			.uri(url.as_str())
			.body(Full::new(body))
			.map_err(|err| Error::Internal(format!("failed to build datastore request: {}", err)))?;

		let res = match tokio::time::timeout(self.timeout, self.client.request(req)).await {
			Ok(Ok(res)) => res,
			Ok(Err(err)) => {
				warn!("datastore request failed: {}", err);
				return Err(Error::ServiceUnavailable("cannot talk to the datastore".into()));
			}
			Err(_) => return Err(Error::Timeout),
		};
		let status = res.status();
		let body = tokio::time::timeout(self.timeout, res.into_body().collect())
			.await
			.map_err(|_| Error::Timeout)?
			.map_err(|err| Error::NetworkError(format!("failed to read response: {}", err)))?
			.to_bytes();
		Ok((status, body))
	}
}

fn unexpected(op: &str, status: StatusCode, body: &[u8]) -> Error {
	Error::NetworkError(format!(
		"{} returned {}: {}",
		op,
		status,
		String::from_utf8_lossy(body).trim()
	))
}

#[async_trait]
impl KvAdapter for KvAdapterConsul {
	async fn put(&self, key: &str, value: &str) -> ClResult<()> {
		let url = self.kv_url(key, None)?;
		let (status, body) =
			self.request(Method::PUT, &url, Bytes::copy_from_slice(value.as_bytes())).await?;
		// Consul answers `true` on success and `false` when the write was refused
		if status.is_success() && body.trim_ascii() == b"true" {
			Ok(())
		} else {
			Err(unexpected("put", status, &body))
		}
	}

	async fn get(&self, key: &str) -> ClResult<Option<Box<str>>> {
		let url = self.kv_url(key, Some("raw"))?;
		let (status, body) = self.request(Method::GET, &url, Bytes::new()).await?;
		match status {
			StatusCode::NOT_FOUND => Ok(None),
			s if s.is_success() => String::from_utf8(body.to_vec())
				.map(|v| Some(v.into_boxed_str()))
				.map_err(|_| Error::Parse(format!("value of '{}' is not UTF-8", key))),
			s => Err(unexpected("get", s, &body)),
		}
	}

	async fn list(&self, prefix: &str) -> ClResult<Vec<Box<str>>> {
		let url = self.kv_url(prefix, Some("keys"))?;
		let (status, body) = self.request(Method::GET, &url, Bytes::new()).await?;
		match status {
			StatusCode::NOT_FOUND => Ok(Vec::new()),
			s if s.is_success() => Ok(serde_json::from_slice::<Vec<Box<str>>>(&body)?),
			s => Err(unexpected("list", s, &body)),
		}
	}

	async fn delete(&self, key: &str) -> ClResult<()> {
		let url = self.kv_url(key, None)?;
		let (status, body) = self.request(Method::DELETE, &url, Bytes::new()).await?;
		if status.is_success() { Ok(()) } else { Err(unexpected("delete", status, &body)) }
	}

	async fn check_health(&self) -> ClResult<()> {
		let url = self.status_url()?;
		let (status, body) = self.request(Method::GET, &url, Bytes::new()).await?;
		let leader: String = serde_json::from_slice(&body).unwrap_or_default();
		if status.is_success() && !leader.is_empty() {
			debug!("datastore leader: {}", leader);
			Ok(())
		} else {
			Err(Error::ServiceUnavailable(
				"cannot talk to the datastore, check if it is running and reachable".into(),
			))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_address() {
		assert!(matches!(parse_address(""), Err(Error::ConfigError(_))));
		assert!(matches!(parse_address("ftp://x"), Err(Error::ConfigError(_))));
		let url = parse_address("10.0.0.5:8500").map(|u| u.to_string()).unwrap_or_default();
		assert_eq!(url, "http://10.0.0.5:8500/");
	}

	#[test]
	fn test_kv_url_encodes_segments() -> ClResult<()> {
		let kv = KvAdapterConsul::new("localhost:8500", DEFAULT_TIMEOUT)?;
		assert_eq!(kv.kv_url("t/westhost", None)?.as_str(), "http://localhost:8500/v1/kv/t/westhost");
		assert_eq!(kv.kv_url("t/", Some("keys"))?.as_str(), "http://localhost:8500/v1/kv/t/?keys");
		assert_eq!(kv.kv_url("", Some("keys"))?.as_str(), "http://localhost:8500/v1/kv/?keys");
		assert_eq!(
			kv.kv_url("t/a key?x", None)?.as_str(),
			"http://localhost:8500/v1/kv/t/a%20key%3Fx"
		);
		Ok(())
	}
}

// vim: ts=4
