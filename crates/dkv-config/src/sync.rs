//! Pushes a flattened configuration to the remote KV store

use dkv_types::kv_adapter::KvAdapter;

use crate::prelude::*;

/// Key prefix of a tenant or subdomain.
///
/// The prefix is concatenated with the property key as is, so a subdomain
/// prefix has no trailing separator: token `T`, subdomain `west` and key
/// `host` give `T/westhost`.
pub fn key_prefix(token: &str, subdomain: Option<&str>) -> String {
	match subdomain {
		Some(subdomain) if !subdomain.is_empty() => format!("{}/{}", token, subdomain),
		_ => format!("{}/", token),
	}
}

/// Writes every entry of `map` under `prefix`, one key at a time.
///
/// Stops at the first failing write and returns its error. Keys written before
/// the failure stay in the store.
pub async fn push(kv: &dyn KvAdapter, prefix: &str, map: &PropertyMap) -> ClResult<usize> {
	for (written, (key, value)) in map.iter().enumerate() {
		let full_key = format!("{}{}", prefix, key);
		kv.put(&full_key, value).await.inspect_err(|err| {
			warn!("write of {} failed after {} keys: {}", full_key, written, err);
		})?;
		info!("Key: {} | Value: {}", full_key, value);
	}
	info!("wrote {} keys under '{}'", map.len(), prefix);
	Ok(map.len())
}


// vim: ts=4
