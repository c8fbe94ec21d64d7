//! Key-value store kept in process memory.
//!
//! Used with `DATASTORE=memory` for local development and as the remote store
//! stand-in of integration tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use dkv::{kv_adapter::KvAdapter, prelude::*};

#[derive(Debug, Default)]
pub struct KvAdapterMemory {
	data: RwLock<BTreeMap<Box<str>, Box<str>>>,
}

impl KvAdapterMemory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copy of the whole store
	pub fn snapshot(&self) -> BTreeMap<Box<str>, Box<str>> {
		self.data.read().clone()
	}
}

#[async_trait]
impl KvAdapter for KvAdapterMemory {
	async fn put(&self, key: &str, value: &str) -> ClResult<()> {
		self.data.write().insert(key.into(), value.into());
		Ok(())
	}

	async fn get(&self, key: &str) -> ClResult<Option<Box<str>>> {
		Ok(self.data.read().get(key).cloned())
	}

	async fn list(&self, prefix: &str) -> ClResult<Vec<Box<str>>> {
		Ok(self.data.read().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
	}

	async fn delete(&self, key: &str) -> ClResult<()> {
		self.data.write().remove(key);
		Ok(())
	}

	async fn check_health(&self) -> ClResult<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_put_get_list_delete() -> ClResult<()> {
		let kv = KvAdapterMemory::new();
		kv.put("t/a", "1").await?;
		kv.put("t/b", "2").await?;
		kv.put("u/a", "3").await?;

		assert_eq!(kv.get("t/a").await?.as_deref(), Some("1"));
		assert_eq!(kv.get("t/zz").await?, None);
		let expected: Vec<Box<str>> = vec!["t/a".into(), "t/b".into()];
		assert_eq!(kv.list("t/").await?, expected);
		assert_eq!(kv.list("").await?.len(), 3);

		kv.delete("t/a").await?;
		kv.delete("t/a").await?;
		assert_eq!(kv.get("t/a").await?, None);
		Ok(())
	}
}

// vim: ts=4
