//! Adapter that persists the token -> domain registry
use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait RegistryAdapter: Debug + Send + Sync {
	/// Returns every live record in registration order
	async fn list(&self) -> ClResult<Vec<TenantRecord>>;

	/// Checks whether a domain is already registered
	async fn find_by_domain(&self, domain: &str) -> ClResult<bool> {
		Ok(self.list().await?.iter().any(|r| r.domain.as_ref() == domain))
	}

	/// Checks whether a token is registered
	async fn find_by_token(&self, token: &str) -> ClResult<bool> {
		Ok(self.get_by_token(token).await?.is_some())
	}

	/// Reads the record of a token
	async fn get_by_token(&self, token: &str) -> ClResult<Option<TenantRecord>> {
		Ok(self.list().await?.into_iter().find(|r| r.token.as_ref() == token))
	}

	/// Appends a new record.
	///
	/// Fails with `Conflict` if the token or the domain is already present.
	async fn append(&self, record: TenantRecord) -> ClResult<()>;

	/// Removes the record of a token. Fails with `NotFound` if there is none.
	async fn remove_by_token(&self, token: &str) -> ClResult<()>;
}

// vim: ts=4
