//! Direct queries against the remote KV store

use std::collections::BTreeMap;

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};

use dkv_types::types::ApiResponse;

use crate::prelude::*;

fn require_key(key: &str) -> ClResult<&str> {
	let key = key.trim_start_matches('/');
	if key.is_empty() {
		return Err(Error::ValidationError("key not set".into()));
	}
	Ok(key)
}

/// GET /v1/getconfig/{*key}
pub async fn get_config(
	State(app): State<App>,
	Path(key): Path<String>,
) -> ClResult<(StatusCode, Json<ApiResponse<BTreeMap<String, Box<str>>>>)> {
	let key = require_key(&key)?;
	let Some(value) = app.kv_adapter.get(key).await? else {
		return Err(Error::NotFound(format!("key '{}' not found", key)));
	};
	let response = BTreeMap::from([(key.to_string(), value)]);
	Ok((StatusCode::OK, Json(ApiResponse::new(response))))
}

/// DELETE /v1/deleteconfig/{*key}
pub async fn delete_config(
	State(app): State<App>,
	Path(key): Path<String>,
) -> ClResult<(StatusCode, Json<ApiResponse<&'static str>>)> {
	let key = require_key(&key)?;
	app.kv_adapter.delete(key).await?;
	info!("deleted key {}", key);
	Ok((StatusCode::OK, Json(ApiResponse::new("key deletion successful"))))
}

/// GET /v1/getconfigs
pub async fn list_configs(
	State(app): State<App>,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<Box<str>>>>)> {
	let keys = app.kv_adapter.list("").await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(keys))))
}

// vim: ts=4
