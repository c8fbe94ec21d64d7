use axum::{
	Json, Router,
	extract::DefaultBodyLimit,
	routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use crate::types::ApiResponse;
use crate::{sync, tenant};

/// Room for multipart boundaries and the text fields around an upload
const MULTIPART_OVERHEAD: usize = 16 * 1024;

async fn health() -> Json<ApiResponse<&'static str>> {
	Json(ApiResponse::new("ok"))
}

async fn not_found() -> Error {
	Error::NotFound("no such endpoint".into())
}

pub fn init(app: App) -> Router {
	let body_limit = app.opts.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

	let register_router = Router::new()
		.route("/v1/register", post(tenant::handler::post_register))
		.route(
			"/v1/register/{token}",
			get(tenant::handler::get_register).delete(tenant::handler::delete_register),
		)
		.route(
			"/v1/register/{token}/subdomain",
			post(tenant::handler::post_subdomain).get(tenant::handler::get_subdomains),
		)
		.route(
			"/v1/register/{token}/subdomain/{subdomain}",
			delete(tenant::handler::delete_subdomain),
		);

	let config_router = Router::new()
		.route(
			"/v1/config",
			post(tenant::handler::post_config)
				.get(tenant::handler::get_config)
				.delete(tenant::handler::delete_config),
		)
		.route("/v1/loadconfig", post(tenant::handler::post_load_config))
		.route("/v1/loadconfig/default", post(tenant::handler::post_load_default_config));

	let datastore_router = Router::new()
		.route("/v1/getconfig/{*key}", get(sync::handler::get_config))
		.route("/v1/deleteconfig/{*key}", delete(sync::handler::delete_config))
		.route("/v1/getconfigs", get(sync::handler::list_configs));

	Router::new()
		.merge(register_router)
		.merge(config_router)
		.merge(datastore_router)
		.route("/health", get(health))
		.fallback(not_found)
		.layer(DefaultBodyLimit::max(body_limit))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
