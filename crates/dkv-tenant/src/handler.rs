use axum::{
	Json,
	body::Body,
	extract::{Multipart, Path, Query, State},
	http::{StatusCode, header},
	response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use dkv_types::types::ApiResponse;

use crate::prelude::*;
use crate::service;

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "configFile";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
	#[serde(default)]
	pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
	pub token: Box<str>,
}

#[derive(Debug, Serialize)]
pub struct TenantResponse {
	pub token: Box<str>,
	pub domain: Box<str>,
}

#[derive(Debug, Deserialize)]
pub struct SubdomainRequest {
	#[serde(default)]
	pub subdomain: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigQuery {
	#[serde(default)]
	pub token: String,
	#[serde(default)]
	pub subdomain: String,
	#[serde(default)]
	pub filename: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoadConfigRequest {
	#[serde(default)]
	pub token: String,
	#[serde(default)]
	pub subdomain: String,
	#[serde(default)]
	pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct LoadConfigResponse {
	pub keys: usize,
}

type Message = (StatusCode, Json<ApiResponse<&'static str>>);

fn message(status: StatusCode, msg: &'static str) -> Message {
	(status, Json(ApiResponse::new(msg)))
}

fn require_token(token: &str) -> ClResult<()> {
	if token.is_empty() {
		return Err(Error::ValidationError("token not set".into()));
	}
	Ok(())
}

// Registration //
//**************//

/// POST /v1/register
pub async fn post_register(
	State(app): State<App>,
	Json(req): Json<RegisterRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
	let token = service::register(&app, &req.domain).await?;
	Ok((StatusCode::CREATED, Json(ApiResponse::new(RegisterResponse { token }))))
}

/// GET /v1/register/{token}
pub async fn get_register(
	State(app): State<App>,
	Path(token): Path<String>,
) -> ClResult<(StatusCode, Json<ApiResponse<TenantResponse>>)> {
	let record = service::get_tenant(&app, &token).await?;
	let response = TenantResponse { token: record.token, domain: record.domain };
	Ok((StatusCode::OK, Json(ApiResponse::new(response))))
}

/// DELETE /v1/register/{token}
pub async fn delete_register(
	State(app): State<App>,
	Path(token): Path<String>,
) -> ClResult<Message> {
	service::remove_tenant(&app, &token).await?;
	Ok(message(StatusCode::OK, "deletion of service is successful"))
}

// Subdomains //
//************//

/// POST /v1/register/{token}/subdomain
pub async fn post_subdomain(
	State(app): State<App>,
	Path(token): Path<String>,
	Json(req): Json<SubdomainRequest>,
) -> ClResult<Message> {
	if req.subdomain.is_empty() {
		return Err(Error::ValidationError("subdomain not set".into()));
	}
	service::create_subdomain(&app, &token, &req.subdomain).await?;
	Ok(message(StatusCode::CREATED, "subdomain creation successful"))
}

/// GET /v1/register/{token}/subdomain
pub async fn get_subdomains(
	State(app): State<App>,
	Path(token): Path<String>,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<Box<str>>>>)> {
	let subdomains = service::list_subdomains(&app, &token).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(subdomains))))
}

/// DELETE /v1/register/{token}/subdomain/{subdomain}
pub async fn delete_subdomain(
	State(app): State<App>,
	Path((token, subdomain)): Path<(String, String)>,
) -> ClResult<Message> {
	service::remove_subdomain(&app, &token, &subdomain).await?;
	Ok(message(StatusCode::OK, "deletion of subdomain is successful"))
}

// Property files //
//****************//

/// POST /v1/config
///
/// Multipart form with `token`, an optional `subdomain` and the file itself in
/// the `configFile` field. The stored file keeps the uploaded file name.
pub async fn post_config(State(app): State<App>, mut multipart: Multipart) -> ClResult<Message> {
	let mut token = String::new();
	let mut subdomain = String::new();
	let mut upload: Option<(String, axum::body::Bytes)> = None;

	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(|err| Error::ValidationError(format!("invalid multipart body: {}", err)))?
	{
		let name = field.name().unwrap_or_default().to_string();
		match name.as_str() {
			"token" => token = field.text().await.map_err(multipart_error)?,
			"subdomain" => subdomain = field.text().await.map_err(multipart_error)?,
			UPLOAD_FIELD => {
				let filename = field.file_name().unwrap_or_default().to_string();
				let data = field.bytes().await.map_err(multipart_error)?;
				if data.len() > app.opts.max_upload_bytes {
					return Err(Error::ValidationError(format!(
						"file exceeds the upload limit of {} bytes",
						app.opts.max_upload_bytes
					)));
				}
				upload = Some((filename, data));
			}
			_ => {}
		}
	}

	require_token(&token)?;
	let Some((filename, data)) = upload else {
		return Err(Error::ValidationError(format!("'{}' field missing", UPLOAD_FIELD)));
	};
	let path = ConfigPath::from_request(&token, &subdomain, &filename);
	let mut reader: &[u8] = &data;
	service::upload_file(&app, &path, &mut reader).await?;
	Ok(message(StatusCode::CREATED, "upload successful"))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> Error {
	Error::ValidationError(format!("invalid multipart field: {}", err))
}

/// GET /v1/config?token=&subdomain=&filename=
pub async fn get_config(
	State(app): State<App>,
	Query(query): Query<ConfigQuery>,
) -> ClResult<Response> {
	require_token(&query.token)?;
	let path = ConfigPath::from_request(&query.token, &query.subdomain, &query.filename);
	let stream = service::fetch_file(&app, &path).await?;
	Ok((
		[(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
		Body::from_stream(stream),
	)
		.into_response())
}

/// DELETE /v1/config?token=&subdomain=&filename=
pub async fn delete_config(
	State(app): State<App>,
	Query(query): Query<ConfigQuery>,
) -> ClResult<Message> {
	require_token(&query.token)?;
	let path = ConfigPath::from_request(&query.token, &query.subdomain, &query.filename);
	service::remove_file(&app, &path).await?;
	Ok(message(StatusCode::OK, "deletion of config is successful"))
}

// Loading //
//*********//

/// POST /v1/loadconfig
pub async fn post_load_config(
	State(app): State<App>,
	Json(req): Json<LoadConfigRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<LoadConfigResponse>>)> {
	require_token(&req.token)?;
	let path = ConfigPath::from_request(&req.token, &req.subdomain, &req.filename);
	let keys = service::load_config(&app, &path).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(LoadConfigResponse { keys }))))
}

/// POST /v1/loadconfig/default
pub async fn post_load_default_config(
	State(app): State<App>,
) -> ClResult<(StatusCode, Json<ApiResponse<LoadConfigResponse>>)> {
	let keys = service::load_default_config(&app).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(LoadConfigResponse { keys }))))
}

// vim: ts=4
