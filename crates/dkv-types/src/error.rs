//! Error type shared by every DKV crate and adapter.
//!
//! Messages carried by the variants are returned to API callers verbatim, so
//! they must only ever describe paths relative to the tenant namespace.

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Malformed or missing caller input
	ValidationError(String),
	/// Domain already registered
	Conflict(String),
	/// Directory or file already exists
	AlreadyExists(String),
	/// Unknown token, subdomain, file or key
	NotFound(String),
	/// Operation is not allowed on a reserved namespace
	PermissionDenied(String),

	/// Filesystem failure
	IoError(String),
	/// Malformed property file or registry document
	Parse(String),

	/// Remote KV store unreachable or unhealthy
	ServiceUnavailable(String),
	/// Remote KV store answered with an unexpected status
	NetworkError(String),
	Timeout,

	/// Missing or invalid environment / builder configuration
	ConfigError(String),
	Internal(String),
}

impl Error {
	/// Stable error code used in API responses
	pub fn code(&self) -> &'static str {
		match self {
			Error::ValidationError(_) => "E-VALIDATION",
			Error::Conflict(_) => "E-CONFLICT",
			Error::AlreadyExists(_) => "E-EXISTS",
			Error::NotFound(_) => "E-NOT-FOUND",
			Error::PermissionDenied(_) => "E-PERMISSION",
			Error::IoError(_) => "E-IO",
			Error::Parse(_) => "E-PARSE",
			Error::ServiceUnavailable(_) => "E-DATASTORE-UNAVAILABLE",
			Error::NetworkError(_) => "E-DATASTORE",
			Error::Timeout => "E-TIMEOUT",
			Error::ConfigError(_) => "E-CONFIG",
			Error::Internal(_) => "E-INTERNAL",
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Error::ValidationError(_) => StatusCode::BAD_REQUEST,
			Error::Conflict(_) | Error::AlreadyExists(_) => StatusCode::CONFLICT,
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
			Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			Error::NetworkError(_) => StatusCode::BAD_GATEWAY,
			Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
			Error::IoError(_) | Error::Parse(_) | Error::ConfigError(_) | Error::Internal(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// Translates an I/O error on a namespace-relative path.
	///
	/// `rel_path` is what the caller sees, never the absolute location on disk.
	pub fn from_io(err: &std::io::Error, rel_path: &str) -> Self {
		match err.kind() {
			std::io::ErrorKind::NotFound => Error::NotFound(format!("{} does not exist", rel_path)),
			std::io::ErrorKind::AlreadyExists => {
				Error::AlreadyExists(format!("{} already exists", rel_path))
			}
			std::io::ErrorKind::PermissionDenied => {
				Error::IoError(format!("{}: permission denied", rel_path))
			}
			kind => Error::IoError(format!("{}: {}", rel_path, kind)),
		}
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::AlreadyExists(msg)
			| Error::NotFound(msg)
			| Error::PermissionDenied(msg)
			| Error::IoError(msg) => write!(f, "{}", msg),
			Error::Parse(msg) => write!(f, "parse error: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "datastore unavailable: {}", msg),
			Error::NetworkError(msg) => write!(f, "datastore error: {}", msg),
			Error::Timeout => write!(f, "datastore request timed out"),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::from_io(&err, "resource")
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Parse(err.to_string())
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Internal(err.to_string())
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::warn!("request failed: {}", self);
		}
		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": self.to_string(),
			}
		});
		(status, Json(body)).into_response()
	}
}


// vim: ts=4
