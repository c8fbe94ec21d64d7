//! Common types used throughout the DKV service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::prelude::*;

/// Reserved name of the global configuration namespace.
///
/// It can neither be registered as a domain nor removed as a token.
pub const DEFAULT_TOKEN: &str = "default";

/// Flattened configuration: key -> value.
///
/// Ordered so that pushes and listings are reproducible.
pub type PropertyMap = BTreeMap<String, String>;

// TenantRecord //
//**************//
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
	pub token: Box<str>,
	#[serde(rename = "service")]
	pub domain: Box<str>,
}

impl TenantRecord {
	pub fn new(token: impl Into<Box<str>>, domain: impl Into<Box<str>>) -> Self {
		Self { token: token.into(), domain: domain.into() }
	}

	/// Blank record written by older releases in place of an empty list
	pub fn is_placeholder(&self) -> bool {
		self.token.is_empty()
	}
}

// ConfigPath //
//************//
/// Location inside a tenant namespace: `token[/subdomain][/filename]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigPath<'a> {
	pub token: &'a str,
	pub subdomain: Option<&'a str>,
	pub filename: Option<&'a str>,
}

impl<'a> ConfigPath<'a> {
	pub fn tenant(token: &'a str) -> Self {
		Self { token, subdomain: None, filename: None }
	}

	pub fn subdomain(token: &'a str, subdomain: &'a str) -> Self {
		Self { token, subdomain: Some(subdomain), filename: None }
	}

	pub fn file(token: &'a str, subdomain: Option<&'a str>, filename: &'a str) -> Self {
		Self { token, subdomain, filename: Some(filename) }
	}

	/// Builds a path from raw request fields, treating empty strings as absent
	pub fn from_request(token: &'a str, subdomain: &'a str, filename: &'a str) -> Self {
		Self { token, subdomain: non_empty(subdomain), filename: non_empty(filename) }
	}

	/// Checks every present segment with [`validate_segment`]
	pub fn validate(&self) -> ClResult<()> {
		validate_segment("token", self.token)?;
		if let Some(subdomain) = self.subdomain {
			validate_segment("subdomain", subdomain)?;
		}
		if let Some(filename) = self.filename {
			validate_segment("filename", filename)?;
		}
		Ok(())
	}

	/// The segments in order, as they appear below the mount root
	pub fn segments(&self) -> impl Iterator<Item = &'a str> {
		std::iter::once(self.token).chain(self.subdomain).chain(self.filename)
	}
}

impl std::fmt::Display for ConfigPath<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut first = true;
		for segment in self.segments() {
			if !first {
				write!(f, "/")?;
			}
			write!(f, "{}", segment)?;
			first = false;
		}
		Ok(())
	}
}

pub fn non_empty(s: &str) -> Option<&str> {
	if s.is_empty() { None } else { Some(s) }
}

/// A namespace segment must name exactly one directory entry.
pub fn validate_segment(what: &str, segment: &str) -> ClResult<()> {
	if segment.is_empty() {
		return Err(Error::ValidationError(format!("{} not set", what)));
	}
	if segment == "." || segment == ".." || segment.contains(['/', '\\', '\0']) {
		return Err(Error::ValidationError(format!("invalid {}: {:?}", what, segment)));
	}
	Ok(())
}

// ApiResponse //
//*************//
/// Response envelope of every successful API call
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
	pub response: T,
}

impl<T> ApiResponse<T> {
	pub fn new(response: T) -> Self {
		Self { response }
	}
}


// vim: ts=4
