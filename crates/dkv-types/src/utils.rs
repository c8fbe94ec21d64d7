//! Utility functions

use crate::types::DEFAULT_TOKEN;

/// Generates a new tenant token (random 128-bit UUID).
pub fn generate_token() -> String {
	loop {
		let token = uuid::Uuid::new_v4().to_string();
		if token != DEFAULT_TOKEN {
			return token;
		}
	}
}


// vim: ts=4
