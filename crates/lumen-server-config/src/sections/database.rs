// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database configuration.

use serde::Deserialize;

const DEFAULT_DATABASE_URL: &str = "sqlite:./lumen.db";

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
	pub url: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_DATABASE_URL.to_string(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> DatabaseConfig {
		DatabaseConfig {
			url: self.url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_url_points_at_local_file() {
		let config = DatabaseConfigLayer::default().finalize();
		assert_eq!(config.url, "sqlite:./lumen.db");
	}

	#[test]
	fn later_layer_wins() {
		let mut base = DatabaseConfigLayer {
			url: Some("sqlite:/var/lib/lumen/a.db".to_string()),
		};
		base.merge(DatabaseConfigLayer { url: None });
		assert_eq!(base.url.as_deref(), Some("sqlite:/var/lib/lumen/a.db"));

		base.merge(DatabaseConfigLayer {
			url: Some("sqlite::memory:".to_string()),
		});
		assert_eq!(base.finalize().url, "sqlite::memory:");
	}
}
