// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment
//! variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuditConfigLayer, DatabaseConfigLayer, LogFormat, LoggingConfigLayer, RetentionConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/lumen/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LUMEN_SERVER_<SECTION>_<FIELD>. Gameplay tunables are file-only.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			database: Some(load_database_from_env()),
			logging: Some(load_logging_from_env()?),
			audit: Some(load_audit_from_env()?),
			retention: Some(load_retention_from_env()?),
			game: None,
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid {kind} value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_database_from_env() -> DatabaseConfigLayer {
	DatabaseConfigLayer {
		url: env_var("LUMEN_SERVER_DATABASE_URL"),
	}
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("LUMEN_SERVER_LOG_FORMAT") {
		Some(v) => Some(LogFormat::parse(&v).ok_or_else(|| ConfigError::InvalidValue {
			key: "LUMEN_SERVER_LOG_FORMAT".to_string(),
			message: format!("expected 'pretty' or 'json', got '{v}'"),
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("LUMEN_SERVER_LOG_LEVEL"),
		format,
	})
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	Ok(AuditConfigLayer {
		enabled: env_bool("LUMEN_SERVER_AUDIT_ENABLED"),
		event_name: env_var("LUMEN_SERVER_AUDIT_EVENT_NAME"),
		max_buffer_size: env_parse("LUMEN_SERVER_AUDIT_MAX_BUFFER_SIZE", "usize")?,
		batch_size: env_parse("LUMEN_SERVER_AUDIT_BATCH_SIZE", "usize")?,
		flush_interval_secs: env_parse("LUMEN_SERVER_AUDIT_FLUSH_INTERVAL_SECS", "u64")?,
		max_retries: env_parse("LUMEN_SERVER_AUDIT_MAX_RETRIES", "u32")?,
		retry_base_delay_ms: env_parse("LUMEN_SERVER_AUDIT_RETRY_BASE_DELAY_MS", "u64")?,
	})
}

fn load_retention_from_env() -> Result<RetentionConfigLayer, ConfigError> {
	Ok(RetentionConfigLayer {
		audit_retention_days: env_parse("LUMEN_SERVER_AUDIT_RETENTION_DAYS", "i64")?,
		cleanup_interval_secs: env_parse("LUMEN_SERVER_RETENTION_CLEANUP_INTERVAL_SECS", "u64")?,
	})
}
