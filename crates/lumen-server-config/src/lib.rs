// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the Lumen server.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`LUMEN_SERVER_*`)
//! 2. Config file (`/etc/lumen/server.toml` or an explicit path)
//! 3. Built-in defaults
//!
//! Gameplay tunables live under the `[game]` table of the config file.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use lumen_game_core::GameTunables;
use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub audit: AuditConfig,
	pub retention: RetentionConfig,
	pub game: GameTunables,
}

/// Load configuration from all sources with standard precedence.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into a validated configuration.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let audit = layer.audit.unwrap_or_default().finalize();
	let retention = layer.retention.unwrap_or_default().finalize();
	let game = layer.game.unwrap_or_default();

	let mut problems = audit.validate();
	if retention.audit_retention_days < 1 {
		problems.push("retention.audit_retention_days must be at least 1".to_string());
	}
	problems.extend(game.validate().into_iter().map(|p| format!("game.{p}")));
	if !problems.is_empty() {
		return Err(ConfigError::Validation(problems.join("; ")));
	}

	info!(
		database = %database.url,
		log_level = %logging.level,
		audit_enabled = audit.enabled,
		audit_event = %audit.event_name,
		audit_retention_days = retention.audit_retention_days,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		database,
		logging,
		audit,
		retention,
		game,
	})
}
