// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lumen server binary.

use std::path::PathBuf;

use clap::Parser;
use lumen_server::App;
use lumen_server_config::{LogFormat, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Lumen server - audit pipeline, ascension and token services.
#[derive(Parser, Debug)]
#[command(name = "lumen-server", about = "Lumen game backend", version)]
struct Args {
	/// TOML configuration file. Defaults to the system location.
	#[arg(long, short, env = "LUMEN_SERVER_CONFIG")]
	config: Option<PathBuf>,
}

fn init_tracing(config: &ServerConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => lumen_server_config::load_config_with_file(path)?,
		None => lumen_server_config::load_config()?,
	};

	init_tracing(&config);

	tracing::info!(
		database = %config.database.url,
		audit_enabled = config.audit.enabled,
		"starting lumen-server"
	);

	let pool = lumen_server_db::create_pool(&config.database.url).await?;
	lumen_server_db::run_migrations(&pool).await?;

	let app = App::new(&config, pool);
	let retention = app.start().await?;

	tokio::signal::ctrl_c().await?;
	tracing::info!("Received shutdown signal");

	if let Some(outcome) = app.shutdown(retention).await {
		tracing::info!(
			persisted = outcome.persisted,
			dropped = outcome.dropped,
			"final audit flush"
		);
	}

	app.pool.close().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}
