// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Lumen server wiring.
//!
//! [`App`] owns the event bus, the audit consumer, the gameplay services and
//! the retention job, and drives their startup and shutdown.

pub mod retention;

use std::sync::Arc;

use lumen_game_core::{GameTunables, SharedTunables, TunablesSource};
use lumen_server_ascension::{AscensionService, PartyPowerCalculator};
use lumen_server_audit::{AuditConsumer, AuditResult, EventBus, FlushOutcome, SqliteAuditSink};
use lumen_server_config::ServerConfig;
use lumen_server_db::{AuditRepository, MaidenRepository};
use lumen_server_tokens::TokenService;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub use retention::{RetentionHandle, RetentionJob};

pub struct App {
	pub pool: SqlitePool,
	pub bus: EventBus,
	pub ascension: AscensionService,
	pub tokens: TokenService,
	pub audit_logs: AuditRepository,
	tunables: Arc<SharedTunables>,
	consumer: AuditConsumer,
	retention: RetentionJob,
}

impl App {
	/// Builds every component from `config` against an already migrated pool.
	/// Nothing runs until [`App::start`].
	pub fn new(config: &ServerConfig, pool: SqlitePool) -> Self {
		let bus = EventBus::new();
		let event_name = config.audit.event_name.clone();
		let tunables = Arc::new(SharedTunables::new(config.game.clone()));
		let source: Arc<dyn TunablesSource> = tunables.clone();

		let power = Arc::new(PartyPowerCalculator::new(MaidenRepository::new(pool.clone())));
		let ascension = AscensionService::new(pool.clone(), Arc::clone(&source), power)
			.with_audit(bus.clone(), event_name.clone());
		let tokens = TokenService::new(pool.clone(), source).with_audit(bus.clone(), event_name);

		let consumer = AuditConsumer::new(
			config.audit.clone(),
			Arc::new(SqliteAuditSink::new(pool.clone())),
		);
		let audit_logs = AuditRepository::new(pool.clone());
		let retention = RetentionJob::from_config(audit_logs.clone(), &config.retention);

		Self {
			pool,
			bus,
			ascension,
			tokens,
			audit_logs,
			tunables,
			consumer,
			retention,
		}
	}

	pub fn consumer(&self) -> &AuditConsumer {
		&self.consumer
	}

	pub fn tunables(&self) -> Arc<GameTunables> {
		self.tunables.snapshot()
	}

	/// Swaps the gameplay tunables. Operations already in flight keep the
	/// snapshot they started with.
	pub fn reload_tunables(&self, tunables: GameTunables) {
		self.tunables.reload(tunables);
		info!("gameplay tunables reloaded");
	}

	/// Starts the audit consumer (when enabled) and the retention job. An
	/// unreachable audit sink fails startup.
	pub async fn start(&self) -> AuditResult<RetentionHandle> {
		if self.consumer.config().enabled {
			self.consumer.check_sink().await?;
			self.consumer.start(&self.bus).await?;
		} else {
			info!("audit consumer disabled by configuration");
		}
		Ok(self.retention.clone().spawn())
	}

	/// Stops the retention job, then the consumer with a final flush.
	pub async fn shutdown(&self, retention: RetentionHandle) -> Option<FlushOutcome> {
		retention.shutdown().await;

		if !self.consumer.is_running() {
			return None;
		}
		match self.consumer.stop().await {
			Ok(outcome) => Some(outcome),
			Err(e) => {
				warn!(error = %e, "audit consumer did not stop cleanly");
				None
			}
		}
	}
}
