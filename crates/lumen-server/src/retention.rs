// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Periodic deletion of expired audit rows.

use std::time::Duration;

use lumen_server_config::RetentionConfig;
use lumen_server_db::{AuditRepository, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct RetentionJob {
	repository: AuditRepository,
	retention_days: i64,
	interval: Duration,
}

impl RetentionJob {
	pub fn new(repository: AuditRepository, retention_days: i64, interval: Duration) -> Self {
		Self {
			repository,
			retention_days,
			interval,
		}
	}

	pub fn from_config(repository: AuditRepository, config: &RetentionConfig) -> Self {
		Self::new(
			repository,
			config.audit_retention_days,
			config.cleanup_interval(),
		)
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Deletes audit rows older than the retention window.
	#[instrument(skip(self), fields(retention_days = self.retention_days))]
	pub async fn run_once(&self) -> Result<u64> {
		let deleted = self.repository.delete_older_than(self.retention_days).await?;
		debug!(deleted, "audit retention pass completed");
		Ok(deleted)
	}

	/// Runs [`Self::run_once`] every interval until the handle is shut down.
	/// The first pass happens one interval after spawning.
	pub fn spawn(self) -> RetentionHandle {
		let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
		let interval = self.interval;

		let handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = tokio::time::sleep(interval) => {
						if let Err(e) = self.run_once().await {
							warn!(error = %e, "audit retention pass failed");
						}
					}
					_ = shutdown_rx.recv() => {
						info!("Shutting down audit retention job");
						break;
					}
				}
			}
		});

		info!(
			interval_secs = interval.as_secs(),
			"Audit retention job started"
		);
		RetentionHandle {
			shutdown_tx,
			handle,
		}
	}
}

pub struct RetentionHandle {
	shutdown_tx: broadcast::Sender<()>,
	handle: JoinHandle<()>,
}

impl RetentionHandle {
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	pub async fn shutdown(self) {
		let _ = self.shutdown_tx.send(());
		if let Err(e) = self.handle.await {
			warn!(error = %e, "audit retention job ended abnormally");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration as ChronoDuration, Utc};
	use lumen_server_audit::{AuditBatchSink, AuditLogEntry, SqliteAuditSink};
	use lumen_server_db::testing::create_migrated_test_pool;
	use lumen_server_db::AuditLogFilter;

	async fn seed(pool: &sqlx::SqlitePool) {
		let sink = SqliteAuditSink::new(pool.clone());
		let old = AuditLogEntry::builder(1, "token_grant")
			.timestamp(Utc::now() - ChronoDuration::days(120))
			.build();
		let recent = AuditLogEntry::builder(1, "token_redeem").build();
		sink.write_batch(&[old, recent]).await.unwrap();
	}

	async fn remaining(repo: &AuditRepository) -> i64 {
		repo.query_logs(&AuditLogFilter::default()).await.unwrap().1
	}

	#[tokio::test]
	async fn run_once_deletes_only_expired_rows() {
		let pool = create_migrated_test_pool().await;
		seed(&pool).await;
		let repo = AuditRepository::new(pool);
		let job = RetentionJob::from_config(repo.clone(), &RetentionConfig::default());

		assert_eq!(job.run_once().await.unwrap(), 1);
		assert_eq!(job.run_once().await.unwrap(), 0);
		assert_eq!(remaining(&repo).await, 1);
	}

	#[tokio::test]
	async fn spawned_job_runs_until_shutdown() {
		let pool = create_migrated_test_pool().await;
		seed(&pool).await;
		let repo = AuditRepository::new(pool);
		let handle = RetentionJob::new(repo.clone(), 90, Duration::from_millis(20)).spawn();

		let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
		while remaining(&repo).await > 1 {
			assert!(tokio::time::Instant::now() < deadline, "retention never ran");
			tokio::time::sleep(Duration::from_millis(10)).await;
		}

		assert!(!handle.is_finished());
		handle.shutdown().await;
		assert_eq!(remaining(&repo).await, 1);
	}
}
