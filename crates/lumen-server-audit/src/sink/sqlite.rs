// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::error::AuditSinkError;
use crate::event::{format_timestamp, AuditLogEntry};
use crate::sink::AuditBatchSink;

/// Writes batches into the `audit_logs` table, one transaction per batch.
#[derive(Clone)]
pub struct SqliteAuditSink {
	pool: SqlitePool,
	name: String,
}

impl SqliteAuditSink {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			name: "sqlite".to_string(),
		}
	}
}

fn map_db_error(e: sqlx::Error) -> AuditSinkError {
	if is_transient_error(&e) {
		AuditSinkError::Transient(format!("database error: {e}"))
	} else {
		AuditSinkError::Permanent(format!("database error: {e}"))
	}
}

#[async_trait]
impl AuditBatchSink for SqliteAuditSink {
	fn name(&self) -> &str {
		&self.name
	}

	#[instrument(skip(self, entries), fields(count = entries.len()))]
	async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditSinkError> {
		if entries.is_empty() {
			return Ok(());
		}

		let created_at = format_timestamp(&chrono::Utc::now());
		let mut tx = self.pool.begin().await.map_err(map_db_error)?;

		for entry in entries {
			let details_json = serde_json::to_string(&entry.details).map_err(|e| {
				AuditSinkError::Permanent(format!("failed to serialize details: {e}"))
			})?;

			sqlx::query(
				r#"
				INSERT INTO audit_logs (
					id, timestamp, actor_id, guild_id, channel_id, category, operation,
					details, context, success, error_type, error_message, duration_ms, created_at
				) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
				"#,
			)
			.bind(entry.id.to_string())
			.bind(format_timestamp(&entry.timestamp))
			.bind(entry.actor_id)
			.bind(entry.guild_id)
			.bind(entry.channel_id)
			.bind(entry.category.as_str())
			.bind(&entry.operation)
			.bind(&details_json)
			.bind(&entry.context)
			.bind(entry.success)
			.bind(&entry.error_type)
			.bind(&entry.error_message)
			.bind(entry.duration_ms)
			.bind(&created_at)
			.execute(&mut *tx)
			.await
			.map_err(map_db_error)?;
		}

		tx.commit().await.map_err(map_db_error)?;
		Ok(())
	}

	async fn health_check(&self) -> Result<(), AuditSinkError> {
		sqlx::query("SELECT 1")
			.execute(&self.pool)
			.await
			.map_err(|e| AuditSinkError::Transient(format!("health check failed: {e}")))?;
		Ok(())
	}
}

fn is_transient_error(e: &sqlx::Error) -> bool {
	match e {
		sqlx::Error::Io(_) => true,
		sqlx::Error::PoolTimedOut => true,
		sqlx::Error::PoolClosed => true,
		sqlx::Error::Database(db_err) => {
			let msg = db_err.message().to_lowercase();
			msg.contains("busy") || msg.contains("locked") || msg.contains("timeout")
		}
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pool_errors_are_transient() {
		assert!(is_transient_error(&sqlx::Error::PoolTimedOut));
		assert!(is_transient_error(&sqlx::Error::PoolClosed));
		assert!(!is_transient_error(&sqlx::Error::RowNotFound));
	}

	#[test]
	fn classification_maps_to_sink_error() {
		assert!(map_db_error(sqlx::Error::PoolTimedOut).is_transient());
		assert!(!map_db_error(sqlx::Error::RowNotFound).is_transient());
	}

	async fn bare_pool() -> SqlitePool {
		sqlx::sqlite::SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn missing_table_is_retried_until_dropped() {
		use crate::consumer::AuditConsumer;
		use lumen_server_config::AuditConfig;

		let sink = SqliteAuditSink::new(bare_pool().await);
		let consumer = AuditConsumer::new(
			AuditConfig {
				max_retries: 3,
				retry_base_delay_ms: 1,
				flush_interval_secs: 3600,
				..AuditConfig::default()
			},
			std::sync::Arc::new(sink),
		);
		consumer
			.enqueue(AuditLogEntry::builder(1, "token_grant").build())
			.await;

		let outcome = consumer.flush().await;
		assert_eq!(outcome.attempts, 3);
		assert_eq!(outcome.dropped, 1);
		assert_eq!(outcome.persisted, 0);
	}

	#[tokio::test]
	async fn health_check_follows_pool_state() {
		let pool = bare_pool().await;
		let sink = SqliteAuditSink::new(pool.clone());
		assert!(sink.health_check().await.is_ok());

		pool.close().await;
		assert!(sink.health_check().await.unwrap_err().is_transient());
	}
}
