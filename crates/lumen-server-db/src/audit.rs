// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Duration, Utc};
use lumen_server_audit::{format_timestamp, AuditCategory, AuditLogEntry};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::Result;

/// Filters for [`AuditRepository::query_logs`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
	pub actor_id: Option<i64>,
	pub category: Option<AuditCategory>,
	pub operation: Option<String>,
	pub from: Option<DateTime<Utc>>,
	pub to: Option<DateTime<Utc>>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Clone)]
pub struct AuditRepository {
	pool: SqlitePool,
}

impl AuditRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Returns one page of matching entries, newest first, plus the total
	/// number of matches.
	#[tracing::instrument(skip(self))]
	pub async fn query_logs(&self, filter: &AuditLogFilter) -> Result<(Vec<AuditLogEntry>, i64)> {
		let limit = filter.limit.unwrap_or(50).clamp(1, 1000);
		let offset = filter.offset.unwrap_or(0).max(0);

		let mut conditions = vec!["1=1".to_string()];
		if filter.actor_id.is_some() {
			conditions.push("actor_id = ?".to_string());
		}
		if filter.category.is_some() {
			conditions.push("category = ?".to_string());
		}
		if filter.operation.is_some() {
			conditions.push("operation = ?".to_string());
		}
		if filter.from.is_some() {
			conditions.push("timestamp >= ?".to_string());
		}
		if filter.to.is_some() {
			conditions.push("timestamp <= ?".to_string());
		}

		let where_clause = conditions.join(" AND ");

		let count_sql = format!(
			"SELECT COUNT(*) as cnt FROM audit_logs WHERE {}",
			where_clause
		);
		let mut count_query = sqlx::query(&count_sql);
		if let Some(v) = filter.actor_id {
			count_query = count_query.bind(v);
		}
		if let Some(v) = filter.category {
			count_query = count_query.bind(v.as_str());
		}
		if let Some(v) = &filter.operation {
			count_query = count_query.bind(v.as_str());
		}
		if let Some(v) = filter.from {
			count_query = count_query.bind(format_timestamp(&v));
		}
		if let Some(v) = filter.to {
			count_query = count_query.bind(format_timestamp(&v));
		}

		let count_row = count_query.fetch_one(&self.pool).await?;
		let total: i64 = count_row.get("cnt");

		let data_sql = format!(
			"SELECT id, timestamp, actor_id, guild_id, channel_id, category, operation, details, \
			 context, success, error_type, error_message, duration_ms \
			 FROM audit_logs WHERE {} ORDER BY timestamp DESC, id LIMIT ? OFFSET ?",
			where_clause
		);
		let mut data_query = sqlx::query(&data_sql);
		if let Some(v) = filter.actor_id {
			data_query = data_query.bind(v);
		}
		if let Some(v) = filter.category {
			data_query = data_query.bind(v.as_str());
		}
		if let Some(v) = &filter.operation {
			data_query = data_query.bind(v.as_str());
		}
		if let Some(v) = filter.from {
			data_query = data_query.bind(format_timestamp(&v));
		}
		if let Some(v) = filter.to {
			data_query = data_query.bind(format_timestamp(&v));
		}
		data_query = data_query.bind(limit).bind(offset);

		let rows = data_query.fetch_all(&self.pool).await?;
		let logs: Vec<AuditLogEntry> = rows
			.into_iter()
			.filter_map(|row| {
				let id_str: String = row.get("id");
				let id = Uuid::parse_str(&id_str).ok()?;

				let ts_str: String = row.get("timestamp");
				let timestamp = DateTime::parse_from_rfc3339(&ts_str)
					.map(|dt| dt.with_timezone(&Utc))
					.ok()?;

				let category_str: String = row.get("category");
				let category = category_str.parse::<AuditCategory>().ok()?;
				let details_str: String = row.get("details");

				Some(AuditLogEntry {
					id,
					timestamp,
					actor_id: row.get("actor_id"),
					guild_id: row.get("guild_id"),
					channel_id: row.get("channel_id"),
					category,
					operation: row.get("operation"),
					details: serde_json::from_str(&details_str).unwrap_or(serde_json::Value::Null),
					context: row.get("context"),
					success: row.get("success"),
					error_type: row.get("error_type"),
					error_message: row.get("error_message"),
					duration_ms: row.get("duration_ms"),
				})
			})
			.collect();

		Ok((logs, total))
	}

	/// Deletes entries older than `retention_days` and returns how many were
	/// removed.
	#[tracing::instrument(skip(self))]
	pub async fn delete_older_than(&self, retention_days: i64) -> Result<u64> {
		let cutoff = Utc::now() - Duration::days(retention_days.clamp(0, 36_500));
		let result = sqlx::query("DELETE FROM audit_logs WHERE timestamp < ?")
			.bind(format_timestamp(&cutoff))
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected();
		if deleted > 0 {
			tracing::info!(deleted, retention_days, "deleted expired audit logs");
		}
		Ok(deleted)
	}
}
