// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-player ledger of state-changing operations, written inside the same
//! transaction as the change it describes.

use chrono::{DateTime, Utc};
use lumen_game_core::PlayerId;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLog {
	pub id: i64,
	pub player_id: PlayerId,
	pub transaction_type: String,
	pub details: serde_json::Value,
	pub context: Option<String>,
	pub created_at: DateTime<Utc>,
}

#[tracing::instrument(skip(conn, details), fields(player_id = %player_id))]
pub async fn log_transaction(
	conn: &mut SqliteConnection,
	player_id: PlayerId,
	transaction_type: &str,
	details: &serde_json::Value,
	context: Option<&str>,
) -> Result<i64> {
	let details = serde_json::to_string(details)?;
	let result = sqlx::query(
		r#"
		INSERT INTO transaction_logs (player_id, transaction_type, details, context, created_at)
		VALUES (?, ?, ?, ?, ?)
		"#,
	)
	.bind(player_id.get())
	.bind(transaction_type)
	.bind(details)
	.bind(context)
	.bind(Utc::now())
	.execute(&mut *conn)
	.await?;

	Ok(result.last_insert_rowid())
}

#[derive(Clone)]
pub struct TransactionLogRepository {
	pool: SqlitePool,
}

impl TransactionLogRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Most recent entries first.
	#[tracing::instrument(skip(self), fields(player_id = %player_id))]
	pub async fn list_for_player(&self, player_id: PlayerId, limit: i64) -> Result<Vec<TransactionLog>> {
		let rows = sqlx::query_as::<_, (i64, i64, String, String, Option<String>, DateTime<Utc>)>(
			r#"
			SELECT id, player_id, transaction_type, details, context, created_at
			FROM transaction_logs
			WHERE player_id = ?
			ORDER BY id DESC
			LIMIT ?
			"#,
		)
		.bind(player_id.get())
		.bind(limit.clamp(1, 1000))
		.fetch_all(&self.pool)
		.await?;

		rows
			.into_iter()
			.map(|(id, player_id, transaction_type, details, context, created_at)| {
				Ok(TransactionLog {
					id,
					player_id: PlayerId::new(player_id),
					transaction_type,
					details: serde_json::from_str(&details)?,
					context,
					created_at,
				})
			})
			.collect()
	}

	pub async fn count_for_player(&self, player_id: PlayerId) -> Result<i64> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transaction_logs WHERE player_id = ?")
			.bind(player_id.get())
			.fetch_one(&self.pool)
			.await?;
		Ok(count)
	}
}
