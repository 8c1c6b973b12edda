// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schema migrations.
//!
//! Each migration is idempotent (`IF NOT EXISTS`), and applied versions are
//! recorded in `schema_migrations` so startup only runs new ones.

use sqlx::SqlitePool;

use crate::error::Result;

struct Migration {
	version: i64,
	name: &'static str,
	statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
	Migration {
		version: 1,
		name: "players_and_inventory",
		statements: &[
			r#"
			CREATE TABLE IF NOT EXISTS players (
				id INTEGER PRIMARY KEY,
				display_name TEXT NOT NULL,
				stamina INTEGER NOT NULL DEFAULT 0 CHECK (stamina >= 0),
				max_stamina INTEGER NOT NULL DEFAULT 0,
				lumenite INTEGER NOT NULL DEFAULT 0 CHECK (lumenite >= 0),
				lumees INTEGER NOT NULL DEFAULT 0 CHECK (lumees >= 0),
				experience INTEGER NOT NULL DEFAULT 0,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
			r#"
			CREATE TABLE IF NOT EXISTS maiden_bases (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				name TEXT NOT NULL UNIQUE,
				element TEXT NOT NULL,
				base_tier INTEGER NOT NULL,
				base_attack INTEGER NOT NULL,
				base_defense INTEGER NOT NULL
			)
			"#,
			r#"
			CREATE TABLE IF NOT EXISTS maidens (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
				maiden_base_id INTEGER NOT NULL REFERENCES maiden_bases(id),
				tier INTEGER NOT NULL,
				quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity >= 0),
				acquired_at TEXT NOT NULL,
				UNIQUE (player_id, maiden_base_id, tier)
			)
			"#,
			"CREATE INDEX IF NOT EXISTS idx_maidens_player ON maidens(player_id)",
			r#"
			CREATE TABLE IF NOT EXISTS tokens (
				player_id INTEGER NOT NULL REFERENCES players(id) ON DELETE CASCADE,
				tier TEXT NOT NULL,
				quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
				updated_at TEXT NOT NULL,
				PRIMARY KEY (player_id, tier)
			)
			"#,
		],
	},
	Migration {
		version: 2,
		name: "ascension_and_transactions",
		statements: &[
			r#"
			CREATE TABLE IF NOT EXISTS ascension_progress (
				player_id INTEGER PRIMARY KEY REFERENCES players(id) ON DELETE CASCADE,
				current_floor INTEGER NOT NULL DEFAULT 1,
				highest_floor INTEGER NOT NULL DEFAULT 0,
				total_floors_cleared INTEGER NOT NULL DEFAULT 0,
				total_victories INTEGER NOT NULL DEFAULT 0,
				total_defeats INTEGER NOT NULL DEFAULT 0,
				last_victory_at TEXT,
				created_at TEXT NOT NULL,
				updated_at TEXT NOT NULL
			)
			"#,
			r#"
			CREATE INDEX IF NOT EXISTS idx_ascension_leaderboard
				ON ascension_progress(highest_floor DESC, total_victories DESC)
			"#,
			r#"
			CREATE TABLE IF NOT EXISTS transaction_logs (
				id INTEGER PRIMARY KEY AUTOINCREMENT,
				player_id INTEGER NOT NULL,
				transaction_type TEXT NOT NULL,
				details TEXT NOT NULL,
				context TEXT,
				created_at TEXT NOT NULL
			)
			"#,
			r#"
			CREATE INDEX IF NOT EXISTS idx_transaction_logs_player
				ON transaction_logs(player_id, created_at)
			"#,
		],
	},
	Migration {
		version: 3,
		name: "audit_logs",
		statements: &[
			r#"
			CREATE TABLE IF NOT EXISTS audit_logs (
				id TEXT PRIMARY KEY,
				timestamp TEXT NOT NULL,
				actor_id INTEGER NOT NULL,
				guild_id INTEGER,
				channel_id INTEGER,
				category TEXT NOT NULL,
				operation TEXT NOT NULL,
				details TEXT NOT NULL,
				context TEXT,
				success INTEGER NOT NULL DEFAULT 1,
				error_type TEXT,
				error_message TEXT,
				duration_ms INTEGER,
				created_at TEXT NOT NULL
			)
			"#,
			"CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp)",
			"CREATE INDEX IF NOT EXISTS idx_audit_logs_actor ON audit_logs(actor_id, timestamp)",
			"CREATE INDEX IF NOT EXISTS idx_audit_logs_category ON audit_logs(category, timestamp)",
			"CREATE INDEX IF NOT EXISTS idx_audit_logs_operation ON audit_logs(operation)",
		],
	},
];

/// Applies every migration not yet recorded. Each migration runs in its own
/// transaction.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS schema_migrations (
			version INTEGER PRIMARY KEY,
			name TEXT NOT NULL,
			applied_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	let applied: Vec<(i64,)> = sqlx::query_as("SELECT version FROM schema_migrations")
		.fetch_all(pool)
		.await?;
	let applied: Vec<i64> = applied.into_iter().map(|(v,)| v).collect();

	for migration in MIGRATIONS {
		if applied.contains(&migration.version) {
			continue;
		}

		let mut tx = pool.begin().await?;
		for statement in migration.statements {
			sqlx::query(statement).execute(&mut *tx).await?;
		}
		sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)")
			.bind(migration.version)
			.bind(migration.name)
			.bind(chrono::Utc::now().to_rfc3339())
			.execute(&mut *tx)
			.await?;
		tx.commit().await?;

		tracing::info!(
			version = migration.version,
			name = migration.name,
			"applied migration"
		);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
			.fetch_one(&pool)
			.await
			.unwrap();
		assert_eq!(count, MIGRATIONS.len() as i64);
	}

	#[tokio::test]
	async fn creates_all_tables() {
		let pool = create_test_pool().await;
		run_migrations(&pool).await.unwrap();

		for table in [
			"players",
			"maiden_bases",
			"maidens",
			"tokens",
			"ascension_progress",
			"transaction_logs",
			"audit_logs",
		] {
			let row: Option<(String,)> =
				sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
					.bind(table)
					.fetch_optional(&pool)
					.await
					.unwrap();
			assert!(row.is_some(), "missing table {table}");
		}
	}

	#[test]
	fn versions_are_strictly_increasing() {
		for pair in MIGRATIONS.windows(2) {
			assert!(pair[0].version < pair[1].version);
		}
	}
}
