// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for tests that need a database.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::player::{NewPlayer, Player, PlayerRepository};
use crate::pool::create_pool;
use crate::schema::run_migrations;

/// In-memory database behind a single connection, so every query (and every
/// transaction) sees the same data and transactions are serialized.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")
		.unwrap()
		.foreign_keys(true);
	SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await
		.unwrap()
}

/// [`create_test_pool`] with all migrations applied.
pub async fn create_migrated_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	run_migrations(&pool).await.unwrap();
	pool
}

/// Migrated database file under `dir`, opened with the production pool
/// settings. Connections are independent, so transactions can overlap and
/// writers contend through SQLite's busy handler.
pub async fn create_file_test_pool(dir: &Path) -> SqlitePool {
	let url = format!("sqlite://{}", dir.join("lumen.db").display());
	let pool = create_pool(&url).await.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn create_test_player(pool: &SqlitePool, id: i64, stamina: i64, lumenite: i64) -> Player {
	PlayerRepository::new(pool.clone())
		.create(&NewPlayer {
			id,
			display_name: format!("player-{id}"),
			stamina,
			max_stamina: stamina.max(100),
			lumenite,
			lumees: 0,
		})
		.await
		.unwrap()
}
