// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable tower-climbing progress, one row per player.

use chrono::{DateTime, Utc};
use lumen_game_core::PlayerId;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscensionProgress {
	pub player_id: PlayerId,
	/// Next floor the player will fight.
	pub current_floor: u32,
	/// Never decreases.
	pub highest_floor: u32,
	/// Victories on floors above the previous highest.
	pub total_floors_cleared: i64,
	pub total_victories: i64,
	pub total_defeats: i64,
	pub last_victory_at: Option<DateTime<Utc>>,
	pub updated_at: DateTime<Utc>,
}

/// Progress after a victory, and whether it set a new highest floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryRecord {
	pub progress: AscensionProgress,
	pub is_record: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
	pub rank: u32,
	pub player_id: PlayerId,
	pub display_name: String,
	pub highest_floor: u32,
	pub total_victories: i64,
}

type ProgressRow = (i64, i64, i64, i64, i64, i64, Option<DateTime<Utc>>, DateTime<Utc>);

fn progress_from_row(row: ProgressRow) -> AscensionProgress {
	let (
		player_id,
		current_floor,
		highest_floor,
		total_floors_cleared,
		total_victories,
		total_defeats,
		last_victory_at,
		updated_at,
	) = row;
	AscensionProgress {
		player_id: PlayerId::new(player_id),
		current_floor: current_floor.max(1) as u32,
		highest_floor: highest_floor.max(0) as u32,
		total_floors_cleared,
		total_victories,
		total_defeats,
		last_victory_at,
		updated_at,
	}
}

async fn fetch_progress(conn: &mut SqliteConnection, player_id: PlayerId) -> Result<Option<AscensionProgress>> {
	let row = sqlx::query_as::<_, ProgressRow>(
		r#"
		SELECT player_id, current_floor, highest_floor, total_floors_cleared, total_victories,
			total_defeats, last_victory_at, updated_at
		FROM ascension_progress
		WHERE player_id = ?
		"#,
	)
	.bind(player_id.get())
	.fetch_optional(&mut *conn)
	.await?;

	Ok(row.map(progress_from_row))
}

/// Returns the player's progress, creating a floor-1 row on first access.
#[tracing::instrument(skip(conn), fields(player_id = %player_id))]
pub async fn get_or_create_progress(conn: &mut SqliteConnection, player_id: PlayerId) -> Result<AscensionProgress> {
	let now = Utc::now();
	sqlx::query(
		r#"
		INSERT INTO ascension_progress (player_id, current_floor, highest_floor, created_at, updated_at)
		VALUES (?, 1, 0, ?, ?)
		ON CONFLICT(player_id) DO NOTHING
		"#,
	)
	.bind(player_id.get())
	.bind(now)
	.bind(now)
	.execute(&mut *conn)
	.await?;

	fetch_progress(conn, player_id)
		.await?
		.ok_or(DbError::ProgressNotFound(player_id))
}

/// Records clearing `floor`: advances to the next floor and raises the
/// highest floor when exceeded.
#[tracing::instrument(skip(conn), fields(player_id = %player_id))]
pub async fn record_victory(
	conn: &mut SqliteConnection,
	player_id: PlayerId,
	floor: u32,
	at: DateTime<Utc>,
) -> Result<VictoryRecord> {
	let previous = get_or_create_progress(conn, player_id).await?;
	let is_record = floor > previous.highest_floor;
	let floor = floor as i64;

	sqlx::query(
		r#"
		UPDATE ascension_progress
		SET current_floor = MAX(current_floor, ? + 1),
			highest_floor = MAX(highest_floor, ?),
			total_floors_cleared = total_floors_cleared + ?,
			total_victories = total_victories + 1,
			last_victory_at = ?,
			updated_at = ?
		WHERE player_id = ?
		"#,
	)
	.bind(floor)
	.bind(floor)
	.bind(if is_record { 1_i64 } else { 0 })
	.bind(at)
	.bind(at)
	.bind(player_id.get())
	.execute(&mut *conn)
	.await?;

	let progress = fetch_progress(conn, player_id)
		.await?
		.ok_or(DbError::ProgressNotFound(player_id))?;

	Ok(VictoryRecord { progress, is_record })
}

#[tracing::instrument(skip(conn), fields(player_id = %player_id))]
pub async fn record_defeat(conn: &mut SqliteConnection, player_id: PlayerId) -> Result<AscensionProgress> {
	get_or_create_progress(conn, player_id).await?;

	sqlx::query(
		"UPDATE ascension_progress SET total_defeats = total_defeats + 1, updated_at = ? WHERE player_id = ?",
	)
	.bind(Utc::now())
	.bind(player_id.get())
	.execute(&mut *conn)
	.await?;

	fetch_progress(conn, player_id)
		.await?
		.ok_or(DbError::ProgressNotFound(player_id))
}

#[derive(Clone)]
pub struct AscensionRepository {
	pool: SqlitePool,
}

impl AscensionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn get_or_create(&self, player_id: PlayerId) -> Result<AscensionProgress> {
		let mut conn = self.pool.acquire().await?;
		get_or_create_progress(&mut conn, player_id).await
	}

	pub async fn record_victory(&self, player_id: PlayerId, floor: u32) -> Result<VictoryRecord> {
		let mut tx = self.pool.begin().await?;
		let record = record_victory(&mut tx, player_id, floor, Utc::now()).await?;
		tx.commit().await?;
		Ok(record)
	}

	/// Players ranked by highest floor, then total victories.
	#[tracing::instrument(skip(self))]
	pub async fn top_climbers(&self, limit: i64) -> Result<Vec<LeaderboardEntry>> {
		let limit = limit.clamp(1, 100);
		let rows = sqlx::query_as::<_, (i64, String, i64, i64)>(
			r#"
			SELECT a.player_id, p.display_name, a.highest_floor, a.total_victories
			FROM ascension_progress a
			JOIN players p ON p.id = a.player_id
			WHERE a.highest_floor > 0
			ORDER BY a.highest_floor DESC, a.total_victories DESC, a.player_id
			LIMIT ?
			"#,
		)
		.bind(limit)
		.fetch_all(&self.pool)
		.await?;

		Ok(
			rows
				.into_iter()
				.enumerate()
				.map(
					|(idx, (player_id, display_name, highest_floor, total_victories))| LeaderboardEntry {
						rank: idx as u32 + 1,
						player_id: PlayerId::new(player_id),
						display_name,
						highest_floor: highest_floor.max(0) as u32,
						total_victories,
					},
				)
				.collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_migrated_test_pool, create_test_player};

	#[tokio::test]
	async fn progress_is_created_lazily() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = AscensionRepository::new(pool);

		let progress = repo.get_or_create(PlayerId::new(1)).await.unwrap();
		assert_eq!(progress.current_floor, 1);
		assert_eq!(progress.highest_floor, 0);
		assert_eq!(progress.total_victories, 0);
		assert!(progress.last_victory_at.is_none());

		let again = repo.get_or_create(PlayerId::new(1)).await.unwrap();
		assert_eq!(again.current_floor, progress.current_floor);
	}

	#[tokio::test]
	async fn victory_advances_and_flags_records() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = AscensionRepository::new(pool);
		let id = PlayerId::new(1);

		let first = repo.record_victory(id, 1).await.unwrap();
		assert!(first.is_record);
		assert_eq!(first.progress.current_floor, 2);
		assert_eq!(first.progress.highest_floor, 1);
		assert_eq!(first.progress.total_floors_cleared, 1);
		assert!(first.progress.last_victory_at.is_some());

		let replay = repo.record_victory(id, 1).await.unwrap();
		assert!(!replay.is_record);
		assert_eq!(replay.progress.highest_floor, 1);
		assert_eq!(replay.progress.current_floor, 2);
		assert_eq!(replay.progress.total_victories, 2);
		assert_eq!(replay.progress.total_floors_cleared, 1);
	}

	#[tokio::test]
	async fn highest_floor_never_decreases() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = AscensionRepository::new(pool.clone());
		let id = PlayerId::new(1);

		repo.record_victory(id, 50).await.unwrap();
		let lower = repo.record_victory(id, 10).await.unwrap();
		assert_eq!(lower.progress.highest_floor, 50);
		assert_eq!(lower.progress.current_floor, 51);

		let mut conn = pool.acquire().await.unwrap();
		let after_defeat = record_defeat(&mut conn, id).await.unwrap();
		assert_eq!(after_defeat.highest_floor, 50);
		assert_eq!(after_defeat.total_defeats, 1);
	}

	#[tokio::test]
	async fn leaderboard_orders_by_floor_then_victories() {
		let pool = create_migrated_test_pool().await;
		for id in 1..=3 {
			create_test_player(&pool, id, 10, 0).await;
		}
		let repo = AscensionRepository::new(pool);

		repo.record_victory(PlayerId::new(1), 10).await.unwrap();
		repo.record_victory(PlayerId::new(2), 10).await.unwrap();
		repo.record_victory(PlayerId::new(2), 3).await.unwrap();
		repo.record_victory(PlayerId::new(3), 25).await.unwrap();

		let board = repo.top_climbers(10).await.unwrap();
		let order: Vec<i64> = board.iter().map(|e| e.player_id.get()).collect();
		assert_eq!(order, vec![3, 2, 1]);
		assert_eq!(board[0].rank, 1);
		assert_eq!(board[0].display_name, "player-3");
		assert_eq!(board[2].rank, 3);

		assert_eq!(repo.top_climbers(1).await.unwrap().len(), 1);
	}
}
