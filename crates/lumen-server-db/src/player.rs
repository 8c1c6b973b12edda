// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Player accounts and currencies.
//!
//! Resource spending is a single conditional `UPDATE`, so concurrent spends
//! for the same player can never drive a balance negative. Inside a
//! transaction it is also the first write, which takes SQLite's write lock
//! for the rest of the turn.

use std::fmt;

use chrono::{DateTime, Utc};
use lumen_game_core::{PlayerId, ResourceCost, RewardBundle};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
	pub id: PlayerId,
	pub display_name: String,
	pub stamina: i64,
	pub max_stamina: i64,
	pub lumenite: i64,
	pub lumees: i64,
	pub experience: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlayer {
	pub id: i64,
	pub display_name: String,
	pub stamina: i64,
	pub max_stamina: i64,
	pub lumenite: i64,
	pub lumees: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
	Stamina,
	Lumenite,
	Lumees,
}

impl Resource {
	pub fn as_str(&self) -> &'static str {
		match self {
			Resource::Stamina => "stamina",
			Resource::Lumenite => "lumenite",
			Resource::Lumees => "lumees",
		}
	}
}

impl fmt::Display for Resource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The first resource a spend could not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceShortfall {
	pub resource: Resource,
	pub required: i64,
	pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendOutcome {
	Spent,
	Insufficient(ResourceShortfall),
}

type PlayerRow = (i64, String, i64, i64, i64, i64, i64, DateTime<Utc>, DateTime<Utc>);

const PLAYER_COLUMNS: &str = "id, display_name, stamina, max_stamina, lumenite, lumees, experience, created_at, updated_at";

fn player_from_row(row: PlayerRow) -> Player {
	let (id, display_name, stamina, max_stamina, lumenite, lumees, experience, created_at, updated_at) =
		row;
	Player {
		id: PlayerId::new(id),
		display_name,
		stamina,
		max_stamina,
		lumenite,
		lumees,
		experience,
		created_at,
		updated_at,
	}
}

pub async fn fetch_player(conn: &mut SqliteConnection, id: PlayerId) -> Result<Option<Player>> {
	let row = sqlx::query_as::<_, PlayerRow>(&format!(
		"SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?"
	))
	.bind(id.get())
	.fetch_optional(&mut *conn)
	.await?;

	Ok(row.map(player_from_row))
}

/// Deducts `cost` atomically. Nothing changes when any resource is short.
#[tracing::instrument(skip(conn), fields(player_id = %id))]
pub async fn spend_resources(
	conn: &mut SqliteConnection,
	id: PlayerId,
	cost: &ResourceCost,
) -> Result<SpendOutcome> {
	let result = sqlx::query(
		r#"
		UPDATE players
		SET stamina = stamina - ?, lumenite = lumenite - ?, updated_at = ?
		WHERE id = ? AND stamina >= ? AND lumenite >= ?
		"#,
	)
	.bind(cost.stamina)
	.bind(cost.lumenite)
	.bind(Utc::now())
	.bind(id.get())
	.bind(cost.stamina)
	.bind(cost.lumenite)
	.execute(&mut *conn)
	.await?;

	if result.rows_affected() > 0 {
		return Ok(SpendOutcome::Spent);
	}

	let player = fetch_player(conn, id)
		.await?
		.ok_or(DbError::PlayerNotFound(id))?;

	let shortfall = if player.stamina < cost.stamina {
		ResourceShortfall {
			resource: Resource::Stamina,
			required: cost.stamina,
			available: player.stamina,
		}
	} else if player.lumenite < cost.lumenite {
		ResourceShortfall {
			resource: Resource::Lumenite,
			required: cost.lumenite,
			available: player.lumenite,
		}
	} else {
		return Err(DbError::SpendRace(id));
	};

	tracing::debug!(
		resource = %shortfall.resource,
		required = shortfall.required,
		available = shortfall.available,
		"insufficient resources"
	);
	Ok(SpendOutcome::Insufficient(shortfall))
}

/// Adds the currencies of `bundle`. Tokens in the bundle are not touched.
#[tracing::instrument(skip(conn, bundle), fields(player_id = %id))]
pub async fn grant_rewards(conn: &mut SqliteConnection, id: PlayerId, bundle: &RewardBundle) -> Result<()> {
	let result = sqlx::query(
		r#"
		UPDATE players
		SET lumees = lumees + ?, lumenite = lumenite + ?, experience = experience + ?, updated_at = ?
		WHERE id = ?
		"#,
	)
	.bind(bundle.lumees)
	.bind(bundle.lumenite)
	.bind(bundle.experience)
	.bind(Utc::now())
	.bind(id.get())
	.execute(&mut *conn)
	.await?;

	if result.rows_affected() == 0 {
		return Err(DbError::PlayerNotFound(id));
	}
	Ok(())
}

#[derive(Clone)]
pub struct PlayerRepository {
	pool: SqlitePool,
}

impl PlayerRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, new), fields(player_id = new.id))]
	pub async fn create(&self, new: &NewPlayer) -> Result<Player> {
		let now = Utc::now();
		let result = sqlx::query(
			r#"
			INSERT INTO players (id, display_name, stamina, max_stamina, lumenite, lumees, experience, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
			ON CONFLICT(id) DO NOTHING
			"#,
		)
		.bind(new.id)
		.bind(&new.display_name)
		.bind(new.stamina)
		.bind(new.max_stamina)
		.bind(new.lumenite)
		.bind(new.lumees)
		.bind(now)
		.bind(now)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::Duplicate(format!("player {}", new.id)));
		}

		self
			.get(PlayerId::new(new.id))
			.await?
			.ok_or(DbError::PlayerNotFound(PlayerId::new(new.id)))
	}

	#[tracing::instrument(skip(self))]
	pub async fn get(&self, id: PlayerId) -> Result<Option<Player>> {
		let mut conn = self.pool.acquire().await?;
		fetch_player(&mut conn, id).await
	}

	pub async fn spend_resources(&self, id: PlayerId, cost: &ResourceCost) -> Result<SpendOutcome> {
		let mut conn = self.pool.acquire().await?;
		spend_resources(&mut conn, id, cost).await
	}

	pub async fn grant_rewards(&self, id: PlayerId, bundle: &RewardBundle) -> Result<()> {
		let mut conn = self.pool.acquire().await?;
		grant_rewards(&mut conn, id, bundle).await
	}

	/// Sets stamina, clamped to `0..=max_stamina`.
	#[tracing::instrument(skip(self))]
	pub async fn set_stamina(&self, id: PlayerId, stamina: i64) -> Result<()> {
		let result = sqlx::query(
			"UPDATE players SET stamina = MIN(MAX(?, 0), max_stamina), updated_at = ? WHERE id = ?",
		)
		.bind(stamina)
		.bind(Utc::now())
		.bind(id.get())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::PlayerNotFound(id));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_migrated_test_pool, create_test_player};

	#[tokio::test]
	async fn create_and_get() {
		let pool = create_migrated_test_pool().await;
		let created = create_test_player(&pool, 42, 10, 100).await;
		assert_eq!(created.id, PlayerId::new(42));
		assert_eq!(created.stamina, 10);
		assert_eq!(created.experience, 0);

		let repo = PlayerRepository::new(pool);
		let fetched = repo.get(PlayerId::new(42)).await.unwrap().unwrap();
		assert_eq!(fetched, created);
		assert!(repo.get(PlayerId::new(7)).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn duplicate_create_conflicts() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let err = PlayerRepository::new(pool)
			.create(&NewPlayer {
				id: 1,
				display_name: "again".to_string(),
				stamina: 1,
				max_stamina: 1,
				lumenite: 0,
				lumees: 0,
			})
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Duplicate(_)));
	}

	#[tokio::test]
	async fn spend_deducts_all_resources() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 100).await;
		let repo = PlayerRepository::new(pool);

		let outcome = repo
			.spend_resources(PlayerId::new(1), &ResourceCost { stamina: 3, lumenite: 15 })
			.await
			.unwrap();
		assert_eq!(outcome, SpendOutcome::Spent);

		let player = repo.get(PlayerId::new(1)).await.unwrap().unwrap();
		assert_eq!(player.stamina, 7);
		assert_eq!(player.lumenite, 85);
	}

	#[tokio::test]
	async fn spend_reports_short_resource_without_changes() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 20).await;
		let repo = PlayerRepository::new(pool);
		let id = PlayerId::new(1);

		let outcome = repo
			.spend_resources(id, &ResourceCost { stamina: 10, lumenite: 50 })
			.await
			.unwrap();
		assert_eq!(
			outcome,
			SpendOutcome::Insufficient(ResourceShortfall {
				resource: Resource::Lumenite,
				required: 50,
				available: 20,
			})
		);

		let outcome = repo
			.spend_resources(id, &ResourceCost { stamina: 11, lumenite: 0 })
			.await
			.unwrap();
		assert!(matches!(
			outcome,
			SpendOutcome::Insufficient(ResourceShortfall {
				resource: Resource::Stamina,
				..
			})
		));

		let player = repo.get(id).await.unwrap().unwrap();
		assert_eq!(player.stamina, 10);
		assert_eq!(player.lumenite, 20);
	}

	#[tokio::test]
	async fn spend_for_missing_player_is_not_found() {
		let pool = create_migrated_test_pool().await;
		let err = PlayerRepository::new(pool)
			.spend_resources(PlayerId::new(9), &ResourceCost { stamina: 1, lumenite: 0 })
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::PlayerNotFound(_)));
	}

	#[tokio::test]
	async fn grant_rewards_adds_currencies() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = PlayerRepository::new(pool);
		let id = PlayerId::new(1);

		repo.grant_rewards(
			id,
			&RewardBundle {
				lumees: 1147,
				lumenite: 100,
				experience: 229,
				tokens: Vec::new(),
			},
		)
		.await
		.unwrap();

		let player = repo.get(id).await.unwrap().unwrap();
		assert_eq!(player.lumees, 1147);
		assert_eq!(player.lumenite, 100);
		assert_eq!(player.experience, 229);

		let err = repo
			.grant_rewards(PlayerId::new(2), &RewardBundle::default())
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::PlayerNotFound(_)));
	}

	#[tokio::test]
	async fn set_stamina_clamps_to_max() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = PlayerRepository::new(pool);
		let id = PlayerId::new(1);

		repo.set_stamina(id, 500).await.unwrap();
		assert_eq!(repo.get(id).await.unwrap().unwrap().stamina, 100);
		repo.set_stamina(id, -5).await.unwrap();
		assert_eq!(repo.get(id).await.unwrap().unwrap().stamina, 0);
	}
}
