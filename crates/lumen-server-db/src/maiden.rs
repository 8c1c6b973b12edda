// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Maiden catalog and per-player ownership.

use chrono::Utc;
use lumen_game_core::{Element, PlayerId};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, Result};

/// Catalog entry shared by every owned copy of a maiden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaidenBase {
	pub id: i64,
	pub name: String,
	pub element: Element,
	/// Lowest tier this maiden can be obtained at.
	pub base_tier: u32,
	pub base_attack: i64,
	pub base_defense: i64,
}

#[derive(Debug, Clone)]
pub struct NewMaidenBase {
	pub name: String,
	pub element: Element,
	pub base_tier: u32,
	pub base_attack: i64,
	pub base_defense: i64,
}

/// A stack of identical maidens owned by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedMaiden {
	pub id: i64,
	pub player_id: PlayerId,
	pub maiden_base_id: i64,
	pub name: String,
	pub element: Element,
	pub tier: u32,
	pub quantity: i64,
	pub base_attack: i64,
	pub base_defense: i64,
}

impl OwnedMaiden {
	/// Attack of one copy: base attack scaled by tier.
	pub fn attack(&self) -> i64 {
		self.base_attack.saturating_mul(self.tier as i64)
	}

	pub fn defense(&self) -> i64 {
		self.base_defense.saturating_mul(self.tier as i64)
	}
}

fn parse_element(raw: &str) -> Result<Element> {
	raw
		.parse()
		.map_err(|_| DbError::CorruptColumn {
			column: "maiden_bases.element",
			value: raw.to_string(),
		})
}

type BaseRow = (i64, String, String, i64, i64, i64);

fn base_from_row((id, name, element, base_tier, base_attack, base_defense): BaseRow) -> Result<MaidenBase> {
	Ok(MaidenBase {
		id,
		name,
		element: parse_element(&element)?,
		base_tier: base_tier.max(0) as u32,
		base_attack,
		base_defense,
	})
}

/// Catalog entries obtainable at `tier`, i.e. whose base tier does not exceed it.
pub async fn bases_up_to_tier(conn: &mut SqliteConnection, tier: u32) -> Result<Vec<MaidenBase>> {
	let rows = sqlx::query_as::<_, BaseRow>(
		r#"
		SELECT id, name, element, base_tier, base_attack, base_defense
		FROM maiden_bases
		WHERE base_tier <= ?
		ORDER BY id
		"#,
	)
	.bind(tier as i64)
	.fetch_all(&mut *conn)
	.await?;

	rows.into_iter().map(base_from_row).collect()
}

/// Adds `quantity` copies of a maiden at `tier`, stacking onto an existing
/// row. Returns the new stack size.
#[tracing::instrument(skip(conn), fields(player_id = %player_id))]
pub async fn grant_maiden(
	conn: &mut SqliteConnection,
	player_id: PlayerId,
	maiden_base_id: i64,
	tier: u32,
	quantity: i64,
) -> Result<i64> {
	if quantity <= 0 {
		return Err(DbError::NonPositiveQuantity {
			what: "maiden grant",
			quantity,
		});
	}

	let (stack,): (i64,) = sqlx::query_as(
		r#"
		INSERT INTO maidens (player_id, maiden_base_id, tier, quantity, acquired_at)
		VALUES (?, ?, ?, ?, ?)
		ON CONFLICT(player_id, maiden_base_id, tier) DO UPDATE SET
			quantity = quantity + excluded.quantity
		RETURNING quantity
		"#,
	)
	.bind(player_id.get())
	.bind(maiden_base_id)
	.bind(tier as i64)
	.bind(quantity)
	.bind(Utc::now())
	.fetch_one(&mut *conn)
	.await?;

	Ok(stack)
}

#[derive(Clone)]
pub struct MaidenRepository {
	pool: SqlitePool,
}

impl MaidenRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, new), fields(name = %new.name))]
	pub async fn insert_base(&self, new: &NewMaidenBase) -> Result<MaidenBase> {
		let result = sqlx::query(
			r#"
			INSERT INTO maiden_bases (name, element, base_tier, base_attack, base_defense)
			VALUES (?, ?, ?, ?, ?)
			ON CONFLICT(name) DO NOTHING
			"#,
		)
		.bind(&new.name)
		.bind(new.element.as_str())
		.bind(new.base_tier as i64)
		.bind(new.base_attack)
		.bind(new.base_defense)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::Duplicate(format!("maiden base '{}'", new.name)));
		}

		Ok(MaidenBase {
			id: result.last_insert_rowid(),
			name: new.name.clone(),
			element: new.element,
			base_tier: new.base_tier,
			base_attack: new.base_attack,
			base_defense: new.base_defense,
		})
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_base(&self, id: i64) -> Result<Option<MaidenBase>> {
		let row = sqlx::query_as::<_, BaseRow>(
			"SELECT id, name, element, base_tier, base_attack, base_defense FROM maiden_bases WHERE id = ?",
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(base_from_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_bases(&self) -> Result<Vec<MaidenBase>> {
		let mut conn = self.pool.acquire().await?;
		bases_up_to_tier(&mut conn, u32::MAX).await
	}

	pub async fn grant(
		&self,
		player_id: PlayerId,
		maiden_base_id: i64,
		tier: u32,
		quantity: i64,
	) -> Result<i64> {
		let mut conn = self.pool.acquire().await?;
		grant_maiden(&mut conn, player_id, maiden_base_id, tier, quantity).await
	}

	/// Every stack the player owns, strongest tier first.
	#[tracing::instrument(skip(self), fields(player_id = %player_id))]
	pub async fn list_for_player(&self, player_id: PlayerId) -> Result<Vec<OwnedMaiden>> {
		let rows = sqlx::query_as::<_, (i64, i64, i64, i64, String, String, i64, i64)>(
			r#"
			SELECT m.id, m.maiden_base_id, m.tier, m.quantity, b.name, b.element, b.base_attack, b.base_defense
			FROM maidens m
			JOIN maiden_bases b ON b.id = m.maiden_base_id
			WHERE m.player_id = ? AND m.quantity > 0
			ORDER BY m.tier DESC, m.id
			"#,
		)
		.bind(player_id.get())
		.fetch_all(&self.pool)
		.await?;

		rows
			.into_iter()
			.map(
				|(id, maiden_base_id, tier, quantity, name, element, base_attack, base_defense)| {
					Ok(OwnedMaiden {
						id,
						player_id,
						maiden_base_id,
						name,
						element: parse_element(&element)?,
						tier: tier.max(0) as u32,
						quantity,
						base_attack,
						base_defense,
					})
				},
			)
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_migrated_test_pool, create_test_player};

	fn base(name: &str, element: Element, base_tier: u32) -> NewMaidenBase {
		NewMaidenBase {
			name: name.to_string(),
			element,
			base_tier,
			base_attack: 100,
			base_defense: 50,
		}
	}

	#[tokio::test]
	async fn catalog_insert_and_filter_by_tier() {
		let pool = create_migrated_test_pool().await;
		let repo = MaidenRepository::new(pool.clone());

		let low = repo.insert_base(&base("Ember", Element::Infernal, 1)).await.unwrap();
		repo.insert_base(&base("Gale", Element::Tempest, 5)).await.unwrap();

		assert_eq!(repo.get_base(low.id).await.unwrap().unwrap(), low);
		assert_eq!(repo.list_bases().await.unwrap().len(), 2);

		let mut conn = pool.acquire().await.unwrap();
		let eligible = bases_up_to_tier(&mut conn, 3).await.unwrap();
		assert_eq!(eligible.len(), 1);
		assert_eq!(eligible[0].name, "Ember");
	}

	#[tokio::test]
	async fn duplicate_base_name_conflicts() {
		let pool = create_migrated_test_pool().await;
		let repo = MaidenRepository::new(pool);
		repo.insert_base(&base("Ember", Element::Infernal, 1)).await.unwrap();
		let err = repo
			.insert_base(&base("Ember", Element::Earth, 2))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Duplicate(_)));
	}

	#[tokio::test]
	async fn grant_stacks_same_tier() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = MaidenRepository::new(pool);
		let ember = repo.insert_base(&base("Ember", Element::Infernal, 1)).await.unwrap();
		let id = PlayerId::new(1);

		assert_eq!(repo.grant(id, ember.id, 3, 1).await.unwrap(), 1);
		assert_eq!(repo.grant(id, ember.id, 3, 2).await.unwrap(), 3);
		assert_eq!(repo.grant(id, ember.id, 4, 1).await.unwrap(), 1);

		let owned = repo.list_for_player(id).await.unwrap();
		assert_eq!(owned.len(), 2);
		assert_eq!(owned[0].tier, 4);
		assert_eq!(owned[0].attack(), 400);
		assert_eq!(owned[0].defense(), 200);
		assert_eq!(owned[1].quantity, 3);
	}

	#[tokio::test]
	async fn grant_rejects_non_positive_quantity() {
		let pool = create_migrated_test_pool().await;
		create_test_player(&pool, 1, 10, 0).await;
		let repo = MaidenRepository::new(pool);
		let ember = repo.insert_base(&base("Ember", Element::Infernal, 1)).await.unwrap();
		assert!(matches!(
			repo.grant(PlayerId::new(1), ember.id, 1, 0).await.unwrap_err(),
			DbError::NonPositiveQuantity { what: "maiden grant", .. }
		));
	}
}
