// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-player token counters, one row per tier.

use std::collections::BTreeMap;

use chrono::Utc;
use lumen_game_core::{PlayerId, TokenTier};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, Result};

/// Removes `quantity` tokens if the player holds at least that many.
///
/// Returns the remaining count, or `None` (with no change) when the balance is
/// too low. The check and the decrement are one statement, so two concurrent
/// consumers of the last token cannot both succeed.
#[tracing::instrument(skip(conn), fields(player_id = %player_id, tier = %tier))]
pub async fn try_consume_tokens(
	conn: &mut SqliteConnection,
	player_id: PlayerId,
	tier: TokenTier,
	quantity: i64,
) -> Result<Option<i64>> {
	let row: Option<(i64,)> = sqlx::query_as(
		r#"
		UPDATE tokens
		SET quantity = quantity - ?, updated_at = ?
		WHERE player_id = ? AND tier = ? AND quantity >= ?
		RETURNING quantity
		"#,
	)
	.bind(quantity)
	.bind(Utc::now())
	.bind(player_id.get())
	.bind(tier.as_str())
	.bind(quantity)
	.fetch_optional(&mut *conn)
	.await?;

	Ok(row.map(|(remaining,)| remaining))
}

/// Adds tokens and returns the new balance.
#[tracing::instrument(skip(conn), fields(player_id = %player_id, tier = %tier))]
pub async fn grant_tokens(
	conn: &mut SqliteConnection,
	player_id: PlayerId,
	tier: TokenTier,
	quantity: i64,
) -> Result<i64> {
	if quantity <= 0 {
		return Err(DbError::NonPositiveQuantity {
			what: "token grant",
			quantity,
		});
	}

	let (balance,): (i64,) = sqlx::query_as(
		r#"
		INSERT INTO tokens (player_id, tier, quantity, updated_at)
		VALUES (?, ?, ?, ?)
		ON CONFLICT(player_id, tier) DO UPDATE SET
			quantity = quantity + excluded.quantity,
			updated_at = excluded.updated_at
		RETURNING quantity
		"#,
	)
	.bind(player_id.get())
	.bind(tier.as_str())
	.bind(quantity)
	.bind(Utc::now())
	.fetch_one(&mut *conn)
	.await?;

	Ok(balance)
}

pub async fn token_balance(conn: &mut SqliteConnection, player_id: PlayerId, tier: TokenTier) -> Result<i64> {
	let row: Option<(i64,)> = sqlx::query_as("SELECT quantity FROM tokens WHERE player_id = ? AND tier = ?")
		.bind(player_id.get())
		.bind(tier.as_str())
		.fetch_optional(&mut *conn)
		.await?;
	Ok(row.map(|(q,)| q).unwrap_or(0))
}

#[derive(Clone)]
pub struct TokenRepository {
	pool: SqlitePool,
}

impl TokenRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Balances for every tier; tiers without a row report zero.
	#[tracing::instrument(skip(self), fields(player_id = %player_id))]
	pub async fn inventory(&self, player_id: PlayerId) -> Result<BTreeMap<TokenTier, i64>> {
		let rows: Vec<(String, i64)> = sqlx::query_as("SELECT tier, quantity FROM tokens WHERE player_id = ?")
			.bind(player_id.get())
			.fetch_all(&self.pool)
			.await?;

		let mut inventory: BTreeMap<TokenTier, i64> = TokenTier::all().iter().map(|t| (*t, 0)).collect();
		for (tier, quantity) in rows {
			let tier: TokenTier = tier
				.parse()
				.map_err(|_| DbError::CorruptColumn {
					column: "tokens.tier",
					value: tier.clone(),
				})?;
			inventory.insert(tier, quantity);
		}
		Ok(inventory)
	}

	pub async fn grant(&self, player_id: PlayerId, tier: TokenTier, quantity: i64) -> Result<i64> {
		let mut conn = self.pool.acquire().await?;
		grant_tokens(&mut conn, player_id, tier, quantity).await
	}

	pub async fn balance(&self, player_id: PlayerId, tier: TokenTier) -> Result<i64> {
		let mut conn = self.pool.acquire().await?;
		token_balance(&mut conn, player_id, tier).await
	}

	pub async fn try_consume(&self, player_id: PlayerId, tier: TokenTier, quantity: i64) -> Result<Option<i64>> {
		let mut conn = self.pool.acquire().await?;
		try_consume_tokens(&mut conn, player_id, tier, quantity).await
	}
}
