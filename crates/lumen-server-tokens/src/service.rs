// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::sync::Arc;

use lumen_game_core::{
	roll_maiden_tier, Element, PlayerId, RandomSource, ThreadRandom, TokenTier, TunablesSource,
};
use lumen_server_audit::{AuditEventPayload, EventBus};
use lumen_server_db::{
	bases_up_to_tier, grant_maiden, grant_tokens, log_transaction, try_consume_tokens,
	TokenRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{Result, TokenError};

pub const REDEEM_TRANSACTION: &str = "token_redeem";
pub const GRANT_TRANSACTION: &str = "token_grant";

/// Balances for every tier, zero filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInventory {
	pub player_id: PlayerId,
	pub balances: BTreeMap<TokenTier, i64>,
}

impl TokenInventory {
	pub fn get(&self, tier: TokenTier) -> i64 {
		self.balances.get(&tier).copied().unwrap_or(0)
	}

	pub fn total(&self) -> i64 {
		self.balances.values().sum()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionResult {
	pub tier: TokenTier,
	pub maiden_base_id: i64,
	pub maiden_name: String,
	pub element: Element,
	pub maiden_tier: u32,
	pub tokens_remaining: i64,
}

struct AuditTarget {
	bus: EventBus,
	event_name: String,
}

pub struct TokenService {
	pool: SqlitePool,
	tokens: TokenRepository,
	tunables: Arc<dyn TunablesSource>,
	rng: Arc<dyn RandomSource>,
	audit: Option<AuditTarget>,
}

impl TokenService {
	pub fn new(pool: SqlitePool, tunables: Arc<dyn TunablesSource>) -> Self {
		Self {
			tokens: TokenRepository::new(pool.clone()),
			pool,
			tunables,
			rng: Arc::new(ThreadRandom::new()),
			audit: None,
		}
	}

	pub fn with_rng(mut self, rng: Arc<dyn RandomSource>) -> Self {
		self.rng = rng;
		self
	}

	pub fn with_audit(mut self, bus: EventBus, event_name: impl Into<String>) -> Self {
		self.audit = Some(AuditTarget {
			bus,
			event_name: event_name.into(),
		});
		self
	}

	pub async fn inventory(&self, player_id: PlayerId) -> Result<TokenInventory> {
		Ok(TokenInventory {
			player_id,
			balances: self.tokens.inventory(player_id).await?,
		})
	}

	/// Adds tokens and returns the new balance.
	#[tracing::instrument(skip(self), fields(player_id = %player_id, tier = %tier))]
	pub async fn grant(&self, player_id: PlayerId, tier: TokenTier, quantity: i64) -> Result<i64> {
		if quantity <= 0 {
			return Err(TokenError::InvalidQuantity(quantity));
		}

		let details = json!({ "tier": tier, "quantity": quantity });
		let mut tx = self.pool.begin().await?;
		let balance = grant_tokens(&mut tx, player_id, tier, quantity).await?;
		log_transaction(&mut tx, player_id, GRANT_TRANSACTION, &details, Some("tokens")).await?;
		tx.commit().await?;

		self.publish_audit(player_id, GRANT_TRANSACTION, details).await;
		Ok(balance)
	}

	/// [`Self::redeem`] with the tier given as text.
	pub async fn redeem_named(&self, player_id: PlayerId, tier: &str) -> Result<RedemptionResult> {
		let tier: TokenTier = tier.parse()?;
		self.redeem(player_id, tier).await
	}

	/// Spends one token of `tier` on a random maiden from the tier's range.
	///
	/// The decrement and the maiden grant share one transaction; if no maiden
	/// can be granted the token is kept.
	#[tracing::instrument(skip(self), fields(player_id = %player_id, tier = %tier))]
	pub async fn redeem(&self, player_id: PlayerId, tier: TokenTier) -> Result<RedemptionResult> {
		let tunables = self.tunables.snapshot();
		let mut tx = self.pool.begin().await?;

		let consumed = try_consume_tokens(&mut tx, player_id, tier, 1).await?;
		let Some(tokens_remaining) = consumed else {
			tx.rollback().await?;
			let available = self.tokens.balance(player_id, tier).await?;
			return Err(TokenError::InsufficientTokens { tier, available });
		};

		let maiden_tier = roll_maiden_tier(tier, &tunables.tokens, self.rng.as_ref())?;
		let candidates = bases_up_to_tier(&mut tx, maiden_tier).await?;
		if candidates.is_empty() {
			tx.rollback().await?;
			return Err(TokenError::NotFound(format!(
				"no maiden obtainable at tier {maiden_tier}"
			)));
		}
		let pick = self
			.rng
			.range_inclusive(0, (candidates.len() - 1) as u32) as usize;
		let base = &candidates[pick.min(candidates.len() - 1)];

		grant_maiden(&mut tx, player_id, base.id, maiden_tier, 1).await?;

		let result = RedemptionResult {
			tier,
			maiden_base_id: base.id,
			maiden_name: base.name.clone(),
			element: base.element,
			maiden_tier,
			tokens_remaining,
		};
		let details = json!({
			"tier": tier,
			"maiden_base_id": result.maiden_base_id,
			"maiden_name": result.maiden_name,
			"maiden_tier": maiden_tier,
			"tokens_remaining": tokens_remaining,
		});
		log_transaction(&mut tx, player_id, REDEEM_TRANSACTION, &details, Some("tokens")).await?;
		tx.commit().await?;

		info!(
			maiden = %result.maiden_name,
			maiden_tier,
			tokens_remaining,
			"token redeemed"
		);
		self.publish_audit(player_id, REDEEM_TRANSACTION, details).await;
		Ok(result)
	}

	async fn publish_audit(&self, player_id: PlayerId, transaction_type: &str, details: Value) {
		if let Some(audit) = &self.audit {
			AuditEventPayload::new(player_id.get(), transaction_type)
				.with_details(details)
				.with_context("tokens")
				.publish(&audit.bus, &audit.event_name)
				.await;
		}
	}
}
