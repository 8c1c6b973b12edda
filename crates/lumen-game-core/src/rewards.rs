// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::random::RandomSource;
use crate::tunables::{RewardBundle, RewardTunables, TokenDropTable, TokenTunables};
use crate::types::TokenTier;
use crate::weighted::weighted_choice_by;

/// `base * growth^floor`, rounded and saturated into `i64`.
pub fn scaled_reward(base: f64, growth: f64, floor: u32) -> i64 {
	let value = base * growth.powi(floor.min(i32::MAX as u32) as i32);
	if !value.is_finite() {
		return if value.is_sign_negative() { 0 } else { i64::MAX };
	}
	(value.round() as i64).max(0)
}

/// Rolls the token tier dropped on `floor` from the first table covering it.
pub fn roll_token_drop(
	floor: u32,
	tables: &[TokenDropTable],
	rng: &dyn RandomSource,
) -> Option<TokenTier> {
	let table = tables.iter().find(|t| t.covers(floor))?;
	weighted_choice_by(&table.weights, |w| w.weight, rng).map(|w| w.tier)
}

/// Bonus bundle for `floor`, or `None` when it is not a milestone.
pub fn milestone_bonus(floor: u32, tunables: &RewardTunables) -> Option<RewardBundle> {
	if tunables.milestone_interval == 0 || floor == 0 || floor % tunables.milestone_interval != 0 {
		return None;
	}
	let bonus = tunables
		.milestone_overrides
		.iter()
		.find(|o| o.floor == floor)
		.map(|o| o.bonus.clone())
		.unwrap_or_else(|| tunables.milestone_bonus.clone());
	Some(bonus)
}

/// Everything granted for clearing one floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryRewards {
	pub floor: u32,
	/// Geometric lumees/experience for the floor.
	pub base: RewardBundle,
	pub token_drop: Option<TokenTier>,
	pub milestone: Option<RewardBundle>,
}

impl VictoryRewards {
	pub fn is_milestone(&self) -> bool {
		self.milestone.is_some()
	}

	/// Sum of base, dropped token and milestone bonus.
	pub fn totals(&self) -> RewardBundle {
		let mut total = self.base.clone();
		if let Some(tier) = self.token_drop {
			total.add_tokens(tier, 1);
		}
		if let Some(bonus) = &self.milestone {
			total.absorb(bonus);
		}
		total
	}
}

pub fn resolve_victory_rewards(
	floor: u32,
	tunables: &RewardTunables,
	rng: &dyn RandomSource,
) -> VictoryRewards {
	let base = RewardBundle {
		lumees: scaled_reward(tunables.base_lumees, tunables.growth_rate, floor),
		experience: scaled_reward(tunables.base_experience, tunables.growth_rate, floor),
		..Default::default()
	};

	VictoryRewards {
		floor,
		base,
		token_drop: roll_token_drop(floor, &tunables.token_drops, rng),
		milestone: milestone_bonus(floor, tunables),
	}
}

/// Rolls the maiden tier granted by redeeming one token of `tier`, uniformly
/// within the configured range.
pub fn roll_maiden_tier(
	tier: TokenTier,
	tunables: &TokenTunables,
	rng: &dyn RandomSource,
) -> Result<u32> {
	let range = tunables
		.range_for(tier)
		.ok_or_else(|| GameError::MissingTierRange(tier.to_string()))?;
	Ok(rng.range_inclusive(range.min_tier, range.max_tier))
}
