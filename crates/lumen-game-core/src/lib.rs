// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core gameplay rules for Lumen.
//!
//! Everything in this crate is pure: no database access, no clocks, and all
//! randomness flows through [`RandomSource`] so outcomes can be replayed in
//! tests. The server crates wrap these rules in transactions.
//!
//! - [`combat`]: per-turn damage, critical gauge, momentum and retaliation
//! - [`monster`]: floor monster generation from weighted pools
//! - [`rewards`]: geometric reward scaling, token drops and milestone bundles
//! - [`tunables`]: every gameplay constant, loadable from TOML

pub mod combat;
pub mod error;
pub mod monster;
pub mod random;
pub mod rewards;
pub mod tunables;
pub mod types;
pub mod weighted;

pub use combat::{
	calculate_damage, momentum_modifier, resolve_turn, retaliation_damage, CombatState, PartyPower,
	TurnEvent, TurnOutcome, TurnResult,
};
pub use error::{GameError, Result};
pub use monster::{generate_floor_monster, FloorMonster, MonsterSource};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use rewards::{
	milestone_bonus, resolve_victory_rewards, roll_maiden_tier, roll_token_drop, scaled_reward,
	VictoryRewards,
};
pub use tunables::{
	AscensionTunables, GameTunables, RewardBundle, SharedTunables, TokenGrant, TokenTunables,
	TunablesSource,
};
pub use types::{AttackType, Element, PlayerId, ResourceCost, TokenTier};
pub use weighted::{weighted_choice, weighted_choice_by};
