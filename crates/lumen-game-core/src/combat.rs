// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turn resolution for ascension floor encounters.
//!
//! A turn is computed from an immutable [`CombatState`] and returns the next
//! state inside [`TurnResult`]; callers persist side effects first and only
//! then adopt the new state, so a failed transaction leaves the encounter
//! untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::monster::FloorMonster;
use crate::random::RandomSource;
use crate::tunables::{AscensionTunables, CombatTunables, MomentumTier};
use crate::types::{AttackType, Element};

/// Aggregate combat stats of a player's best party.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyPower {
	pub power: i64,
	pub defense: i64,
	/// Elements with a general present in the party.
	pub generals: BTreeSet<Element>,
	/// Share of `power` contributed by each element's general.
	pub element_bonuses: BTreeMap<Element, f64>,
}

impl PartyPower {
	pub fn has_general(&self, element: Element) -> bool {
		self.generals.contains(&element)
	}
}

/// Ephemeral per-encounter state. Lives in the caller's session, never in the
/// database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
	pub floor: u32,
	pub monster_hp: i64,
	pub monster_max_hp: i64,
	pub player_hp: i64,
	pub player_max_hp: i64,
	/// 0..=gauge_max; a full gauge guarantees the next hit is critical.
	pub critical_gauge: u32,
	/// 0..=momentum_max; scales outgoing damage.
	pub momentum: u32,
	pub turns_taken: u32,
}

impl CombatState {
	pub fn new(monster: &FloorMonster, player_max_hp: i64) -> Self {
		let player_max_hp = player_max_hp.max(1);
		Self {
			floor: monster.floor,
			monster_hp: monster.hp,
			monster_max_hp: monster.max_hp,
			player_hp: player_max_hp,
			player_max_hp,
			critical_gauge: 0,
			momentum: 0,
			turns_taken: 0,
		}
	}

	pub fn is_victory(&self) -> bool {
		self.monster_hp <= 0
	}

	pub fn is_defeat(&self) -> bool {
		self.player_hp <= 0
	}

	pub fn is_finished(&self) -> bool {
		self.is_victory() || self.is_defeat()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
	Ongoing,
	Victory,
	Defeat,
}

/// Notable things that happened during a turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
	CriticalHit { guaranteed: bool },
	BossDefeated,
	Retaliated { damage: i64 },
	MomentumIncreased { from: u32, to: u32 },
	MomentumDecreased { from: u32, to: u32 },
	Regenerated { amount: i64 },
	PlayerDefeated,
}

impl fmt::Display for TurnEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TurnEvent::CriticalHit { guaranteed: true } => write!(f, "guaranteed critical hit"),
			TurnEvent::CriticalHit { guaranteed: false } => write!(f, "critical hit"),
			TurnEvent::BossDefeated => write!(f, "boss defeated"),
			TurnEvent::Retaliated { damage } => write!(f, "boss retaliated for {damage}"),
			TurnEvent::MomentumIncreased { from, to } => {
				write!(f, "momentum increased ({from} -> {to})")
			}
			TurnEvent::MomentumDecreased { from, to } => {
				write!(f, "momentum decreased ({from} -> {to})")
			}
			TurnEvent::Regenerated { amount } => write!(f, "regenerated {amount} hp"),
			TurnEvent::PlayerDefeated => write!(f, "party defeated"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
	pub attack: AttackType,
	pub damage_dealt: i64,
	pub is_critical: bool,
	pub guaranteed_critical: bool,
	pub crit_chance: f64,
	pub retaliation_damage: i64,
	pub regenerated: i64,
	pub outcome: TurnOutcome,
	pub state: CombatState,
	pub events: Vec<TurnEvent>,
}

/// Damage modifier for the current momentum: the strongest tier reached.
pub fn momentum_modifier(momentum: u32, tiers: &[MomentumTier]) -> f64 {
	tiers
		.iter()
		.filter(|t| momentum >= t.min_momentum)
		.map(|t| t.modifier)
		.fold(1.0, f64::max)
}

pub fn calculate_damage(
	power: i64,
	multiplier: u32,
	is_critical: bool,
	momentum: u32,
	combat: &CombatTunables,
) -> i64 {
	let mut damage = power.max(0) as f64 * multiplier as f64;
	if is_critical {
		damage *= combat.crit_multiplier;
	}
	damage *= momentum_modifier(momentum, &combat.momentum_tiers);
	(damage.floor() as i64).max(combat.min_damage)
}

/// Boss damage against the party, reduced by party defense and by
/// `mitigation_pct` (0..=1).
pub fn retaliation_damage(
	boss_attack: i64,
	party_defense: i64,
	mitigation_pct: f64,
	combat: &CombatTunables,
) -> i64 {
	let k = combat.retaliation_defense_constant.max(1.0);
	let raw = boss_attack.max(0) as f64 * k / (k + party_defense.max(0) as f64);
	let reduced = raw * (1.0 - mitigation_pct.clamp(0.0, 1.0));
	(reduced.floor() as i64).max(combat.min_damage)
}

/// Resolves one attack turn. Pure: `state` is not modified.
pub fn resolve_turn(
	state: &CombatState,
	attack: AttackType,
	party: &PartyPower,
	monster: &FloorMonster,
	tunables: &AscensionTunables,
	rng: &dyn RandomSource,
) -> TurnResult {
	let combat = &tunables.combat;
	let generals = &tunables.generals;
	let multiplier = attack.multiplier();

	let mut next = *state;
	let mut events = Vec::new();

	let mut crit_chance = combat.base_crit_chance;
	if party.has_general(generals.crit_element) {
		crit_chance += generals.crit_bonus;
	}

	let mut gauge = state.critical_gauge.min(combat.gauge_max);
	if attack == AttackType::X10 {
		gauge = combat.gauge_max;
	}

	let guaranteed_critical = gauge >= combat.gauge_max;
	if guaranteed_critical {
		crit_chance = 1.0;
		next.critical_gauge = 0;
	} else {
		let gain = combat.gauge_gain_per_multiplier.saturating_mul(multiplier);
		next.critical_gauge = gauge.saturating_add(gain).min(combat.gauge_max);
	}
	let crit_chance = crit_chance.clamp(0.0, 1.0);

	let is_critical = guaranteed_critical || rng.next_f64() < crit_chance;
	if is_critical {
		events.push(TurnEvent::CriticalHit {
			guaranteed: guaranteed_critical,
		});
	}

	let damage_dealt = calculate_damage(party.power, multiplier, is_critical, state.momentum, combat);
	next.monster_hp = state.monster_hp.saturating_sub(damage_dealt).max(0);
	next.turns_taken = state.turns_taken.saturating_add(1);

	let mut retaliation = 0;
	let mut regenerated = 0;
	let outcome = if next.monster_hp <= 0 {
		events.push(TurnEvent::BossDefeated);
		TurnOutcome::Victory
	} else {
		let mitigation = if party.has_general(generals.mitigation_element) {
			generals.mitigation_pct
		} else {
			0.0
		};
		retaliation = retaliation_damage(monster.attack, party.defense, mitigation, combat);
		events.push(TurnEvent::Retaliated {
			damage: retaliation,
		});

		next.player_hp = state.player_hp.saturating_sub(retaliation).max(0);
		let defeated = next.player_hp <= 0;

		let heavy_hit = retaliation as f64 > state.player_max_hp as f64 * combat.heavy_hit_threshold;
		if heavy_hit {
			next.momentum = state.momentum.saturating_sub(combat.momentum_loss);
			events.push(TurnEvent::MomentumDecreased {
				from: state.momentum,
				to: next.momentum,
			});
		} else if !defeated {
			next.momentum = state
				.momentum
				.saturating_add(combat.momentum_gain)
				.min(combat.momentum_max);
			if next.momentum != state.momentum {
				events.push(TurnEvent::MomentumIncreased {
					from: state.momentum,
					to: next.momentum,
				});
			}
		}

		if defeated {
			events.push(TurnEvent::PlayerDefeated);
			TurnOutcome::Defeat
		} else {
			if party.has_general(generals.regen_element) {
				let amount = (next.player_max_hp as f64 * generals.regen_pct).floor() as i64;
				regenerated = amount.clamp(0, next.player_max_hp - next.player_hp);
				if regenerated > 0 {
					next.player_hp += regenerated;
					events.push(TurnEvent::Regenerated {
						amount: regenerated,
					});
				}
			}
			TurnOutcome::Ongoing
		}
	};

	TurnResult {
		attack,
		damage_dealt,
		is_critical,
		guaranteed_critical,
		crit_chance,
		retaliation_damage: retaliation,
		regenerated,
		outcome,
		state: next,
		events,
	}
}
