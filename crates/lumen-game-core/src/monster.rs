// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;
use crate::tunables::{FallbackMonster, MonsterTunables};
use crate::types::Element;
use crate::weighted::weighted_choice_by;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterSource {
	Pool,
	MilestoneBoss,
	Fallback,
}

/// The boss guarding one floor. HP always mirrors the defense stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorMonster {
	pub floor: u32,
	pub name: String,
	pub element: Element,
	pub attack: i64,
	pub defense: i64,
	pub hp: i64,
	pub max_hp: i64,
	pub source: MonsterSource,
}

impl FloorMonster {
	fn new(
		floor: u32,
		name: String,
		element: Element,
		attack: i64,
		defense: i64,
		source: MonsterSource,
	) -> Self {
		let attack = attack.max(1);
		let defense = defense.max(1);
		Self {
			floor,
			name,
			element,
			attack,
			defense,
			hp: defense,
			max_hp: defense,
			source,
		}
	}

	pub fn is_milestone_boss(&self) -> bool {
		self.source == MonsterSource::MilestoneBoss
	}
}

pub(crate) fn scale_stat(base: f64, growth: f64, steps: u32) -> i64 {
	let value = base * growth.powi(steps.min(i32::MAX as u32) as i32);
	if !value.is_finite() {
		return i64::MAX;
	}
	(value.round() as i64).max(1)
}

/// Generates the monster for `floor`.
///
/// Resolution order: a milestone boss defined for exactly this floor, then a
/// weighted pick from the first pool covering the floor, then the fallback
/// monster. The fallback guarantees an encounter even when content data is
/// missing or empty.
pub fn generate_floor_monster(
	floor: u32,
	tunables: &MonsterTunables,
	rng: &dyn RandomSource,
) -> FloorMonster {
	let floor = floor.max(1);

	if let Some(boss) = tunables.milestone_bosses.iter().find(|b| b.floor == floor) {
		return FloorMonster::new(
			floor,
			boss.name.clone(),
			boss.element,
			boss.attack,
			boss.defense,
			MonsterSource::MilestoneBoss,
		);
	}

	if let Some(pool) = tunables.pools.iter().find(|p| p.covers(floor)) {
		if let Some(template) = weighted_choice_by(&pool.monsters, |m| m.weight, rng) {
			let steps = floor - pool.min_floor;
			return FloorMonster::new(
				floor,
				template.name.clone(),
				template.element,
				scale_stat(template.base_attack, pool.attack_growth, steps),
				scale_stat(template.base_defense, pool.defense_growth, steps),
				MonsterSource::Pool,
			);
		}
	}

	fallback_monster(floor, &tunables.fallback)
}

/// Builds the fallback monster for `floor` using the same geometric law as the
/// pools, anchored at floor 1.
pub fn fallback_monster(floor: u32, fallback: &FallbackMonster) -> FloorMonster {
	let floor = floor.max(1);
	let steps = floor - 1;
	FloorMonster::new(
		floor,
		fallback.name.clone(),
		fallback.element,
		scale_stat(fallback.base_attack, fallback.attack_growth, steps),
		scale_stat(fallback.base_defense, fallback.defense_growth, steps),
		MonsterSource::Fallback,
	)
}
