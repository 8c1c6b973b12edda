// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gameplay tunables.
//!
//! Every struct deserializes with `#[serde(default)]`, so a partial TOML table
//! only overrides the keys it names and an empty table reproduces the built-in
//! constants exactly. Attack costs and the milestone bonus hold values whose
//! type default differs from the gameplay default, so they deserialize through
//! a layer of optional fields resolved against the built-in values.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{AttackType, Element, ResourceCost, TokenTier};

/// Root of all gameplay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameTunables {
	pub ascension: AscensionTunables,
	pub tokens: TokenTunables,
}

impl GameTunables {
	/// Returns human readable problems; empty when the tunables are usable.
	pub fn validate(&self) -> Vec<String> {
		let mut problems = Vec::new();
		let asc = &self.ascension;

		for attack in AttackType::all() {
			let cost = asc.costs.for_attack(*attack);
			if cost.stamina < 0 || cost.lumenite < 0 {
				problems.push(format!("ascension.costs.{attack}: costs must not be negative"));
			}
		}
		if !(0.0..=1.0).contains(&asc.combat.base_crit_chance) {
			problems.push("ascension.combat.base_crit_chance must be within 0..=1".to_string());
		}
		if asc.combat.gauge_max == 0 {
			problems.push("ascension.combat.gauge_max must be positive".to_string());
		}
		if asc.combat.momentum_max == 0 {
			problems.push("ascension.combat.momentum_max must be positive".to_string());
		}
		if asc.rewards.growth_rate <= 0.0 {
			problems.push("ascension.rewards.growth_rate must be positive".to_string());
		}
		if asc.rewards.milestone_interval == 0 {
			problems.push("ascension.rewards.milestone_interval must be positive".to_string());
		}
		for pool in &asc.monsters.pools {
			if let Some(max) = pool.max_floor {
				if max < pool.min_floor {
					problems.push(format!(
						"ascension.monsters.pools: max_floor {max} is below min_floor {}",
						pool.min_floor
					));
				}
			}
			if pool.attack_growth <= 0.0 || pool.defense_growth <= 0.0 {
				problems.push(format!(
					"ascension.monsters.pools (from floor {}): growth must be positive",
					pool.min_floor
				));
			}
		}
		for range in &self.tokens.tier_ranges {
			if range.max_tier < range.min_tier {
				problems.push(format!(
					"tokens.tier_ranges.{}: max_tier is below min_tier",
					range.tier
				));
			}
		}
		problems
	}
}

/// Tower climbing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AscensionTunables {
	pub costs: AttackCosts,
	pub combat: CombatTunables,
	pub generals: GeneralEffects,
	pub rewards: RewardTunables,
	pub monsters: MonsterTunables,
	/// Player HP before the party's defense is added.
	pub player_base_hp: i64,
	pub player_hp_per_defense: f64,
}

impl Default for AscensionTunables {
	fn default() -> Self {
		Self {
			costs: AttackCosts::default(),
			combat: CombatTunables::default(),
			generals: GeneralEffects::default(),
			rewards: RewardTunables::default(),
			monsters: MonsterTunables::default(),
			player_base_hp: 1000,
			player_hp_per_defense: 2.0,
		}
	}
}

impl AscensionTunables {
	pub fn player_max_hp(&self, party_defense: i64) -> i64 {
		let hp = self.player_base_hp as f64 + party_defense.max(0) as f64 * self.player_hp_per_defense;
		(hp.round() as i64).max(1)
	}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttackCosts {
	pub x1: ResourceCost,
	pub x3: ResourceCost,
	pub x10: ResourceCost,
}

impl Default for AttackCosts {
	fn default() -> Self {
		Self {
			x1: ResourceCost {
				stamina: 1,
				lumenite: 0,
			},
			x3: ResourceCost {
				stamina: 3,
				lumenite: 15,
			},
			x10: ResourceCost {
				stamina: 10,
				lumenite: 50,
			},
		}
	}
}

/// Partial cost table as written in configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct ResourceCostLayer {
	stamina: Option<i64>,
	lumenite: Option<i64>,
}

impl ResourceCostLayer {
	fn resolve(self, base: ResourceCost) -> ResourceCost {
		ResourceCost {
			stamina: self.stamina.unwrap_or(base.stamina),
			lumenite: self.lumenite.unwrap_or(base.lumenite),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AttackCostsLayer {
	x1: ResourceCostLayer,
	x3: ResourceCostLayer,
	x10: ResourceCostLayer,
}

impl<'de> Deserialize<'de> for AttackCosts {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let layer = AttackCostsLayer::deserialize(deserializer)?;
		let base = AttackCosts::default();
		Ok(AttackCosts {
			x1: layer.x1.resolve(base.x1),
			x3: layer.x3.resolve(base.x3),
			x10: layer.x10.resolve(base.x10),
		})
	}
}

impl AttackCosts {
	pub fn for_attack(&self, attack: AttackType) -> ResourceCost {
		match attack {
			AttackType::X1 => self.x1,
			AttackType::X3 => self.x3,
			AttackType::X10 => self.x10,
		}
	}
}

/// Damage modifier applied once momentum reaches `min_momentum`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MomentumTier {
	pub min_momentum: u32,
	pub modifier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CombatTunables {
	pub base_crit_chance: f64,
	pub crit_multiplier: f64,
	/// Gauge gained per point of attack multiplier on turns that do not consume it.
	pub gauge_gain_per_multiplier: u32,
	pub gauge_max: u32,
	pub momentum_max: u32,
	pub momentum_gain: u32,
	pub momentum_loss: u32,
	/// Retaliation above this fraction of max HP counts as a heavy hit.
	pub heavy_hit_threshold: f64,
	pub momentum_tiers: Vec<MomentumTier>,
	/// Retaliation is `attack * k / (k + party_defense)` with this `k`.
	pub retaliation_defense_constant: f64,
	pub min_damage: i64,
}

impl Default for CombatTunables {
	fn default() -> Self {
		Self {
			base_crit_chance: 0.05,
			crit_multiplier: 1.5,
			gauge_gain_per_multiplier: 10,
			gauge_max: 100,
			momentum_max: 100,
			momentum_gain: 10,
			momentum_loss: 20,
			heavy_hit_threshold: 0.30,
			momentum_tiers: vec![
				MomentumTier {
					min_momentum: 80,
					modifier: 1.30,
				},
				MomentumTier {
					min_momentum: 50,
					modifier: 1.20,
				},
				MomentumTier {
					min_momentum: 30,
					modifier: 1.10,
				},
			],
			retaliation_defense_constant: 1000.0,
			min_damage: 1,
		}
	}
}

/// Passive effects granted while a general of the given element is in the party.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralEffects {
	pub crit_element: Element,
	pub crit_bonus: f64,
	pub mitigation_element: Element,
	pub mitigation_pct: f64,
	pub regen_element: Element,
	pub regen_pct: f64,
}

impl Default for GeneralEffects {
	fn default() -> Self {
		Self {
			crit_element: Element::Tempest,
			crit_bonus: 0.05,
			mitigation_element: Element::Earth,
			mitigation_pct: 0.10,
			regen_element: Element::Radiant,
			regen_pct: 0.05,
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
	pub tier: TokenTier,
	pub quantity: i64,
}

/// A bundle of currencies and tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewardBundle {
	pub lumees: i64,
	pub lumenite: i64,
	pub experience: i64,
	pub tokens: Vec<TokenGrant>,
}

impl RewardBundle {
	/// Adds `other` into `self`, merging token grants of the same tier.
	pub fn absorb(&mut self, other: &RewardBundle) {
		self.lumees = self.lumees.saturating_add(other.lumees);
		self.lumenite = self.lumenite.saturating_add(other.lumenite);
		self.experience = self.experience.saturating_add(other.experience);
		for grant in &other.tokens {
			self.add_tokens(grant.tier, grant.quantity);
		}
	}

	pub fn add_tokens(&mut self, tier: TokenTier, quantity: i64) {
		if quantity <= 0 {
			return;
		}
		match self.tokens.iter_mut().find(|g| g.tier == tier) {
			Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
			None => self.tokens.push(TokenGrant { tier, quantity }),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RewardBundleLayer {
	lumees: Option<i64>,
	lumenite: Option<i64>,
	experience: Option<i64>,
	tokens: Option<Vec<TokenGrant>>,
}

impl RewardBundleLayer {
	fn resolve(self, base: RewardBundle) -> RewardBundle {
		RewardBundle {
			lumees: self.lumees.unwrap_or(base.lumees),
			lumenite: self.lumenite.unwrap_or(base.lumenite),
			experience: self.experience.unwrap_or(base.experience),
			tokens: self.tokens.unwrap_or(base.tokens),
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TokenWeight {
	pub tier: TokenTier,
	pub weight: f64,
}

/// Token drop probabilities for a floor range (inclusive; open-ended when
/// `max_floor` is absent).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenDropTable {
	pub min_floor: u32,
	#[serde(default)]
	pub max_floor: Option<u32>,
	pub weights: Vec<TokenWeight>,
}

impl TokenDropTable {
	pub fn covers(&self, floor: u32) -> bool {
		floor >= self.min_floor && self.max_floor.map_or(true, |max| floor <= max)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilestoneOverride {
	pub floor: u32,
	pub bonus: RewardBundle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewardTunables {
	pub base_lumees: f64,
	pub base_experience: f64,
	pub growth_rate: f64,
	pub milestone_interval: u32,
	/// Keys left out of the configured table keep their built-in value.
	#[serde(deserialize_with = "milestone_bonus_over_default")]
	pub milestone_bonus: RewardBundle,
	/// Floors whose bonus replaces `milestone_bonus`.
	pub milestone_overrides: Vec<MilestoneOverride>,
	pub token_drops: Vec<TokenDropTable>,
}

fn drop_table(min_floor: u32, max_floor: Option<u32>, weights: &[(TokenTier, f64)]) -> TokenDropTable {
	TokenDropTable {
		min_floor,
		max_floor,
		weights: weights
			.iter()
			.map(|(tier, weight)| TokenWeight {
				tier: *tier,
				weight: *weight,
			})
			.collect(),
	}
}

fn default_milestone_bonus() -> RewardBundle {
	RewardBundle {
		lumees: 5000,
		lumenite: 100,
		experience: 0,
		tokens: vec![TokenGrant {
			tier: TokenTier::Gold,
			quantity: 1,
		}],
	}
}

fn milestone_bonus_over_default<'de, D>(deserializer: D) -> Result<RewardBundle, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(RewardBundleLayer::deserialize(deserializer)?.resolve(default_milestone_bonus()))
}

impl Default for RewardTunables {
	fn default() -> Self {
		use TokenTier::*;
		Self {
			base_lumees: 100.0,
			base_experience: 20.0,
			growth_rate: 1.05,
			milestone_interval: 50,
			milestone_bonus: default_milestone_bonus(),
			milestone_overrides: Vec::new(),
			token_drops: vec![
				drop_table(1, Some(25), &[(Bronze, 80.0), (Silver, 20.0)]),
				drop_table(26, Some(50), &[(Bronze, 60.0), (Silver, 30.0), (Gold, 10.0)]),
				drop_table(51, Some(100), &[(Silver, 50.0), (Gold, 35.0), (Platinum, 15.0)]),
				drop_table(101, Some(200), &[(Gold, 50.0), (Platinum, 35.0), (Diamond, 15.0)]),
				drop_table(201, None, &[(Platinum, 60.0), (Diamond, 40.0)]),
			],
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonsterTemplate {
	pub name: String,
	pub element: Element,
	pub base_attack: f64,
	pub base_defense: f64,
	pub weight: f64,
}

/// Weighted monster pool. Stats are defined at `min_floor` and grow
/// geometrically for each floor above it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonsterPool {
	pub min_floor: u32,
	#[serde(default)]
	pub max_floor: Option<u32>,
	pub attack_growth: f64,
	pub defense_growth: f64,
	pub monsters: Vec<MonsterTemplate>,
}

impl MonsterPool {
	pub fn covers(&self, floor: u32) -> bool {
		floor >= self.min_floor && self.max_floor.map_or(true, |max| floor <= max)
	}
}

/// Fixed encounter that replaces the pool on its floor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilestoneBoss {
	pub floor: u32,
	pub name: String,
	pub element: Element,
	pub attack: i64,
	pub defense: i64,
}

/// Used when no pool covers a floor. Stats are defined at floor 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FallbackMonster {
	pub name: String,
	pub element: Element,
	pub base_attack: f64,
	pub base_defense: f64,
	pub attack_growth: f64,
	pub defense_growth: f64,
}

impl Default for FallbackMonster {
	fn default() -> Self {
		Self {
			name: "Wandering Shade".to_string(),
			element: Element::Umbral,
			base_attack: 40.0,
			base_defense: 400.0,
			attack_growth: 1.08,
			defense_growth: 1.10,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonsterTunables {
	pub pools: Vec<MonsterPool>,
	pub milestone_bosses: Vec<MilestoneBoss>,
	pub fallback: FallbackMonster,
}

fn template(name: &str, element: Element, attack: f64, defense: f64, weight: f64) -> MonsterTemplate {
	MonsterTemplate {
		name: name.to_string(),
		element,
		base_attack: attack,
		base_defense: defense,
		weight,
	}
}

fn boss(floor: u32, name: &str, element: Element, attack: i64, defense: i64) -> MilestoneBoss {
	MilestoneBoss {
		floor,
		name: name.to_string(),
		element,
		attack,
		defense,
	}
}

impl Default for MonsterTunables {
	fn default() -> Self {
		use Element::*;
		Self {
			pools: vec![
				MonsterPool {
					min_floor: 1,
					max_floor: Some(25),
					attack_growth: 1.08,
					defense_growth: 1.10,
					monsters: vec![
						template("Shade Wisp", Umbral, 30.0, 300.0, 50.0),
						template("Ember Imp", Infernal, 35.0, 260.0, 30.0),
						template("Moss Golem", Earth, 25.0, 380.0, 20.0),
					],
				},
				MonsterPool {
					min_floor: 26,
					max_floor: Some(100),
					attack_growth: 1.06,
					defense_growth: 1.07,
					monsters: vec![
						template("Storm Harpy", Tempest, 180.0, 3200.0, 40.0),
						template("Abyssal Leech", Abyssal, 210.0, 2900.0, 35.0),
						template("Dawn Sentinel", Radiant, 160.0, 3800.0, 25.0),
					],
				},
				MonsterPool {
					min_floor: 101,
					max_floor: None,
					attack_growth: 1.04,
					defense_growth: 1.05,
					monsters: vec![
						template("Void Colossus", Abyssal, 1100.0, 95000.0, 50.0),
						template("Cinder Warlord", Infernal, 1300.0, 82000.0, 50.0),
					],
				},
			],
			milestone_bosses: vec![
				boss(50, "Warden of Cinders", Infernal, 600, 18000),
				boss(100, "The Hollow Queen", Umbral, 1400, 90000),
				boss(150, "Tempest Sovereign", Tempest, 2600, 300000),
				boss(200, "Lumen Eater", Radiant, 4800, 900000),
			],
			fallback: FallbackMonster::default(),
		}
	}
}

/// Maiden tier range granted by redeeming one token of `tier`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierRange {
	pub tier: TokenTier,
	pub min_tier: u32,
	pub max_tier: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TokenTunables {
	pub tier_ranges: Vec<TierRange>,
}

impl Default for TokenTunables {
	fn default() -> Self {
		use TokenTier::*;
		let range = |tier, min_tier, max_tier| TierRange {
			tier,
			min_tier,
			max_tier,
		};
		Self {
			tier_ranges: vec![
				range(Bronze, 1, 3),
				range(Silver, 3, 5),
				range(Gold, 5, 7),
				range(Platinum, 7, 9),
				range(Diamond, 9, 11),
			],
		}
	}
}

impl TokenTunables {
	pub fn range_for(&self, tier: TokenTier) -> Option<TierRange> {
		self.tier_ranges.iter().copied().find(|r| r.tier == tier)
	}
}

/// Read access to the current tunables snapshot.
///
/// Implementations hand out immutable snapshots; a reload swaps the snapshot
/// without affecting callers that already hold the previous one.
pub trait TunablesSource: Send + Sync {
	fn snapshot(&self) -> Arc<GameTunables>;
}

/// In-memory, hot-reloadable tunables.
#[derive(Debug)]
pub struct SharedTunables {
	current: RwLock<Arc<GameTunables>>,
}

impl SharedTunables {
	pub fn new(tunables: GameTunables) -> Self {
		Self {
			current: RwLock::new(Arc::new(tunables)),
		}
	}

	pub fn reload(&self, tunables: GameTunables) {
		let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
		*guard = Arc::new(tunables);
	}
}

impl Default for SharedTunables {
	fn default() -> Self {
		Self::new(GameTunables::default())
	}
}

impl TunablesSource for SharedTunables {
	fn snapshot(&self) -> Arc<GameTunables> {
		Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
	}
}
