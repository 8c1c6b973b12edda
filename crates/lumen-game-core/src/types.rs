// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Chat platform user id of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(i64);

impl PlayerId {
	pub fn new(id: i64) -> Self {
		Self(id)
	}

	pub fn get(&self) -> i64 {
		self.0
	}
}

impl fmt::Display for PlayerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<i64> for PlayerId {
	fn from(id: i64) -> Self {
		Self(id)
	}
}

/// Elemental affinity of a maiden or monster.
///
/// A party "general" is the strongest maiden of an element; some elements
/// grant passive combat effects while their general is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
	Infernal,
	Umbral,
	Earth,
	Tempest,
	Radiant,
	Abyssal,
}

impl Element {
	pub fn all() -> &'static [Element] {
		&[
			Element::Infernal,
			Element::Umbral,
			Element::Earth,
			Element::Tempest,
			Element::Radiant,
			Element::Abyssal,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Element::Infernal => "infernal",
			Element::Umbral => "umbral",
			Element::Earth => "earth",
			Element::Tempest => "tempest",
			Element::Radiant => "radiant",
			Element::Abyssal => "abyssal",
		}
	}
}

impl fmt::Display for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Element {
	type Err = GameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Element::all()
			.iter()
			.copied()
			.find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| GameError::UnknownElement(s.to_string()))
	}
}

/// Token bucket. Tokens are redeemed for a maiden within the tier's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTier {
	Bronze,
	Silver,
	Gold,
	Platinum,
	Diamond,
}

impl TokenTier {
	pub fn all() -> &'static [TokenTier] {
		&[
			TokenTier::Bronze,
			TokenTier::Silver,
			TokenTier::Gold,
			TokenTier::Platinum,
			TokenTier::Diamond,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			TokenTier::Bronze => "bronze",
			TokenTier::Silver => "silver",
			TokenTier::Gold => "gold",
			TokenTier::Platinum => "platinum",
			TokenTier::Diamond => "diamond",
		}
	}
}

impl fmt::Display for TokenTier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TokenTier {
	type Err = GameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		TokenTier::all()
			.iter()
			.copied()
			.find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| GameError::UnknownTokenTier(s.to_string()))
	}
}

/// Attack strength chosen by the player for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
	#[serde(rename = "x1")]
	X1,
	#[serde(rename = "x3")]
	X3,
	#[serde(rename = "x10")]
	X10,
}

impl AttackType {
	pub fn all() -> &'static [AttackType] {
		&[AttackType::X1, AttackType::X3, AttackType::X10]
	}

	pub fn multiplier(&self) -> u32 {
		match self {
			AttackType::X1 => 1,
			AttackType::X3 => 3,
			AttackType::X10 => 10,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AttackType::X1 => "x1",
			AttackType::X3 => "x3",
			AttackType::X10 => "x10",
		}
	}
}

impl fmt::Display for AttackType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AttackType {
	type Err = GameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"x1" | "1" => Ok(AttackType::X1),
			"x3" | "3" => Ok(AttackType::X3),
			"x10" | "10" => Ok(AttackType::X10),
			_ => Err(GameError::UnknownAttackType(s.to_string())),
		}
	}
}

/// Resources consumed by one attack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCost {
	pub stamina: i64,
	#[serde(default)]
	pub lumenite: i64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn attack_type_parses_case_insensitively() {
		assert_eq!("X10".parse::<AttackType>().unwrap(), AttackType::X10);
		assert_eq!(" x3 ".parse::<AttackType>().unwrap(), AttackType::X3);
		assert!(matches!(
			"x5".parse::<AttackType>(),
			Err(GameError::UnknownAttackType(_))
		));
	}

	#[test]
	fn attack_multipliers() {
		assert_eq!(AttackType::X1.multiplier(), 1);
		assert_eq!(AttackType::X3.multiplier(), 3);
		assert_eq!(AttackType::X10.multiplier(), 10);
	}

	#[test]
	fn token_tier_display_matches_parse() {
		for tier in TokenTier::all() {
			assert_eq!(tier.to_string().parse::<TokenTier>().unwrap(), *tier);
		}
		assert!("mythic".parse::<TokenTier>().is_err());
	}

	#[test]
	fn element_parse() {
		assert_eq!("Radiant".parse::<Element>().unwrap(), Element::Radiant);
		assert!(matches!(
			"void".parse::<Element>(),
			Err(GameError::UnknownElement(_))
		));
	}
}
