// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Strategic power: the aggregate stats of a player's best party.

use std::collections::BTreeMap;

use async_trait::async_trait;
use lumen_game_core::{Element, PartyPower, PlayerId};
use lumen_server_db::{MaidenRepository, OwnedMaiden};

use crate::error::Result;

pub const MAX_PARTY_SIZE: usize = 6;

#[async_trait]
pub trait PowerCalculator: Send + Sync {
	async fn party_power(&self, player_id: PlayerId) -> Result<PartyPower>;
}

/// Picks each element's strongest maiden as its general, keeps the
/// strongest [`MAX_PARTY_SIZE`] of them, and sums their stats.
pub fn best_party(maidens: &[OwnedMaiden]) -> PartyPower {
	let mut generals: BTreeMap<Element, &OwnedMaiden> = BTreeMap::new();
	for maiden in maidens.iter().filter(|m| m.quantity > 0) {
		let stronger = generals
			.get(&maiden.element)
			.map_or(true, |current| (maiden.attack(), maiden.defense()) > (current.attack(), current.defense()));
		if stronger {
			generals.insert(maiden.element, maiden);
		}
	}

	let mut party: Vec<&OwnedMaiden> = generals.into_values().collect();
	party.sort_by(|a, b| b.attack().cmp(&a.attack()).then(a.element.cmp(&b.element)));
	party.truncate(MAX_PARTY_SIZE);

	let power = party.iter().fold(0_i64, |acc, m| acc.saturating_add(m.attack()));
	let defense = party.iter().fold(0_i64, |acc, m| acc.saturating_add(m.defense()));
	let element_bonuses = party
		.iter()
		.map(|m| {
			let share = if power > 0 {
				m.attack() as f64 / power as f64
			} else {
				0.0
			};
			(m.element, share)
		})
		.collect();

	PartyPower {
		power,
		defense,
		generals: party.iter().map(|m| m.element).collect(),
		element_bonuses,
	}
}

/// [`PowerCalculator`] over the player's owned maidens.
#[derive(Clone)]
pub struct PartyPowerCalculator {
	maidens: MaidenRepository,
}

impl PartyPowerCalculator {
	pub fn new(maidens: MaidenRepository) -> Self {
		Self { maidens }
	}
}

#[async_trait]
impl PowerCalculator for PartyPowerCalculator {
	#[tracing::instrument(skip(self), fields(player_id = %player_id))]
	async fn party_power(&self, player_id: PlayerId) -> Result<PartyPower> {
		let owned = self.maidens.list_for_player(player_id).await?;
		let party = best_party(&owned);
		tracing::debug!(power = party.power, defense = party.defense, "computed party power");
		Ok(party)
	}
}
