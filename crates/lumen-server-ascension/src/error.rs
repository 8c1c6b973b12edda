// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use lumen_game_core::{GameError, PlayerId};
use lumen_server_db::{DbError, Resource, ResourceShortfall};

pub type Result<T> = std::result::Result<T, AscensionError>;

#[derive(Debug, thiserror::Error)]
pub enum AscensionError {
	#[error("insufficient {resource}: {required} required, {available} available")]
	InsufficientResources {
		resource: Resource,
		required: i64,
		available: i64,
	},

	#[error("invalid attack type '{0}' (expected x1, x3 or x10)")]
	InvalidAttackType(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("the floor {floor} encounter is already finished")]
	EncounterFinished { floor: u32 },

	#[error("encounter belongs to player {owner}, not {player}")]
	EncounterMismatch { owner: PlayerId, player: PlayerId },

	#[error(transparent)]
	Database(#[from] DbError),
}

impl AscensionError {
	/// Expected gameplay failures the player can act on, as opposed to
	/// infrastructure errors.
	pub fn is_domain(&self) -> bool {
		!matches!(self, AscensionError::Database(_))
	}
}

impl From<ResourceShortfall> for AscensionError {
	fn from(s: ResourceShortfall) -> Self {
		AscensionError::InsufficientResources {
			resource: s.resource,
			required: s.required,
			available: s.available,
		}
	}
}

impl From<GameError> for AscensionError {
	fn from(e: GameError) -> Self {
		match e {
			GameError::UnknownAttackType(raw) => AscensionError::InvalidAttackType(raw),
			other => AscensionError::NotFound(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn domain_classification() {
		assert!(AscensionError::InvalidAttackType("x5".to_string()).is_domain());
		assert!(AscensionError::EncounterFinished { floor: 3 }.is_domain());
		assert!(!AscensionError::Database(DbError::SpendRace(PlayerId::new(1))).is_domain());
	}

	#[test]
	fn shortfall_message_names_resource() {
		let err = AscensionError::from(ResourceShortfall {
			resource: Resource::Stamina,
			required: 10,
			available: 3,
		});
		assert_eq!(err.to_string(), "insufficient stamina: 10 required, 3 available");
	}

	#[test]
	fn unknown_attack_maps_to_invalid_attack_type() {
		let err: AscensionError = "x7".parse::<lumen_game_core::AttackType>().unwrap_err().into();
		assert!(matches!(err, AscensionError::InvalidAttackType(raw) if raw == "x7"));
	}
}
