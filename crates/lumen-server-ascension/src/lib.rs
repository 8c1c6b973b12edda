// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ascension: sequential tower floors, one boss per floor.
//!
//! [`AscensionService`] wires the pure combat and reward rules from
//! `lumen-game-core` to persistence. Encounters live in the caller's session;
//! only resources, rewards, progress and the transaction log are durable.

pub mod error;
pub mod power;
pub mod service;

pub use error::{AscensionError, Result};
pub use power::{best_party, PartyPowerCalculator, PowerCalculator, MAX_PARTY_SIZE};
pub use service::{
	AscensionService, AttackOutcome, Encounter, REWARD_TRANSACTION, SPEND_TRANSACTION,
};
