// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage errors for the Lumen repositories.

use lumen_game_core::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("invalid database url: {0}")]
	InvalidUrl(String),

	#[error("player {0} not found")]
	PlayerNotFound(PlayerId),

	#[error("no ascension progress for player {0}")]
	ProgressNotFound(PlayerId),

	#[error("{0} already exists")]
	Duplicate(String),

	#[error("{what} quantity must be positive, got {quantity}")]
	NonPositiveQuantity { what: &'static str, quantity: i64 },

	/// A stored enum column holds a value the domain types do not know.
	#[error("corrupt {column} value '{value}'")]
	CorruptColumn { column: &'static str, value: String },

	/// The conditional spend matched no row although the player could afford it.
	#[error("resource spend for player {0} matched no row")]
	SpendRace(PlayerId),

	#[error("ledger details could not be encoded: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, DbError::PlayerNotFound(_) | DbError::ProgressNotFound(_))
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
