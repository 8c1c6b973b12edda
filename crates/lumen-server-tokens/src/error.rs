// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use lumen_game_core::{GameError, TokenTier};
use lumen_server_db::DbError;

pub type Result<T> = std::result::Result<T, TokenError>;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
	#[error("no {tier} tokens to redeem ({available} available)")]
	InsufficientTokens { tier: TokenTier, available: i64 },

	#[error("invalid token tier '{0}'")]
	InvalidTier(String),

	#[error("token quantity must be positive, got {0}")]
	InvalidQuantity(i64),

	#[error("not found: {0}")]
	NotFound(String),

	#[error(transparent)]
	Database(#[from] DbError),
}

impl TokenError {
	pub fn is_domain(&self) -> bool {
		!matches!(self, TokenError::Database(_))
	}
}

impl From<sqlx::Error> for TokenError {
	fn from(e: sqlx::Error) -> Self {
		TokenError::Database(DbError::Sqlx(e))
	}
}

impl From<GameError> for TokenError {
	fn from(e: GameError) -> Self {
		match e {
			GameError::UnknownTokenTier(raw) => TokenError::InvalidTier(raw),
			other => TokenError::NotFound(other.to_string()),
		}
	}
}
