// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite persistence for Lumen.
//!
//! Repositories wrap a [`sqlx::SqlitePool`] for standalone calls. Operations
//! that must compose into a larger atomic unit are also exposed as free
//! functions taking `&mut SqliteConnection`, so services can run several of
//! them inside one transaction.

pub mod ascension;
pub mod audit;
pub mod error;
pub mod maiden;
pub mod player;
pub mod pool;
pub mod schema;
pub mod testing;
pub mod token;
pub mod transaction_log;

pub use ascension::{
	get_or_create_progress, record_defeat, record_victory, AscensionProgress, AscensionRepository,
	LeaderboardEntry, VictoryRecord,
};
pub use audit::{AuditLogFilter, AuditRepository};
pub use error::{DbError, Result};
pub use maiden::{
	bases_up_to_tier, grant_maiden, MaidenBase, MaidenRepository, NewMaidenBase, OwnedMaiden,
};
pub use player::{
	fetch_player, grant_rewards, spend_resources, NewPlayer, Player, PlayerRepository, Resource,
	ResourceShortfall, SpendOutcome,
};
pub use pool::create_pool;
pub use schema::run_migrations;
pub use token::{grant_tokens, token_balance, try_consume_tokens, TokenRepository};
pub use transaction_log::{log_transaction, TransactionLog, TransactionLogRepository};
