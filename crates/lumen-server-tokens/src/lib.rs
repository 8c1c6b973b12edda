// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Token inventory and redemption.

pub mod error;
pub mod service;

pub use error::{Result, TokenError};
pub use service::{
	RedemptionResult, TokenInventory, TokenService, GRANT_TRANSACTION, REDEEM_TRANSACTION,
};
