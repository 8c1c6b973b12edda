// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
	#[error("unknown attack type '{0}' (expected x1, x3 or x10)")]
	UnknownAttackType(String),

	#[error("unknown token tier '{0}'")]
	UnknownTokenTier(String),

	#[error("unknown element '{0}'")]
	UnknownElement(String),

	#[error("no maiden tier range configured for {0} tokens")]
	MissingTierRange(String),
}
