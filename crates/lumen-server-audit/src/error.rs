// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
	#[error("invalid audit payload: {0}")]
	InvalidPayload(String),

	#[error("sink '{sink}' error: {source}")]
	Sink {
		sink: String,
		#[source]
		source: AuditSinkError,
	},

	#[error("event bus error: {0}")]
	Bus(String),

	#[error("audit consumer is already running")]
	AlreadyRunning,

	#[error("audit consumer is not running")]
	NotRunning,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditSinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),
}

impl AuditSinkError {
	/// Transient failures are worth retrying.
	pub fn is_transient(&self) -> bool {
		matches!(self, AuditSinkError::Transient(_))
	}
}
