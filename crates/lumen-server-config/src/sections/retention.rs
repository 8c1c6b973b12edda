// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit log retention.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_AUDIT_RETENTION_DAYS: i64 = 90;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq)]
pub struct RetentionConfig {
	/// Audit rows older than this many days are deleted.
	pub audit_retention_days: i64,
	pub cleanup_interval_secs: u64,
}

impl RetentionConfig {
	pub fn cleanup_interval(&self) -> Duration {
		Duration::from_secs(self.cleanup_interval_secs)
	}
}

impl Default for RetentionConfig {
	fn default() -> Self {
		Self {
			audit_retention_days: DEFAULT_AUDIT_RETENTION_DAYS,
			cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetentionConfigLayer {
	#[serde(default)]
	pub audit_retention_days: Option<i64>,
	#[serde(default)]
	pub cleanup_interval_secs: Option<u64>,
}

impl RetentionConfigLayer {
	pub fn merge(&mut self, other: RetentionConfigLayer) {
		if other.audit_retention_days.is_some() {
			self.audit_retention_days = other.audit_retention_days;
		}
		if other.cleanup_interval_secs.is_some() {
			self.cleanup_interval_secs = other.cleanup_interval_secs;
		}
	}

	pub fn finalize(self) -> RetentionConfig {
		RetentionConfig {
			audit_retention_days: self
				.audit_retention_days
				.unwrap_or(DEFAULT_AUDIT_RETENTION_DAYS),
			cleanup_interval_secs: self
				.cleanup_interval_secs
				.unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_keep_ninety_days() {
		let config = RetentionConfigLayer::default().finalize();
		assert_eq!(config.audit_retention_days, 90);
		assert_eq!(config.cleanup_interval(), Duration::from_secs(86_400));
	}
}
