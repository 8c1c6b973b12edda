// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit consumer configuration section.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_EVENT_NAME: &str = "audit_log";
const DEFAULT_MAX_BUFFER_SIZE: usize = 10_000;
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 5;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	#[serde(default)]
	pub enabled: Option<bool>,
	#[serde(default)]
	pub event_name: Option<String>,
	#[serde(default)]
	pub max_buffer_size: Option<usize>,
	#[serde(default)]
	pub batch_size: Option<usize>,
	#[serde(default)]
	pub flush_interval_secs: Option<u64>,
	#[serde(default)]
	pub max_retries: Option<u32>,
	#[serde(default)]
	pub retry_base_delay_ms: Option<u64>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.event_name.is_some() {
			self.event_name = other.event_name;
		}
		if other.max_buffer_size.is_some() {
			self.max_buffer_size = other.max_buffer_size;
		}
		if other.batch_size.is_some() {
			self.batch_size = other.batch_size;
		}
		if other.flush_interval_secs.is_some() {
			self.flush_interval_secs = other.flush_interval_secs;
		}
		if other.max_retries.is_some() {
			self.max_retries = other.max_retries;
		}
		if other.retry_base_delay_ms.is_some() {
			self.retry_base_delay_ms = other.retry_base_delay_ms;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			event_name: self
				.event_name
				.unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
			max_buffer_size: self.max_buffer_size.unwrap_or(DEFAULT_MAX_BUFFER_SIZE),
			batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
			flush_interval_secs: self
				.flush_interval_secs
				.unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS),
			max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
			retry_base_delay_ms: self
				.retry_base_delay_ms
				.unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
	pub enabled: bool,
	/// Bus event the consumer subscribes to.
	pub event_name: String,
	/// Oldest entries are evicted once the buffer holds this many.
	pub max_buffer_size: usize,
	/// Buffer length that triggers an immediate background flush.
	pub batch_size: usize,
	pub flush_interval_secs: u64,
	/// Total write attempts per batch before it is dropped.
	pub max_retries: u32,
	pub retry_base_delay_ms: u64,
}

impl AuditConfig {
	pub fn flush_interval(&self) -> Duration {
		Duration::from_secs(self.flush_interval_secs)
	}

	pub fn retry_base_delay(&self) -> Duration {
		Duration::from_millis(self.retry_base_delay_ms)
	}

	/// Cross-field checks; returns one message per problem.
	pub fn validate(&self) -> Vec<String> {
		let mut problems = Vec::new();
		if self.batch_size == 0 {
			problems.push("audit.batch_size must be at least 1".to_string());
		}
		if self.max_buffer_size < self.batch_size {
			problems.push(format!(
				"audit.max_buffer_size ({}) must not be smaller than audit.batch_size ({})",
				self.max_buffer_size, self.batch_size
			));
		}
		if self.max_retries == 0 {
			problems.push("audit.max_retries must be at least 1".to_string());
		}
		if self.flush_interval_secs == 0 {
			problems.push("audit.flush_interval_secs must be at least 1".to_string());
		}
		problems
	}
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditConfigLayer::default().finalize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = AuditConfig::default();
		assert!(config.enabled);
		assert_eq!(config.event_name, "audit_log");
		assert_eq!(config.max_buffer_size, 10_000);
		assert_eq!(config.batch_size, 100);
		assert_eq!(config.flush_interval(), Duration::from_secs(5));
		assert_eq!(config.max_retries, 3);
		assert_eq!(config.retry_base_delay(), Duration::from_secs(1));
		assert!(config.validate().is_empty());
	}

	#[test]
	fn test_merge_overwrites_only_present_fields() {
		let mut base = AuditConfigLayer {
			enabled: Some(true),
			batch_size: Some(50),
			..Default::default()
		};
		base.merge(AuditConfigLayer {
			enabled: Some(false),
			max_retries: Some(5),
			..Default::default()
		});
		assert_eq!(base.enabled, Some(false));
		assert_eq!(base.batch_size, Some(50));
		assert_eq!(base.max_retries, Some(5));
	}

	#[test]
	fn test_validate_rejects_bad_sizes() {
		let config = AuditConfigLayer {
			batch_size: Some(0),
			max_retries: Some(0),
			..Default::default()
		}
		.finalize();
		assert_eq!(config.validate().len(), 2);

		let config = AuditConfigLayer {
			max_buffer_size: Some(10),
			batch_size: Some(20),
			..Default::default()
		}
		.finalize();
		let problems = config.validate();
		assert_eq!(problems.len(), 1);
		assert!(problems[0].contains("max_buffer_size"));
	}
}
