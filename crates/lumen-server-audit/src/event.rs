// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit record types.
//!
//! - [`AuditCategory`]: coarse bucket derived from the operation name
//! - [`AuditLogEntry`]: one immutable record of a state-changing action
//! - [`AuditLogBuilder`]: fluent construction of entries

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
	Transaction,
	Command,
	System,
	Security,
	Other,
}

/// Keyword table used by [`AuditCategory::classify`]. Order matters: the
/// first bucket with a matching keyword wins.
const CATEGORY_KEYWORDS: &[(AuditCategory, &[&str])] = &[
	(
		AuditCategory::Security,
		&["security", "auth", "ban", "exploit", "suspicious", "permission"],
	),
	(
		AuditCategory::System,
		&["system", "startup", "shutdown", "maintenance", "migration", "config"],
	),
	(AuditCategory::Command, &["command", "cmd"]),
	(
		AuditCategory::Transaction,
		&[
			"transaction",
			"grant",
			"spend",
			"purchase",
			"redeem",
			"reward",
			"transfer",
			"token",
			"lumees",
			"lumenite",
		],
	),
];

impl AuditCategory {
	/// Buckets an operation name by case-insensitive keyword match.
	pub fn classify(operation: &str) -> Self {
		let operation = operation.to_lowercase();
		CATEGORY_KEYWORDS
			.iter()
			.find(|(_, keywords)| keywords.iter().any(|k| operation.contains(k)))
			.map(|(category, _)| *category)
			.unwrap_or(AuditCategory::Other)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AuditCategory::Transaction => "TRANSACTION",
			AuditCategory::Command => "COMMAND",
			AuditCategory::System => "SYSTEM",
			AuditCategory::Security => "SECURITY",
			AuditCategory::Other => "OTHER",
		}
	}
}

impl fmt::Display for AuditCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AuditCategory {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"TRANSACTION" => Ok(AuditCategory::Transaction),
			"COMMAND" => Ok(AuditCategory::Command),
			"SYSTEM" => Ok(AuditCategory::System),
			"SECURITY" => Ok(AuditCategory::Security),
			"OTHER" => Ok(AuditCategory::Other),
			other => Err(format!("unknown audit category '{other}'")),
		}
	}
}

/// Canonical storage form of audit timestamps. Fixed width so stored values
/// sort chronologically as text.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A single audit record. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	/// Player (chat user) that performed the action.
	pub actor_id: i64,
	pub guild_id: Option<i64>,
	pub channel_id: Option<i64>,
	pub category: AuditCategory,
	/// Operation name, e.g. `token_redeem`.
	pub operation: String,
	pub details: serde_json::Value,
	pub context: Option<String>,
	pub success: bool,
	pub error_type: Option<String>,
	pub error_message: Option<String>,
	pub duration_ms: Option<i64>,
}

impl AuditLogEntry {
	pub fn builder(actor_id: i64, operation: impl Into<String>) -> AuditLogBuilder {
		AuditLogBuilder::new(actor_id, operation)
	}
}

#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	actor_id: i64,
	operation: String,
	category: Option<AuditCategory>,
	timestamp: Option<DateTime<Utc>>,
	guild_id: Option<i64>,
	channel_id: Option<i64>,
	details: serde_json::Value,
	context: Option<String>,
	success: bool,
	error_type: Option<String>,
	error_message: Option<String>,
	duration_ms: Option<i64>,
}

impl AuditLogBuilder {
	pub fn new(actor_id: i64, operation: impl Into<String>) -> Self {
		Self {
			actor_id,
			operation: operation.into(),
			category: None,
			timestamp: None,
			guild_id: None,
			channel_id: None,
			details: serde_json::Value::Object(serde_json::Map::new()),
			context: None,
			success: true,
			error_type: None,
			error_message: None,
			duration_ms: None,
		}
	}

	/// Overrides the category derived from the operation name.
	pub fn category(mut self, category: AuditCategory) -> Self {
		self.category = Some(category);
		self
	}

	pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	pub fn guild(mut self, guild_id: i64) -> Self {
		self.guild_id = Some(guild_id);
		self
	}

	pub fn channel(mut self, channel_id: i64) -> Self {
		self.channel_id = Some(channel_id);
		self
	}

	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}

	pub fn context(mut self, context: impl Into<String>) -> Self {
		self.context = Some(context.into());
		self
	}

	pub fn success(mut self, success: bool) -> Self {
		self.success = success;
		self
	}

	/// Marks the entry failed with the given error.
	pub fn error(mut self, error_type: impl Into<String>, message: impl Into<String>) -> Self {
		self.success = false;
		self.error_type = Some(error_type.into());
		self.error_message = Some(message.into());
		self
	}

	pub fn duration_ms(mut self, duration_ms: i64) -> Self {
		self.duration_ms = Some(duration_ms);
		self
	}

	pub fn build(self) -> AuditLogEntry {
		let category = self
			.category
			.unwrap_or_else(|| AuditCategory::classify(&self.operation));
		AuditLogEntry {
			id: Uuid::new_v4(),
			timestamp: self.timestamp.unwrap_or_else(Utc::now),
			actor_id: self.actor_id,
			guild_id: self.guild_id,
			channel_id: self.channel_id,
			category,
			operation: self.operation,
			details: self.details,
			context: self.context,
			success: self.success,
			error_type: self.error_type,
			error_message: self.error_message,
			duration_ms: self.duration_ms,
		}
	}
}
