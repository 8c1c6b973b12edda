// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire shape of audit events published on the bus.

use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use crate::bus::EventBus;
use crate::error::{AuditError, AuditResult};
use crate::event::{AuditLogBuilder, AuditLogEntry};

/// Payload carried by an audit bus event.
///
/// `metadata` may carry `guild_id`, `channel_id`, `success`, `error_type`,
/// `error_message` and `duration_ms`; everything else in it is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditEventPayload {
	pub player_id: i64,
	pub transaction_type: String,
	#[serde(default, deserialize_with = "object_or_null")]
	pub details: Map<String, Value>,
	#[serde(default)]
	pub context: Option<String>,
	#[serde(default, deserialize_with = "object_or_null")]
	pub metadata: Map<String, Value>,
}

fn object_or_null<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl AuditEventPayload {
	pub fn new(player_id: i64, transaction_type: impl Into<String>) -> Self {
		Self {
			player_id,
			transaction_type: transaction_type.into(),
			details: Map::new(),
			context: None,
			metadata: Map::new(),
		}
	}

	/// Replaces `details`; non-object values are stored under `value`.
	pub fn with_details(mut self, details: Value) -> Self {
		self.details = match details {
			Value::Object(map) => map,
			Value::Null => Map::new(),
			other => {
				let mut map = Map::new();
				map.insert("value".to_string(), other);
				map
			}
		};
		self
	}

	pub fn with_context(mut self, context: impl Into<String>) -> Self {
		self.context = Some(context.into());
		self
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
		self.metadata.insert(key.into(), value);
		self
	}

	/// Parses a bus payload. Missing or mistyped required fields are reported
	/// as [`AuditError::InvalidPayload`].
	pub fn from_value(value: &Value) -> AuditResult<Self> {
		let payload = Self::deserialize(value).map_err(|e| AuditError::InvalidPayload(e.to_string()))?;
		if payload.transaction_type.trim().is_empty() {
			return Err(AuditError::InvalidPayload(
				"transaction_type must not be empty".to_string(),
			));
		}
		Ok(payload)
	}

	pub fn to_value(&self) -> Value {
		json!({
			"player_id": self.player_id,
			"transaction_type": self.transaction_type,
			"details": self.details,
			"context": self.context,
			"metadata": self.metadata,
		})
	}

	/// Converts into a classified audit record.
	pub fn into_entry(self) -> AuditLogEntry {
		let mut builder: AuditLogBuilder =
			AuditLogEntry::builder(self.player_id, self.transaction_type)
				.details(Value::Object(self.details));

		if let Some(context) = self.context {
			builder = builder.context(context);
		}
		if let Some(guild_id) = metadata_i64(&self.metadata, "guild_id") {
			builder = builder.guild(guild_id);
		}
		if let Some(channel_id) = metadata_i64(&self.metadata, "channel_id") {
			builder = builder.channel(channel_id);
		}
		if let Some(duration_ms) = metadata_i64(&self.metadata, "duration_ms") {
			builder = builder.duration_ms(duration_ms);
		}

		let success = self
			.metadata
			.get("success")
			.and_then(Value::as_bool)
			.unwrap_or(true);
		let error_type = metadata_string(&self.metadata, "error_type");
		let error_message = metadata_string(&self.metadata, "error_message");

		if success {
			builder.build()
		} else {
			builder
				.error(
					error_type.unwrap_or_else(|| "unknown".to_string()),
					error_message.unwrap_or_default(),
				)
				.build()
		}
	}

	/// Publishes this payload on `bus`; returns the number of handlers invoked.
	pub async fn publish(&self, bus: &EventBus, event_name: &str) -> usize {
		bus.publish(event_name, self.to_value()).await
	}
}

/// Chat platform ids arrive as numbers or numeric strings.
fn metadata_i64(metadata: &Map<String, Value>, key: &str) -> Option<i64> {
	match metadata.get(key)? {
		Value::Number(n) => n
			.as_i64()
			.or_else(|| n.as_u64().map(|v| v as i64))
			.or_else(|| n.as_f64().map(|v| v.round() as i64)),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn metadata_string(metadata: &Map<String, Value>, key: &str) -> Option<String> {
	match metadata.get(key)? {
		Value::Null => None,
		Value::String(s) => Some(s.clone()),
		other => Some(other.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::AuditCategory;

	#[test]
	fn parses_minimal_payload() {
		let payload = AuditEventPayload::from_value(&json!({
			"player_id": 42,
			"transaction_type": "token_redeem",
		}))
		.unwrap();
		assert_eq!(payload.player_id, 42);
		assert!(payload.details.is_empty());
		assert!(payload.metadata.is_empty());
		assert!(payload.context.is_none());
	}

	#[test]
	fn null_maps_default_to_empty() {
		let payload = AuditEventPayload::from_value(&json!({
			"player_id": 1,
			"transaction_type": "x",
			"details": null,
			"metadata": null,
		}))
		.unwrap();
		assert!(payload.details.is_empty());
	}

	#[test]
	fn rejects_malformed_payloads() {
		for bad in [
			json!({ "transaction_type": "token_redeem" }),
			json!({ "player_id": "abc", "transaction_type": "token_redeem" }),
			json!({ "player_id": 1 }),
			json!({ "player_id": 1, "transaction_type": "  " }),
			json!({ "player_id": 1, "transaction_type": "x", "details": [1, 2] }),
			json!("not an object"),
		] {
			let err = AuditEventPayload::from_value(&bad).unwrap_err();
			assert!(matches!(err, AuditError::InvalidPayload(_)), "{bad}");
		}
	}

	#[test]
	fn metadata_populates_entry() {
		let entry = AuditEventPayload::from_value(&json!({
			"player_id": 9,
			"transaction_type": "token_redeem",
			"details": { "tier": "gold" },
			"context": "/redeem gold",
			"metadata": {
				"guild_id": "123456789012345678",
				"channel_id": 555,
				"success": false,
				"error_type": "InsufficientTokens",
				"error_message": "no gold tokens",
				"duration_ms": 17.4,
			},
		}))
		.unwrap()
		.into_entry();

		assert_eq!(entry.actor_id, 9);
		assert_eq!(entry.category, AuditCategory::Transaction);
		assert_eq!(entry.guild_id, Some(123_456_789_012_345_678));
		assert_eq!(entry.channel_id, Some(555));
		assert!(!entry.success);
		assert_eq!(entry.error_type.as_deref(), Some("InsufficientTokens"));
		assert_eq!(entry.error_message.as_deref(), Some("no gold tokens"));
		assert_eq!(entry.duration_ms, Some(17));
		assert_eq!(entry.context.as_deref(), Some("/redeem gold"));
		assert_eq!(entry.details, json!({ "tier": "gold" }));
	}

	#[test]
	fn success_defaults_to_true() {
		let entry = AuditEventPayload::new(3, "command_used").into_entry();
		assert!(entry.success);
		assert_eq!(entry.category, AuditCategory::Command);
	}

	#[test]
	fn value_roundtrip_preserves_fields() {
		let payload = AuditEventPayload::new(5, "ascension_reward")
			.with_details(json!({ "floor": 50 }))
			.with_context("ascension")
			.with_metadata("guild_id", json!(77));
		let parsed = AuditEventPayload::from_value(&payload.to_value()).unwrap();
		assert_eq!(parsed, payload);
	}
}
