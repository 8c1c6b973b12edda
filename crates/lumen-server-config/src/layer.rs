// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use lumen_game_core::GameTunables;
use serde::Deserialize;

use crate::sections::{
	AuditConfigLayer, DatabaseConfigLayer, LoggingConfigLayer, RetentionConfigLayer,
};

/// Partial configuration produced by one source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub audit: Option<AuditConfigLayer>,
	#[serde(default)]
	pub retention: Option<RetentionConfigLayer>,
	/// Gameplay tunables. Missing keys keep their built-in values; a later
	/// source replaces the whole table.
	#[serde(default)]
	pub game: Option<GameTunables>,
}

fn merge_section<T>(target: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (target.as_mut(), other) {
		(Some(current), Some(incoming)) => merge(current, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.database, other.database, |a, b| a.merge(b));
		merge_section(&mut self.logging, other.logging, |a, b| a.merge(b));
		merge_section(&mut self.audit, other.audit, |a, b| a.merge(b));
		merge_section(&mut self.retention, other.retention, |a, b| a.merge(b));
		if other.game.is_some() {
			self.game = other.game;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_combines_sections() {
		let mut base: ServerConfigLayer = toml::from_str(
			r#"
			[database]
			url = "sqlite:/data/a.db"

			[audit]
			batch_size = 10
			"#,
		)
		.unwrap();
		let overlay = ServerConfigLayer {
			audit: Some(AuditConfigLayer {
				enabled: Some(false),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(overlay);

		let audit = base.audit.unwrap();
		assert_eq!(audit.batch_size, Some(10));
		assert_eq!(audit.enabled, Some(false));
		assert_eq!(base.database.unwrap().url.as_deref(), Some("sqlite:/data/a.db"));
	}

	#[test]
	fn game_table_parses_partially() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
			[game.ascension.rewards]
			milestone_interval = 25
			"#,
		)
		.unwrap();
		let game = layer.game.unwrap();
		assert_eq!(game.ascension.rewards.milestone_interval, 25);
		assert_eq!(game.ascension.rewards.base_lumees, 100.0);
	}
}
