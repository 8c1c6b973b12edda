// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;

use lumen_game_core::{AttackType, GameTunables};
use lumen_server_config::{load_config_with_file, LogFormat};

#[test]
fn missing_file_falls_back_to_defaults() {
	let dir = tempfile::tempdir().unwrap();
	let config = load_config_with_file(dir.path().join("absent.toml")).unwrap();

	assert_eq!(config.audit.batch_size, 100);
	assert_eq!(config.retention.audit_retention_days, 90);
	assert_eq!(config.game, GameTunables::default());
}

#[test]
fn file_overrides_defaults_section_by_section() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	write!(
		file,
		r#"
[logging]
format = "json"

[audit]
max_buffer_size = 500
batch_size = 50

[retention]
audit_retention_days = 30

[game.ascension.costs.x10]
stamina = 8
"#
	)
	.unwrap();

	let config = load_config_with_file(file.path()).unwrap();

	assert_eq!(config.logging.format, LogFormat::Json);
	assert_eq!(config.audit.max_buffer_size, 500);
	assert_eq!(config.audit.batch_size, 50);
	assert_eq!(config.audit.max_retries, 3);
	assert_eq!(config.retention.audit_retention_days, 30);

	let x10 = config.game.ascension.costs.for_attack(AttackType::X10);
	assert_eq!(x10.stamina, 8);
	assert_eq!(x10.lumenite, 50);
}
