// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod audit;
mod database;
mod logging;
mod retention;

pub use audit::{AuditConfig, AuditConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use retention::{RetentionConfig, RetentionConfigLayer};
