// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[cfg(feature = "sink-sqlite")]
pub mod sqlite;

use async_trait::async_trait;

use crate::event::AuditLogEntry;

pub use crate::error::AuditSinkError;

/// Durable destination for flushed audit batches.
///
/// `write_batch` must be all-or-nothing: on error, none of the entries may
/// be visible, so the consumer can retry the whole batch.
#[async_trait]
pub trait AuditBatchSink: Send + Sync {
	fn name(&self) -> &str;

	async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditSinkError>;

	async fn health_check(&self) -> Result<(), AuditSinkError> {
		Ok(())
	}
}
