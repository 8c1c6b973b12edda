// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit pipeline for Lumen.
//!
//! Services publish [`AuditEventPayload`]s on the in-process [`EventBus`];
//! the [`AuditConsumer`] buffers them and writes batches through an
//! [`AuditBatchSink`].

pub mod bus;
pub mod consumer;
pub mod error;
pub mod event;
pub mod payload;
pub mod sink;

pub use bus::{EventBus, EventHandler, SubscriptionId};
pub use consumer::{backoff_delay, AuditConsumer, ConsumerStatus, FlushOutcome};
pub use error::{AuditError, AuditResult, AuditSinkError};
pub use event::{format_timestamp, AuditCategory, AuditLogBuilder, AuditLogEntry};
pub use payload::AuditEventPayload;
pub use sink::AuditBatchSink;

pub use lumen_server_config::AuditConfig;

#[cfg(feature = "sink-sqlite")]
pub use sink::sqlite::SqliteAuditSink;
