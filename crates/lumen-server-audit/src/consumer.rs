// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Buffered audit consumer.
//!
//! Events arrive from the [`EventBus`], are parsed and classified, and are
//! appended to a bounded in-memory FIFO. A background loop flushes the buffer
//! on a timer; reaching `batch_size` triggers an immediate background flush.
//! The buffer lock is only held to append or drain, never across a write.
//!
//! When the buffer is full the oldest entry is evicted. Every failed write is
//! retried with exponential backoff; a batch that still fails after
//! `max_retries` attempts is dropped and logged. The consumer never
//! propagates storage failures to producers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use lumen_server_config::AuditConfig;

use crate::bus::{EventBus, EventHandler, SubscriptionId};
use crate::error::{AuditError, AuditResult};
use crate::event::AuditLogEntry;
use crate::payload::AuditEventPayload;
use crate::sink::AuditBatchSink;

/// Upper bound on the backoff exponent.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Delay before retry number `attempt + 1`: `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
	base.saturating_mul(2u32.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT)))
}

/// Result of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushOutcome {
	/// Entries drained from the buffer.
	pub drained: usize,
	pub persisted: usize,
	pub dropped: usize,
	/// Write attempts made; 0 when the buffer was empty.
	pub attempts: u32,
}

impl FlushOutcome {
	pub fn is_empty(&self) -> bool {
		self.drained == 0
	}
}

/// Point-in-time health snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerStatus {
	pub running: bool,
	pub buffer_size: usize,
	pub max_buffer_size: usize,
	pub events_received: u64,
	pub events_persisted: u64,
	pub events_dropped: u64,
	pub events_malformed: u64,
	pub flush_count: u64,
	pub failed_flushes: u64,
	pub last_flush_at: Option<DateTime<Utc>>,
	/// Persisted / received, as a percentage. 100 when nothing was received.
	pub success_rate: f64,
	/// Dropped / received, as a percentage. 0 when nothing was received.
	pub drop_rate: f64,
}

#[derive(Default)]
struct ConsumerStats {
	received: AtomicU64,
	persisted: AtomicU64,
	dropped: AtomicU64,
	malformed: AtomicU64,
	flushes: AtomicU64,
	failed_flushes: AtomicU64,
}

struct Lifecycle {
	bus: EventBus,
	subscription: SubscriptionId,
	shutdown_tx: broadcast::Sender<()>,
	handle: JoinHandle<()>,
}

struct ConsumerInner {
	config: AuditConfig,
	sink: Arc<dyn AuditBatchSink>,
	buffer: Mutex<VecDeque<AuditLogEntry>>,
	/// Mirror of the buffer length so `status` stays synchronous.
	buffered: AtomicUsize,
	flush_scheduled: AtomicBool,
	running: AtomicBool,
	stats: ConsumerStats,
	last_flush_at: std::sync::Mutex<Option<DateTime<Utc>>>,
	lifecycle: Mutex<Option<Lifecycle>>,
}

/// Cloneable handle to a buffered audit consumer.
#[derive(Clone)]
pub struct AuditConsumer {
	inner: Arc<ConsumerInner>,
}

impl AuditConsumer {
	pub fn new(config: AuditConfig, sink: Arc<dyn AuditBatchSink>) -> Self {
		Self {
			inner: Arc::new(ConsumerInner {
				config,
				sink,
				buffer: Mutex::new(VecDeque::new()),
				buffered: AtomicUsize::new(0),
				flush_scheduled: AtomicBool::new(false),
				running: AtomicBool::new(false),
				stats: ConsumerStats::default(),
				last_flush_at: std::sync::Mutex::new(None),
				lifecycle: Mutex::new(None),
			}),
		}
	}

	pub fn config(&self) -> &AuditConfig {
		&self.inner.config
	}

	pub fn is_running(&self) -> bool {
		self.inner.running.load(Ordering::SeqCst)
	}

	/// Subscribes to `bus` and starts the periodic flush loop.
	#[instrument(skip(self, bus), fields(event = %self.inner.config.event_name))]
	pub async fn start(&self, bus: &EventBus) -> AuditResult<()> {
		let mut lifecycle = self.inner.lifecycle.lock().await;
		if lifecycle.is_some() {
			return Err(AuditError::AlreadyRunning);
		}

		let handler = Arc::new(ConsumerHandler {
			inner: Arc::clone(&self.inner),
		});
		self.inner.running.store(true, Ordering::SeqCst);
		let subscription = bus.subscribe(self.inner.config.event_name.clone(), handler);

		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
		let handle = tokio::spawn(run_flush_loop(Arc::clone(&self.inner), shutdown_rx));

		*lifecycle = Some(Lifecycle {
			bus: bus.clone(),
			subscription,
			shutdown_tx,
			handle,
		});

		info!(
			batch_size = self.inner.config.batch_size,
			max_buffer_size = self.inner.config.max_buffer_size,
			flush_interval_secs = self.inner.config.flush_interval_secs,
			"Audit consumer started"
		);
		Ok(())
	}

	/// Unsubscribes, stops the flush loop and flushes whatever is buffered.
	#[instrument(skip(self))]
	pub async fn stop(&self) -> AuditResult<FlushOutcome> {
		let Some(lifecycle) = self.inner.lifecycle.lock().await.take() else {
			return Err(AuditError::NotRunning);
		};

		lifecycle.bus.unsubscribe(lifecycle.subscription);
		self.inner.running.store(false, Ordering::SeqCst);
		let _ = lifecycle.shutdown_tx.send(());
		if let Err(e) = lifecycle.handle.await {
			warn!(error = %e, "audit flush loop ended abnormally");
		}

		let outcome = self.inner.flush().await;
		info!(
			final_flush_persisted = outcome.persisted,
			final_flush_dropped = outcome.dropped,
			"Audit consumer stopped"
		);
		Ok(outcome)
	}

	/// Appends an entry, evicting the oldest when the buffer is full.
	pub async fn enqueue(&self, entry: AuditLogEntry) {
		self.inner.enqueue(entry).await;
	}

	/// Drains the buffer and writes it as one batch.
	pub async fn flush(&self) -> FlushOutcome {
		self.inner.flush().await
	}

	/// Runs the sink health check once, without retries.
	pub async fn check_sink(&self) -> AuditResult<()> {
		self.inner
			.sink
			.health_check()
			.await
			.map_err(|source| AuditError::Sink {
				sink: self.inner.sink.name().to_string(),
				source,
			})
	}

	pub fn status(&self) -> ConsumerStatus {
		let stats = &self.inner.stats;
		let received = stats.received.load(Ordering::Relaxed);
		let persisted = stats.persisted.load(Ordering::Relaxed);
		let dropped = stats.dropped.load(Ordering::Relaxed);

		let (success_rate, drop_rate) = if received == 0 {
			(100.0, 0.0)
		} else {
			(
				persisted as f64 / received as f64 * 100.0,
				dropped as f64 / received as f64 * 100.0,
			)
		};

		ConsumerStatus {
			running: self.is_running(),
			buffer_size: self.inner.buffered.load(Ordering::Relaxed),
			max_buffer_size: self.inner.config.max_buffer_size,
			events_received: received,
			events_persisted: persisted,
			events_dropped: dropped,
			events_malformed: stats.malformed.load(Ordering::Relaxed),
			flush_count: stats.flushes.load(Ordering::Relaxed),
			failed_flushes: stats.failed_flushes.load(Ordering::Relaxed),
			last_flush_at: *self
				.inner
				.last_flush_at
				.lock()
				.unwrap_or_else(|e| e.into_inner()),
			success_rate,
			drop_rate,
		}
	}
}

impl ConsumerInner {
	async fn enqueue(self: &Arc<Self>, entry: AuditLogEntry) {
		self.push(entry, false).await;
	}

	/// Bus deliveries racing with `stop()` are dropped instead of being left
	/// behind the final flush. `running` is read under the buffer lock, which
	/// the final drain also takes after `running` is cleared.
	async fn enqueue_from_bus(self: &Arc<Self>, entry: AuditLogEntry) {
		self.push(entry, true).await;
	}

	async fn push(self: &Arc<Self>, entry: AuditLogEntry, require_running: bool) {
		self.stats.received.fetch_add(1, Ordering::Relaxed);
		let max = self.config.max_buffer_size.max(1);

		let len = {
			let mut buffer = self.buffer.lock().await;
			if require_running && !self.running.load(Ordering::SeqCst) {
				self.stats.dropped.fetch_add(1, Ordering::Relaxed);
				warn!(
					actor_id = entry.actor_id,
					operation = %entry.operation,
					"Audit consumer stopped, dropped late event"
				);
				return;
			}
			while buffer.len() >= max {
				if let Some(evicted) = buffer.pop_front() {
					self.stats.dropped.fetch_add(1, Ordering::Relaxed);
					warn!(
						actor_id = evicted.actor_id,
						operation = %evicted.operation,
						max_buffer_size = max,
						"Audit buffer full, dropped oldest entry"
					);
				}
			}
			buffer.push_back(entry);
			self.buffered.store(buffer.len(), Ordering::Relaxed);
			buffer.len()
		};

		if len >= self.config.batch_size.max(1) {
			self.schedule_flush();
		}
	}

	/// Spawns one background flush unless one is already pending.
	fn schedule_flush(self: &Arc<Self>) {
		if self
			.flush_scheduled
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			return;
		}

		let inner = Arc::clone(self);
		tokio::spawn(async move {
			inner.flush_scheduled.store(false, Ordering::SeqCst);
			inner.flush().await;
		});
	}

	async fn flush(&self) -> FlushOutcome {
		let batch: Vec<AuditLogEntry> = {
			let mut buffer = self.buffer.lock().await;
			let drained = buffer.drain(..).collect();
			self.buffered.store(0, Ordering::Relaxed);
			drained
		};

		if batch.is_empty() {
			return FlushOutcome::default();
		}

		self.stats.flushes.fetch_add(1, Ordering::Relaxed);
		let count = batch.len();
		let max_attempts = self.config.max_retries.max(1);
		let base_delay = self.config.retry_base_delay();
		let mut attempts = 0;

		while attempts < max_attempts {
			let attempt = attempts;
			attempts += 1;

			match self.sink.write_batch(&batch).await {
				Ok(()) => {
					self.stats.persisted.fetch_add(count as u64, Ordering::Relaxed);
					*self.last_flush_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());
					debug!(count, attempts, sink = self.sink.name(), "Flushed audit batch");
					return FlushOutcome {
						drained: count,
						persisted: count,
						dropped: 0,
						attempts,
					};
				}
				Err(e) if attempts < max_attempts => {
					let delay = backoff_delay(base_delay, attempt);
					warn!(
						attempt = attempts,
						max_attempts,
						transient = e.is_transient(),
						retry_in_ms = delay.as_millis() as u64,
						error = %e,
						"Audit batch write failed, retrying"
					);
					tokio::time::sleep(delay).await;
				}
				Err(e) => {
					warn!(
						attempt = attempts,
						transient = e.is_transient(),
						error = %e,
						"Audit batch write failed"
					);
				}
			}
		}

		self.stats.failed_flushes.fetch_add(1, Ordering::Relaxed);
		self.stats.dropped.fetch_add(count as u64, Ordering::Relaxed);
		error!(
			severity = "critical",
			count,
			attempts,
			sink = self.sink.name(),
			"Dropping audit batch after failed writes"
		);

		FlushOutcome {
			drained: count,
			persisted: 0,
			dropped: count,
			attempts,
		}
	}
}

async fn run_flush_loop(inner: Arc<ConsumerInner>, mut shutdown_rx: broadcast::Receiver<()>) {
	let interval = inner.config.flush_interval().max(Duration::from_millis(1));

	loop {
		tokio::select! {
			_ = tokio::time::sleep(interval) => {
				inner.flush().await;
			}
			_ = shutdown_rx.recv() => {
				debug!("audit flush loop received shutdown signal");
				break;
			}
		}
	}
}

/// Bus subscriber feeding the consumer. Malformed payloads are counted and
/// skipped.
struct ConsumerHandler {
	inner: Arc<ConsumerInner>,
}

#[async_trait]
impl EventHandler for ConsumerHandler {
	async fn handle(&self, event_name: &str, payload: &Value) -> AuditResult<()> {
		match AuditEventPayload::from_value(payload) {
			Ok(parsed) => {
				self.inner.enqueue_from_bus(parsed.into_entry()).await;
			}
			Err(e) => {
				self.inner.stats.malformed.fetch_add(1, Ordering::Relaxed);
				warn!(event = %event_name, error = %e, "Skipping malformed audit event");
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::AuditSinkError;
	use serde_json::json;
	use std::sync::atomic::AtomicUsize;

	struct MockSink {
		batches: std::sync::Mutex<Vec<Vec<AuditLogEntry>>>,
		calls: AtomicUsize,
		/// Number of upcoming calls that fail.
		failures_left: AtomicUsize,
		permanent: AtomicBool,
	}

	impl MockSink {
		fn new() -> Arc<Self> {
			Arc::new(Self {
				batches: std::sync::Mutex::new(Vec::new()),
				calls: AtomicUsize::new(0),
				failures_left: AtomicUsize::new(0),
				permanent: AtomicBool::new(false),
			})
		}

		fn fail_next(&self, n: usize) {
			self.failures_left.store(n, Ordering::SeqCst);
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		fn persisted(&self) -> Vec<AuditLogEntry> {
			self.batches.lock().unwrap().iter().flatten().cloned().collect()
		}
	}

	#[async_trait]
	impl AuditBatchSink for MockSink {
		fn name(&self) -> &str {
			"mock"
		}

		async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditSinkError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let failing = self
				.failures_left
				.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
				.is_ok();
			if failing {
				return if self.permanent.load(Ordering::SeqCst) {
					Err(AuditSinkError::Permanent("constraint violated".to_string()))
				} else {
					Err(AuditSinkError::Transient("database is locked".to_string()))
				};
			}
			self.batches.lock().unwrap().push(entries.to_vec());
			Ok(())
		}
	}

	fn config(batch_size: usize, max_buffer_size: usize) -> AuditConfig {
		AuditConfig {
			batch_size,
			max_buffer_size,
			flush_interval_secs: 3600,
			retry_base_delay_ms: 1,
			..AuditConfig::default()
		}
	}

	fn entry(actor_id: i64) -> AuditLogEntry {
		AuditLogEntry::builder(actor_id, "token_redeem").build()
	}

	#[test]
	fn backoff_doubles_per_attempt() {
		let base = Duration::from_secs(1);
		assert_eq!(backoff_delay(base, 0), Duration::from_secs(1));
		assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
		assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
		assert!(backoff_delay(base, 100) >= backoff_delay(base, 16));
	}

	#[tokio::test]
	async fn overflow_evicts_exactly_one_oldest_entry() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(config(100, 3), sink.clone());

		for actor in 1..=3 {
			consumer.enqueue(entry(actor)).await;
		}
		assert_eq!(consumer.status().events_dropped, 0);

		consumer.enqueue(entry(4)).await;
		let status = consumer.status();
		assert_eq!(status.events_dropped, 1);
		assert_eq!(status.buffer_size, 3);

		consumer.flush().await;
		let actors: Vec<i64> = sink.persisted().iter().map(|e| e.actor_id).collect();
		assert_eq!(actors, vec![2, 3, 4]);
	}

	#[tokio::test]
	async fn flush_drains_buffer_into_one_batch() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		for actor in 0..5 {
			consumer.enqueue(entry(actor)).await;
		}

		let outcome = consumer.flush().await;
		assert_eq!(
			outcome,
			FlushOutcome {
				drained: 5,
				persisted: 5,
				dropped: 0,
				attempts: 1,
			}
		);
		assert_eq!(sink.calls(), 1);

		let status = consumer.status();
		assert_eq!(status.buffer_size, 0);
		assert_eq!(status.events_persisted, 5);
		assert_eq!(status.flush_count, 1);
		assert!(status.last_flush_at.is_some());
		assert_eq!(status.success_rate, 100.0);

		assert!(consumer.flush().await.is_empty());
		assert_eq!(sink.calls(), 1);
	}

	#[tokio::test]
	async fn transient_failure_is_retried() {
		let sink = MockSink::new();
		sink.fail_next(2);
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		consumer.enqueue(entry(1)).await;

		let outcome = consumer.flush().await;
		assert_eq!(outcome.persisted, 1);
		assert_eq!(outcome.attempts, 3);
		assert_eq!(sink.calls(), 3);
		assert_eq!(consumer.status().failed_flushes, 0);
	}

	#[tokio::test]
	async fn batch_dropped_after_retries_exhausted() {
		let sink = MockSink::new();
		sink.fail_next(10);
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		consumer.enqueue(entry(1)).await;
		consumer.enqueue(entry(2)).await;

		let outcome = consumer.flush().await;
		assert_eq!(outcome.dropped, 2);
		assert_eq!(outcome.attempts, 3);
		assert_eq!(sink.calls(), 3);

		let status = consumer.status();
		assert_eq!(status.events_dropped, 2);
		assert_eq!(status.failed_flushes, 1);
		assert_eq!(status.drop_rate, 100.0);
		assert_eq!(status.success_rate, 0.0);
		assert_eq!(status.buffer_size, 0);
	}

	#[tokio::test]
	async fn permanent_failure_is_retried_too() {
		let sink = MockSink::new();
		sink.permanent.store(true, Ordering::SeqCst);
		sink.fail_next(1);
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		consumer.enqueue(entry(1)).await;

		let outcome = consumer.flush().await;
		assert_eq!(outcome.attempts, 2);
		assert_eq!(outcome.persisted, 1);
		assert_eq!(sink.calls(), 2);
	}

	#[tokio::test]
	async fn persistent_permanent_failure_uses_every_attempt() {
		let sink = MockSink::new();
		sink.permanent.store(true, Ordering::SeqCst);
		sink.fail_next(10);
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		consumer.enqueue(entry(1)).await;

		let outcome = consumer.flush().await;
		assert_eq!(outcome.attempts, 3);
		assert_eq!(outcome.dropped, 1);
		assert_eq!(sink.calls(), 3);
	}

	#[tokio::test]
	async fn late_bus_delivery_after_stop_is_dropped() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		let bus = EventBus::new();
		consumer.start(&bus).await.unwrap();
		consumer.stop().await.unwrap();

		// a publish that snapshotted the handler list before unsubscribe
		let handler = ConsumerHandler {
			inner: Arc::clone(&consumer.inner),
		};
		handler
			.handle(
				"audit_log",
				&json!({ "player_id": 3, "transaction_type": "token_grant" }),
			)
			.await
			.unwrap();

		let status = consumer.status();
		assert_eq!(status.buffer_size, 0);
		assert_eq!(status.events_received, 1);
		assert_eq!(status.events_dropped, 1);

		// direct enqueue is unaffected by the lifecycle
		consumer.enqueue(entry(4)).await;
		assert_eq!(consumer.status().buffer_size, 1);
	}

	#[tokio::test]
	async fn check_sink_reports_sink_errors() {
		struct DownSink;

		#[async_trait]
		impl AuditBatchSink for DownSink {
			fn name(&self) -> &str {
				"down"
			}

			async fn write_batch(&self, _entries: &[AuditLogEntry]) -> Result<(), AuditSinkError> {
				Ok(())
			}

			async fn health_check(&self) -> Result<(), AuditSinkError> {
				Err(AuditSinkError::Transient("unreachable".to_string()))
			}
		}

		let healthy = AuditConsumer::new(config(100, 1000), MockSink::new());
		assert!(healthy.check_sink().await.is_ok());

		let down = AuditConsumer::new(config(100, 1000), Arc::new(DownSink));
		match down.check_sink().await {
			Err(AuditError::Sink { sink, source }) => {
				assert_eq!(sink, "down");
				assert!(source.is_transient());
			}
			other => panic!("expected sink error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn reaching_batch_size_triggers_background_flush() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(config(2, 1000), sink.clone());
		consumer.enqueue(entry(1)).await;
		consumer.enqueue(entry(2)).await;

		for _ in 0..50 {
			if sink.persisted().len() == 2 {
				break;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		assert_eq!(sink.persisted().len(), 2);
	}

	#[tokio::test]
	async fn lifecycle_transitions() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		let bus = EventBus::new();

		assert!(matches!(consumer.stop().await, Err(AuditError::NotRunning)));

		consumer.start(&bus).await.unwrap();
		assert!(consumer.status().running);
		assert_eq!(bus.subscriber_count("audit_log"), 1);
		assert!(matches!(
			consumer.start(&bus).await,
			Err(AuditError::AlreadyRunning)
		));

		let delivered = bus
			.publish(
				"audit_log",
				json!({ "player_id": 11, "transaction_type": "token_grant" }),
			)
			.await;
		assert_eq!(delivered, 1);

		let outcome = consumer.stop().await.unwrap();
		assert_eq!(outcome.persisted, 1);
		assert!(!consumer.status().running);
		assert_eq!(bus.subscriber_count("audit_log"), 0);
		assert_eq!(sink.persisted()[0].actor_id, 11);

		// restart after stop is allowed
		consumer.start(&bus).await.unwrap();
		consumer.stop().await.unwrap();
	}

	#[tokio::test]
	async fn malformed_events_are_counted_and_skipped() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(config(100, 1000), sink.clone());
		let bus = EventBus::new();
		consumer.start(&bus).await.unwrap();

		bus.publish("audit_log", json!({ "transaction_type": "token_grant" }))
			.await;
		bus.publish(
			"audit_log",
			json!({ "player_id": 1, "transaction_type": "token_grant" }),
		)
		.await;

		let status = consumer.status();
		assert_eq!(status.events_malformed, 1);
		assert_eq!(status.events_received, 1);
		assert_eq!(status.buffer_size, 1);

		consumer.stop().await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn periodic_loop_flushes_on_interval() {
		let sink = MockSink::new();
		let consumer = AuditConsumer::new(
			AuditConfig {
				flush_interval_secs: 5,
				..config(100, 1000)
			},
			sink.clone(),
		);
		let bus = EventBus::new();
		consumer.start(&bus).await.unwrap();
		consumer.enqueue(entry(1)).await;

		tokio::time::sleep(Duration::from_secs(6)).await;
		assert_eq!(sink.persisted().len(), 1);

		consumer.stop().await.unwrap();
	}

	#[tokio::test]
	async fn status_rates_with_no_events() {
		let consumer = AuditConsumer::new(config(100, 1000), MockSink::new());
		let status = consumer.status();
		assert_eq!(status.success_rate, 100.0);
		assert_eq!(status.drop_rate, 0.0);
		assert_eq!(status.max_buffer_size, 1000);
		assert!(status.last_flush_at.is_none());
	}
}
