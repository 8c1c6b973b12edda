// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process publish/subscribe bus.
//!
//! Delivery is at-least-once within the process and not persisted. Handlers
//! run sequentially in subscription order; a failing handler is logged and
//! does not stop delivery to the others.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AuditResult;

#[async_trait]
pub trait EventHandler: Send + Sync {
	async fn handle(&self, event_name: &str, payload: &Value) -> AuditResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "sub-{}", self.0)
	}
}

#[derive(Clone)]
struct Subscription {
	id: SubscriptionId,
	event_name: String,
	handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct BusInner {
	next_id: AtomicU64,
	subscriptions: RwLock<Vec<Subscription>>,
}

/// Cheaply cloneable handle; clones share subscriptions.
#[derive(Clone, Default)]
pub struct EventBus {
	inner: Arc<BusInner>,
}

impl fmt::Debug for EventBus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let count = self
			.inner
			.subscriptions
			.read()
			.map(|s| s.len())
			.unwrap_or_default();
		f.debug_struct("EventBus")
			.field("subscriptions", &count)
			.finish()
	}
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe(
		&self,
		event_name: impl Into<String>,
		handler: Arc<dyn EventHandler>,
	) -> SubscriptionId {
		let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
		let event_name = event_name.into();
		debug!(subscription = %id, event = %event_name, "subscribing to event");

		let mut subscriptions = self
			.inner
			.subscriptions
			.write()
			.unwrap_or_else(|e| e.into_inner());
		subscriptions.push(Subscription {
			id,
			event_name,
			handler,
		});
		id
	}

	/// Removes a subscription. Returns `false` when it was already gone.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut subscriptions = self
			.inner
			.subscriptions
			.write()
			.unwrap_or_else(|e| e.into_inner());
		let before = subscriptions.len();
		subscriptions.retain(|s| s.id != id);
		before != subscriptions.len()
	}

	pub fn subscriber_count(&self, event_name: &str) -> usize {
		self.inner
			.subscriptions
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.iter()
			.filter(|s| s.event_name == event_name)
			.count()
	}

	/// Delivers `payload` to every handler subscribed to `event_name` and
	/// returns how many were invoked.
	pub async fn publish(&self, event_name: &str, payload: Value) -> usize {
		let handlers: Vec<Subscription> = self
			.inner
			.subscriptions
			.read()
			.unwrap_or_else(|e| e.into_inner())
			.iter()
			.filter(|s| s.event_name == event_name)
			.cloned()
			.collect();

		for subscription in &handlers {
			if let Err(e) = subscription.handler.handle(event_name, &payload).await {
				warn!(
					subscription = %subscription.id,
					event = %event_name,
					error = %e,
					"event handler failed"
				);
			}
		}

		handlers.len()
	}
}
