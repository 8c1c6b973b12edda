// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

/// Source of uniform randomness for gameplay rolls.
pub trait RandomSource: Send + Sync {
	/// Returns a value in `[0, 1)`.
	fn next_f64(&self) -> f64;

	/// Returns a value in `min..=max`. `max < min` yields `min`.
	fn range_inclusive(&self, min: u32, max: u32) -> u32 {
		if max <= min {
			return min;
		}
		let span = (max - min + 1) as f64;
		let offset = (self.next_f64() * span).floor() as u32;
		min + offset.min(max - min)
	}
}

/// Thread-local RNG backed source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl ThreadRandom {
	pub fn new() -> Self {
		Self
	}
}

impl RandomSource for ThreadRandom {
	fn next_f64(&self) -> f64 {
		rand::thread_rng().gen::<f64>()
	}

	fn range_inclusive(&self, min: u32, max: u32) -> u32 {
		if max <= min {
			return min;
		}
		rand::thread_rng().gen_range(min..=max)
	}
}

/// Replays a fixed sequence of rolls, cycling when exhausted.
///
/// Used to make combat and reward outcomes deterministic in tests.
#[derive(Debug)]
pub struct SequenceRandom {
	values: Vec<f64>,
	cursor: AtomicUsize,
}

impl SequenceRandom {
	pub fn new(values: Vec<f64>) -> Self {
		Self {
			values,
			cursor: AtomicUsize::new(0),
		}
	}

	/// Always returns `value`.
	pub fn constant(value: f64) -> Self {
		Self::new(vec![value])
	}
}

impl RandomSource for SequenceRandom {
	fn next_f64(&self) -> f64 {
		if self.values.is_empty() {
			return 0.0;
		}
		let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
		self.values[idx].clamp(0.0, 0.999_999_999)
	}
}
