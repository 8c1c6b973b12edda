// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cumulative-weight selection shared by monster pools, token drop tables and
//! maiden redemption.

use crate::random::RandomSource;

/// Picks one item with probability proportional to `weight(item)`.
///
/// Non-positive and non-finite weights never win. Returns `None` when no item
/// carries a positive weight.
pub fn weighted_choice_by<'a, T, F>(
	items: &'a [T],
	weight: F,
	rng: &dyn RandomSource,
) -> Option<&'a T>
where
	F: Fn(&T) -> f64,
{
	let effective = |item: &T| {
		let w = weight(item);
		if w.is_finite() && w > 0.0 {
			w
		} else {
			0.0
		}
	};

	let total: f64 = items.iter().map(effective).sum();
	if total <= 0.0 {
		return None;
	}

	let roll = rng.next_f64() * total;
	let mut cumulative = 0.0;
	let mut last_positive = None;
	for item in items {
		let w = effective(item);
		if w == 0.0 {
			continue;
		}
		cumulative += w;
		last_positive = Some(item);
		if roll < cumulative {
			return Some(item);
		}
	}

	// Float accumulation can leave `roll` a hair above the final bound.
	last_positive
}

/// Picks from `(item, weight)` pairs.
pub fn weighted_choice<'a, T>(items: &'a [(T, f64)], rng: &dyn RandomSource) -> Option<&'a T> {
	weighted_choice_by(items, |(_, w)| *w, rng).map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::random::SequenceRandom;

	#[test]
	fn empty_and_zero_weights_yield_none() {
		let rng = SequenceRandom::constant(0.5);
		let empty: Vec<(&str, f64)> = Vec::new();
		assert!(weighted_choice(&empty, &rng).is_none());
		assert!(weighted_choice(&[("a", 0.0), ("b", -1.0)], &rng).is_none());
	}

	#[test]
	fn roll_maps_onto_cumulative_ranges() {
		let items = [("common", 70.0), ("rare", 25.0), ("epic", 5.0)];
		assert_eq!(
			weighted_choice(&items, &SequenceRandom::constant(0.0)),
			Some(&"common")
		);
		assert_eq!(
			weighted_choice(&items, &SequenceRandom::constant(0.69)),
			Some(&"common")
		);
		assert_eq!(
			weighted_choice(&items, &SequenceRandom::constant(0.70)),
			Some(&"rare")
		);
		assert_eq!(
			weighted_choice(&items, &SequenceRandom::constant(0.96)),
			Some(&"epic")
		);
	}

	#[test]
	fn zero_weight_items_are_skipped() {
		let items = [("never", 0.0), ("always", 1.0)];
		for roll in [0.0, 0.3, 0.99] {
			assert_eq!(
				weighted_choice(&items, &SequenceRandom::constant(roll)),
				Some(&"always")
			);
		}
	}

	#[test]
	fn by_accessor_works_on_structs() {
		struct Entry {
			name: &'static str,
			weight: u32,
		}
		let entries = [
			Entry {
				name: "a",
				weight: 1,
			},
			Entry {
				name: "b",
				weight: 3,
			},
		];
		let picked = weighted_choice_by(&entries, |e| e.weight as f64, &SequenceRandom::constant(0.5));
		assert_eq!(picked.map(|e| e.name), Some("b"));
	}
}
