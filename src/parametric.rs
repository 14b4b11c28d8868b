//! Parametric descriptions of Levenshtein automata.
//!
//! - Klaus U. Schulz, Stoyan Mihov: *Fast String Correction with Levenshtein-Automata*, 2002.
//!
//! A state of the automaton for a word `w` and distance `n` is a set of positions
//! `(i, e)`: `i` characters of `w` consumed with `e` errors. Normalized relative to
//! their smallest `i`, these sets do not depend on `w`; only the characteristic
//! vector of the next `2n + 1` characters of `w` decides the transition. The tables
//! below map `(set, vector)` to `(set', offset increment)` once for all words.

use std::collections::VecDeque;
use std::sync::OnceLock;

use hashbrown::HashMap;

/// `i` and `e` of a position; `transposed` marks the middle of a transposition,
/// where the input already supplied the character at `i + 1` and must supply `i` next.
#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
struct Position {
	offset: usize,
	errors: usize,
	transposed: bool,
}

type PositionSet = Vec<Position>;

/// Fixed-width unsigned integers packed into 64-bit words, least significant bits first.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct PackedTable {
	bits: u32,
	words: Vec<u64>,
}

impl PackedTable {
	fn pack(values: &[u32]) -> Self {
		let max: u32 = values.iter().copied().max().unwrap_or(0);
		let bits: u32 = (u32::BITS - max.leading_zeros()).max(1);
		let mut words: Vec<u64> = vec![0; (values.len() * bits as usize).div_ceil(64)];
		for (index, &value) in values.iter().enumerate() {
			let bit: usize = index * bits as usize;
			let (word, shift) = (bit / 64, bit % 64);
			words[word] |= u64::from(value) << shift;
			if shift + bits as usize > 64 {
				words[word + 1] |= u64::from(value) >> (64 - shift);
			}
		}
		Self { bits, words }
	}

	fn get(&self, index: usize) -> u32 {
		let bit: usize = index * self.bits as usize;
		let (word, shift) = (bit / 64, bit % 64);
		let mut value: u64 = self.words[word] >> shift;
		if shift + self.bits as usize > 64 {
			value |= self.words[word + 1] << (64 - shift);
		}
		(value & ((1 << self.bits) - 1)) as u32
	}
}

/// Transition tables for one distance, shared by all words.
#[derive(Debug)]
pub struct ParametricDescription {
	max_distance: usize,
	/// Per state, the smallest `e - i` over its plain positions.
	min_errors: Vec<i64>,
	/// Per window length `k`, the target state plus one (zero when the set dies),
	/// indexed by `vector * states + state`.
	to_states: Vec<PackedTable>,
	/// Same layout; how far the smallest position advanced.
	offset_increments: Vec<PackedTable>,
}

static LEV1: OnceLock<ParametricDescription> = OnceLock::new();
static LEV1T: OnceLock<ParametricDescription> = OnceLock::new();
static LEV2: OnceLock<ParametricDescription> = OnceLock::new();
static LEV2T: OnceLock<ParametricDescription> = OnceLock::new();

impl ParametricDescription {
	/// Tables for `max_distance` 1 or 2, generated on first use.
	pub fn get(max_distance: usize, transpositions: bool) -> Option<&'static Self> {
		let cell: &'static OnceLock<Self> = match (max_distance, transpositions) {
			(1, false) => &LEV1,
			(1, true) => &LEV1T,
			(2, false) => &LEV2,
			(2, true) => &LEV2T,
			_ => return None,
		};
		Some(cell.get_or_init(|| Self::generate(max_distance, transpositions)))
	}

	pub fn max_distance(&self) -> usize {
		self.max_distance
	}

	pub fn num_states(&self) -> usize {
		self.min_errors.len()
	}

	/// Longest window of characteristic bits a transition looks at.
	fn window(&self) -> usize {
		2 * self.max_distance + 1
	}

	fn generate(n: usize, transpositions: bool) -> Self {
		let window: usize = 2 * n + 1;
		let initial: PositionSet = vec![Position {
			offset: 0,
			errors: 0,
			transposed: false,
		}];
		let mut sets: Vec<PositionSet> = vec![initial.clone()];
		let mut ids: HashMap<PositionSet, usize> = HashMap::new();
		ids.insert(initial, 0);
		// transitions[state][k][vector]
		let mut transitions: Vec<Vec<Vec<Option<(usize, usize)>>>> = Vec::new();
		let mut worklist: VecDeque<usize> = VecDeque::from([0]);

		while let Some(state) = worklist.pop_front() {
			let mut per_window: Vec<Vec<Option<(usize, usize)>>> = Vec::with_capacity(window + 1);
			for k in 0..=window {
				let mut per_vector: Vec<Option<(usize, usize)>> = Vec::with_capacity(1 << k);
				for vector in 0..(1u32 << k) {
					let next: Option<(usize, usize)> = step(&sets[state], n, transpositions, k, vector).map(|(set, delta)| {
						let id: usize = match ids.get(&set) {
							Some(&id) => id,
							None => {
								let id: usize = sets.len();
								ids.insert(set.clone(), id);
								sets.push(set);
								worklist.push_back(id);
								id
							},
						};
						(id, delta)
					});
					per_vector.push(next);
				}
				per_window.push(per_vector);
			}
			// States are numbered in the order they are queued.
			debug_assert_eq!(transitions.len(), state);
			transitions.push(per_window);
		}

		let states: usize = sets.len();
		let mut to_states: Vec<PackedTable> = Vec::with_capacity(window + 1);
		let mut offset_increments: Vec<PackedTable> = Vec::with_capacity(window + 1);
		for k in 0..=window {
			let vectors: usize = 1 << k;
			let mut targets: Vec<u32> = vec![0; vectors * states];
			let mut increments: Vec<u32> = vec![0; vectors * states];
			for (state, per_window) in transitions.iter().enumerate() {
				for (vector, next) in per_window[k].iter().enumerate() {
					if let Some((to, delta)) = next {
						targets[vector * states + state] = (to + 1) as u32;
						increments[vector * states + state] = *delta as u32;
					}
				}
			}
			to_states.push(PackedTable::pack(&targets));
			offset_increments.push(PackedTable::pack(&increments));
		}

		let min_errors: Vec<i64> = sets
			.iter()
			.map(|set| {
				set.iter()
					.filter(|p| !p.transposed)
					.map(|p| p.errors as i64 - p.offset as i64)
					.min()
					.unwrap_or(i64::MAX / 2)
			})
			.collect();

		debug!("generated parametric description for distance {n} (transpositions: {transpositions}) with {states} states");
		Self {
			max_distance: n,
			min_errors,
			to_states,
			offset_increments,
		}
	}
}

/// Successor of `set` when the next `k` characters of the word match the input
/// character exactly where `vector` has a bit set (most significant bit first).
fn step(set: &[Position], n: usize, transpositions: bool, k: usize, vector: u32) -> Option<(PositionSet, usize)> {
	let bit = |j: usize| (j < k) && ((vector >> (k - 1 - j)) & 1 == 1);
	let plain = |offset: usize, errors: usize| Position {
		offset,
		errors,
		transposed: false,
	};

	let mut next: Vec<Position> = Vec::new();
	for &Position {
		offset: i,
		errors: e,
		transposed,
	} in set
	{
		if transposed {
			if bit(i) {
				next.push(plain(i + 2, e));
			}
			continue;
		}
		if bit(i) {
			next.push(plain(i + 1, e));
		}
		if e == n {
			continue;
		}
		// substitution
		if i < k {
			next.push(plain(i + 1, e + 1));
		}
		// insertion
		next.push(plain(i, e + 1));
		// deletions followed by a match
		for d in 1..=(n - e) {
			if bit(i + d) {
				next.push(plain(i + d + 1, e + d));
			}
		}
		// deletions followed by the first half of a transposition
		if transpositions {
			for d in 0..(n - e) {
				if bit(i + d + 1) {
					next.push(Position {
						offset: i + d,
						errors: e + d + 1,
						transposed: true,
					});
				}
			}
		}
	}

	// Keep the fewest errors per position, then drop plain positions subsumed by another.
	next.sort_unstable_by_key(|p| (p.offset, p.transposed, p.errors));
	next.dedup_by(|later, earlier| (later.offset == earlier.offset) && (later.transposed == earlier.transposed));
	let subsumed = |p: &Position| {
		!p.transposed
			&& next.iter().any(|q| {
				!q.transposed && (q.errors < p.errors) && (q.offset.abs_diff(p.offset) <= p.errors - q.errors)
			})
	};
	let kept: Vec<Position> = next.iter().copied().filter(|p| !subsumed(p)).collect();

	let base: usize = kept.iter().map(|p| p.offset).min()?;
	let mut normalized: PositionSet = kept
		.into_iter()
		.map(|p| Position {
			offset: p.offset - base,
			..p
		})
		.collect();
	normalized.sort_unstable();
	Some((normalized, base))
}

/// A description applied to a word of length `w`.
///
/// Absolute states encode `state * (w + 1) + offset`, where `offset` is how many
/// characters of the word lie before the smallest position.
#[derive(Debug, Clone, Copy)]
pub struct ParametricTable {
	description: &'static ParametricDescription,
	w: usize,
}

impl ParametricTable {
	pub fn new(description: &'static ParametricDescription, w: usize) -> Self {
		Self { description, w }
	}

	/// Number of absolute states.
	pub fn size(&self) -> usize {
		self.description.num_states() * (self.w + 1)
	}

	pub fn is_accept(&self, abs_state: usize) -> bool {
		let state: usize = abs_state / (self.w + 1);
		let offset: usize = abs_state % (self.w + 1);
		(self.w - offset) as i64 + self.description.min_errors[state] <= self.description.max_distance as i64
	}

	pub fn position(&self, abs_state: usize) -> usize {
		abs_state % (self.w + 1)
	}

	/// Successor of `abs_state`, whose position is `position`, for the characteristic
	/// vector of the word characters from `position` on. `None` when no position survives.
	pub fn transition(&self, abs_state: usize, position: usize, vector: u32) -> Option<usize> {
		let state: usize = abs_state / (self.w + 1);
		let offset: usize = abs_state % (self.w + 1);
		debug_assert_eq!(offset, position);
		let k: usize = (self.w - position).min(self.description.window());
		let loc: usize = vector as usize * self.description.num_states() + state;
		match self.description.to_states[k].get(loc) {
			0 => None,
			to => {
				let increment: usize = self.description.offset_increments[k].get(loc) as usize;
				Some((to as usize - 1) * (self.w + 1) + offset + increment)
			},
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn packed_values_cross_word_boundaries() {
		let values: Vec<u32> = (0..200).map(|i| (i * 37) % 101).collect();
		let table: PackedTable = PackedTable::pack(&values);
		assert_eq!(table.bits, 7);
		for (index, &value) in values.iter().enumerate() {
			assert_eq!(table.get(index), value);
		}
		let zeros: PackedTable = PackedTable::pack(&[0, 0, 0]);
		assert_eq!(zeros.get(2), 0);
	}

	#[test]
	fn state_counts() {
		// The classic tables have 5 and 30 states.
		assert_eq!(ParametricDescription::get(1, false).unwrap().num_states(), 5);
		assert_eq!(ParametricDescription::get(2, false).unwrap().num_states(), 30);
		// Transposed position sets are kept apart even where they behave alike.
		assert_eq!(ParametricDescription::get(1, true).unwrap().num_states(), 7);
		assert_eq!(ParametricDescription::get(2, true).unwrap().num_states(), 82);
		assert!(ParametricDescription::get(3, false).is_none());
		assert!(ParametricDescription::get(0, true).is_none());
	}

	#[test]
	fn generated_once_per_process() {
		let handles: Vec<std::thread::JoinHandle<usize>> = (0..4)
			.map(|_| {
				std::thread::spawn(|| {
					let description: &'static ParametricDescription = ParametricDescription::get(2, true).unwrap();
					description as *const ParametricDescription as usize
				})
			})
			.collect();
		let local: &'static ParametricDescription = ParametricDescription::get(2, true).unwrap();
		for handle in handles {
			assert_eq!(handle.join().unwrap(), local as *const ParametricDescription as usize);
		}
		assert!(std::ptr::eq(
			ParametricDescription::get(1, false).unwrap(),
			ParametricDescription::get(1, false).unwrap()
		));
	}

	#[test]
	fn absolute_states() {
		let table: ParametricTable = ParametricTable::new(ParametricDescription::get(1, false).unwrap(), 3);
		assert_eq!(table.size(), 5 * 4);
		// Initial state: nothing consumed, the whole word still ahead.
		assert!(!table.is_accept(0));
		assert_eq!(table.position(0), 0);
		// Matching the first character of the word moves the offset.
		let next: usize = table.transition(0, 0, 0b100).unwrap();
		assert_eq!(table.position(next), 1);
		assert_eq!(next / 4, 0);
		// One character missing at the end is within distance 1.
		let after_two: usize = table.transition(next, 1, 0b10).unwrap();
		assert!(table.is_accept(after_two));
		// Two unrelated characters exceed the distance.
		let miss: usize = table.transition(0, 0, 0b000).unwrap();
		assert_eq!(table.transition(miss, table.position(miss), 0b000), None);
	}

	#[test]
	fn steps() {
		let initial: PositionSet = vec![Position {
			offset: 0,
			errors: 0,
			transposed: false,
		}];
		// Match: a single position one character further, relative to itself.
		let (set, delta) = step(&initial, 1, false, 3, 0b100).unwrap();
		assert_eq!(delta, 1);
		assert_eq!(set, initial);
		// Mismatch with the second character matching: substitution, insertion, and deletion.
		let (set, delta) = step(&initial, 1, true, 3, 0b010).unwrap();
		assert_eq!(delta, 0);
		let offsets: Vec<(usize, usize, bool)> = set.iter().map(|p| (p.offset, p.errors, p.transposed)).collect();
		assert_eq!(offsets, vec![(0, 1, false), (0, 1, true), (1, 1, false), (2, 1, false)]);
		// Nothing survives once the errors are spent.
		let spent: PositionSet = vec![Position {
			offset: 0,
			errors: 1,
			transposed: false,
		}];
		assert_eq!(step(&spent, 1, false, 3, 0b000), None);
	}
}
