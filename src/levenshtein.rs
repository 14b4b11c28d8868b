//! Deterministic automata accepting every string within a small edit distance of a word.

use std::collections::BTreeSet;

use crate::automaton::Automaton;
use crate::automaton::MAX_CODE_POINT;
use crate::automaton::StateId;
use crate::basic_automata::make_code_points;
use crate::parametric::ParametricDescription;
use crate::parametric::ParametricTable;

/// Largest distance with a parametric description.
pub const MAXIMUM_SUPPORTED_DISTANCE: usize = 2;

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum LevenshteinError {
	#[error("symbol {symbol:#x} in the word exceeds the alphabet maximum {alpha_max:#x}")]
	AlphabetOverflow { symbol: u32, alpha_max: u32 },
	#[error("alphabet maximum {alpha_max:#x} is beyond the last code point")]
	AlphabetTooLarge { alpha_max: u32 },
}

#[derive(Debug, Clone)]
pub struct LevenshteinAutomata {
	word: Vec<u32>,
	/// Distinct symbols of the word, sorted.
	alphabet: Vec<u32>,
	/// Maximal label ranges up to the alphabet maximum that contain no symbol of the word.
	ranges: Vec<(u32, u32)>,
	with_transpositions: bool,
}

impl LevenshteinAutomata {
	/// Automata for `word` over all code points. With transpositions, swapping two
	/// adjacent characters counts as one edit.
	pub fn new(word: &str, with_transpositions: bool) -> Self {
		let word: Vec<u32> = word.chars().map(u32::from).collect();
		Self::unchecked(word, MAX_CODE_POINT, with_transpositions)
	}

	/// Automata for `word` over labels `0..=alpha_max`, where `alpha_max` is at most [`MAX_CODE_POINT`].
	pub fn with_alpha_max(word: &[u32], alpha_max: u32, with_transpositions: bool) -> Result<Self, LevenshteinError> {
		if alpha_max > MAX_CODE_POINT {
			return Err(LevenshteinError::AlphabetTooLarge { alpha_max });
		}
		if let Some(&symbol) = word.iter().find(|&&symbol| symbol > alpha_max) {
			return Err(LevenshteinError::AlphabetOverflow { symbol, alpha_max });
		}
		Ok(Self::unchecked(word.to_vec(), alpha_max, with_transpositions))
	}

	fn unchecked(word: Vec<u32>, alpha_max: u32, with_transpositions: bool) -> Self {
		let alphabet: Vec<u32> = word.iter().copied().collect::<BTreeSet<u32>>().into_iter().collect();

		let mut ranges: Vec<(u32, u32)> = Vec::new();
		let mut lower: u32 = 0;
		for &symbol in alphabet.iter() {
			if symbol > lower {
				ranges.push((lower, symbol - 1));
			}
			lower = symbol + 1;
		}
		if lower <= alpha_max {
			ranges.push((lower, alpha_max));
		}

		Self {
			word,
			alphabet,
			ranges,
			with_transpositions,
		}
	}

	pub fn word(&self) -> &[u32] {
		&self.word
	}

	pub fn with_transpositions(&self) -> bool {
		self.with_transpositions
	}

	/// Deterministic automaton accepting the strings within distance `n` of the word;
	/// `None` if `n` exceeds [`MAXIMUM_SUPPORTED_DISTANCE`].
	pub fn to_automaton(&self, n: usize) -> Option<Automaton> {
		if n == 0 {
			return Some(make_code_points(&self.word));
		}
		let description: &'static ParametricDescription = ParametricDescription::get(n, self.with_transpositions)?;
		let table: ParametricTable = ParametricTable::new(description, self.word.len());
		let range: usize = 2 * n + 1;

		let mut a: Automaton = Automaton::new();
		let mut states: Vec<StateId> = Vec::with_capacity(table.size());
		states.push(a.initial());
		while states.len() < table.size() {
			states.push(a.new_state());
		}
		for (abs_state, &s) in states.iter().enumerate() {
			a.set_accept(s, table.is_accept(abs_state));
		}

		for (abs_state, &s) in states.iter().enumerate() {
			let position: usize = table.position(abs_state);
			let end: usize = position + (self.word.len() - position).min(range);
			for &symbol in self.alphabet.iter() {
				let vector: u32 = self.characteristic_vector(symbol, position, end);
				if let Some(dest) = table.transition(abs_state, position, vector) {
					a.add_transition(s, symbol, symbol, states[dest]);
				}
			}
			// Symbols outside the word never match, so their vector is zero.
			if let Some(dest) = table.transition(abs_state, position, 0) {
				for &(min, max) in self.ranges.iter() {
					a.add_transition(s, min, max, states[dest]);
				}
			}
		}

		a.set_deterministic(true);
		a.reduce();
		// Drops the absolute states this word never reaches.
		a.number_states();
		trace!("levenshtein automaton for distance {n} has {} states", a.num_states());
		Some(a)
	}

	/// Bit `j` (most significant first) is set if the word has `symbol` at `start + j`.
	fn characteristic_vector(&self, symbol: u32, start: usize, end: usize) -> u32 {
		self.word[start..end]
			.iter()
			.fold(0, |vector, &c| (vector << 1) | u32::from(c == symbol))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::operations::run;
	use crate::operations::run_code_points;

	fn edit_distance(a: &[char], b: &[char], transpositions: bool) -> usize {
		let mut d: Vec<Vec<usize>> = vec![vec![0; b.len() + 1]; a.len() + 1];
		for (i, row) in d.iter_mut().enumerate() {
			row[0] = i;
		}
		for j in 0..=b.len() {
			d[0][j] = j;
		}
		for i in 1..=a.len() {
			for j in 1..=b.len() {
				let cost: usize = usize::from(a[i - 1] != b[j - 1]);
				d[i][j] = (d[i - 1][j] + 1).min(d[i][j - 1] + 1).min(d[i - 1][j - 1] + cost);
				if transpositions && (i > 1) && (j > 1) && (a[i - 1] == b[j - 2]) && (a[i - 2] == b[j - 1]) {
					d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
				}
			}
		}
		d[a.len()][b.len()]
	}

	fn strings(alphabet: &[char], max_len: usize) -> Vec<Vec<char>> {
		let mut strings: Vec<Vec<char>> = vec![Vec::new()];
		let mut start: usize = 0;
		for _ in 0..max_len {
			let end: usize = strings.len();
			for i in start..end {
				for &ch in alphabet {
					let mut string: Vec<char> = strings[i].clone();
					string.push(ch);
					strings.push(string);
				}
			}
			start = end;
		}
		strings
	}

	#[test]
	fn matches_edit_distance() {
		let words: Vec<Vec<char>> = strings(&['a', 'b', 'c'], 4);
		let inputs: Vec<Vec<char>> = strings(&['a', 'b', 'x'], 5);
		for transpositions in [false, true] {
			for word in words.iter() {
				let word_string: String = word.iter().collect();
				let builder: LevenshteinAutomata = LevenshteinAutomata::new(&word_string, transpositions);
				for n in 0..=MAXIMUM_SUPPORTED_DISTANCE {
					let a: Automaton = builder.to_automaton(n).unwrap();
					assert!(a.is_deterministic());
					for input in inputs.iter() {
						let expected: bool = edit_distance(word, input, transpositions) <= n;
						let labels = input.iter().map(|&ch| u32::from(ch));
						assert_eq!(
							run_code_points(&a, labels),
							expected,
							"{word_string:?} vs {input:?}, n = {n}, transpositions = {transpositions}"
						);
					}
				}
			}
		}
	}

	#[test]
	fn long_words_match_edit_distance() {
		// Longer than the window of 2n + 1 characters, so the vectors near the end are cut short.
		let inputs: Vec<Vec<char>> = strings(&['a', 'b', 'c'], 8);
		for word in ["abcabca", "abacaba", "aabbcca", "cbacbac", "aaaaaab", "abcbcba"] {
			let word_chars: Vec<char> = word.chars().collect();
			for transpositions in [false, true] {
				let builder: LevenshteinAutomata = LevenshteinAutomata::new(word, transpositions);
				for n in 1..=MAXIMUM_SUPPORTED_DISTANCE {
					let a: Automaton = builder.to_automaton(n).unwrap();
					for input in inputs.iter() {
						let expected: bool = edit_distance(&word_chars, input, transpositions) <= n;
						let labels = input.iter().map(|&ch| u32::from(ch));
						assert_eq!(
							run_code_points(&a, labels),
							expected,
							"{word:?} vs {input:?}, n = {n}, transpositions = {transpositions}"
						);
					}
				}
			}
		}
	}

	#[test]
	fn food() {
		let a: Automaton = LevenshteinAutomata::new("food", false).to_automaton(1).unwrap();
		for accepted in ["food", "fod", "foo", "good", "fxod", "foods", "ffood", "fo0d"] {
			assert!(run(&a, accepted), "{accepted:?}");
		}
		for rejected in ["fodder", "fo", "doof", "ofod", ""] {
			assert!(!run(&a, rejected), "{rejected:?}");
		}

		// A swap is one edit only with transpositions.
		let plain: Automaton = LevenshteinAutomata::new("food", false).to_automaton(1).unwrap();
		let swapped: Automaton = LevenshteinAutomata::new("food", true).to_automaton(1).unwrap();
		assert!(!run(&plain, "ofod"));
		assert!(run(&swapped, "ofod"));
		assert!(run(&swapped, "fodo"));
	}

	#[test]
	fn wide_characters() {
		let a: Automaton = LevenshteinAutomata::new("日本語", true).to_automaton(2).unwrap();
		assert!(run(&a, "日本語"));
		assert!(run(&a, "本日語"));
		assert!(run(&a, "日本"));
		assert!(run(&a, "日x語y"));
		assert!(!run(&a, "x"));
		assert!(run(&a, "\u{10FFFF}本語"));
	}

	#[test]
	fn unsupported_and_exact() {
		let builder: LevenshteinAutomata = LevenshteinAutomata::new("abc", false);
		assert!(builder.to_automaton(3).is_none());
		let exact: Automaton = builder.to_automaton(0).unwrap();
		assert!(run(&exact, "abc"));
		assert!(!run(&exact, "abd"));

		let empty: Automaton = LevenshteinAutomata::new("", true).to_automaton(2).unwrap();
		assert!(run(&empty, ""));
		assert!(run(&empty, "zz"));
		assert!(!run(&empty, "zzz"));
	}

	#[test]
	fn alphabet_limits() {
		assert_eq!(
			LevenshteinAutomata::with_alpha_max(&[1, 300, 2], 255, false).unwrap_err(),
			LevenshteinError::AlphabetOverflow {
				symbol: 300,
				alpha_max: 255
			}
		);
		let builder: LevenshteinAutomata = LevenshteinAutomata::with_alpha_max(&[3, 1, 3], 5, false).unwrap();
		assert_eq!(builder.alphabet, vec![1, 3]);
		assert_eq!(builder.ranges, vec![(0, 0), (2, 2), (4, 5)]);
		let a: Automaton = builder.to_automaton(1).unwrap();
		assert!(run_code_points(&a, [3, 1, 3]));
		assert!(run_code_points(&a, [3, 5, 3]));
		// Beyond the alphabet maximum nothing matches.
		assert!(!run_code_points(&a, [3, 6, 3]));

		assert_eq!(
			LevenshteinAutomata::with_alpha_max(&[u32::MAX], u32::MAX, false).unwrap_err(),
			LevenshteinError::AlphabetTooLarge { alpha_max: u32::MAX }
		);
		let widest: LevenshteinAutomata =
			LevenshteinAutomata::with_alpha_max(&[MAX_CODE_POINT, 0], MAX_CODE_POINT, true).unwrap();
		assert_eq!(widest.ranges, vec![(1, MAX_CODE_POINT - 1)]);
		let a: Automaton = widest.to_automaton(1).unwrap();
		assert!(run_code_points(&a, [MAX_CODE_POINT, 0]));
		assert!(run_code_points(&a, [0, MAX_CODE_POINT]));
		assert!(run_code_points(&a, [MAX_CODE_POINT, 7]));
		assert!(!run_code_points(&a, [7, 7]));
	}
}
