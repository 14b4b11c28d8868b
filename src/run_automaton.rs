//! Table-driven deterministic automata for fast matching.
//!
//! The label space is split into classes at the start points of the automaton;
//! the transition table has one row per state and one column per class.

use crate::automaton::Automaton;
use crate::automaton::MAX_CODE_POINT;
use crate::automaton::StateId;
use crate::automaton::append_label;
use crate::operations::determinize;
use crate::utf32_to_utf8;

const NO_TRANSITION: u32 = u32::MAX;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RunAutomaton {
	max_interval: u32,
	accept: Vec<bool>,
	initial: usize,
	/// `transitions[state * points.len() + class]`, or [`NO_TRANSITION`].
	transitions: Vec<u32>,
	/// Sorted start points of the label classes.
	points: Vec<u32>,
	/// Class of every label up to `max_interval`, when tableized.
	classmap: Option<Vec<u32>>,
}

impl RunAutomaton {
	/// Determinizes and numbers `a` in place; state `n` of the result is state `n` of `a`.
	pub fn new(a: &mut Automaton, max_interval: u32, tableize: bool) -> Self {
		determinize(a);
		a.number_states();
		let points: Vec<u32> = a.start_points();
		let size: usize = a.arena_len();

		let mut accept: Vec<bool> = vec![false; size];
		let mut transitions: Vec<u32> = vec![NO_TRANSITION; size * points.len()];
		for n in 0..size {
			let s: StateId = StateId::new(n);
			accept[n] = a[s].is_accept();
			for (class, &point) in points.iter().enumerate() {
				if let Some(q) = a.step(s, point) {
					transitions[n * points.len() + class] = q.index() as u32;
				}
			}
		}

		let classmap: Option<Vec<u32>> = tableize.then(|| {
			let mut classmap: Vec<u32> = Vec::with_capacity(max_interval as usize + 1);
			let mut i: usize = 0;
			for label in 0..=max_interval {
				if (i + 1 < points.len()) && (label == points[i + 1]) {
					i += 1;
				}
				classmap.push(i as u32);
			}
			classmap
		});

		Self {
			max_interval,
			accept,
			initial: a.initial().index(),
			transitions,
			points,
			classmap,
		}
	}

	/// Number of states.
	pub fn size(&self) -> usize {
		self.accept.len()
	}

	pub fn is_accept(&self, state: usize) -> bool {
		self.accept[state]
	}

	pub fn initial_state(&self) -> usize {
		self.initial
	}

	/// Sorted start points of the label classes.
	pub fn char_intervals(&self) -> &[u32] {
		&self.points
	}

	fn char_class(&self, label: u32) -> usize {
		if let Some(class) = self.classmap.as_ref().and_then(|classmap| classmap.get(label as usize)) {
			return *class as usize;
		}
		self.points.partition_point(|&point| point <= label).saturating_sub(1)
	}

	/// Destination of `state` on `label`, if any.
	pub fn step(&self, state: usize, label: u32) -> Option<usize> {
		match self.transitions[state * self.points.len() + self.char_class(label)] {
			NO_TRANSITION => None,
			q => Some(q as usize),
		}
	}
}

impl std::fmt::Display for RunAutomaton {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(fmt, "initial state: {}", self.initial)?;
		for state in 0..self.size() {
			let verdict: &str = if self.accept[state] { "accept" } else { "reject" };
			writeln!(fmt, "state {state} [{verdict}]:")?;
			for (class, &min) in self.points.iter().enumerate() {
				let Some(to) = self.step(state, min) else {
					continue;
				};
				let max: u32 = match self.points.get(class + 1) {
					Some(next) => next - 1,
					None => self.max_interval,
				};
				let mut label: String = String::new();
				append_label(&mut label, min);
				if min != max {
					label.push('-');
					append_label(&mut label, max);
				}
				writeln!(fmt, " {label} -> {to}")?;
			}
		}
		Ok(())
	}
}

/// Runs over UTF-8 bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ByteRunAutomaton(RunAutomaton);

impl ByteRunAutomaton {
	/// Converts the code point labeled `a` to UTF-8 first.
	pub fn new(a: &Automaton) -> Self {
		let mut utf8: Automaton = utf32_to_utf8::convert(a);
		Self::from_utf8(&mut utf8)
	}

	/// `a` is already byte labeled; it is determinized and numbered in place.
	pub fn from_utf8(a: &mut Automaton) -> Self {
		Self(RunAutomaton::new(a, 255, true))
	}

	pub fn run(&self, input: &[u8]) -> bool {
		let mut p: usize = self.initial_state();
		for &byte in input {
			match self.step(p, u32::from(byte)) {
				Some(q) => p = q,
				None => return false,
			}
		}
		self.is_accept(p)
	}
}

impl std::ops::Deref for ByteRunAutomaton {
	type Target = RunAutomaton;

	fn deref(&self) -> &RunAutomaton {
		&self.0
	}
}

/// Runs over code points.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CharacterRunAutomaton(RunAutomaton);

impl CharacterRunAutomaton {
	pub fn new(a: &Automaton) -> Self {
		let mut a: Automaton = a.clone();
		Self(RunAutomaton::new(&mut a, MAX_CODE_POINT, false))
	}

	pub fn run(&self, input: &str) -> bool {
		let mut p: usize = self.initial_state();
		for ch in input.chars() {
			match self.step(p, u32::from(ch)) {
				Some(q) => p = q,
				None => return false,
			}
		}
		self.is_accept(p)
	}
}

impl std::ops::Deref for CharacterRunAutomaton {
	type Target = RunAutomaton;

	fn deref(&self) -> &RunAutomaton {
		&self.0
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::basic_automata::make_char;
	use crate::basic_automata::make_char_range;
	use crate::basic_automata::make_string;
	use crate::minimization::minimize;
	use crate::operations::concatenate;
	use crate::operations::optional;
	use crate::operations::repeat;
	use crate::operations::run;
	use crate::operations::union;

	/// `(ab|é)*c?`
	fn sample() -> Automaton {
		concatenate(repeat(union(make_string("ab"), make_char('é'))), optional(make_char('c')))
	}

	#[test]
	fn characters_match_like_the_graph() {
		let a: Automaton = sample();
		let r: CharacterRunAutomaton = CharacterRunAutomaton::new(&a);
		for input in ["", "ab", "abé", "ééabc", "c", "abab", "a", "cc", "éb", "ba", "abcab"] {
			assert_eq!(r.run(input), run(&a, input), "{input:?}");
		}
		assert!(r.run("éabc"));
		assert!(!r.run("abx"));
	}

	#[test]
	fn bytes_match_the_encoding() {
		let a: Automaton = sample();
		let r: ByteRunAutomaton = ByteRunAutomaton::new(&a);
		for input in ["", "ab", "abé", "ééabc", "c", "abab", "a", "cc", "éb", "ba", "abcab"] {
			assert_eq!(r.run(input.as_bytes()), run(&a, input), "{input:?}");
		}
		// Half of "é"
		assert!(!r.run(&[0xC3]));
		assert!(!r.run(&[0xFF]));
	}

	#[test]
	fn classes_and_steps() {
		let mut a: Automaton = repeat(make_char_range('b' as u32, 'd' as u32));
		minimize(&mut a);
		let r: RunAutomaton = RunAutomaton::new(&mut a, MAX_CODE_POINT, false);
		assert!(a.is_deterministic());
		assert_eq!(r.char_intervals(), &[0, 'b' as u32, 'e' as u32]);
		assert_eq!(r.size(), 1);
		assert!(r.is_accept(r.initial_state()));
		assert_eq!(r.step(0, 'c' as u32), Some(0));
		assert_eq!(r.step(0, 'a' as u32), None);
		assert_eq!(r.step(0, MAX_CODE_POINT), None);
		assert_eq!(r.to_string(), "initial state: 0\nstate 0 [accept]:\n b-d -> 0\n");
	}

	#[test]
	fn tableized_classes_match_search() {
		let a: Automaton = sample();
		let mut utf8: Automaton = utf32_to_utf8::convert(&a);
		let tableized: RunAutomaton = RunAutomaton::new(&mut utf8.clone(), 255, true);
		let searched: RunAutomaton = RunAutomaton::new(&mut utf8, 255, false);
		for state in 0..tableized.size() {
			for byte in 0..=255 {
				assert_eq!(tableized.step(state, byte), searched.step(state, byte));
			}
		}
	}
}
