//! Construction of basic automata.

use crate::automaton::Automaton;
use crate::automaton::AutomatonError;
use crate::automaton::MAX_CODE_POINT;
use crate::automaton::MIN_CODE_POINT;
use crate::automaton::StateId;
use crate::daciuk_mihov::BuildError;
use crate::daciuk_mihov::DaciukMihovBuilder;
use crate::operations::add_epsilons;

/// Accepts no strings.
pub fn make_empty() -> Automaton {
	Automaton::new()
}

/// Accepts only the empty string.
pub fn make_empty_string() -> Automaton {
	Automaton::from_singleton(String::new())
}

/// Accepts every string.
pub fn make_any_string() -> Automaton {
	let mut a: Automaton = Automaton::new();
	let s: StateId = a.initial();
	a.set_accept(s, true);
	a.add_transition(s, MIN_CODE_POINT, MAX_CODE_POINT, s);
	a
}

/// Accepts any single code point.
pub fn make_any_char() -> Automaton {
	make_char_range(MIN_CODE_POINT, MAX_CODE_POINT)
}

pub fn make_char(ch: char) -> Automaton {
	Automaton::from_singleton(ch.to_string())
}

/// Accepts a single code point in `[min, max]`; empty if `min > max`.
pub fn make_char_range(min: u32, max: u32) -> Automaton {
	if min == max {
		if let Some(ch) = char::from_u32(min) {
			return make_char(ch);
		}
	}
	let mut a: Automaton = Automaton::new();
	if min > max {
		return a;
	}
	let s1: StateId = a.initial();
	let s2: StateId = a.new_state();
	a.set_accept(s2, true);
	a.add_transition(s1, min, max, s2);
	a
}

pub fn make_string(string: &str) -> Automaton {
	Automaton::from_singleton(string.to_owned())
}

/// Expanded automaton accepting exactly the given code point sequence.
pub fn make_code_points(word: &[u32]) -> Automaton {
	let mut a: Automaton = Automaton::new();
	let mut p: StateId = a.initial();
	for &label in word {
		let q: StateId = a.new_state();
		a.add_transition(p, label, label, q);
		p = q;
	}
	a.set_accept(p, true);
	a
}

/// Accepts the decimal numbers in `[min, max]`.
///
/// If `digits > 0`, numbers are written with exactly that many digits (padded with zeros);
/// otherwise any number of leading zeros is accepted.
pub fn make_interval(min: u32, max: u32, digits: usize) -> Result<Automaton, AutomatonError> {
	let x: String = min.to_string();
	let y: String = max.to_string();
	if (min > max) || ((digits > 0) && (y.len() > digits)) {
		return Err(AutomatonError::InvalidNumericInterval { min, max, digits });
	}
	let width: usize = if digits > 0 { digits } else { y.len() };
	let x: Vec<u8> = format!("{x:0>width$}").into_bytes();
	let y: Vec<u8> = format!("{y:0>width$}").into_bytes();

	let mut builder: IntervalBuilder = IntervalBuilder {
		a: Automaton::new(),
		initials: Vec::new(),
	};
	let initial: StateId = builder.between(&x, &y, 0, digits == 0);
	let mut a: Automaton = builder.a;
	a.set_initial(initial);
	if digits == 0 {
		let pairs: Vec<(StateId, StateId)> = builder
			.initials
			.into_iter()
			.filter(|&p| p != initial)
			.map(|p| (initial, p))
			.collect();
		add_epsilons(&mut a, &pairs);
		a.add_transition(initial, u32::from(b'0'), u32::from(b'0'), initial);
		a.set_deterministic(false);
	} else {
		a.set_deterministic(true);
	}
	a.remove_dead_transitions();
	Ok(a)
}

/// Accepts exactly the given strings, which must be sorted.
pub fn make_string_union<S: AsRef<str>>(strings: &[S]) -> Result<Automaton, BuildError> {
	if strings.is_empty() {
		return Ok(make_empty());
	}
	DaciukMihovBuilder::build(strings.iter().map(AsRef::as_ref))
}

struct IntervalBuilder {
	a: Automaton,
	/// States reachable from the initial state by reading only zeros.
	initials: Vec<StateId>,
}

impl IntervalBuilder {
	fn digit(label: u8) -> u32 {
		u32::from(label)
	}

	fn any_of_right_length(&mut self, x: &[u8], n: usize) -> StateId {
		let s: StateId = self.a.new_state();
		if x.len() == n {
			self.a.set_accept(s, true);
		} else {
			let next: StateId = self.any_of_right_length(x, n + 1);
			self.a.add_transition(s, Self::digit(b'0'), Self::digit(b'9'), next);
		}
		s
	}

	fn at_least(&mut self, x: &[u8], n: usize, zeros: bool) -> StateId {
		let s: StateId = self.a.new_state();
		if x.len() == n {
			self.a.set_accept(s, true);
		} else {
			if zeros {
				self.initials.push(s);
			}
			let c: u8 = x[n];
			let next: StateId = self.at_least(x, n + 1, zeros && (c == b'0'));
			self.a.add_transition(s, Self::digit(c), Self::digit(c), next);
			if c < b'9' {
				let any: StateId = self.any_of_right_length(x, n + 1);
				self.a.add_transition(s, Self::digit(c + 1), Self::digit(b'9'), any);
			}
		}
		s
	}

	fn at_most(&mut self, x: &[u8], n: usize) -> StateId {
		let s: StateId = self.a.new_state();
		if x.len() == n {
			self.a.set_accept(s, true);
		} else {
			let c: u8 = x[n];
			let next: StateId = self.at_most(x, n + 1);
			self.a.add_transition(s, Self::digit(c), Self::digit(c), next);
			if c > b'0' {
				let any: StateId = self.any_of_right_length(x, n + 1);
				self.a.add_transition(s, Self::digit(b'0'), Self::digit(c - 1), any);
			}
		}
		s
	}

	fn between(&mut self, x: &[u8], y: &[u8], n: usize, zeros: bool) -> StateId {
		let s: StateId = self.a.new_state();
		if x.len() == n {
			self.a.set_accept(s, true);
		} else {
			if zeros {
				self.initials.push(s);
			}
			let cx: u8 = x[n];
			let cy: u8 = y[n];
			if cx == cy {
				let next: StateId = self.between(x, y, n + 1, zeros && (cx == b'0'));
				self.a.add_transition(s, Self::digit(cx), Self::digit(cx), next);
			} else {
				let low: StateId = self.at_least(x, n + 1, zeros && (cx == b'0'));
				self.a.add_transition(s, Self::digit(cx), Self::digit(cx), low);
				let high: StateId = self.at_most(y, n + 1);
				self.a.add_transition(s, Self::digit(cy), Self::digit(cy), high);
				if cx + 1 < cy {
					let any: StateId = self.any_of_right_length(x, n + 1);
					self.a.add_transition(s, Self::digit(cx + 1), Self::digit(cy - 1), any);
				}
			}
		}
		s
	}
}
