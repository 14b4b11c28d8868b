//! Structural queries and transformations that do not fit the set algebra.

use std::collections::BTreeSet;

use hashbrown::HashSet;

use crate::automaton::Automaton;
use crate::automaton::State;
use crate::automaton::StateId;
use crate::automaton::Transition;
use crate::operations::determinize;

/// Whether the language of `a` is finite, i.e. no cycle is reachable.
pub fn is_finite(a: &Automaton) -> bool {
	if a.is_singleton() {
		return true;
	}
	let mut on_path: Vec<bool> = vec![false; a.arena_len()];
	let mut finished: Vec<bool> = vec![false; a.arena_len()];
	// (state, index of the next transition to follow)
	let mut stack: Vec<(StateId, usize)> = vec![(a.initial(), 0)];
	on_path[a.initial().index()] = true;
	while let Some((s, next)) = stack.last_mut() {
		let Some(t) = a[*s].transitions().get(*next) else {
			on_path[s.index()] = false;
			finished[s.index()] = true;
			stack.pop();
			continue;
		};
		*next += 1;
		let to: StateId = t.to;
		if on_path[to.index()] {
			return false;
		}
		if !finished[to.index()] {
			on_path[to.index()] = true;
			stack.push((to, 0));
		}
	}
	true
}

/// Labels of the longest chain of single-label transitions from the initial state
/// through non-accepting states, i.e. a prefix shared by every accepted string.
fn common_prefix_labels(a: &Automaton) -> Vec<u32> {
	let mut labels: Vec<u32> = Vec::new();
	let mut visited: HashSet<StateId> = HashSet::new();
	let mut s: StateId = a.initial();
	loop {
		visited.insert(s);
		let state: &State = &a[s];
		match state.transitions() {
			[t] if !state.is_accept() && (t.min == t.max) && !visited.contains(&t.to) => {
				labels.push(t.min);
				s = t.to;
			},
			_ => return labels,
		}
	}
}

/// Longest string that is a prefix of every accepted string.
/// Only exact for deterministic automata. Stops before the first label that is not a `char`.
pub fn common_prefix(a: &Automaton) -> String {
	if let Some(string) = a.singleton() {
		return string.to_owned();
	}
	common_prefix_labels(a).into_iter().map_while(char::from_u32).collect()
}

/// Like [`common_prefix`] for a byte-labeled automaton.
pub fn common_prefix_bytes(a: &Automaton) -> Vec<u8> {
	if let Some(string) = a.singleton() {
		return string.as_bytes().to_vec();
	}
	common_prefix_labels(a).into_iter().map(|label| label as u8).collect()
}

/// Longest string that is a suffix of every accepted string.
/// Stops after the last label that is not a `char`.
pub fn common_suffix(a: &Automaton) -> String {
	if let Some(string) = a.singleton() {
		return string.to_owned();
	}
	let mut r: Automaton = a.clone();
	reverse(&mut r);
	determinize(&mut r);
	// Labels come last character first.
	let mut suffix: Vec<char> = common_prefix_labels(&r).into_iter().map_while(char::from_u32).collect();
	suffix.reverse();
	suffix.into_iter().collect()
}

/// Like [`common_suffix`] for a byte-labeled automaton.
pub fn common_suffix_bytes(a: &Automaton) -> Vec<u8> {
	if let Some(string) = a.singleton() {
		return string.as_bytes().to_vec();
	}
	let mut r: Automaton = a.clone();
	reverse(&mut r);
	determinize(&mut r);
	let mut bytes: Vec<u8> = common_prefix_bytes(&r);
	bytes.reverse();
	bytes
}

/// Reverses the language of `a` in place; the result is nondeterministic.
/// Returns the states that were accepting before, which the new initial state links to.
pub fn reverse(a: &mut Automaton) -> Vec<StateId> {
	a.expand_singleton();
	let states: Vec<StateId> = a.reachable_states();
	let accept_states: Vec<StateId> = a.accept_states();

	let mut reversed: Vec<Vec<Transition>> = vec![Vec::new(); a.arena_len()];
	for &s in states.iter() {
		for t in a[s].transitions() {
			reversed[t.to.index()].push(Transition::new(t.min, t.max, s));
		}
	}
	for &s in states.iter() {
		let state: &mut State = a.state_mut(s);
		state.accept = false;
		state.transitions = std::mem::take(&mut reversed[s.index()]);
	}
	let old_initial: StateId = a.initial();
	a.set_accept(old_initial, true);

	let initial: StateId = a.new_state();
	for &s in accept_states.iter() {
		a.add_epsilon(initial, s);
	}
	a.set_initial(initial);
	a.set_deterministic(false);
	accept_states
}

/// Every accepted string, sorted, if the language is finite and has at most `limit` strings;
/// `None` otherwise. Includes the empty string when the initial state accepts.
pub fn finite_strings(a: &Automaton, limit: Option<usize>) -> Option<Vec<Vec<u32>>> {
	let exceeds = |count: usize| limit.is_some_and(|limit| count > limit);
	if let Some(string) = a.singleton() {
		if exceeds(1) {
			return None;
		}
		return Some(vec![string.chars().map(u32::from).collect()]);
	}

	let mut strings: BTreeSet<Vec<u32>> = BTreeSet::new();
	if a[a.initial()].is_accept() {
		strings.insert(Vec::new());
		if exceeds(1) {
			return None;
		}
	}
	let mut on_path: Vec<bool> = vec![false; a.arena_len()];
	on_path[a.initial().index()] = true;
	let mut path: Vec<u32> = Vec::new();
	// (state, index of the current transition, next label within it)
	let mut stack: Vec<(StateId, usize, Option<u32>)> = vec![(a.initial(), 0, None)];
	while let Some((s, transition, next)) = stack.last_mut() {
		let Some(t) = a[*s].transitions().get(*transition) else {
			on_path[s.index()] = false;
			stack.pop();
			path.pop();
			continue;
		};
		if on_path[t.to.index()] {
			return None;
		}
		let label: u32 = next.unwrap_or(t.min);
		if label == t.max {
			*transition += 1;
			*next = None;
		} else {
			*next = Some(label + 1);
		}
		path.push(label);
		if a[t.to].is_accept() {
			strings.insert(path.clone());
			if exceeds(strings.len()) {
				return None;
			}
		}
		on_path[t.to.index()] = true;
		stack.push((t.to, 0, None));
	}
	Some(strings.into_iter().collect())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::automaton::AutomatonBuilder;
	use crate::basic_automata::make_char;
	use crate::basic_automata::make_char_range;
	use crate::basic_automata::make_string;
	use crate::operations::concatenate;
	use crate::operations::optional;
	use crate::operations::repeat;
	use crate::operations::run;
	use crate::operations::union_all;

	fn labels(string: &str) -> Vec<u32> {
		string.chars().map(u32::from).collect()
	}

	#[test]
	fn finiteness() {
		assert!(is_finite(&make_string("abc")));
		assert!(is_finite(&union_all(vec![make_string("ab"), make_string("c")])));
		assert!(!is_finite(&repeat(make_char('a'))));
		assert!(!is_finite(&concatenate(make_string("x"), repeat(make_string("yz")))));
		// Shared but acyclic paths
		let diamond: Automaton = concatenate(union_all(vec![make_char('a'), make_char('b')]), optional(make_char('c')));
		assert!(is_finite(&diamond));
	}

	#[test]
	fn prefixes_and_suffixes() {
		let mut a: Automaton = union_all(vec![make_string("foobar"), make_string("foobaz"), make_string("fooxar")]);
		determinize(&mut a);
		assert_eq!(common_prefix(&a), "foo");
		assert_eq!(common_prefix_bytes(&a), b"foo");
		assert_eq!(common_suffix(&a), "");

		let mut a: Automaton = concatenate(repeat(make_char_range('a' as u32, 'c' as u32)), make_string("ing"));
		determinize(&mut a);
		assert_eq!(common_prefix(&a), "");
		assert_eq!(common_suffix(&a), "ing");
		assert_eq!(common_suffix_bytes(&a), b"ing");

		assert_eq!(common_prefix(&make_string("solo")), "solo");
		assert_eq!(common_suffix(&make_string("solo")), "solo");
	}

	#[test]
	fn prefixes_stop_at_surrogates() {
		let mut builder: AutomatonBuilder = AutomatonBuilder::new();
		let mut p: StateId = builder.initial();
		for label in ['a' as u32, 'b' as u32, 0xD800, 'c' as u32, 'd' as u32] {
			let q: StateId = builder.new_state();
			builder.add_transition(p, label, label, q).unwrap();
			p = q;
		}
		builder.set_accept(p, true);
		let a: Automaton = builder.finish_deterministic().unwrap();
		assert_eq!(common_prefix(&a), "ab");
		assert_eq!(common_suffix(&a), "cd");
	}

	#[test]
	fn reversal() {
		let mut a: Automaton = concatenate(make_string("ab"), repeat(make_char('c')));
		let former: Vec<StateId> = reverse(&mut a);
		assert!(!former.is_empty());
		assert!(run(&a, "ba"));
		assert!(run(&a, "cccba"));
		assert!(!run(&a, "ab"));
		assert!(!run(&a, "bac"));
	}

	#[test]
	fn enumerate_finite_language() {
		let a: Automaton = union_all(vec![
			make_string("b"),
			make_string(""),
			make_string("ab"),
			make_char_range('x' as u32, 'z' as u32),
		]);
		let strings: Vec<Vec<u32>> = finite_strings(&a, None).unwrap();
		let expected: Vec<Vec<u32>> = ["", "ab", "b", "x", "y", "z"].iter().map(|s| labels(s)).collect();
		assert_eq!(strings, expected);
		assert_eq!(finite_strings(&a, Some(6)).unwrap().len(), 6);
		assert!(finite_strings(&a, Some(5)).is_none());
		assert!(finite_strings(&repeat(make_char('a')), None).is_none());
		assert_eq!(finite_strings(&make_string("hi"), Some(1)), Some(vec![labels("hi")]));
		assert!(finite_strings(&make_string("hi"), Some(0)).is_none());
	}
}
