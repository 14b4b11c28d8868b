//! Set operations on automata.
//!
//! Combinators take their operands by value and reuse them destructively;
//! clone an operand first to keep it.

use std::collections::BTreeSet;
use std::collections::VecDeque;

use hashbrown::HashMap;
use hashbrown::HashSet;

use crate::automaton::Automaton;
use crate::automaton::Grafted;
use crate::automaton::MAX_CODE_POINT;
use crate::automaton::MIN_CODE_POINT;
use crate::automaton::StateId;
use crate::automaton::Transition;
use crate::basic_automata::make_empty;
use crate::basic_automata::make_empty_string;
use crate::basic_automata::make_string;
use crate::config::AutomatonConfig;
use crate::interval_tree::Interval;
use crate::interval_tree::IntervalTree;
use crate::minimization::minimize;

/// Accepts the concatenation of the languages of `a1` and `a2`.
pub fn concatenate(a1: Automaton, a2: Automaton) -> Automaton {
	if let (Some(s1), Some(s2)) = (a1.singleton(), a2.singleton()) {
		return make_string(&format!("{s1}{s2}"));
	}
	if is_empty(&a1) || is_empty(&a2) {
		return make_empty();
	}
	// Epsilon-linking a single string chain to a DFA yields a DFA.
	let deterministic: bool = a1.is_singleton() && a2.is_deterministic();
	let mut a1: Automaton = a1;
	let accept_states: Vec<StateId> = a1.accept_states();
	let second: Grafted = a1.graft(a2);
	for s in accept_states {
		a1.set_accept(s, false);
		a1.add_epsilon(s, second.initial);
	}
	a1.set_deterministic(deterministic);
	a1
}

/// Accepts the concatenation of the languages of all automata in order.
pub fn concatenate_all(automata: Vec<Automaton>) -> Automaton {
	if automata.is_empty() {
		return make_empty_string();
	}
	if automata.iter().all(Automaton::is_singleton) {
		let string: String = automata.iter().filter_map(Automaton::singleton).collect();
		return make_string(&string);
	}
	if automata.iter().any(is_empty) {
		return make_empty();
	}

	let mut operands = automata.into_iter();
	let Some(mut b) = operands.next() else {
		return make_empty_string();
	};
	let mut accept_states: Vec<StateId> = b.accept_states();
	for a in operands {
		if is_empty_string(&a) {
			continue;
		}
		let next: Grafted = b.graft(a);
		let mut next_accept_states: Vec<StateId> = next.accept_states;
		for s in accept_states {
			b.set_accept(s, false);
			b.add_epsilon(s, next.initial);
			if b[s].is_accept() {
				next_accept_states.push(s);
			}
		}
		accept_states = next_accept_states;
	}
	b.set_deterministic(false);
	b
}

/// Accepts the language of `a` plus the empty string.
pub fn optional(mut a: Automaton) -> Automaton {
	a.expand_singleton();
	let s: StateId = a.new_state();
	let initial: StateId = a.initial();
	a.add_epsilon(s, initial);
	a.set_accept(s, true);
	a.set_initial(s);
	a.set_deterministic(false);
	a
}

/// Kleene star.
pub fn repeat(mut a: Automaton) -> Automaton {
	a.expand_singleton();
	let accept_states: Vec<StateId> = a.accept_states();
	let s: StateId = a.new_state();
	a.set_accept(s, true);
	let initial: StateId = a.initial();
	a.add_epsilon(s, initial);
	for p in accept_states {
		a.add_epsilon(p, s);
	}
	a.set_initial(s);
	a.set_deterministic(false);
	a
}

/// At least `min` repetitions.
pub fn repeat_min(a: Automaton, min: usize) -> Automaton {
	if min == 0 {
		return repeat(a);
	}
	let mut operands: Vec<Automaton> = vec![a.clone(); min];
	operands.push(repeat(a));
	concatenate_all(operands)
}

/// Between `min` and `max` repetitions; empty if `max < min`.
pub fn repeat_range(mut a: Automaton, min: usize, max: usize) -> Automaton {
	if min > max {
		return make_empty();
	}
	let optional_count: usize = max - min;
	a.expand_singleton();
	let mut b: Automaton = match min {
		0 => make_empty_string(),
		1 => a.clone(),
		_ => concatenate_all(vec![a.clone(); min]),
	};
	if optional_count > 0 {
		// Chain of `optional_count` copies, each allowed to stop at any accepting state.
		let mut d: Automaton = a.clone();
		for _ in 1..optional_count {
			let mut c: Automaton = a.clone();
			let accept_states: Vec<StateId> = c.accept_states();
			let rest: Grafted = c.graft(d);
			for p in accept_states {
				c.add_epsilon(p, rest.initial);
			}
			d = c;
		}
		let accept_states: Vec<StateId> = b.accept_states();
		let rest: Grafted = b.graft(d);
		for p in accept_states {
			b.add_epsilon(p, rest.initial);
		}
		b.set_deterministic(false);
	}
	b
}

/// Accepts every string not accepted by `a`.
pub fn complement(mut a: Automaton) -> Automaton {
	a.expand_singleton();
	determinize(&mut a);
	a.totalize();
	for s in a.reachable_states() {
		let accept: bool = a[s].is_accept();
		a.set_accept(s, !accept);
	}
	a.remove_dead_transitions();
	a
}

/// Accepts the strings of `a1` not accepted by `a2`.
pub fn minus(a1: Automaton, a2: Automaton) -> Automaton {
	if is_empty(&a1) {
		return make_empty();
	}
	if is_empty(&a2) {
		return a1;
	}
	if let Some(string) = a1.singleton() {
		return if run(&a2, string) { make_empty() } else { a1 };
	}
	intersection(a1, complement(a2))
}

/// Product construction over the reachable state pairs.
pub fn intersection(a1: Automaton, a2: Automaton) -> Automaton {
	if let Some(string) = a1.singleton() {
		return if run(&a2, string) { a1 } else { make_empty() };
	}
	if let Some(string) = a2.singleton() {
		return if run(&a1, string) { a2 } else { make_empty() };
	}
	let transitions1: Vec<Vec<Transition>> = a1.sorted_transitions();
	let transitions2: Vec<Vec<Transition>> = a2.sorted_transitions();

	let mut c: Automaton = Automaton::new();
	let mut pairs: HashMap<(StateId, StateId), StateId> = HashMap::new();
	let mut worklist: VecDeque<(StateId, StateId, StateId)> = VecDeque::new();
	pairs.insert((a1.initial(), a2.initial()), c.initial());
	worklist.push_back((a1.initial(), a2.initial(), c.initial()));

	while let Some((s1, s2, s)) = worklist.pop_front() {
		c.set_accept(s, a1[s1].is_accept() && a2[s2].is_accept());
		let t1: &[Transition] = &transitions1[s1.index()];
		let t2: &[Transition] = &transitions2[s2.index()];
		let mut b2: usize = 0;
		for first in t1.iter() {
			while (b2 < t2.len()) && (t2[b2].max < first.min) {
				b2 += 1;
			}
			for second in t2[b2..].iter().take_while(|second| first.max >= second.min) {
				if second.max < first.min {
					continue;
				}
				let target: StateId = match pairs.get(&(first.to, second.to)) {
					Some(&target) => target,
					None => {
						let target: StateId = c.new_state();
						pairs.insert((first.to, second.to), target);
						worklist.push_back((first.to, second.to, target));
						target
					},
				};
				c.add_transition(s, first.min.max(second.min), first.max.min(second.max), target);
			}
		}
	}
	c.set_deterministic(a1.is_deterministic() && a2.is_deterministic());
	c.remove_dead_transitions();
	trace!("intersection has {} states", c.num_states());
	c
}

/// Whether both automata accept the same language. Determinizes both as a side effect.
pub fn same_language(a1: &mut Automaton, a2: &mut Automaton) -> bool {
	if let (Some(s1), Some(s2)) = (a1.singleton(), a2.singleton()) {
		return s1 == s2;
	}
	subset_of(a2, a1) && subset_of(a1, a2)
}

/// Whether the language of `a1` is a subset of the language of `a2`.
/// Determinizes `a2` as a side effect.
pub fn subset_of(a1: &Automaton, a2: &mut Automaton) -> bool {
	if let Some(s1) = a1.singleton() {
		return match a2.singleton() {
			Some(s2) => s1 == s2,
			None => run(a2, s1),
		};
	}
	determinize(a2);
	a2.expand_singleton();
	let transitions1: Vec<Vec<Transition>> = a1.sorted_transitions();
	let transitions2: Vec<Vec<Transition>> = a2.sorted_transitions();

	let mut visited: HashSet<(StateId, StateId)> = HashSet::new();
	let mut worklist: VecDeque<(StateId, StateId)> = VecDeque::new();
	visited.insert((a1.initial(), a2.initial()));
	worklist.push_back((a1.initial(), a2.initial()));

	while let Some((s1, s2)) = worklist.pop_front() {
		if a1[s1].is_accept() && !a2[s2].is_accept() {
			return false;
		}
		let t1: &[Transition] = &transitions1[s1.index()];
		let t2: &[Transition] = &transitions2[s2.index()];
		let mut b2: usize = 0;
		for first in t1.iter() {
			while (b2 < t2.len()) && (t2[b2].max < first.min) {
				b2 += 1;
			}
			// `[uncovered, first.max]` is the part of `first` not yet matched by `a2`;
			// `None` once everything up to the maximum code point is covered.
			let mut uncovered: Option<u32> = Some(first.min);
			for second in t2[b2..].iter().take_while(|second| first.max >= second.min) {
				let Some(min) = uncovered else {
					break;
				};
				if second.min > min {
					return false;
				}
				uncovered = if second.max < MAX_CODE_POINT {
					Some(second.max + 1)
				} else {
					None
				};
				let pair: (StateId, StateId) = (first.to, second.to);
				if visited.insert(pair) {
					worklist.push_back(pair);
				}
			}
			if uncovered.is_some_and(|min| min <= first.max) {
				return false;
			}
		}
	}
	true
}

/// Accepts the union of the languages of `a1` and `a2`.
pub fn union(a1: Automaton, a2: Automaton) -> Automaton {
	if let (Some(s1), Some(s2)) = (a1.singleton(), a2.singleton()) {
		if s1 == s2 {
			return a1;
		}
	}
	let mut a1: Automaton = a1;
	a1.expand_singleton();
	let first: StateId = a1.initial();
	let second: Grafted = a1.graft(a2);
	let s: StateId = a1.new_state();
	a1.add_epsilon(s, first);
	a1.add_epsilon(s, second.initial);
	a1.set_initial(s);
	a1.set_deterministic(false);
	a1
}

/// Accepts the union of the languages of all automata; empty operands are skipped.
pub fn union_all(automata: Vec<Automaton>) -> Automaton {
	let mut a: Automaton = Automaton::new();
	let s: StateId = a.initial();
	for b in automata {
		if is_empty(&b) {
			continue;
		}
		let grafted: Grafted = a.graft(b);
		a.add_epsilon(s, grafted.initial);
	}
	a.set_deterministic(false);
	a
}

/// Subset construction. No-op for deterministic and singleton automata.
pub fn determinize(a: &mut Automaton) {
	if a.is_deterministic() || a.is_singleton() {
		return;
	}
	let before: usize = a.num_states();

	let mut result: Automaton = Automaton::new();
	let mut sets: HashMap<Vec<StateId>, StateId> = HashMap::new();
	let mut worklist: VecDeque<(Vec<StateId>, StateId)> = VecDeque::new();

	let initial_set: Vec<StateId> = vec![a.initial()];
	result.set_accept(result.initial(), a[a.initial()].is_accept());
	sets.insert(initial_set.clone(), result.initial());
	worklist.push_back((initial_set, result.initial()));

	while let Some((set, r)) = worklist.pop_front() {
		// Collate the outgoing transitions of the whole set into disjoint intervals.
		let mut collated: IntervalTree<BTreeSet<StateId>> = IntervalTree::new();
		for &s in set.iter() {
			for t in a[s].transitions() {
				collated.insert(Interval::new(t.min, t.max), BTreeSet::from([t.to]), |x, y| {
					x.union(y).copied().collect()
				});
			}
		}
		for (interval, targets) in collated.iter() {
			let key: Vec<StateId> = targets.iter().copied().collect();
			let q: StateId = match sets.get(&key) {
				Some(&q) => q,
				None => {
					let q: StateId = result.new_state();
					result.set_accept(q, key.iter().any(|&s| a[s].is_accept()));
					sets.insert(key.clone(), q);
					worklist.push_back((key, q));
					q
				},
			};
			result.add_transition(r, interval.start(), interval.end(), q);
		}
	}

	result.set_deterministic(true);
	result.reduce();
	result.number_states();
	debug!("determinized {before} states into {}", result.num_states());
	*a = result;
}

/// Adds the epsilon transitions `pairs` (`(from, to)`), closed transitively,
/// by copying transitions and acceptance along them.
pub fn add_epsilons(a: &mut Automaton, pairs: &[(StateId, StateId)]) {
	a.expand_singleton();
	let mut forward: HashMap<StateId, Vec<StateId>> = HashMap::new();
	for &(from, to) in pairs {
		forward.entry(from).or_default().push(to);
	}

	let mut closure: Vec<(StateId, StateId)> = Vec::new();
	for &from in forward.keys() {
		let mut seen: HashSet<StateId> = HashSet::new();
		let mut stack: Vec<StateId> = forward[&from].clone();
		while let Some(to) = stack.pop() {
			if !seen.insert(to) {
				continue;
			}
			closure.push((from, to));
			if let Some(next) = forward.get(&to) {
				stack.extend(next.iter().copied());
			}
		}
	}
	for (from, to) in closure {
		a.add_epsilon(from, to);
	}
	a.set_deterministic(false);
}

/// Whether `a` accepts only the empty string.
pub fn is_empty_string(a: &Automaton) -> bool {
	match a.singleton() {
		Some(string) => string.is_empty(),
		None => a[a.initial()].is_accept() && a[a.initial()].transitions().is_empty(),
	}
}

/// Whether `a` accepts no strings. Relies on the absence of dead transitions.
pub fn is_empty(a: &Automaton) -> bool {
	if a.is_singleton() {
		return false;
	}
	!a[a.initial()].is_accept() && a[a.initial()].transitions().is_empty()
}

/// Whether `a` accepts every string. Only detects the minimal form.
pub fn is_total(a: &Automaton) -> bool {
	if a.is_singleton() {
		return false;
	}
	let initial: StateId = a.initial();
	match a[initial].transitions() {
		[t] => {
			a[initial].is_accept() && (t.to == initial) && (t.min == MIN_CODE_POINT) && (t.max == MAX_CODE_POINT)
		},
		_ => false,
	}
}

/// Whether `a` accepts `input`.
pub fn run(a: &Automaton, input: &str) -> bool {
	if let Some(string) = a.singleton() {
		return string == input;
	}
	run_code_points(a, input.chars().map(u32::from))
}

/// Whether `a` accepts the given label sequence.
///
/// Deterministic automata take one step per label; otherwise the set of
/// reachable states is tracked.
pub fn run_code_points<I>(a: &Automaton, input: I) -> bool
where
	I: IntoIterator<Item = u32>,
{
	if let Some(string) = a.singleton() {
		return string.chars().map(u32::from).eq(input);
	}
	if a.is_deterministic() {
		let mut p: StateId = a.initial();
		for label in input {
			match a.step(p, label) {
				Some(q) => p = q,
				None => return false,
			}
		}
		return a[p].is_accept();
	}

	let mut current: Vec<StateId> = vec![a.initial()];
	let mut next: Vec<StateId> = Vec::new();
	let mut queued: Vec<bool> = vec![false; a.arena_len()];
	let mut dest: Vec<StateId> = Vec::new();
	let mut accept: bool = a[a.initial()].is_accept();
	for label in input {
		accept = false;
		next.clear();
		for &p in current.iter() {
			dest.clear();
			a[p].step_all(label, &mut dest);
			for &q in dest.iter() {
				if a[q].is_accept() {
					accept = true;
				}
				if !queued[q.index()] {
					queued[q.index()] = true;
					next.push(q);
				}
			}
		}
		for q in next.iter() {
			queued[q.index()] = false;
		}
		std::mem::swap(&mut current, &mut next);
		if current.is_empty() {
			return false;
		}
	}
	accept
}

/// Combinators that minimize every result when [`AutomatonConfig::minimize_always`] is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operations {
	config: AutomatonConfig,
}

impl Operations {
	pub fn new(config: AutomatonConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> AutomatonConfig {
		self.config
	}

	fn check_minimize_always(&self, mut a: Automaton) -> Automaton {
		if self.config.minimize_always {
			minimize(&mut a);
		}
		a
	}

	pub fn concatenate(&self, a1: Automaton, a2: Automaton) -> Automaton {
		self.check_minimize_always(concatenate(a1, a2))
	}

	pub fn concatenate_all(&self, automata: Vec<Automaton>) -> Automaton {
		self.check_minimize_always(concatenate_all(automata))
	}

	pub fn optional(&self, a: Automaton) -> Automaton {
		self.check_minimize_always(optional(a))
	}

	pub fn repeat(&self, a: Automaton) -> Automaton {
		self.check_minimize_always(repeat(a))
	}

	pub fn repeat_min(&self, a: Automaton, min: usize) -> Automaton {
		self.check_minimize_always(repeat_min(a, min))
	}

	pub fn repeat_range(&self, a: Automaton, min: usize, max: usize) -> Automaton {
		self.check_minimize_always(repeat_range(a, min, max))
	}

	pub fn complement(&self, a: Automaton) -> Automaton {
		self.check_minimize_always(complement(a))
	}

	pub fn minus(&self, a1: Automaton, a2: Automaton) -> Automaton {
		self.check_minimize_always(minus(a1, a2))
	}

	pub fn intersection(&self, a1: Automaton, a2: Automaton) -> Automaton {
		self.check_minimize_always(intersection(a1, a2))
	}

	pub fn union(&self, a1: Automaton, a2: Automaton) -> Automaton {
		self.check_minimize_always(union(a1, a2))
	}

	pub fn union_all(&self, automata: Vec<Automaton>) -> Automaton {
		self.check_minimize_always(union_all(automata))
	}
}
