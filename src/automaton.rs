//! Finite automata over code point (or, after UTF-8 conversion, byte) labels.
//!
//! States live in an arena owned by the [`Automaton`] and are addressed by
//! [`StateId`] handles. Operations that combine automata graft one arena into
//! another; states that become unreachable stay in the arena until the next
//! compaction ([`Automaton::number_states`] or [`Automaton::remove_dead_transitions`]).
//!
//! Every public operation preserves these representation invariants:
//! - no transition leads to a dead state (one from which no accepting state is reachable),
//! - after [`Automaton::reduce`], no two sibling transitions with the same destination overlap or touch,
//! - `deterministic` is only `true` when it has been established; `false` is always safe.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::interval_tree::Interval;

pub const MIN_CODE_POINT: u32 = 0;
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateId(usize);

/// Labeled edge `[min, max] -> to`.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub struct Transition {
	pub min: u32,
	pub max: u32,
	pub to: StateId,
}

#[derive(Debug, Clone, Default)]
pub struct State {
	pub(crate) accept: bool,
	pub(crate) transitions: Vec<Transition>,
}

#[derive(Debug, Clone)]
pub struct Automaton {
	states: Vec<State>,
	initial: StateId,
	deterministic: bool,
	/// When set, the automaton accepts exactly this string and `states` is not meaningful.
	singleton: Option<String>,
	/// The arena holds exactly the reachable states, in breadth-first order from `initial`.
	numbered: bool,
}

/// States of an automaton moved into another one by [`Automaton::graft`].
#[derive(Debug)]
pub(crate) struct Grafted {
	pub initial: StateId,
	pub accept_states: Vec<StateId>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum AutomatonError {
	#[error("empty label interval [{min}, {max}]")]
	EmptyInterval { min: u32, max: u32 },
	#[error("label {0:#x} is beyond the maximum code point")]
	LabelOutOfRange(u32),
	#[error("state {state} has overlapping transitions")]
	NotDeterministic { state: usize },
	#[error("invalid numeric interval {min}-{max} with {digits} digits")]
	InvalidNumericInterval { min: u32, max: u32, digits: usize },
}

impl StateId {
	pub fn index(self) -> usize {
		self.0
	}

	pub(crate) fn new(index: usize) -> Self {
		Self(index)
	}

	pub(crate) fn offset(self, by: usize) -> Self {
		Self(self.0 + by)
	}
}

impl Transition {
	pub fn new(min: u32, max: u32, to: StateId) -> Self {
		debug_assert!(min <= max);
		Self { min, max, to }
	}

	pub fn single(label: u32, to: StateId) -> Self {
		Self::new(label, label, to)
	}

	pub fn contains(&self, label: u32) -> bool {
		(self.min <= label) && (label <= self.max)
	}
}

impl State {
	pub fn is_accept(&self) -> bool {
		self.accept
	}

	pub fn transitions(&self) -> &[Transition] {
		&self.transitions
	}

	/// Destination of the first transition on `label`; the only one if the automaton is deterministic.
	pub fn step(&self, label: u32) -> Option<StateId> {
		self.transitions.iter().find(|t| t.contains(label)).map(|t| t.to)
	}

	pub(crate) fn step_all(&self, label: u32, dest: &mut Vec<StateId>) {
		dest.extend(self.transitions.iter().filter(|t| t.contains(label)).map(|t| t.to));
	}

	/// Sorts by ascending `min`, then descending `max`, then destination.
	pub(crate) fn sort_transitions(&mut self) {
		self.transitions.sort_unstable_by(compare_by_min_max_then_dest);
	}

	/// Merges overlapping or adjacent intervals that share a destination.
	pub(crate) fn reduce(&mut self) {
		if self.transitions.len() <= 1 {
			return;
		}
		self.transitions
			.sort_unstable_by(|a, b| a.to.cmp(&b.to).then(a.min.cmp(&b.min)).then(b.max.cmp(&a.max)));

		let mut reduced: Vec<Transition> = Vec::with_capacity(self.transitions.len());
		let mut maybe_current: Option<Transition> = None;
		for &t in self.transitions.iter() {
			match maybe_current.as_mut() {
				Some(current) if (current.to == t.to) && (t.min <= current.max.saturating_add(1)) => {
					current.max = current.max.max(t.max);
				},
				_ => {
					if let Some(current) = maybe_current {
						reduced.push(current);
					}
					maybe_current = Some(t);
				},
			}
		}
		if let Some(current) = maybe_current {
			reduced.push(current);
		}
		reduced.sort_unstable_by(compare_by_min_max_then_dest);
		self.transitions = reduced;
	}
}

pub(crate) fn compare_by_min_max_then_dest(a: &Transition, b: &Transition) -> std::cmp::Ordering {
	a.min.cmp(&b.min).then(b.max.cmp(&a.max)).then(a.to.cmp(&b.to))
}

impl Automaton {
	/// Automaton with a single, non-accepting state: the empty language.
	pub fn new() -> Self {
		Self {
			states: vec![State::default()],
			initial: StateId(0),
			deterministic: true,
			singleton: None,
			numbered: true,
		}
	}

	/// Compact representation of the language `{ string }`.
	pub fn from_singleton(string: String) -> Self {
		Self {
			states: Vec::new(),
			initial: StateId(0),
			deterministic: true,
			singleton: Some(string),
			numbered: false,
		}
	}

	pub(crate) fn from_parts(states: Vec<State>, initial: StateId, deterministic: bool) -> Self {
		Self {
			states,
			initial,
			deterministic,
			singleton: None,
			numbered: false,
		}
	}

	pub fn singleton(&self) -> Option<&str> {
		self.singleton.as_deref()
	}

	pub fn is_singleton(&self) -> bool {
		self.singleton.is_some()
	}

	pub fn is_deterministic(&self) -> bool {
		self.deterministic
	}

	pub(crate) fn set_deterministic(&mut self, deterministic: bool) {
		self.deterministic = deterministic;
	}

	/// Initial state. States of a singleton are numbered by position in the string,
	/// the way [`Self::expand_singleton`] numbers them.
	pub fn initial(&self) -> StateId {
		self.initial
	}

	pub(crate) fn set_initial(&mut self, state: StateId) {
		self.initial = state;
		self.numbered = false;
	}

	pub(crate) fn new_state(&mut self) -> StateId {
		self.states.push(State::default());
		self.numbered = false;
		StateId(self.states.len() - 1)
	}

	pub(crate) fn set_accept(&mut self, state: StateId, accept: bool) {
		self.states[state.0].accept = accept;
	}

	pub(crate) fn add_transition(&mut self, from: StateId, min: u32, max: u32, to: StateId) {
		self.states[from.0].transitions.push(Transition::new(min, max, to));
		self.numbered = false;
	}

	pub(crate) fn state_mut(&mut self, state: StateId) -> &mut State {
		self.numbered = false;
		&mut self.states[state.0]
	}

	/// Makes `from` behave as if it had an epsilon transition to `to`:
	/// copies `to`'s transitions and acceptance into `from`.
	pub(crate) fn add_epsilon(&mut self, from: StateId, to: StateId) {
		if from == to {
			return;
		}
		if self.states[to.0].accept {
			self.states[from.0].accept = true;
		}
		let copied: Vec<Transition> = self.states[to.0].transitions.clone();
		self.states[from.0].transitions.extend(copied);
		self.numbered = false;
	}

	/// Moves every state of `other` into this arena. Nothing links to them yet.
	pub(crate) fn graft(&mut self, mut other: Automaton) -> Grafted {
		other.expand_singleton();
		let offset: usize = self.states.len();
		let accept_states: Vec<StateId> = other.accept_states().into_iter().map(|s| s.offset(offset)).collect();
		let initial: StateId = other.initial.offset(offset);
		self.states.extend(other.states.into_iter().map(|mut state| {
			for t in state.transitions.iter_mut() {
				t.to = t.to.offset(offset);
			}
			state
		}));
		self.numbered = false;
		Grafted { initial, accept_states }
	}

	/// Switches a singleton automaton to the explicit graph representation.
	pub fn expand_singleton(&mut self) {
		let Some(string) = self.singleton.take() else {
			return;
		};
		self.states.clear();
		let mut p: StateId = self.new_state();
		self.initial = p;
		for ch in string.chars() {
			let q: StateId = self.new_state();
			self.add_transition(p, u32::from(ch), u32::from(ch), q);
			p = q;
		}
		self.states[p.0].accept = true;
		self.deterministic = true;
	}

	/// Reachable states in breadth-first order from the initial state.
	pub fn reachable_states(&self) -> Vec<StateId> {
		debug_assert!(!self.is_singleton());
		if self.numbered {
			return (0..self.states.len()).map(StateId).collect();
		}
		let mut visited: Vec<bool> = vec![false; self.states.len()];
		let mut order: Vec<StateId> = vec![self.initial];
		visited[self.initial.0] = true;
		let mut next: usize = 0;
		while let Some(&s) = order.get(next) {
			next += 1;
			for t in self.states[s.0].transitions.iter() {
				if !visited[t.to.0] {
					visited[t.to.0] = true;
					order.push(t.to);
				}
			}
		}
		order
	}

	/// Compacts the arena so it holds only the reachable states, numbered in breadth-first order.
	/// Afterwards `StateId::index` is the state number, and stays so until the next mutation.
	pub fn number_states(&mut self) {
		self.expand_singleton();
		if self.numbered {
			return;
		}
		let order: Vec<StateId> = self.reachable_states();
		let mut remap: Vec<usize> = vec![usize::MAX; self.states.len()];
		for (number, s) in order.iter().enumerate() {
			remap[s.0] = number;
		}
		let mut old: Vec<State> = std::mem::take(&mut self.states);
		self.states = order
			.iter()
			.map(|s| {
				let mut state: State = std::mem::take(&mut old[s.0]);
				for t in state.transitions.iter_mut() {
					t.to = StateId(remap[t.to.0]);
				}
				state
			})
			.collect();
		self.initial = StateId(0);
		self.numbered = true;
	}

	pub(crate) fn is_numbered(&self) -> bool {
		self.numbered && !self.is_singleton()
	}

	/// Size of the arena, reachable or not. Equals [`Self::num_states`] once numbered.
	pub(crate) fn arena_len(&self) -> usize {
		self.states.len()
	}

	pub fn num_states(&self) -> usize {
		match self.singleton() {
			Some(string) => string.chars().count() + 1,
			None => self.reachable_states().len(),
		}
	}

	pub fn num_transitions(&self) -> usize {
		match self.singleton() {
			Some(string) => string.chars().count(),
			None => self
				.reachable_states()
				.into_iter()
				.map(|s| self.states[s.0].transitions.len())
				.sum(),
		}
	}

	/// Reachable accepting states.
	pub fn accept_states(&mut self) -> Vec<StateId> {
		self.expand_singleton();
		self.reachable_states()
			.into_iter()
			.filter(|s| self.states[s.0].accept)
			.collect()
	}

	/// Adds a non-accepting sink so every reachable state has a transition on every code point.
	pub fn totalize(&mut self) {
		self.expand_singleton();
		let reachable: Vec<StateId> = self.reachable_states();
		let sink: StateId = self.new_state();
		self.add_transition(sink, MIN_CODE_POINT, MAX_CODE_POINT, sink);
		for s in reachable {
			let state: &mut State = &mut self.states[s.0];
			state.sort_transitions();
			let mut covered: Vec<Interval> = state
				.transitions
				.iter()
				.map(|t| Interval::new(t.min, t.max))
				.collect();
			for gap in Interval::complement(&mut covered, MIN_CODE_POINT, MAX_CODE_POINT) {
				state.transitions.push(Transition::new(gap.start(), gap.end(), sink));
			}
		}
		self.numbered = false;
	}

	/// Reduces every reachable state; see [`State::reduce`].
	pub fn reduce(&mut self) {
		if self.is_singleton() {
			return;
		}
		for s in self.reachable_states() {
			self.states[s.0].reduce();
		}
	}

	/// Sorted interval start points of all transitions, always including [`MIN_CODE_POINT`].
	pub fn start_points(&mut self) -> Vec<u32> {
		self.expand_singleton();
		let mut points: BTreeSet<u32> = BTreeSet::new();
		points.insert(MIN_CODE_POINT);
		for s in self.reachable_states() {
			for t in self.states[s.0].transitions.iter() {
				points.insert(t.min);
				if t.max < MAX_CODE_POINT {
					points.insert(t.max + 1);
				}
			}
		}
		points.into_iter().collect()
	}

	/// Arena-indexed flags of the states from which an accepting state is reachable.
	pub(crate) fn live_states(&self) -> Vec<bool> {
		let reachable: Vec<StateId> = self.reachable_states();
		let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
		for &s in reachable.iter() {
			for t in self.states[s.0].transitions.iter() {
				reverse[t.to.0].push(s);
			}
		}
		let mut live: Vec<bool> = vec![false; self.states.len()];
		let mut worklist: Vec<StateId> = reachable.into_iter().filter(|s| self.states[s.0].accept).collect();
		for s in worklist.iter() {
			live[s.0] = true;
		}
		while let Some(s) = worklist.pop() {
			for &p in reverse[s.0].iter() {
				if !live[p.0] {
					live[p.0] = true;
					worklist.push(p);
				}
			}
		}
		live
	}

	/// Drops transitions into dead states, reduces, and compacts the arena.
	pub fn remove_dead_transitions(&mut self) {
		if self.is_singleton() {
			return;
		}
		let live: Vec<bool> = self.live_states();
		for s in self.reachable_states() {
			self.states[s.0].transitions.retain(|t| live[t.to.0]);
		}
		self.reduce();
		self.numbered = false;
		self.number_states();
	}

	/// Restores the representation invariants after the graph was edited directly.
	pub fn restore_invariant(&mut self) {
		self.remove_dead_transitions();
	}

	/// Transitions of every arena state, each sorted by [`State::sort_transitions`] order.
	/// Indexed by [`StateId::index`].
	pub fn sorted_transitions(&self) -> Vec<Vec<Transition>> {
		debug_assert!(!self.is_singleton());
		self.states
			.iter()
			.map(|state| {
				let mut transitions: Vec<Transition> = state.transitions.clone();
				transitions.sort_unstable_by(compare_by_min_max_then_dest);
				transitions
			})
			.collect()
	}

	pub fn step(&self, state: StateId, label: u32) -> Option<StateId> {
		if let Some(string) = self.singleton() {
			let ch: char = string.chars().nth(state.0)?;
			return (u32::from(ch) == label).then_some(StateId(state.0 + 1));
		}
		self.states.get(state.0)?.step(label)
	}

	pub fn is_accept(&self, state: StateId) -> bool {
		match self.singleton() {
			Some(string) => state.0 == string.chars().count(),
			None => self.states.get(state.0).is_some_and(State::is_accept),
		}
	}

	/// Graphviz rendering of the reachable part.
	pub fn to_dot(&self) -> String {
		let mut expanded: std::borrow::Cow<'_, Automaton> = std::borrow::Cow::Borrowed(self);
		if self.is_singleton() {
			expanded.to_mut().expand_singleton();
		}
		let order: Vec<StateId> = expanded.reachable_states();
		let numbers: Vec<usize> = expanded.numbers_for(&order);

		let mut dot: String = String::from("digraph Automaton {\n  rankdir = LR;\n");
		for &s in order.iter() {
			let state: &State = &expanded.states[s.0];
			let number: usize = numbers[s.0];
			let shape: &str = if state.accept { "doublecircle" } else { "circle" };
			let _ = writeln!(dot, "  {number} [shape={shape},label=\"\"];");
			if s == expanded.initial {
				dot.push_str("  initial [shape=plaintext,label=\"\"];\n");
				let _ = writeln!(dot, "  initial -> {number}");
			}
			for t in state.transitions.iter() {
				let mut label: String = String::new();
				append_label(&mut label, t.min);
				if t.min != t.max {
					label.push('-');
					append_label(&mut label, t.max);
				}
				let _ = writeln!(dot, "  {number} -> {} [label=\"{label}\"]", numbers[t.to.0]);
			}
		}
		dot.push_str("}\n");
		dot
	}

	/// Arena-indexed state numbers for a breadth-first `order`.
	fn numbers_for(&self, order: &[StateId]) -> Vec<usize> {
		let mut numbers: Vec<usize> = vec![usize::MAX; self.states.len()];
		for (number, s) in order.iter().enumerate() {
			numbers[s.0] = number;
		}
		numbers
	}
}

impl Default for Automaton {
	fn default() -> Self {
		Self::new()
	}
}

impl std::ops::Index<StateId> for Automaton {
	type Output = State;

	fn index(&self, state: StateId) -> &State {
		assert!(
			!self.is_singleton(),
			"a singleton automaton has no state graph until expand_singleton"
		);
		&self.states[state.0]
	}
}

impl std::fmt::Display for Automaton {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if let Some(string) = self.singleton() {
			let mut escaped: String = String::new();
			for ch in string.chars() {
				append_label(&mut escaped, u32::from(ch));
			}
			return write!(fmt, "singleton: {escaped}");
		}
		let order: Vec<StateId> = self.reachable_states();
		let numbers: Vec<usize> = self.numbers_for(&order);
		writeln!(fmt, "initial state: {}", numbers[self.initial.0])?;
		for &s in order.iter() {
			let state: &State = &self.states[s.0];
			let verdict: &str = if state.accept { "accept" } else { "reject" };
			writeln!(fmt, "state {} [{verdict}]:", numbers[s.0])?;
			for t in state.transitions.iter() {
				let mut label: String = String::new();
				append_label(&mut label, t.min);
				if t.min != t.max {
					label.push('-');
					append_label(&mut label, t.max);
				}
				writeln!(fmt, "  {label} -> {}", numbers[t.to.0])?;
			}
		}
		Ok(())
	}
}

/// Printable ASCII as-is (except `\` and `"`), everything else as `\u` escapes.
pub(crate) fn append_label(out: &mut String, label: u32) {
	match char::from_u32(label) {
		Some(ch) if (0x21..=0x7e).contains(&label) && ch != '\\' && ch != '"' => out.push(ch),
		_ => {
			let _ = write!(out, "\\u{label:04x}");
		},
	}
}

/// Unchecked graph-editing access.
///
/// The automaton under construction may violate every representation invariant;
/// it only becomes usable by the rest of the crate through [`Self::finish`] or
/// [`Self::finish_deterministic`], which restore and check them.
#[derive(Debug)]
pub struct AutomatonBuilder {
	automaton: Automaton,
}

impl AutomatonBuilder {
	pub fn new() -> Self {
		Self {
			automaton: Automaton::new(),
		}
	}

	pub fn initial(&self) -> StateId {
		self.automaton.initial
	}

	pub fn new_state(&mut self) -> StateId {
		self.automaton.new_state()
	}

	pub fn set_initial(&mut self, state: StateId) {
		self.automaton.set_initial(state);
	}

	pub fn set_accept(&mut self, state: StateId, accept: bool) {
		self.automaton.set_accept(state, accept);
	}

	pub fn add_transition(&mut self, from: StateId, min: u32, max: u32, to: StateId) -> Result<(), AutomatonError> {
		if min > max {
			return Err(AutomatonError::EmptyInterval { min, max });
		}
		if max > MAX_CODE_POINT {
			return Err(AutomatonError::LabelOutOfRange(max));
		}
		self.automaton.add_transition(from, min, max, to);
		Ok(())
	}

	pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
		self.automaton.add_epsilon(from, to);
	}

	/// Restores the invariants; the result is flagged nondeterministic.
	pub fn finish(mut self) -> Automaton {
		self.automaton.set_deterministic(false);
		self.automaton.restore_invariant();
		self.automaton
	}

	/// Like [`Self::finish`], but checks that no state has overlapping transitions
	/// and flags the result deterministic.
	pub fn finish_deterministic(self) -> Result<Automaton, AutomatonError> {
		let mut automaton: Automaton = self.finish();
		for (number, state) in automaton.states.iter().enumerate() {
			let mut transitions: Vec<Transition> = state.transitions.clone();
			transitions.sort_unstable_by(compare_by_min_max_then_dest);
			if transitions.windows(2).any(|pair| pair[1].min <= pair[0].max) {
				return Err(AutomatonError::NotDeterministic { state: number });
			}
		}
		automaton.set_deterministic(true);
		Ok(automaton)
	}
}

impl Default for AutomatonBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn chain(labels: &[u32]) -> Automaton {
		let mut builder: AutomatonBuilder = AutomatonBuilder::new();
		let mut p: StateId = builder.initial();
		for &label in labels {
			let q: StateId = builder.new_state();
			builder.add_transition(p, label, label, q).unwrap();
			p = q;
		}
		builder.set_accept(p, true);
		builder.finish_deterministic().unwrap()
	}

	#[test]
	fn expand_singleton() {
		let mut a: Automaton = Automaton::from_singleton("héllo".to_owned());
		assert_eq!(a.num_states(), 6);
		assert_eq!(a.num_transitions(), 5);
		a.expand_singleton();
		assert!(!a.is_singleton());
		assert!(a.is_deterministic());
		let mut s: StateId = a.initial();
		for ch in "héllo".chars() {
			s = a.step(s, u32::from(ch)).unwrap();
		}
		assert!(a[s].is_accept());
		assert_eq!(a.num_states(), 6);
	}

	#[test]
	fn step_through_singleton() {
		let a: Automaton = Automaton::from_singleton("héllo".to_owned());
		let mut s: StateId = a.initial();
		assert!(!a.is_accept(s));
		for ch in "héllo".chars() {
			s = a.step(s, u32::from(ch)).unwrap();
		}
		assert!(a.is_singleton());
		assert!(a.is_accept(s));
		assert_eq!(a.step(s, 'x' as u32), None);
		assert_eq!(a.step(a.initial(), 'x' as u32), None);

		let mut expanded: Automaton = a.clone();
		expanded.expand_singleton();
		let mut t: StateId = expanded.initial();
		for ch in "hé".chars() {
			t = expanded.step(t, u32::from(ch)).unwrap();
		}
		assert_eq!(a.step(a.step(a.initial(), 'h' as u32).unwrap(), 'é' as u32), Some(t));
	}

	#[test]
	#[should_panic(expected = "singleton")]
	fn singleton_has_no_state_graph() {
		let a: Automaton = Automaton::from_singleton("ab".to_owned());
		let _ = a[a.initial()].is_accept();
	}

	#[test]
	fn reduce_at_the_top_label() {
		let mut a: Automaton = Automaton::new();
		let s: StateId = a.new_state();
		a.add_transition(a.initial(), u32::MAX - 1, u32::MAX, s);
		a.add_transition(a.initial(), u32::MAX, u32::MAX, s);
		a.add_transition(a.initial(), 5, 9, s);
		a.reduce();
		let transitions: &[Transition] = a[a.initial()].transitions();
		assert_eq!(transitions.len(), 2);
		assert_eq!((transitions[1].min, transitions[1].max), (u32::MAX - 1, u32::MAX));
	}

	#[test]
	fn reduce_merges_adjacent_intervals() {
		let mut builder: AutomatonBuilder = AutomatonBuilder::new();
		let end: StateId = builder.new_state();
		let other: StateId = builder.new_state();
		let initial: StateId = builder.initial();
		builder.add_transition(initial, 'a' as u32, 'c' as u32, end).unwrap();
		builder.add_transition(initial, 'd' as u32, 'f' as u32, end).unwrap();
		builder.add_transition(initial, 'b' as u32, 'e' as u32, end).unwrap();
		builder.add_transition(initial, 'g' as u32, 'g' as u32, other).unwrap();
		builder.add_transition(initial, 'h' as u32, 'h' as u32, end).unwrap();
		builder.set_accept(end, true);
		builder.set_accept(other, true);
		let a: Automaton = builder.finish();
		let transitions: &[Transition] = a[a.initial()].transitions();
		assert_eq!(transitions.len(), 3);
		assert_eq!((transitions[0].min, transitions[0].max), ('a' as u32, 'f' as u32));
		assert_eq!((transitions[1].min, transitions[1].max), ('g' as u32, 'g' as u32));
		assert_eq!((transitions[2].min, transitions[2].max), ('h' as u32, 'h' as u32));
	}

	#[test]
	fn dead_transitions_are_removed() {
		let mut builder: AutomatonBuilder = AutomatonBuilder::new();
		let initial: StateId = builder.initial();
		let live: StateId = builder.new_state();
		let dead: StateId = builder.new_state();
		let unreachable: StateId = builder.new_state();
		builder.add_transition(initial, 'a' as u32, 'a' as u32, live).unwrap();
		builder.add_transition(initial, 'b' as u32, 'b' as u32, dead).unwrap();
		builder.add_transition(dead, 'c' as u32, 'c' as u32, dead).unwrap();
		builder.set_accept(live, true);
		builder.set_accept(unreachable, true);
		let a: Automaton = builder.finish();
		assert_eq!(a.num_states(), 2);
		assert_eq!(a.arena_len(), 2);
		assert_eq!(a[a.initial()].transitions().len(), 1);
		assert!(a.is_numbered());
	}

	#[test]
	fn totalize_covers_every_code_point() {
		let mut a: Automaton = chain(&['b' as u32, 'x' as u32]);
		a.totalize();
		for s in a.reachable_states() {
			for label in [0, 'a' as u32, 'b' as u32, 'c' as u32, 'x' as u32, MAX_CODE_POINT] {
				assert!(a.step(s, label).is_some());
			}
		}
		assert_eq!(a.start_points(), vec![0, 'b' as u32, 'c' as u32, 'x' as u32, 'y' as u32]);
	}

	#[test]
	fn numbering_is_breadth_first() {
		let mut a: Automaton = chain(&['a' as u32, 'b' as u32]);
		let graft: Grafted = a.graft(chain(&['c' as u32]));
		let initial: StateId = a.initial();
		a.add_epsilon(initial, graft.initial);
		assert_eq!(graft.accept_states.len(), 1);
		assert_eq!(a.arena_len(), 5);
		a.number_states();
		assert_eq!(a.initial(), StateId(0));
		assert_eq!(a.step(StateId(0), 'a' as u32), Some(StateId(1)));
		assert_eq!(a.step(StateId(0), 'c' as u32), Some(StateId(2)));
		assert_eq!(a.step(StateId(1), 'b' as u32), Some(StateId(3)));
		assert_eq!(a.arena_len(), 4);
	}

	#[test]
	fn builder_rejects_overlaps_and_bad_intervals() {
		let mut builder: AutomatonBuilder = AutomatonBuilder::new();
		let initial: StateId = builder.initial();
		let s: StateId = builder.new_state();
		let t: StateId = builder.new_state();
		assert_eq!(
			builder.add_transition(initial, 5, 4, s),
			Err(AutomatonError::EmptyInterval { min: 5, max: 4 })
		);
		assert_eq!(
			builder.add_transition(initial, 0, MAX_CODE_POINT + 1, s),
			Err(AutomatonError::LabelOutOfRange(MAX_CODE_POINT + 1))
		);
		builder.add_transition(initial, 'a' as u32, 'm' as u32, s).unwrap();
		builder.add_transition(initial, 'k' as u32, 'z' as u32, t).unwrap();
		builder.set_accept(s, true);
		builder.set_accept(t, true);
		assert_eq!(
			builder.finish_deterministic().unwrap_err(),
			AutomatonError::NotDeterministic { state: 0 }
		);
	}

	#[test]
	fn dot_and_display() {
		let a: Automaton = chain(&['a' as u32, 0x1F600]);
		let dot: String = a.to_dot();
		assert!(dot.starts_with("digraph Automaton {\n"));
		assert!(dot.contains("  initial -> 0\n"));
		assert!(dot.contains("  0 -> 1 [label=\"a\"]\n"));
		assert!(dot.contains("  1 -> 2 [label=\"\\u1f600\"]\n"));
		assert!(dot.contains("  2 [shape=doublecircle,label=\"\"];\n"));

		let text: String = a.to_string();
		assert!(text.starts_with("initial state: 0\n"));
		assert!(text.contains("state 2 [accept]:\n"));

		assert_eq!(Automaton::from_singleton("a\"".to_owned()).to_string(), "singleton: a\\u0022");
	}
}
