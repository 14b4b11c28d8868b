//! Hopcroft's partition refinement.
//!
//! - John E. Hopcroft: *An n log n algorithm for minimizing states in a finite automaton*, 1971.
//!
//! Blocks are refined per (block, symbol) splitter. Each block keeps, for every
//! symbol, the list of its states that have an incoming transition on that
//! symbol; only the smaller half of a split needs to be queued again.

use std::collections::VecDeque;

use hashbrown::HashSet;

use crate::automaton::Automaton;
use crate::automaton::MAX_CODE_POINT;
use crate::automaton::MIN_CODE_POINT;
use crate::automaton::State;
use crate::automaton::StateId;
use crate::automaton::Transition;
use crate::operations::determinize;

/// Minimizes (and determinizes) `a`. Singletons are already minimal.
pub fn minimize(a: &mut Automaton) {
	if !a.is_singleton() {
		minimize_hopcroft(a);
	}
}

#[derive(Debug, Clone, Copy, Default)]
struct StateList {
	size: usize,
	first: Option<usize>,
	last: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct StateListNode {
	q: usize,
	next: Option<usize>,
	prev: Option<usize>,
	/// Index of the owning list.
	list: usize,
}

/// Doubly linked lists of states, all nodes in one arena.
struct ActiveLists {
	lists: Vec<StateList>,
	nodes: Vec<StateListNode>,
}

impl ActiveLists {
	fn add(&mut self, list: usize, q: usize) -> usize {
		let node: usize = self.nodes.len();
		let owner: &mut StateList = &mut self.lists[list];
		self.nodes.push(StateListNode {
			q,
			next: None,
			prev: owner.last,
			list,
		});
		match owner.last {
			Some(last) => self.nodes[last].next = Some(node),
			None => owner.first = Some(node),
		}
		owner.last = Some(node);
		owner.size += 1;
		node
	}

	fn remove(&mut self, node: usize) {
		let StateListNode { next, prev, list, .. } = self.nodes[node];
		let owner: &mut StateList = &mut self.lists[list];
		match prev {
			Some(prev) => self.nodes[prev].next = next,
			None => owner.first = next,
		}
		match next {
			Some(next) => self.nodes[next].prev = prev,
			None => owner.last = prev,
		}
		owner.size -= 1;
	}

	fn members(&self, list: usize) -> Vec<usize> {
		let mut members: Vec<usize> = Vec::with_capacity(self.lists[list].size);
		let mut cursor: Option<usize> = self.lists[list].first;
		while let Some(node) = cursor {
			members.push(self.nodes[node].q);
			cursor = self.nodes[node].next;
		}
		members
	}
}

pub fn minimize_hopcroft(a: &mut Automaton) {
	determinize(a);
	a.expand_singleton();
	let initial: StateId = a.initial();
	if let [t] = a[initial].transitions() {
		if (t.to == initial) && (t.min == MIN_CODE_POINT) && (t.max == MAX_CODE_POINT) {
			return;
		}
	}
	a.totalize();
	a.number_states();

	let sigma: Vec<u32> = a.start_points();
	let sigma_len: usize = sigma.len();
	let states_len: usize = a.arena_len();
	// At least the two initial blocks exist even when one of them is empty.
	let blocks_len: usize = states_len.max(2);

	let mut reverse: Vec<Vec<usize>> = vec![Vec::new(); states_len * sigma_len];
	let mut partition: Vec<HashSet<usize>> = vec![HashSet::new(); blocks_len];
	let mut splitblock: Vec<Vec<usize>> = vec![Vec::new(); blocks_len];
	let mut block: Vec<usize> = vec![0; states_len];
	let mut active: ActiveLists = ActiveLists {
		lists: vec![StateList::default(); blocks_len * sigma_len],
		nodes: Vec::new(),
	};
	let mut active2: Vec<Option<usize>> = vec![None; states_len * sigma_len];
	let mut pending: VecDeque<(usize, usize)> = VecDeque::new();
	let mut pending2: Vec<bool> = vec![false; sigma_len * blocks_len];
	let mut split: Vec<bool> = vec![false; states_len];
	let mut refine: Vec<usize> = Vec::new();
	let mut refine2: Vec<bool> = vec![false; blocks_len];

	// Initial partition: accepting and rejecting states.
	for q in 0..states_len {
		let j: usize = if a[StateId::new(q)].is_accept() { 0 } else { 1 };
		partition[j].insert(q);
		block[q] = j;
		for (x, &label) in sigma.iter().enumerate() {
			let Some(to) = a.step(StateId::new(q), label) else {
				continue;
			};
			reverse[to.index() * sigma_len + x].push(q);
		}
	}
	for j in 0..=1 {
		for x in 0..sigma_len {
			let mut members: Vec<usize> = partition[j].iter().copied().collect();
			members.sort_unstable();
			for q in members {
				if !reverse[q * sigma_len + x].is_empty() {
					active2[q * sigma_len + x] = Some(active.add(j * sigma_len + x, q));
				}
			}
		}
	}
	for x in 0..sigma_len {
		let j: usize = if active.lists[x].size <= active.lists[sigma_len + x].size { 0 } else { 1 };
		pending.push_back((j, x));
		pending2[x * blocks_len + j] = true;
	}

	let mut k: usize = 2;
	while let Some((p, x)) = pending.pop_front() {
		pending2[x * blocks_len + p] = false;

		// States with a transition on `x` into block `p` must leave their blocks.
		for m in active.members(p * sigma_len + x) {
			for &i in reverse[m * sigma_len + x].iter() {
				if split[i] {
					continue;
				}
				split[i] = true;
				let j: usize = block[i];
				splitblock[j].push(i);
				if !refine2[j] {
					refine2[j] = true;
					refine.push(j);
				}
			}
		}

		refine.sort_unstable();
		for j in refine.drain(..) {
			let sb: Vec<usize> = std::mem::take(&mut splitblock[j]);
			if sb.len() < partition[j].len() {
				for &s in sb.iter() {
					partition[j].remove(&s);
					partition[k].insert(s);
					block[s] = k;
					for c in 0..sigma_len {
						let Some(node) = active2[s * sigma_len + c] else {
							continue;
						};
						if active.nodes[node].list == j * sigma_len + c {
							active.remove(node);
							active2[s * sigma_len + c] = Some(active.add(k * sigma_len + c, s));
						}
					}
				}
				for c in 0..sigma_len {
					let aj: usize = active.lists[j * sigma_len + c].size;
					let ak: usize = active.lists[k * sigma_len + c].size;
					let ofs: usize = c * blocks_len;
					if !pending2[ofs + j] && (0 < aj) && (aj <= ak) {
						pending2[ofs + j] = true;
						pending.push_back((j, c));
					} else {
						pending2[ofs + k] = true;
						pending.push_back((k, c));
					}
				}
				k += 1;
			}
			refine2[j] = false;
			for s in sb {
				split[s] = false;
			}
		}
		trace!("{k} blocks after splitter ({p}, {x})");
	}

	// One state per block; any member represents it.
	let mut states: Vec<State> = Vec::with_capacity(k);
	let mut new_initial: StateId = StateId::new(0);
	for (n, members) in partition.iter().take(k).enumerate() {
		if members.contains(&initial.index()) {
			new_initial = StateId::new(n);
		}
		let Some(&representative) = members.iter().next() else {
			states.push(State::default());
			continue;
		};
		let original: &State = &a[StateId::new(representative)];
		states.push(State {
			accept: original.is_accept(),
			transitions: original
				.transitions()
				.iter()
				.map(|t| Transition::new(t.min, t.max, StateId::new(block[t.to.index()])))
				.collect(),
		});
	}

	let before: usize = states_len;
	*a = Automaton::from_parts(states, new_initial, true);
	a.remove_dead_transitions();
	debug!("minimized {before} states into {}", a.num_states());
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::basic_automata::make_any_string;
	use crate::basic_automata::make_char;
	use crate::basic_automata::make_empty;
	use crate::basic_automata::make_string;
	use crate::operations::complement;
	use crate::operations::concatenate;
	use crate::operations::is_empty;
	use crate::operations::is_total;
	use crate::operations::repeat;
	use crate::operations::run;
	use crate::operations::same_language;
	use crate::operations::union;
	use crate::operations::union_all;

	fn a_or_b() -> Automaton {
		union(make_char('a'), make_char('b'))
	}

	/// `(a|b)*abb`
	fn ends_with_abb() -> Automaton {
		concatenate(repeat(a_or_b()), make_string("abb"))
	}

	fn strings(max_len: usize) -> Vec<String> {
		let mut strings: Vec<String> = vec![String::new()];
		let mut start: usize = 0;
		for _ in 0..max_len {
			let end: usize = strings.len();
			for i in start..end {
				for ch in ['a', 'b', 'c'] {
					let string: String = format!("{}{ch}", strings[i]);
					strings.push(string);
				}
			}
			start = end;
		}
		strings
	}

	#[test]
	fn textbook_minimal_size() {
		let mut a: Automaton = ends_with_abb();
		minimize(&mut a);
		assert!(a.is_deterministic());
		assert_eq!(a.num_states(), 4);
		for string in strings(6) {
			assert_eq!(run(&a, &string), string.ends_with("abb") && !string.contains('c'), "{string:?}");
		}
	}

	#[test]
	fn preserves_language_and_is_idempotent() {
		let samples: Vec<Automaton> = vec![
			ends_with_abb(),
			union_all(vec![make_string("abc"), make_string("abd"), make_string("bc"), make_string("c")]),
			complement(ends_with_abb()),
			repeat(make_string("ab")),
			concatenate(repeat(make_char('a')), repeat(make_char('a'))),
		];
		for sample in samples {
			let mut minimal: Automaton = sample.clone();
			minimize(&mut minimal);
			let mut original: Automaton = sample.clone();
			assert!(same_language(&mut minimal, &mut original));

			let mut again: Automaton = minimal.clone();
			minimize(&mut again);
			assert_eq!(again.num_states(), minimal.num_states());
			assert_eq!(again.num_transitions(), minimal.num_transitions());
			assert_eq!(again.to_string(), minimal.to_string());
		}
	}

	#[test]
	fn redundant_states_collapse() {
		// a*a* is a*
		let mut a: Automaton = concatenate(repeat(make_char('a')), repeat(make_char('a')));
		minimize(&mut a);
		assert_eq!(a.num_states(), 1);
		assert_eq!(a.num_transitions(), 1);
	}

	#[test]
	fn trivial_languages() {
		let mut empty: Automaton = make_empty();
		minimize(&mut empty);
		assert!(is_empty(&empty));
		assert_eq!(empty.num_states(), 1);

		let mut total: Automaton = union(make_any_string(), make_string("x"));
		minimize(&mut total);
		assert!(is_total(&total));

		let mut singleton: Automaton = make_string("xyz");
		minimize(&mut singleton);
		assert_eq!(singleton.singleton(), Some("xyz"));
	}
}
