//! Incremental construction of a minimal deterministic automaton from sorted strings.
//!
//! - Jan Daciuk, Stoyan Mihov, Bruce W. Watson, Richard E. Watson:
//!   *Incremental Construction of Minimal Acyclic Finite-State Automata*, 2000.
//!
//! Nodes live in an arena; frozen nodes are interned in a registry keyed on their
//! acceptance, labels and (already interned) child handles.

use hashbrown::HashMap;

use crate::automaton::Automaton;
use crate::automaton::StateId;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BuildError {
	#[error("input is not sorted: {previous:?} was added before {current:?}")]
	Unsorted { previous: String, current: String },
	#[error("the builder has already been completed")]
	AlreadyCompleted,
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
struct NodeId(usize);

#[derive(Debug, Clone, Default, Eq, Hash, PartialEq)]
struct Node {
	is_final: bool,
	labels: Vec<u32>,
	children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct DaciukMihovBuilder {
	nodes: Vec<Node>,
	/// `None` once completed.
	registry: Option<HashMap<Node, NodeId>>,
	previous: Option<String>,
}

const ROOT: NodeId = NodeId(0);

impl DaciukMihovBuilder {
	pub fn new() -> Self {
		Self {
			nodes: vec![Node::default()],
			registry: Some(HashMap::new()),
			previous: None,
		}
	}

	/// Builds the automaton for `strings`, which must be sorted and may repeat.
	pub fn build<'a, I>(strings: I) -> Result<Automaton, BuildError>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut builder: Self = Self::new();
		for string in strings {
			builder.add(string)?;
		}
		builder.complete()
	}

	/// Adds `current`, which must not sort before the previously added string.
	pub fn add(&mut self, current: &str) -> Result<(), BuildError> {
		if self.registry.is_none() {
			return Err(BuildError::AlreadyCompleted);
		}
		if let Some(previous) = self.previous.as_deref() {
			if previous > current {
				return Err(BuildError::Unsorted {
					previous: previous.to_owned(),
					current: current.to_owned(),
				});
			}
		}

		let labels: Vec<u32> = current.chars().map(u32::from).collect();

		// Descend along the common prefix with the previous string.
		let mut pos: usize = 0;
		let mut state: NodeId = ROOT;
		while let Some(&label) = labels.get(pos) {
			match self.last_child(state, label) {
				Some(next) => {
					state = next;
					pos += 1;
				},
				None => break,
			}
		}

		if self.has_children(state) {
			self.replace_or_register(state);
		}
		self.add_suffix(state, &labels[pos..]);
		self.previous = Some(current.to_owned());
		Ok(())
	}

	/// Freezes the remaining path and returns the automaton.
	/// Any further call to [`Self::add`] or [`Self::complete`] fails.
	pub fn complete(&mut self) -> Result<Automaton, BuildError> {
		if self.registry.is_none() {
			return Err(BuildError::AlreadyCompleted);
		}
		if self.has_children(ROOT) {
			self.replace_or_register(ROOT);
		}
		let registered: usize = self.registry.take().map_or(0, |registry| registry.len());
		let automaton: Automaton = self.convert();
		debug!(
			"built minimal automaton with {} states ({registered} registered nodes)",
			automaton.num_states()
		);
		Ok(automaton)
	}

	fn last_child(&self, state: NodeId, label: u32) -> Option<NodeId> {
		let node: &Node = &self.nodes[state.0];
		match node.labels.last() {
			Some(&last) if last == label => node.children.last().copied(),
			_ => None,
		}
	}

	fn has_children(&self, state: NodeId) -> bool {
		!self.nodes[state.0].children.is_empty()
	}

	/// Interns the chain of last children below `state`, deepest first,
	/// replacing each by an equivalent registered node where one exists.
	fn replace_or_register(&mut self, state: NodeId) {
		let mut parents: Vec<NodeId> = vec![state];
		while let Some(&child) = self.nodes[parents[parents.len() - 1].0].children.last() {
			if !self.has_children(child) {
				break;
			}
			parents.push(child);
		}

		let Some(registry) = self.registry.as_mut() else {
			return;
		};
		for &parent in parents.iter().rev() {
			let Some(&child) = self.nodes[parent.0].children.last() else {
				continue;
			};
			match registry.get(&self.nodes[child.0]) {
				Some(&registered) => {
					if let Some(last) = self.nodes[parent.0].children.last_mut() {
						*last = registered;
					}
				},
				None => {
					registry.insert(self.nodes[child.0].clone(), child);
				},
			}
		}
	}

	fn add_suffix(&mut self, mut state: NodeId, suffix: &[u32]) {
		for &label in suffix {
			self.nodes.push(Node::default());
			let child: NodeId = NodeId(self.nodes.len() - 1);
			let node: &mut Node = &mut self.nodes[state.0];
			node.labels.push(label);
			node.children.push(child);
			state = child;
		}
		self.nodes[state.0].is_final = true;
	}

	fn convert(&self) -> Automaton {
		let mut a: Automaton = Automaton::new();
		let mut mapped: Vec<Option<StateId>> = vec![None; self.nodes.len()];
		mapped[ROOT.0] = Some(a.initial());
		a.set_accept(a.initial(), self.nodes[ROOT.0].is_final);

		let mut pending: Vec<(NodeId, StateId)> = vec![(ROOT, a.initial())];
		while let Some((node, state)) = pending.pop() {
			let node: &Node = &self.nodes[node.0];
			for (&label, &child) in node.labels.iter().zip(node.children.iter()) {
				let target: StateId = match mapped[child.0] {
					Some(target) => target,
					None => {
						let target: StateId = a.new_state();
						a.set_accept(target, self.nodes[child.0].is_final);
						mapped[child.0] = Some(target);
						pending.push((child, target));
						target
					},
				};
				a.add_transition(state, label, label, target);
			}
		}
		a.set_deterministic(true);
		a.reduce();
		a.number_states();
		a
	}
}

impl Default for DaciukMihovBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::basic_automata::make_string;
	use crate::minimization::minimize;
	use crate::operations::determinize;
	use crate::operations::run;
	use crate::operations::same_language;
	use crate::operations::union_all;
	use crate::special_operations::finite_strings;

	const WORDS: &[&str] = &[
		"", "a", "abc", "abcd", "abd", "b", "bcd", "bd", "cat", "cats", "dog", "dogs", "x", "xbcd", "xbd", "ybcd",
		"ÿ", "ÿbd", "日本", "日本語",
	];

	#[test]
	fn accepts_exactly_the_input() {
		let a: Automaton = DaciukMihovBuilder::build(WORDS.iter().copied()).unwrap();
		for word in WORDS {
			assert!(run(&a, word), "{word:?}");
		}
		for word in ["ab", "abcde", "c", "ca", "catss", "dogg", "y", "日", "本"] {
			assert!(!run(&a, word), "{word:?}");
		}
		let strings: Vec<Vec<u32>> = finite_strings(&a, None).unwrap();
		assert_eq!(strings.len(), WORDS.len());
	}

	#[test]
	fn matches_union_then_minimize() {
		let mut direct: Automaton = DaciukMihovBuilder::build(WORDS.iter().copied()).unwrap();
		let mut general: Automaton = union_all(WORDS.iter().map(|word| make_string(word)).collect());
		determinize(&mut general);
		minimize(&mut general);
		assert!(same_language(&mut direct, &mut general));
		// The direct construction is already minimal.
		assert_eq!(direct.num_states(), general.num_states());
	}

	#[test]
	fn shares_suffixes() {
		let a: Automaton = DaciukMihovBuilder::build(["abcd", "bbcd", "cbcd"]).unwrap();
		// root, one shared "b", "c", "d" chain, and the final state
		assert_eq!(a.num_states(), 5);
	}

	#[test]
	fn duplicates_are_accepted() {
		let a: Automaton = DaciukMihovBuilder::build(["aa", "aa", "ab"]).unwrap();
		assert!(run(&a, "aa"));
		assert!(run(&a, "ab"));
	}

	#[test]
	fn unsorted_input_is_rejected() {
		let mut builder: DaciukMihovBuilder = DaciukMihovBuilder::new();
		builder.add("b").unwrap();
		assert_eq!(
			builder.add("a"),
			Err(BuildError::Unsorted {
				previous: "b".to_owned(),
				current: "a".to_owned(),
			})
		);
	}

	#[test]
	fn completed_builder_is_rejected() {
		let mut builder: DaciukMihovBuilder = DaciukMihovBuilder::new();
		builder.add("a").unwrap();
		builder.complete().unwrap();
		assert_eq!(builder.add("b"), Err(BuildError::AlreadyCompleted));
		assert_eq!(builder.complete().unwrap_err(), BuildError::AlreadyCompleted);
	}
}
