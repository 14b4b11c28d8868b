//! Automata prepared for intersection with a sorted term dictionary.
//!
//! Simple languages (nothing, everything, one term, one prefix) are recognized
//! once so that term enumeration can compare bytes instead of stepping a run
//! automaton. Everything else is converted to UTF-8 and compiled to a
//! [`ByteRunAutomaton`].

use crate::automaton::Automaton;
use crate::automaton::Transition;
use crate::basic_automata::make_any_string;
use crate::basic_automata::make_string;
use crate::operations::concatenate;
use crate::operations::is_empty;
use crate::operations::is_total;
use crate::operations::same_language;
use crate::run_automaton::ByteRunAutomaton;
use crate::special_operations::common_prefix;
use crate::special_operations::common_suffix_bytes;
use crate::special_operations::is_finite;
use crate::terms::Terms;
use crate::utf32_to_utf8;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum AutomatonKind {
	/// Accepts no terms.
	None,
	/// Accepts every term.
	All,
	/// Accepts exactly one term.
	Single,
	/// Accepts every term starting with a prefix.
	Prefix,
	/// Anything else; matched with a run automaton.
	Normal,
}

#[derive(Debug, Clone)]
pub enum CompiledAutomaton {
	None,
	All,
	Single { term: Vec<u8> },
	Prefix { prefix: Vec<u8> },
	Normal(NormalAutomaton),
}

#[derive(Debug, Clone)]
pub struct NormalAutomaton {
	run_automaton: ByteRunAutomaton,
	/// Byte transitions of every run automaton state, sorted by label.
	sorted_transitions: Vec<Vec<Transition>>,
	/// Suffix shared by all accepted terms; only computed for infinite languages.
	common_suffix: Option<Vec<u8>>,
	finite: bool,
}

impl CompiledAutomaton {
	pub fn new(automaton: Automaton) -> Self {
		Self::with_options(automaton, None, true)
	}

	/// `finite` skips the finiteness check when the caller already knows the answer.
	/// Without `simplify`, the result is always [`AutomatonKind::Normal`].
	pub fn with_options(mut automaton: Automaton, finite: Option<bool>, simplify: bool) -> Self {
		if simplify {
			if let Some(kind) = Self::simplify(&mut automaton) {
				debug!("compiled automaton is of kind {:?}", kind.kind());
				return kind;
			}
		}

		let finite: bool = finite.unwrap_or_else(|| is_finite(&automaton));
		let mut utf8: Automaton = utf32_to_utf8::convert(&automaton);
		let common_suffix: Option<Vec<u8>> = (!finite).then(|| common_suffix_bytes(&utf8));
		let run_automaton: ByteRunAutomaton = ByteRunAutomaton::from_utf8(&mut utf8);
		// The run automaton numbered `utf8` in place, so arena indices are its states.
		let sorted_transitions: Vec<Vec<Transition>> = utf8.sorted_transitions();
		debug!(
			"compiled automaton into {} byte states (finite: {finite}, common suffix: {:?})",
			run_automaton.size(),
			common_suffix
		);
		Self::Normal(NormalAutomaton {
			run_automaton,
			sorted_transitions,
			common_suffix,
			finite,
		})
	}

	fn simplify(automaton: &mut Automaton) -> Option<Self> {
		if is_empty(automaton) {
			return Some(Self::None);
		}
		if is_total(automaton) {
			return Some(Self::All);
		}
		if let Some(term) = automaton.singleton() {
			return Some(Self::Single {
				term: term.as_bytes().to_vec(),
			});
		}
		let prefix: String = common_prefix(automaton);
		if !prefix.is_empty() && same_language(automaton, &mut make_string(&prefix)) {
			return Some(Self::Single {
				term: prefix.into_bytes(),
			});
		}
		let mut prefixed: Automaton = concatenate(make_string(&prefix), make_any_string());
		if same_language(automaton, &mut prefixed) {
			return Some(Self::Prefix {
				prefix: prefix.into_bytes(),
			});
		}
		None
	}

	pub fn kind(&self) -> AutomatonKind {
		match self {
			Self::None => AutomatonKind::None,
			Self::All => AutomatonKind::All,
			Self::Single { .. } => AutomatonKind::Single,
			Self::Prefix { .. } => AutomatonKind::Prefix,
			Self::Normal(_) => AutomatonKind::Normal,
		}
	}

	/// The single term, or the prefix.
	pub fn term(&self) -> Option<&[u8]> {
		match self {
			Self::Single { term } => Some(term.as_slice()),
			Self::Prefix { prefix } => Some(prefix.as_slice()),
			_ => None,
		}
	}

	pub fn run_automaton(&self) -> Option<&ByteRunAutomaton> {
		match self {
			Self::Normal(normal) => Some(&normal.run_automaton),
			_ => None,
		}
	}

	pub fn sorted_transitions(&self) -> Option<&[Vec<Transition>]> {
		match self {
			Self::Normal(normal) => Some(normal.sorted_transitions.as_slice()),
			_ => None,
		}
	}

	pub fn common_suffix(&self) -> Option<&[u8]> {
		match self {
			Self::Normal(normal) => normal.common_suffix.as_deref(),
			_ => None,
		}
	}

	pub fn is_finite(&self) -> Option<bool> {
		match self {
			Self::Normal(normal) => Some(normal.finite),
			_ => None,
		}
	}

	/// Whether `term` is accepted.
	pub fn matches(&self, term: &[u8]) -> bool {
		match self {
			Self::None => false,
			Self::All => true,
			Self::Single { term: single } => term == single.as_slice(),
			Self::Prefix { prefix } => term.starts_with(prefix),
			Self::Normal(normal) => {
				normal.common_suffix.as_ref().is_none_or(|suffix| term.ends_with(suffix))
					&& normal.run_automaton.run(term)
			},
		}
	}

	/// The largest accepted term that is less than or equal to `input`.
	///
	/// `None` when no accepted term is less than or equal to `input`, or when the
	/// accepted terms below `input` have no largest element (an infinite language).
	pub fn floor(&self, input: &[u8]) -> Option<Vec<u8>> {
		match self {
			Self::None => None,
			Self::All => Some(input.to_vec()),
			Self::Single { term } => (term.as_slice() <= input).then(|| term.clone()),
			Self::Prefix { prefix } => input.starts_with(prefix).then(|| input.to_vec()),
			Self::Normal(normal) => normal.floor(input),
		}
	}

	/// Terms of `terms` accepted by this automaton, in order.
	pub fn terms_enum<'a, T>(&'a self, terms: &'a T) -> Box<dyn Iterator<Item = &'a [u8]> + 'a>
	where
		T: Terms + ?Sized,
	{
		match self {
			Self::None => Box::new(std::iter::empty()),
			Self::All => terms.terms(),
			Self::Single { term } => Box::new(
				terms
					.terms()
					.skip_while(move |candidate| *candidate < term.as_slice())
					.take_while(move |candidate| *candidate == term.as_slice()),
			),
			Self::Prefix { prefix } => Box::new(
				terms
					.terms()
					.skip_while(move |candidate| *candidate < prefix.as_slice())
					.take_while(move |candidate| candidate.starts_with(prefix)),
			),
			Self::Normal(_) => terms.intersect(self, None),
		}
	}
}

impl NormalAutomaton {
	fn floor(&self, input: &[u8]) -> Option<Vec<u8>> {
		let mut state: usize = self.run_automaton.initial_state();
		if input.is_empty() {
			return self.run_automaton.is_accept(state).then(Vec::new);
		}

		let mut output: Vec<u8> = Vec::with_capacity(input.len());
		// States before each byte of `output`.
		let mut stack: Vec<usize> = Vec::new();
		let mut idx: usize = 0;
		loop {
			let mut label: u8 = input[idx];
			let mut next: Option<usize> = self.run_automaton.step(state, u32::from(label));
			if idx == input.len() - 1 {
				if next.is_some_and(|q| self.run_automaton.is_accept(q)) {
					output.push(label);
					return Some(output);
				}
				next = None;
			}

			let Some(q) = next else {
				// Back up to a state with a transition below the label.
				loop {
					let Some(first) = self.sorted_transitions[state].first() else {
						debug_assert!(self.run_automaton.is_accept(state));
						output.truncate(idx);
						return Some(output);
					};
					if u32::from(label) > first.min {
						break;
					}
					if self.run_automaton.is_accept(state) {
						output.truncate(idx);
						return Some(output);
					}
					state = stack.pop()?;
					idx -= 1;
					label = input[idx];
				}
				trace!("floor backs up to byte {idx} at state {state}");
				output.truncate(idx);
				return self.add_tail(state, output, label);
			};
			output.push(label);
			stack.push(state);
			state = q;
			idx += 1;
		}
	}

	/// Appends the largest label below `lead_label` leaving `state`, then the
	/// largest continuation down to a state without transitions.
	fn add_tail(&self, mut state: usize, mut term: Vec<u8>, lead_label: u8) -> Option<Vec<u8>> {
		let max_transition: &Transition = self.sorted_transitions[state]
			.iter()
			.rev()
			.find(|t| t.min < u32::from(lead_label))?;
		term.push(max_transition.max.min(u32::from(lead_label) - 1) as u8);
		state = max_transition.to.index();

		let mut depth: usize = 0;
		while let Some(last) = self.sorted_transitions[state].last() {
			// Longer than any acyclic path: the largest continuation never ends.
			if depth == self.sorted_transitions.len() {
				return None;
			}
			term.push(last.max as u8);
			state = last.to.index();
			depth += 1;
		}
		debug_assert!(self.run_automaton.is_accept(state));
		Some(term)
	}
}
