//! The term dictionary side of automaton matching.

use std::collections::BTreeSet;

use crate::compiled::CompiledAutomaton;

/// A sorted collection of byte string terms.
pub trait Terms {
	/// Every term, in ascending byte order.
	fn terms(&self) -> Box<dyn Iterator<Item = &[u8]> + '_>;

	/// Terms accepted by `compiled` that sort after `start_term`, if given.
	///
	/// Dictionaries with a seekable layout should override this; the default
	/// visits every term and checks the common suffix before running the automaton.
	fn intersect<'a>(
		&'a self,
		compiled: &'a CompiledAutomaton,
		start_term: Option<&'a [u8]>,
	) -> Box<dyn Iterator<Item = &'a [u8]> + 'a> {
		Box::new(
			self.terms()
				.skip_while(move |term| start_term.is_some_and(|start| *term <= start))
				.filter(move |term| compiled.matches(term)),
		)
	}
}

impl Terms for BTreeSet<Vec<u8>> {
	fn terms(&self) -> Box<dyn Iterator<Item = &[u8]> + '_> {
		Box::new(self.iter().map(Vec::as_slice))
	}
}
