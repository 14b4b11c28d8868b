use pyo3::exceptions::PyRuntimeError;
use pyo3::exceptions::PyUnicodeEncodeError;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use pyo3::types::PyString;

use crate::automaton::Automaton;
use crate::compiled::CompiledAutomaton;
use crate::config::SyntaxFlags;
use crate::levenshtein::LevenshteinAutomata;
use crate::levenshtein::MAXIMUM_SUPPORTED_DISTANCE;
use crate::regexp::RegExp;
use crate::run_automaton::CharacterRunAutomaton;

pyo3::create_exception!(fuzzy_automata, FuzzyAutomataException, PyRuntimeError);
pyo3::create_exception!(fuzzy_automata, InvalidPattern, FuzzyAutomataException);

#[pyclass]
#[derive(Debug)]
struct RegexAutomaton {
	#[pyo3(get)]
	pattern: String,
	compiled: CompiledAutomaton,
}

#[pyclass]
#[derive(Debug)]
struct FuzzyAutomaton {
	#[pyo3(get)]
	word: String,
	#[pyo3(get)]
	distance: usize,
	run_automaton: CharacterRunAutomaton,
}

#[pymethods]
impl RegexAutomaton {
	#[new]
	#[pyo3(signature = (pattern, flags = SyntaxFlags::ALL.bits()))]
	fn new(pattern: &str, flags: u32) -> PyResult<Self> {
		let regexp: RegExp = RegExp::with_flags(pattern, SyntaxFlags::from_bits(flags))
			.map_err(|err| InvalidPattern::new_err(format!("Invalid pattern: {err}")))?;
		let automaton: Automaton = regexp
			.to_automaton()
			.map_err(|err| InvalidPattern::new_err(format!("Ill-formed pattern: {err}")))?;
		Ok(Self {
			pattern: pattern.to_owned(),
			compiled: CompiledAutomaton::new(automaton),
		})
	}

	/// Accepts either `str` or UTF-8 `bytes`.
	fn matches(&self, text: &Bound<'_, PyAny>) -> PyResult<bool> {
		Ok(self.compiled.matches(python_unicode_or_bytes_as_str(text)?.as_bytes()))
	}

	/// Greatest accepted term sorting at or below `term`.
	fn floor<'py>(&self, py: Python<'py>, term: &Bound<'py, PyAny>) -> PyResult<Option<Bound<'py, PyBytes>>> {
		let term: &str = python_unicode_or_bytes_as_str(term)?;
		Ok(self.compiled.floor(term.as_bytes()).map(|floor| PyBytes::new(py, &floor)))
	}

	#[getter]
	fn kind(&self) -> String {
		format!("{:?}", self.compiled.kind())
	}
}

#[pymethods]
impl FuzzyAutomaton {
	#[new]
	#[pyo3(signature = (word, distance, transpositions = true))]
	fn new(word: &str, distance: usize, transpositions: bool) -> PyResult<Self> {
		let Some(automaton): Option<Automaton> = LevenshteinAutomata::new(word, transpositions).to_automaton(distance)
		else {
			return Err(PyValueError::new_err(format!(
				"Distance {distance} exceeds the supported maximum {MAXIMUM_SUPPORTED_DISTANCE}"
			)));
		};
		Ok(Self {
			word: word.to_owned(),
			distance,
			run_automaton: CharacterRunAutomaton::new(&automaton),
		})
	}

	fn matches(&self, text: &Bound<'_, PyAny>) -> PyResult<bool> {
		Ok(self.run_automaton.run(python_unicode_or_bytes_as_str(text)?))
	}
}

fn python_unicode_or_bytes_as_str<'a>(input: &'a Bound<'_, PyAny>) -> PyResult<&'a str> {
	if let Ok(unicode) = input.cast::<PyString>() {
		Ok(unicode.to_str()?)
	} else if let Ok(bytes) = input.cast::<PyBytes>() {
		match str::from_utf8(bytes.as_bytes()) {
			Ok(utf8) => Ok(utf8),
			Err(err) => Err(PyUnicodeEncodeError::new_err(err.to_string())),
		}
	} else {
		Err(FuzzyAutomataException::new_err("Expected str or bytes"))
	}
}

#[pymodule]
mod fuzzy_automata {
	use pyo3::prelude::*;

	#[pymodule_export]
	use super::FuzzyAutomaton;
	#[pymodule_export]
	use super::RegexAutomaton;

	#[pymodule_init]
	fn init(m: &Bound<'_, PyModule>) -> PyResult<()> {
		m.add("FuzzyAutomataException", m.py().get_type::<super::FuzzyAutomataException>())?;
		m.add("InvalidPattern", m.py().get_type::<super::InvalidPattern>())?;
		Ok(())
	}
}
