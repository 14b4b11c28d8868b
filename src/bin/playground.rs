use std::collections::BTreeSet;

use fuzzy_automata::automaton::*;
use fuzzy_automata::compiled::*;
use fuzzy_automata::levenshtein::*;
use fuzzy_automata::regexp::*;
use fuzzy_automata::run_automaton::*;
use fuzzy_automata::special_operations::*;

fn main() -> Result<(), RegExpError> {
	let r: RegExp = RegExp::new("(foo|ba[rz])+x?")?;
	println!("parsed: {r}");
	let a: Automaton = r.to_automaton()?;
	println!("{a}");
	println!("{}", a.to_dot());

	let run: CharacterRunAutomaton = CharacterRunAutomaton::new(&a);
	for input in ["foo", "foobazx", "fooba", "x"] {
		println!("{input:?} matched: {}", run.run(input));
	}

	let compiled: CompiledAutomaton = CompiledAutomaton::new(a);
	println!("kind: {:?}", compiled.kind());
	for input in ["bat", "foofoo", "zzz", "a"] {
		let floor: Option<String> = compiled
			.floor(input.as_bytes())
			.map(|floor| String::from_utf8_lossy(&floor).into_owned());
		println!("floor of {input:?}: {floor:?}");
	}

	let dictionary: BTreeSet<Vec<u8>> = ["bar", "barx", "baz", "foo", "foobar", "qux"]
		.iter()
		.map(|term| term.as_bytes().to_vec())
		.collect();
	let matched: Vec<String> = compiled
		.terms_enum(&dictionary)
		.map(|term| String::from_utf8_lossy(term).into_owned())
		.collect();
	println!("dictionary matches: {matched:?}");

	let fuzzy: Automaton = LevenshteinAutomata::new("food", true)
		.to_automaton(1)
		.unwrap_or_else(Automaton::new);
	println!("levenshtein automaton has {} states", fuzzy.num_states());
	let fuzzy: CharacterRunAutomaton = CharacterRunAutomaton::new(&fuzzy);
	for input in ["food", "ofod", "fodder", "good"] {
		println!("{input:?} within one edit: {}", fuzzy.run(input));
	}

	let finite: Automaton = RegExp::new("(a|b)(c|d)?")?.to_automaton()?;
	if let Some(strings) = finite_strings(&finite, None) {
		for string in strings {
			let string: String = string.iter().filter_map(|&c| char::from_u32(c)).collect();
			println!("finite string: {string:?}");
		}
	}
	Ok(())
}
