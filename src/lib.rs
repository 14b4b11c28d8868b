#[macro_use(debug, trace)]
extern crate tracing;

pub mod automaton;
pub mod basic_automata;
pub mod compiled;
pub mod config;
pub mod daciuk_mihov;
pub mod interval_tree;
pub mod levenshtein;
pub mod minimization;
pub mod operations;
pub mod parametric;
pub mod regexp;
pub mod run_automaton;
pub mod special_operations;
pub mod terms;
pub mod utf32_to_utf8;

#[cfg(feature = "python")]
pub mod python_interface;
