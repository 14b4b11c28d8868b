//! Regular expressions over code points, compiled to automata.
//!
//! ```text
//! union         ::= intersection ('|' intersection)*
//! intersection  ::= concatenation ('&' concatenation)*        [INTERSECTION]
//! concatenation ::= repeat+
//! repeat        ::= complement ('?' | '*' | '+' | '{n}' | '{n,}' | '{n,m}')*
//! complement    ::= '~'* char_class                            [COMPLEMENT]
//! char_class    ::= '[' '^'? (char ('-' char)?)+ ']' | simple
//! simple        ::= '.' | '#' [EMPTY] | '@' [ANYSTRING] | '"' <any>* '"'
//!                 | '(' ')' | '(' union ')'
//!                 | '<' identifier '>' [AUTOMATON] | '<' n '-' m '>' [INTERVAL]
//!                 | char
//! char          ::= '\'? <any>
//! ```
//!
//! Operators whose flag is disabled, and special characters that are not in
//! operator position, are literals.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::io;

use nom::Err as NomErr;
use nom::IResult;
use nom::Parser;
use nom::error::ErrorKind as NomErrorKind;
use nom::error::ParseError;

use crate::automaton::Automaton;
use crate::automaton::AutomatonError;
use crate::basic_automata::make_any_char;
use crate::basic_automata::make_any_string;
use crate::basic_automata::make_char;
use crate::basic_automata::make_char_range;
use crate::basic_automata::make_empty;
use crate::basic_automata::make_interval;
use crate::basic_automata::make_string;
use crate::config::AutomatonConfig;
use crate::config::SyntaxFlags;
use crate::minimization::minimize;
use crate::operations::Operations;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RegExp {
	Union(Box<RegExp>, Box<RegExp>),
	Concatenation(Box<RegExp>, Box<RegExp>),
	Intersection(Box<RegExp>, Box<RegExp>),
	Optional(Box<RegExp>),
	Repeat(Box<RegExp>),
	RepeatMin {
		item: Box<RegExp>,
		min: usize,
	},
	RepeatRange {
		item: Box<RegExp>,
		min: usize,
		max: usize,
	},
	Complement(Box<RegExp>),
	Char(char),
	CharRange(char, char),
	AnyChar,
	Empty,
	String(String),
	AnyString,
	/// `<name>`, resolved by an [`AutomatonProvider`].
	Named(String),
	/// `<min-max>`; numbers are written with exactly `digits` digits unless `digits` is zero.
	Interval {
		min: u32,
		max: u32,
		digits: usize,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum RegExpError {
	#[error("{kind} at position {position}")]
	Syntax { position: usize, kind: SyntaxErrorKind },
	#[error("automaton '{0}' not found")]
	UnknownAutomaton(String),
	#[error("failed to load automaton '{name}'")]
	Provider {
		name: String,
		#[source]
		source: io::Error,
	},
	#[error(transparent)]
	Automaton(#[from] AutomatonError),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum SyntaxErrorKind {
	#[error("unexpected end of pattern")]
	UnexpectedEnd,
	#[error("end of pattern expected")]
	ExpectedEnd,
	#[error("expected '{0}'")]
	ExpectedChar(char),
	#[error("integer expected")]
	ExpectedInteger,
	#[error("number too big")]
	NumberTooBig,
	#[error("invalid range {from:?}-{to:?}")]
	InvalidRange { from: char, to: char },
	#[error("interval syntax error")]
	InvalidInterval,
	#[error("illegal identifier")]
	IllegalIdentifier,
	#[error("parse error ({0:?})")]
	Nom(NomErrorKind),
}

/// Resolves the `<name>` automata of a regular expression.
pub trait AutomatonProvider {
	fn automaton(&self, name: &str) -> io::Result<Option<Automaton>>;
}

impl<S: BuildHasher> AutomatonProvider for HashMap<String, Automaton, S> {
	fn automaton(&self, name: &str) -> io::Result<Option<Automaton>> {
		Ok(self.get(name).cloned())
	}
}

impl AutomatonProvider for BTreeMap<String, Automaton> {
	fn automaton(&self, name: &str) -> io::Result<Option<Automaton>> {
		Ok(self.get(name).cloned())
	}
}

#[derive(Debug)]
struct RegExpParsingError<'a> {
	input: &'a str,
	kind: SyntaxErrorKind,
}

impl<'a> ParseError<&'a str> for RegExpParsingError<'a> {
	fn from_error_kind(input: &'a str, nom: NomErrorKind) -> Self {
		Self {
			input,
			kind: SyntaxErrorKind::Nom(nom),
		}
	}

	fn append(_input: &'a str, _kind: NomErrorKind, other: Self) -> Self {
		other
	}
}

impl<'a> RegExpParsingError<'a> {
	fn new(input: &'a str, kind: SyntaxErrorKind) -> Self {
		Self { input, kind }
	}
}

type ParsingResult<'a, T> = IResult<&'a str, T, RegExpParsingError<'a>>;

impl RegExp {
	/// Parses `pattern` with every optional operator enabled.
	pub fn new(pattern: &str) -> Result<Self, RegExpError> {
		Self::with_flags(pattern, SyntaxFlags::ALL)
	}

	pub fn with_flags(pattern: &str, flags: SyntaxFlags) -> Result<Self, RegExpError> {
		if pattern.is_empty() {
			return Ok(Self::String(String::new()));
		}
		match parse_to_end(pattern, flags) {
			Ok((_, regexp)) => Ok(regexp),
			Err(NomErr::Incomplete(_)) => Err(RegExpError::Syntax {
				position: pattern.chars().count(),
				kind: SyntaxErrorKind::UnexpectedEnd,
			}),
			Err(NomErr::Error(err) | NomErr::Failure(err)) => {
				let consumed: &str = pattern.strip_suffix(err.input).unwrap_or(pattern);
				Err(RegExpError::Syntax {
					position: consumed.chars().count(),
					kind: err.kind,
				})
			},
		}
	}

	fn union(left: RegExp, right: RegExp) -> RegExp {
		Self::Union(Box::new(left), Box::new(right))
	}

	fn intersection(left: RegExp, right: RegExp) -> RegExp {
		Self::Intersection(Box::new(left), Box::new(right))
	}

	/// Joins adjacent literals into a single string node.
	fn concatenation(left: RegExp, right: RegExp) -> RegExp {
		match (left, right) {
			(left, right) if left.is_literal() && right.is_literal() => Self::joined(&left, &right),
			(Self::Concatenation(first, last), right) if last.is_literal() && right.is_literal() => {
				Self::Concatenation(first, Box::new(Self::joined(&last, &right)))
			},
			(left, Self::Concatenation(first, rest)) if left.is_literal() && first.is_literal() => {
				Self::Concatenation(Box::new(Self::joined(&left, &first)), rest)
			},
			(left, right) => Self::Concatenation(Box::new(left), Box::new(right)),
		}
	}

	fn is_literal(&self) -> bool {
		matches!(self, Self::Char(_) | Self::String(_))
	}

	fn joined(left: &RegExp, right: &RegExp) -> RegExp {
		let mut string: String = String::new();
		for literal in [left, right] {
			match literal {
				Self::Char(ch) => string.push(*ch),
				Self::String(s) => string.push_str(s),
				_ => unreachable!("only literals are joined"),
			}
		}
		Self::String(string)
	}

	/// Names of the `<name>` automata this expression refers to.
	pub fn identifiers(&self) -> BTreeSet<String> {
		let mut identifiers: BTreeSet<String> = BTreeSet::new();
		let mut stack: Vec<&RegExp> = vec![self];
		while let Some(node) = stack.pop() {
			match node {
				Self::Union(left, right) | Self::Concatenation(left, right) | Self::Intersection(left, right) => {
					stack.push(right);
					stack.push(left);
				},
				Self::Optional(item)
				| Self::Repeat(item)
				| Self::RepeatMin { item, .. }
				| Self::RepeatRange { item, .. }
				| Self::Complement(item) => stack.push(item),
				Self::Named(name) => {
					identifiers.insert(name.clone());
				},
				_ => (),
			}
		}
		identifiers
	}

	/// Compiles to a minimal automaton; `<name>` references fail to resolve.
	pub fn to_automaton(&self) -> Result<Automaton, RegExpError> {
		self.compile(None, &Operations::default())
	}

	pub fn to_automaton_with(&self, provider: &dyn AutomatonProvider) -> Result<Automaton, RegExpError> {
		self.to_automaton_with_config(provider, AutomatonConfig::default())
	}

	pub fn to_automaton_with_config(
		&self,
		provider: &dyn AutomatonProvider,
		config: AutomatonConfig,
	) -> Result<Automaton, RegExpError> {
		self.compile(Some(provider), &Operations::new(config))
	}

	fn compile(&self, provider: Option<&dyn AutomatonProvider>, operations: &Operations) -> Result<Automaton, RegExpError> {
		let a: Automaton = self.lower(provider, operations)?;
		debug!("compiled {self} into {} states", a.num_states());
		Ok(a)
	}

	fn lower(&self, provider: Option<&dyn AutomatonProvider>, operations: &Operations) -> Result<Automaton, RegExpError> {
		let mut a: Automaton = match self {
			Self::Union(..) => operations.union_all(self.lower_leaves(provider, operations)?),
			Self::Concatenation(..) => operations.concatenate_all(self.lower_leaves(provider, operations)?),
			Self::Intersection(left, right) => {
				operations.intersection(left.lower(provider, operations)?, right.lower(provider, operations)?)
			},
			Self::Optional(item) => operations.optional(item.lower(provider, operations)?),
			Self::Repeat(item) => operations.repeat(item.lower(provider, operations)?),
			Self::RepeatMin { item, min } => operations.repeat_min(item.lower(provider, operations)?, *min),
			Self::RepeatRange { item, min, max } => operations.repeat_range(item.lower(provider, operations)?, *min, *max),
			Self::Complement(item) => operations.complement(item.lower(provider, operations)?),
			Self::Char(ch) => return Ok(make_char(*ch)),
			Self::CharRange(from, to) => return Ok(make_char_range(u32::from(*from), u32::from(*to))),
			Self::AnyChar => return Ok(make_any_char()),
			Self::Empty => return Ok(make_empty()),
			Self::String(s) => return Ok(make_string(s)),
			Self::AnyString => return Ok(make_any_string()),
			Self::Named(name) => {
				let found: Option<Automaton> = match provider {
					Some(provider) => provider.automaton(name).map_err(|source| RegExpError::Provider {
						name: name.clone(),
						source,
					})?,
					None => None,
				};
				return found.ok_or_else(|| RegExpError::UnknownAutomaton(name.clone()));
			},
			Self::Interval { min, max, digits } => return Ok(make_interval(*min, *max, *digits)?),
		};
		minimize(&mut a);
		trace!("{self} has {} states", a.num_states());
		Ok(a)
	}

	/// Lowers the operands of a chain of unions (or concatenations), in order.
	fn lower_leaves(
		&self,
		provider: Option<&dyn AutomatonProvider>,
		operations: &Operations,
	) -> Result<Vec<Automaton>, RegExpError> {
		let mut leaves: Vec<Automaton> = Vec::new();
		let mut stack: Vec<&RegExp> = vec![self];
		while let Some(node) = stack.pop() {
			match node {
				Self::Union(left, right) if matches!(self, Self::Union(..)) => {
					stack.push(right);
					stack.push(left);
				},
				Self::Concatenation(left, right) if matches!(self, Self::Concatenation(..)) => {
					stack.push(right);
					stack.push(left);
				},
				_ => leaves.push(node.lower(provider, operations)?),
			}
		}
		Ok(leaves)
	}
}

impl std::str::FromStr for RegExp {
	type Err = RegExpError;

	fn from_str(pattern: &str) -> Result<Self, RegExpError> {
		Self::new(pattern)
	}
}

impl std::fmt::Display for RegExp {
	fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Union(left, right) => write!(fmt, "({left}|{right})"),
			Self::Concatenation(left, right) => write!(fmt, "{left}{right}"),
			Self::Intersection(left, right) => write!(fmt, "({left}&{right})"),
			Self::Optional(item) => write!(fmt, "({item})?"),
			Self::Repeat(item) => write!(fmt, "({item})*"),
			Self::RepeatMin { item, min } => write!(fmt, "({item}){{{min},}}"),
			Self::RepeatRange { item, min, max } => write!(fmt, "({item}){{{min},{max}}}"),
			Self::Complement(item) => write!(fmt, "~({item})"),
			Self::Char(ch) => write!(fmt, "\\{ch}"),
			Self::CharRange(from, to) => write!(fmt, "[\\{from}-\\{to}]"),
			Self::AnyChar => fmt.write_str("."),
			Self::Empty => fmt.write_str("#"),
			Self::String(s) => write!(fmt, "\"{s}\""),
			Self::AnyString => fmt.write_str("@"),
			Self::Named(name) => write!(fmt, "<{name}>"),
			Self::Interval { min, max, digits } => write!(fmt, "<{min:0>width$}-{max:0>width$}>", width = *digits),
		}
	}
}

/// Nests to the right: `a, [b, c]` becomes `combine(a, combine(b, c))`.
fn nest_right(first: RegExp, mut rest: Vec<RegExp>, combine: fn(RegExp, RegExp) -> RegExp) -> RegExp {
	let Some(last) = rest.pop() else {
		return first;
	};
	let tail: RegExp = rest.into_iter().rev().fold(last, |right, left| combine(left, right));
	combine(first, tail)
}

fn parse_to_end(input: &str, flags: SyntaxFlags) -> ParsingResult<'_, RegExp> {
	let (input, regexp): (&str, RegExp) = parse_union(input, flags)?;
	if !input.is_empty() {
		return failure(input, SyntaxErrorKind::ExpectedEnd);
	}
	Ok((input, regexp))
}

fn parse_union<'a>(input: &'a str, flags: SyntaxFlags) -> ParsingResult<'a, RegExp> {
	use nom::combinator::cut;
	use nom::multi::many0;
	use nom::sequence::preceded;

	let (input, first): (&str, RegExp) = parse_intersection(input, flags)?;
	let (input, rest): (&str, Vec<RegExp>) = many0(preceded(
		parse_char::<'|'>,
		cut(move |input: &'a str| parse_intersection(input, flags)),
	))
	.parse(input)?;

	Ok((input, nest_right(first, rest, RegExp::union)))
}

fn parse_intersection<'a>(input: &'a str, flags: SyntaxFlags) -> ParsingResult<'a, RegExp> {
	use nom::combinator::cut;
	use nom::multi::many0;
	use nom::sequence::preceded;

	let (input, first): (&str, RegExp) = parse_concatenation(input, flags)?;
	if !flags.contains(SyntaxFlags::INTERSECTION) {
		return Ok((input, first));
	}
	let (input, rest): (&str, Vec<RegExp>) = many0(preceded(
		parse_char::<'&'>,
		cut(move |input: &'a str| parse_concatenation(input, flags)),
	))
	.parse(input)?;

	Ok((input, nest_right(first, rest, RegExp::intersection)))
}

fn parse_concatenation(input: &str, flags: SyntaxFlags) -> ParsingResult<'_, RegExp> {
	let (mut input, first): (&str, RegExp) = parse_repeat(input, flags)?;

	let mut rest: Vec<RegExp> = Vec::new();
	while continues_concatenation(input, flags) {
		let (remaining, item): (&str, RegExp) = parse_repeat(input, flags)?;
		input = remaining;
		rest.push(item);
	}

	Ok((input, nest_right(first, rest, RegExp::concatenation)))
}

fn continues_concatenation(input: &str, flags: SyntaxFlags) -> bool {
	match input.chars().next() {
		None | Some(')' | '|') => false,
		Some('&') => !flags.contains(SyntaxFlags::INTERSECTION),
		Some(_) => true,
	}
}

fn parse_repeat(input: &str, flags: SyntaxFlags) -> ParsingResult<'_, RegExp> {
	use nom::branch::alt;

	enum Suffix {
		Optional,
		Star,
		Plus,
		Bound(usize, Option<usize>),
	}

	let (mut input, mut regexp): (&str, RegExp) = parse_complement(input, flags)?;

	loop {
		let suffix: Suffix = match alt((
			parse_char::<'?'>.map(|_| Suffix::Optional),
			parse_char::<'*'>.map(|_| Suffix::Star),
			parse_char::<'+'>.map(|_| Suffix::Plus),
			parse_repetition_bound.map(|(min, max)| Suffix::Bound(min, max)),
		))
		.parse(input)
		{
			Ok((remaining, suffix)) => {
				input = remaining;
				suffix
			},
			Err(NomErr::Error(_)) => break,
			Err(err) => return Err(err),
		};

		let item: Box<RegExp> = Box::new(regexp);
		regexp = match suffix {
			Suffix::Optional => RegExp::Optional(item),
			Suffix::Star => RegExp::Repeat(item),
			Suffix::Plus => RegExp::RepeatMin { item, min: 1 },
			Suffix::Bound(min, Some(max)) => RegExp::RepeatRange { item, min, max },
			Suffix::Bound(min, None) => RegExp::RepeatMin { item, min },
		};
	}

	Ok((input, regexp))
}

/// `{n}`, `{n,}` or `{n,m}`; an open upper bound is `None`.
fn parse_repetition_bound(input: &str) -> ParsingResult<'_, (usize, Option<usize>)> {
	use nom::combinator::opt;
	use nom::sequence::preceded;

	combinator_surrounded_cut::<'{', '}', _, _>((parse_digits, opt(preceded(parse_char::<','>, opt(parse_digits)))))
		.map(|(min, max)| match max {
			None => (min, Some(min)),
			Some(max) => (min, max),
		})
		.parse(input)
}

fn parse_complement(input: &str, flags: SyntaxFlags) -> ParsingResult<'_, RegExp> {
	use nom::multi::many0_count;

	let (input, count): (&str, usize) = if flags.contains(SyntaxFlags::COMPLEMENT) {
		many0_count(parse_char::<'~'>).parse(input)?
	} else {
		(input, 0)
	};

	let (input, mut regexp): (&str, RegExp) = parse_char_class_expression(input, flags)?;
	for _ in 0..count {
		regexp = RegExp::Complement(Box::new(regexp));
	}
	Ok((input, regexp))
}

// ========================================

fn parse_char_class_expression(input: &str, flags: SyntaxFlags) -> ParsingResult<'_, RegExp> {
	match combinator_surrounded_cut::<'[', ']', _, _>(parse_char_classes).parse(input) {
		Err(NomErr::Error(_)) => parse_simple(input, flags),
		result => result,
	}
}

fn parse_char_classes(input: &str) -> ParsingResult<'_, RegExp> {
	use nom::combinator::opt;

	let (input, negated): (&str, Option<char>) = opt(parse_char::<'^'>).parse(input)?;

	let (mut input, mut regexp): (&str, RegExp) = parse_char_class(input)?;
	while !input.is_empty() && !input.starts_with(']') {
		let (remaining, class): (&str, RegExp) = parse_char_class(input)?;
		input = remaining;
		regexp = RegExp::union(regexp, class);
	}

	if negated.is_some() {
		regexp = RegExp::intersection(RegExp::AnyChar, RegExp::Complement(Box::new(regexp)));
	}
	Ok((input, regexp))
}

fn parse_char_class(original_input: &str) -> ParsingResult<'_, RegExp> {
	let (input, from): (&str, char) = parse_char_expression(original_input)?;

	let Ok((input, _)) = parse_char::<'-'>(input) else {
		return Ok((input, RegExp::Char(from)));
	};
	let (input, to): (&str, char) = parse_char_expression(input)?;
	if from > to {
		return failure(original_input, SyntaxErrorKind::InvalidRange { from, to });
	}
	Ok((input, RegExp::CharRange(from, to)))
}

// ========================================

fn parse_simple<'a>(input: &'a str, flags: SyntaxFlags) -> ParsingResult<'a, RegExp> {
	use nom::branch::alt;
	use nom::bytes::complete::take_till;

	alt((
		parse_char::<'.'>.map(|_| RegExp::AnyChar),
		when_enabled(flags, SyntaxFlags::EMPTY, parse_char::<'#'>).map(|_| RegExp::Empty),
		when_enabled(flags, SyntaxFlags::ANYSTRING, parse_char::<'@'>).map(|_| RegExp::AnyString),
		combinator_surrounded_cut::<'"', '"', _, _>(take_till(|ch: char| ch == '"'))
			.map(|string: &str| RegExp::String(string.to_owned())),
		(parse_char::<'('>, parse_char::<')'>).map(|_| RegExp::String(String::new())),
		combinator_surrounded_cut::<'(', ')', _, _>(move |input: &'a str| parse_union(input, flags)),
		when_enabled(
			flags,
			SyntaxFlags::AUTOMATON | SyntaxFlags::INTERVAL,
			move |input: &'a str| parse_angle_brackets(input, flags),
		),
		parse_char_expression.map(RegExp::Char),
	))
	.parse(input)
}

/// `<name>` or `<min-max>`.
fn parse_angle_brackets(input: &str, flags: SyntaxFlags) -> ParsingResult<'_, RegExp> {
	use nom::bytes::complete::take_till;

	let (remaining, inside): (&str, &str) =
		combinator_surrounded_cut::<'<', '>', _, _>(take_till(|ch: char| ch == '>')).parse(input)?;
	let close: &str = &input['<'.len_utf8() + inside.len()..];

	let dashes: Vec<usize> = inside.match_indices('-').map(|(i, _)| i).collect();
	match dashes.as_slice() {
		[] if flags.contains(SyntaxFlags::AUTOMATON) => Ok((remaining, RegExp::Named(inside.to_owned()))),
		[] => failure(close, SyntaxErrorKind::InvalidInterval),
		_ if !flags.contains(SyntaxFlags::INTERVAL) => failure(close, SyntaxErrorKind::IllegalIdentifier),
		&[dash] if (dash > 0) && (dash < inside.len() - 1) => {
			let (min, max): (&str, &str) = (&inside[..dash], &inside[dash + 1..]);
			let (Ok(first), Ok(second)) = (min.parse::<u32>(), max.parse::<u32>()) else {
				return failure(close, SyntaxErrorKind::InvalidInterval);
			};
			let digits: usize = if min.len() == max.len() { min.len() } else { 0 };
			Ok((
				remaining,
				RegExp::Interval {
					min: first.min(second),
					max: first.max(second),
					digits,
				},
			))
		},
		_ => failure(close, SyntaxErrorKind::InvalidInterval),
	}
}

/// Any character, optionally escaped with `\`.
fn parse_char_expression(input: &str) -> ParsingResult<'_, char> {
	use nom::character::complete::anychar;
	use nom::combinator::opt;

	let (input, _): (&str, Option<char>) = opt(parse_char::<'\\'>).parse(input)?;
	match anychar::<&str, RegExpParsingError<'_>>(input) {
		Ok(ok) => Ok(ok),
		Err(_) => failure(input, SyntaxErrorKind::UnexpectedEnd),
	}
}

fn parse_char<const CHAR: char>(input: &str) -> ParsingResult<'_, char> {
	let mut chars: std::str::Chars = input.chars();

	if let Some(ch) = chars.next() {
		if ch == CHAR {
			return Ok((chars.as_str(), ch));
		}
	}

	Err(NomErr::Error(RegExpParsingError::new(
		input,
		SyntaxErrorKind::ExpectedChar(CHAR),
	)))
}

fn parse_digits(input: &str) -> ParsingResult<'_, usize> {
	use nom::character::complete::digit1;

	match digit1::<&str, RegExpParsingError<'_>>(input) {
		Ok((remaining, lexeme)) => match lexeme.parse::<usize>() {
			Ok(n) => Ok((remaining, n)),
			Err(_) => failure(input, SyntaxErrorKind::NumberTooBig),
		},
		Err(err @ NomErr::Incomplete(_)) => Err(err),
		Err(NomErr::Error(_) | NomErr::Failure(_)) => Err(NomErr::Error(RegExpParsingError::new(
			input,
			SyntaxErrorKind::ExpectedInteger,
		))),
	}
}

// ==================================

fn failure<T>(input: &str, kind: SyntaxErrorKind) -> ParsingResult<'_, T> {
	Err(NomErr::Failure(RegExpParsingError::new(input, kind)))
}

/// Runs `inside` only if any of `required` is enabled; otherwise fails softly
/// so the operator character can be read as a literal.
fn when_enabled<'a, O, F>(
	flags: SyntaxFlags,
	required: SyntaxFlags,
	mut inside: F,
) -> impl Parser<&'a str, Output = O, Error = RegExpParsingError<'a>>
where
	F: Parser<&'a str, Output = O, Error = RegExpParsingError<'a>>,
{
	move |input: &'a str| {
		if flags.intersects(required) {
			inside.parse(input)
		} else {
			Err(NomErr::Error(RegExpParsingError::from_error_kind(input, NomErrorKind::Verify)))
		}
	}
}

fn combinator_surrounded_cut<'a, const OPEN: char, const CLOSE: char, O, F>(
	mut inside: F,
) -> impl Parser<&'a str, Output = O, Error = RegExpParsingError<'a>>
where
	F: Parser<&'a str, Output = O, Error = RegExpParsingError<'a>>,
{
	move |input: &'a str| {
		let (input, _): (&str, char) = parse_char::<OPEN>(input)?;

		let (input, output): (&str, O) = match inside.parse(input) {
			Ok(ok) => ok,
			Err(err @ NomErr::Incomplete(_)) => {
				return Err(err);
			},
			Err(NomErr::Error(err) | NomErr::Failure(err)) => {
				// The opening character commits us: the inside must match.
				return Err(NomErr::Failure(err));
			},
		};

		let (input, _): (&str, char) = match parse_char::<CLOSE>(input) {
			Ok(ok) => ok,
			Err(_) => {
				return failure(input, SyntaxErrorKind::ExpectedChar(CLOSE));
			},
		};

		Ok((input, output))
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::operations::run;
	use crate::operations::same_language;

	fn compile(pattern: &str) -> Automaton {
		RegExp::new(pattern).unwrap().to_automaton().unwrap()
	}

	fn syntax_error(pattern: &str, flags: SyntaxFlags) -> (usize, SyntaxErrorKind) {
		match RegExp::with_flags(pattern, flags).unwrap_err() {
			RegExpError::Syntax { position, kind } => (position, kind),
			other => panic!("unexpected error {other:?}"),
		}
	}

	#[test]
	fn optional_and_star() {
		let a: Automaton = compile("ab?c*");
		for accepted in ["ac", "abc", "accc", "a", "ab"] {
			assert!(run(&a, accepted), "{accepted:?}");
		}
		for rejected in ["bc", "", "abb", "acb", "ca"] {
			assert!(!run(&a, rejected), "{rejected:?}");
		}
		assert_eq!(RegExp::new("ab?c*").unwrap().to_string(), "\\a(\\b)?(\\c)*");
	}

	#[test]
	fn canonical_printing() {
		let cases: &[(&str, &str)] = &[
			("abc", "\"abc\""),
			("a|b|c", "(\\a|(\\b|\\c))"),
			("[a-c]", "[\\a-\\c]"),
			("[^a]", "(.&~(\\a))"),
			("[ab]", "(\\a|\\b)"),
			("x{2,3}", "(\\x){2,3}"),
			("x{2,}", "(\\x){2,}"),
			("x{2}", "(\\x){2,2}"),
			("x+", "(\\x){1,}"),
			("(a)b", "\"ab\""),
			("a*bc", "(\\a)*\"bc\""),
			("(a*b)c", "(\\a)*\"bc\""),
			("a&b&c", "(\\a&(\\b&\\c))"),
			("~~a", "~(~(\\a))"),
			("<7-10>", "<7-10>"),
			("<10-07>", "<07-10>"),
			("<name>", "<name>"),
			("\"a|b\"", "\"a|b\""),
			("()", "\"\""),
			("", "\"\""),
			("**", "(\\*)*"),
			("|a", "\"|a\""),
			("\\.", "\\."),
			("#@.", "#@."),
		];
		for &(pattern, printed) in cases {
			assert_eq!(RegExp::new(pattern).unwrap().to_string(), printed, "{pattern:?}");
		}
	}

	#[test]
	fn disabled_operators_are_literals() {
		let regexp: RegExp = RegExp::with_flags("a&b~c#@", SyntaxFlags::NONE).unwrap();
		assert_eq!(regexp, RegExp::String("a&b~c#@".to_owned()));
		let regexp: RegExp = RegExp::with_flags("<ab>", SyntaxFlags::NONE).unwrap();
		assert_eq!(regexp, RegExp::String("<ab>".to_owned()));
		let a: Automaton = RegExp::with_flags("~a", SyntaxFlags::INTERSECTION).unwrap().to_automaton().unwrap();
		assert!(run(&a, "~a"));
	}

	#[test]
	fn syntax_errors() {
		let all: SyntaxFlags = SyntaxFlags::ALL;
		assert_eq!(syntax_error("(ab", all), (3, SyntaxErrorKind::ExpectedChar(')')));
		assert_eq!(syntax_error("ab)", all), (2, SyntaxErrorKind::ExpectedEnd));
		assert_eq!(syntax_error("a{x}", all), (2, SyntaxErrorKind::ExpectedInteger));
		assert_eq!(syntax_error("a{1", all), (3, SyntaxErrorKind::ExpectedChar('}')));
		assert_eq!(syntax_error("a{1,2", all), (5, SyntaxErrorKind::ExpectedChar('}')));
		assert_eq!(syntax_error("[ab", all), (3, SyntaxErrorKind::ExpectedChar(']')));
		assert_eq!(syntax_error("[^]", all), (3, SyntaxErrorKind::ExpectedChar(']')));
		assert_eq!(
			syntax_error("x[b-a]", all),
			(2, SyntaxErrorKind::InvalidRange { from: 'b', to: 'a' })
		);
		assert_eq!(syntax_error("a|", all), (2, SyntaxErrorKind::UnexpectedEnd));
		assert_eq!(syntax_error("\\", all), (1, SyntaxErrorKind::UnexpectedEnd));
		assert_eq!(syntax_error("\"abc", all), (4, SyntaxErrorKind::ExpectedChar('"')));
		assert_eq!(syntax_error("<a-b>", all), (4, SyntaxErrorKind::InvalidInterval));
		assert_eq!(syntax_error("<1-2-3>", all), (6, SyntaxErrorKind::InvalidInterval));
		assert_eq!(syntax_error("<-3>", all), (3, SyntaxErrorKind::InvalidInterval));
		assert_eq!(syntax_error("<ab>", SyntaxFlags::INTERVAL), (3, SyntaxErrorKind::InvalidInterval));
		assert_eq!(syntax_error("<1-2>", SyntaxFlags::AUTOMATON), (4, SyntaxErrorKind::IllegalIdentifier));
		assert_eq!(syntax_error("<ab", all), (3, SyntaxErrorKind::ExpectedChar('>')));
		assert_eq!(syntax_error("a{99999999999999999999999}", all), (2, SyntaxErrorKind::NumberTooBig));
		// Positions count characters, not bytes.
		assert_eq!(syntax_error("é(ab", all), (4, SyntaxErrorKind::ExpectedChar(')')));

		let message: String = RegExp::new("(ab").unwrap_err().to_string();
		assert_eq!(message, "expected ')' at position 3");
	}

	#[test]
	fn operators() {
		let a: Automaton = compile("[a-z]+&~(abc)");
		assert!(run(&a, "abd"));
		assert!(!run(&a, "abc"));
		assert!(!run(&a, ""));

		let a: Automaton = compile("[^b]");
		assert!(run(&a, "a"));
		assert!(run(&a, "日"));
		assert!(!run(&a, "b"));
		assert!(!run(&a, "aa"));

		assert!(!run(&compile("#"), ""));
		assert!(run(&compile("@"), "anything"));
		assert!(run(&compile("a.c"), "a日c"));
		assert!(run(&compile("()"), ""));
		assert!(run(&compile(""), ""));
		assert!(!run(&compile(""), "a"));

		let a: Automaton = compile("(ab){2,3}");
		assert!(!run(&a, "ab"));
		assert!(run(&a, "abab"));
		assert!(run(&a, "ababab"));
		assert!(!run(&a, "abababab"));

		// Descending bounds give the empty language.
		let a: Automaton = compile("a{3,2}");
		assert!(!run(&a, "aa"));
		assert!(!run(&a, "aaa"));

		let mut union: Automaton = compile("a|b|ab");
		let mut spelled: Automaton = compile("[ab]|ab");
		assert!(same_language(&mut union, &mut spelled));
	}

	#[test]
	fn numeric_intervals() {
		let a: Automaton = compile("<5-12>");
		for accepted in ["5", "9", "10", "12", "005", "012"] {
			assert!(run(&a, accepted), "{accepted:?}");
		}
		for rejected in ["4", "13", "", "1"] {
			assert!(!run(&a, rejected), "{rejected:?}");
		}

		let a: Automaton = compile("<05-12>");
		assert!(run(&a, "05"));
		assert!(run(&a, "11"));
		assert!(!run(&a, "5"));
		assert!(!run(&a, "005"));
	}

	#[test]
	fn named_automata() {
		let regexp: RegExp = RegExp::new("<digit>+x|<word>").unwrap();
		let expected: BTreeSet<String> = ["digit", "word"].iter().map(|s| s.to_string()).collect();
		assert_eq!(regexp.identifiers(), expected);

		assert!(matches!(
			regexp.to_automaton(),
			Err(RegExpError::UnknownAutomaton(ref name)) if name == "digit"
		));

		let mut automata: HashMap<String, Automaton> = HashMap::new();
		automata.insert("digit".to_owned(), compile("[0-9]"));
		automata.insert("word".to_owned(), compile("hello"));
		let a: Automaton = regexp.to_automaton_with(&automata).unwrap();
		assert!(run(&a, "42x"));
		assert!(run(&a, "hello"));
		assert!(!run(&a, "x"));

		let automata: BTreeMap<String, Automaton> = automata.into_iter().collect();
		let a: Automaton = regexp
			.to_automaton_with_config(&automata, AutomatonConfig::minimizing())
			.unwrap();
		assert!(run(&a, "7x"));

		struct Failing;
		impl AutomatonProvider for Failing {
			fn automaton(&self, _name: &str) -> io::Result<Option<Automaton>> {
				Err(io::Error::other("unreadable"))
			}
		}
		assert!(matches!(
			regexp.to_automaton_with(&Failing),
			Err(RegExpError::Provider { ref name, .. }) if name == "digit"
		));
	}

	#[test]
	fn parse_through_from_str() {
		let regexp: RegExp = "a(b|c)".parse().unwrap();
		assert_eq!(regexp.to_string(), "\\a(\\b|\\c)");
		assert!("a(".parse::<RegExp>().is_err());
	}
}
