//! Rewrites a code point labeled automaton into a byte labeled one accepting the
//! UTF-8 encodings of the same strings.
//!
//! Every code point interval becomes a small fan of byte paths: the interval is
//! split where the encoded length changes, and within one length into a leading
//! partial range, a middle of "any continuation byte" runs, and a trailing partial range.

use crate::automaton::Automaton;
use crate::automaton::MAX_CODE_POINT;
use crate::automaton::StateId;

const START_CODES: [u32; 4] = [0, 128, 2048, 65536];
const END_CODES: [u32; 4] = [127, 2047, 65535, 1114111];

/// Surrogate code points, which have no UTF-8 encoding.
const SURROGATE_MIN: u32 = 0xD800;
const SURROGATE_MAX: u32 = 0xDFFF;

/// Continuation bytes `10xxxxxx`.
const CONTINUATION_MIN: u32 = 0x80;
const CONTINUATION_MAX: u32 = 0xBF;

const fn mask(bits: u32) -> u32 {
	(1 << bits) - 1
}

#[derive(Debug, Clone, Copy, Default)]
struct Utf8Byte {
	value: u32,
	/// Number of payload bits in `value`.
	bits: u32,
}

#[derive(Debug, Clone, Copy)]
struct Utf8Sequence {
	bytes: [Utf8Byte; 4],
	len: usize,
}

impl Utf8Sequence {
	fn new(code: u32) -> Self {
		let mut sequence: Self = Self {
			bytes: [Utf8Byte::default(); 4],
			len: 0,
		};
		if code < 128 {
			sequence.bytes[0] = Utf8Byte { value: code, bits: 7 };
			sequence.len = 1;
		} else if code < 2048 {
			sequence.bytes[0] = Utf8Byte {
				value: (6 << 5) | (code >> 6),
				bits: 5,
			};
			sequence.set_rest(code, 1);
		} else if code < 65536 {
			sequence.bytes[0] = Utf8Byte {
				value: (14 << 4) | (code >> 12),
				bits: 4,
			};
			sequence.set_rest(code, 2);
		} else {
			sequence.bytes[0] = Utf8Byte {
				value: (30 << 3) | (code >> 18),
				bits: 3,
			};
			sequence.set_rest(code, 3);
		}
		sequence
	}

	fn set_rest(&mut self, mut code: u32, num_bytes: usize) {
		for i in 0..num_bytes {
			self.bytes[num_bytes - i] = Utf8Byte {
				value: CONTINUATION_MIN | (code & mask(6)),
				bits: 6,
			};
			code >>= 6;
		}
		self.len = num_bytes + 1;
	}

	fn byte_at(&self, idx: usize) -> u32 {
		self.bytes[idx].value
	}

	fn num_bits(&self, idx: usize) -> u32 {
		self.bytes[idx].bits
	}
}

struct Converter {
	utf8: Automaton,
}

impl Converter {
	fn edge(&mut self, from: StateId, min: u32, max: u32, to: StateId) {
		self.utf8.add_transition(from, min, max, to);
	}

	fn convert_one_edge(&mut self, start: StateId, end: StateId, start_code_point: u32, end_code_point: u32) {
		let end_code_point: u32 = end_code_point.min(MAX_CODE_POINT);
		if start_code_point > end_code_point {
			return;
		}
		if start_code_point < SURROGATE_MIN {
			self.convert_range(start, end, start_code_point, end_code_point.min(SURROGATE_MIN - 1));
		}
		if end_code_point > SURROGATE_MAX {
			self.convert_range(start, end, start_code_point.max(SURROGATE_MAX + 1), end_code_point);
		}
	}

	fn convert_range(&mut self, start: StateId, end: StateId, start_code_point: u32, end_code_point: u32) {
		let start_utf8: Utf8Sequence = Utf8Sequence::new(start_code_point);
		let end_utf8: Utf8Sequence = Utf8Sequence::new(end_code_point);
		self.build(start, end, &start_utf8, &end_utf8, 0);
	}

	fn build(&mut self, start: StateId, end: StateId, start_utf8: &Utf8Sequence, end_utf8: &Utf8Sequence, upto: usize) {
		if start_utf8.byte_at(upto) == end_utf8.byte_at(upto) {
			// Same lead byte.
			if (upto == start_utf8.len - 1) && (upto == end_utf8.len - 1) {
				self.edge(start, start_utf8.byte_at(upto), end_utf8.byte_at(upto), end);
			} else {
				debug_assert!(start_utf8.len > upto + 1);
				debug_assert!(end_utf8.len > upto + 1);
				let n: StateId = self.utf8.new_state();
				self.edge(start, start_utf8.byte_at(upto), start_utf8.byte_at(upto), n);
				self.build(n, end, start_utf8, end_utf8, upto + 1);
			}
		} else if start_utf8.len == end_utf8.len {
			if upto == start_utf8.len - 1 {
				self.edge(start, start_utf8.byte_at(upto), end_utf8.byte_at(upto), end);
			} else {
				self.start(start, end, start_utf8, upto, false);
				if end_utf8.byte_at(upto) - start_utf8.byte_at(upto) > 1 {
					self.all(
						start,
						end,
						start_utf8.byte_at(upto) + 1,
						end_utf8.byte_at(upto) - 1,
						start_utf8.len - upto - 1,
					);
				}
				self.end(start, end, end_utf8, upto, false);
			}
		} else {
			// Lengths differ, so the lead bytes already differ.
			debug_assert_eq!(upto, 0);
			self.start(start, end, start_utf8, upto, true);
			// Each length in between, and the head of the last one, is split again from
			// its exact bounds; some lead bytes only allow part of the continuation range.
			for byte_count in (start_utf8.len + 1)..end_utf8.len {
				let low: Utf8Sequence = Utf8Sequence::new(START_CODES[byte_count - 1]);
				let high: Utf8Sequence = Utf8Sequence::new(END_CODES[byte_count - 1]);
				self.build(start, end, &low, &high, 0);
			}
			let low: Utf8Sequence = Utf8Sequence::new(START_CODES[end_utf8.len - 1]);
			self.build(start, end, &low, end_utf8, 0);
		}
	}

	/// Sequences from `utf8` up to the largest one sharing its leading bytes.
	fn start(&mut self, start: StateId, end: StateId, utf8: &Utf8Sequence, upto: usize, do_all: bool) {
		let byte: u32 = utf8.byte_at(upto);
		let last: u32 = byte | mask(utf8.num_bits(upto));
		if upto == utf8.len - 1 {
			self.edge(start, byte, last, end);
			return;
		}
		let n: StateId = self.utf8.new_state();
		self.edge(start, byte, byte, n);
		self.start(n, end, utf8, upto + 1, true);
		if do_all && (byte != last) {
			self.all(start, end, byte + 1, last, utf8.len - upto - 1);
		}
	}

	/// Sequences from the smallest one sharing the leading bytes of `utf8` up to `utf8`.
	fn end(&mut self, start: StateId, end: StateId, utf8: &Utf8Sequence, upto: usize, do_all: bool) {
		let byte: u32 = utf8.byte_at(upto);
		if upto == utf8.len - 1 {
			self.edge(start, byte & !mask(utf8.num_bits(upto)), byte, end);
			return;
		}
		let first: u32 = byte & !mask(utf8.num_bits(upto));
		if do_all && (byte != first) {
			self.all(start, end, first, byte - 1, utf8.len - upto - 1);
		}
		let n: StateId = self.utf8.new_state();
		self.edge(start, byte, byte, n);
		self.end(n, end, utf8, upto + 1, true);
	}

	/// Lead bytes in `[start_code, end_code]` followed by `left` arbitrary continuation bytes.
	fn all(&mut self, start: StateId, end: StateId, start_code: u32, end_code: u32, mut left: usize) {
		if left == 0 {
			self.edge(start, start_code, end_code, end);
			return;
		}
		let mut last: StateId = self.utf8.new_state();
		self.edge(start, start_code, end_code, last);
		while left > 1 {
			let n: StateId = self.utf8.new_state();
			self.edge(last, CONTINUATION_MIN, CONTINUATION_MAX, n);
			left -= 1;
			last = n;
		}
		self.edge(last, CONTINUATION_MIN, CONTINUATION_MAX, end);
	}
}

/// Byte labeled, nondeterministic equivalent of `utf32`.
pub fn convert(utf32: &Automaton) -> Automaton {
	let expanded: Automaton;
	let utf32: &Automaton = if utf32.is_singleton() {
		let mut copy: Automaton = utf32.clone();
		copy.expand_singleton();
		expanded = copy;
		&expanded
	} else {
		utf32
	};

	let mut converter: Converter = Converter { utf8: Automaton::new() };
	let mut map: Vec<Option<StateId>> = vec![None; utf32.arena_len()];
	let initial: StateId = converter.utf8.initial();
	converter.utf8.set_accept(initial, utf32[utf32.initial()].is_accept());
	map[utf32.initial().index()] = Some(initial);

	let mut pending: Vec<StateId> = vec![utf32.initial()];
	while let Some(s) = pending.pop() {
		let Some(from) = map[s.index()] else {
			continue;
		};
		for t in utf32[s].transitions() {
			let to: StateId = match map[t.to.index()] {
				Some(to) => to,
				None => {
					let to: StateId = converter.utf8.new_state();
					converter.utf8.set_accept(to, utf32[t.to].is_accept());
					map[t.to.index()] = Some(to);
					pending.push(t.to);
					to
				},
			};
			converter.convert_one_edge(from, to, t.min, t.max);
		}
	}

	let mut utf8: Automaton = converter.utf8;
	utf8.set_deterministic(false);
	debug!("converted {} code point states into {} byte states", utf32.num_states(), utf8.arena_len());
	utf8
}
