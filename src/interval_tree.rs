use std::cmp::Ordering;

/// Sorted, disjoint code point intervals, each carrying a value.
///
/// Inserting an interval that overlaps existing ones splits them at the overlap
/// boundaries and merges the values of the overlapping parts,
/// which is exactly what subset construction needs to collate the outgoing
/// transitions of a set of states.
#[derive(Debug, Clone)]
pub struct IntervalTree<V: Clone> {
	intervals: Vec<(Interval, V)>,
}

/// Closed interval `[start, end]` of labels.
#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub struct Interval {
	start: u32,
	end: u32,
}

enum Intersection {
	Same,
	Disjoint {
		lower_is: Side,
	},
	SameStartNewExtends {
		overlap: Interval,
		remaining: Interval,
	},
	SameStartExistingExtends {
		overlap: Interval,
		remaining: Interval,
	},
	NewFirst {
		before: Interval,
		overlap_start: u32,
	},
	ExistingFirst {
		before: Interval,
		overlap_start: u32,
	},
}

enum Side {
	New,
	Existing,
}

impl<V: Clone> IntervalTree<V> {
	pub const fn new() -> Self {
		Self { intervals: Vec::new() }
	}

	pub fn len(&self) -> usize {
		self.intervals.len()
	}

	pub fn is_empty(&self) -> bool {
		self.intervals.is_empty()
	}

	pub fn lookup(&self, pos: u32) -> Option<&V> {
		let index: usize = self.partition_point(pos);
		match self.intervals.get(index) {
			Some((interval, value)) if interval.start <= pos => Some(value),
			_ => None,
		}
	}

	pub fn insert<Merge>(&mut self, mut new: Interval, new_value: V, merge: Merge)
	where
		Merge: Fn(&V, &V) -> V,
	{
		// The new interval may overlap several existing ones; each iteration either
		// finishes or leaves `new` starting exactly at the start of an existing interval.
		loop {
			let index: usize = self.partition_point(new.start);
			let Some((existing, existing_value)) = self.intervals.get_mut(index) else {
				self.intervals.push((new, new_value));
				break;
			};
			debug_assert!(new.start <= existing.end);

			match new.intersection(existing) {
				Intersection::Same => {
					*existing_value = merge(existing_value, &new_value);
					break;
				},
				Intersection::Disjoint { lower_is } => {
					match lower_is {
						Side::New => self.intervals.insert(index, (new, new_value)),
						Side::Existing => self.intervals.insert(index + 1, (new, new_value)),
					}
					break;
				},
				Intersection::SameStartNewExtends { overlap, remaining } => {
					*existing = overlap;
					*existing_value = merge(existing_value, &new_value);
					new = remaining;
				},
				Intersection::SameStartExistingExtends { overlap, remaining } => {
					*existing = remaining;
					let merged: V = merge(existing_value, &new_value);
					self.intervals.insert(index, (overlap, merged));
					break;
				},
				Intersection::NewFirst { before, overlap_start } => {
					self.intervals.insert(index, (before, new_value.clone()));
					new.start = overlap_start;
				},
				Intersection::ExistingFirst { before, overlap_start } => {
					existing.start = overlap_start;
					let head: V = existing_value.clone();
					self.intervals.insert(index, (before, head));
				},
			}
		}
		self.invariants();
	}

	pub fn iter(&self) -> impl Iterator<Item = (Interval, &V)> {
		self.intervals.iter().map(|(interval, value)| (*interval, value))
	}

	/// Index of the first interval whose end is at or after `pos`.
	fn partition_point(&self, pos: u32) -> usize {
		self.intervals.partition_point(|(interval, _)| interval.end < pos)
	}

	fn invariants(&self) {
		if cfg!(debug_assertions) {
			for pair in self.intervals.windows(2) {
				assert!(pair[0].0.end < pair[1].0.start);
			}
		}
	}
}

impl<V: Clone> Default for IntervalTree<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl Interval {
	pub fn new(start: u32, end: u32) -> Self {
		assert!(start <= end);
		Self { start, end }
	}

	pub fn start(&self) -> u32 {
		self.start
	}

	pub fn end(&self) -> u32 {
		self.end
	}

	pub fn contains(&self, pos: u32) -> bool {
		(self.start <= pos) && (pos <= self.end)
	}

	/// Gaps left in `[lower, upper]` by `intervals`, which may overlap and come in any order.
	pub fn complement(intervals: &mut [Interval], lower: u32, upper: u32) -> Vec<Interval> {
		intervals.sort_unstable();

		let mut complement: Vec<Interval> = Vec::new();

		let mut pos: u32 = lower;
		for &Interval { start, end } in intervals.iter() {
			if pos < start {
				complement.push(Interval::new(pos, (start - 1).min(upper)));
			}
			if end >= upper {
				return complement;
			}
			if end >= pos {
				pos = end + 1;
			}
		}

		if pos <= upper {
			complement.push(Interval::new(pos, upper));
		}

		complement
	}

	fn intersection(&self, existing: &Self) -> Intersection {
		if self.end < existing.start {
			return Intersection::Disjoint { lower_is: Side::New };
		} else if existing.end < self.start {
			return Intersection::Disjoint {
				lower_is: Side::Existing,
			};
		}

		match (self.start.cmp(&existing.start), self.end.cmp(&existing.end)) {
			(Ordering::Equal, Ordering::Equal) => Intersection::Same,
			(Ordering::Equal, Ordering::Less) => Intersection::SameStartExistingExtends {
				overlap: Interval::new(self.start, self.end),
				remaining: Interval::new(self.end + 1, existing.end),
			},
			(Ordering::Equal, Ordering::Greater) => Intersection::SameStartNewExtends {
				overlap: Interval::new(existing.start, existing.end),
				remaining: Interval::new(existing.end + 1, self.end),
			},
			(Ordering::Less, _) => Intersection::NewFirst {
				before: Interval::new(self.start, existing.start - 1),
				overlap_start: existing.start,
			},
			(Ordering::Greater, _) => Intersection::ExistingFirst {
				before: Interval::new(existing.start, self.start - 1),
				overlap_start: self.start,
			},
		}
	}
}
