/// Options threaded through automaton construction.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct AutomatonConfig {
	/// Minimize the result of every combinator and regular expression node.
	pub minimize_always: bool,
}

impl AutomatonConfig {
	pub fn minimizing() -> Self {
		Self { minimize_always: true }
	}
}

/// Optional regular expression operators.
///
/// A disabled operator character is parsed as a literal.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub struct SyntaxFlags(u32);

impl SyntaxFlags {
	pub const NONE: Self = Self(0);
	/// `&`
	pub const INTERSECTION: Self = Self(0x0001);
	/// `~`
	pub const COMPLEMENT: Self = Self(0x0002);
	/// `#`
	pub const EMPTY: Self = Self(0x0004);
	/// `@`
	pub const ANYSTRING: Self = Self(0x0008);
	/// `<identifier>`
	pub const AUTOMATON: Self = Self(0x0010);
	/// `<n-m>`
	pub const INTERVAL: Self = Self(0x0020);
	pub const ALL: Self = Self(0xffff);

	pub const fn from_bits(bits: u32) -> Self {
		Self(bits)
	}

	pub const fn bits(self) -> u32 {
		self.0
	}

	/// Whether every flag of `other` is set.
	pub const fn contains(self, other: Self) -> bool {
		(self.0 & other.0) == other.0
	}

	/// Whether any flag of `other` is set.
	pub const fn intersects(self, other: Self) -> bool {
		(self.0 & other.0) != 0
	}
}

impl Default for SyntaxFlags {
	fn default() -> Self {
		Self::ALL
	}
}

impl std::ops::BitOr for SyntaxFlags {
	type Output = Self;

	fn bitor(self, other: Self) -> Self {
		Self(self.0 | other.0)
	}
}

impl std::ops::BitOrAssign for SyntaxFlags {
	fn bitor_assign(&mut self, other: Self) {
		self.0 |= other.0;
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn flags() {
		let flags: SyntaxFlags = SyntaxFlags::AUTOMATON | SyntaxFlags::INTERVAL;
		assert!(flags.contains(SyntaxFlags::INTERVAL));
		assert!(!flags.contains(SyntaxFlags::AUTOMATON | SyntaxFlags::EMPTY));
		assert!(flags.intersects(SyntaxFlags::AUTOMATON | SyntaxFlags::EMPTY));
		assert!(!SyntaxFlags::NONE.intersects(SyntaxFlags::ALL));
		assert_eq!(flags.bits(), 0x30);
		assert_eq!(SyntaxFlags::default(), SyntaxFlags::ALL);

		let mut flags: SyntaxFlags = SyntaxFlags::NONE;
		flags |= SyntaxFlags::from_bits(0x3);
		assert!(flags.contains(SyntaxFlags::INTERSECTION | SyntaxFlags::COMPLEMENT));
	}
}
