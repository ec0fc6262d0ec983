//! Global String Interner
//!
//! Turns stage, program and tag names into compact integer [`Symbol`]s so
//! routing entries and descriptors stay `Copy` and compare in O(1).

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer identifier of an interned string.
pub type Symbol = Spur;

/// Interns a string and returns its Symbol.
///
/// Returns the existing Symbol if the string was interned before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the Symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}
