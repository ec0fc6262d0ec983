//! Predicate Algebra
//!
//! Geometry filters are plain data: a small tagged tree of attribute tests
//! combined with AND / OR / NOT. Unlike opaque closures, a predicate can be
//! printed, compared and analysed, so a misrouted object can always be
//! traced back to the rule that claimed it.
//!
//! ```rust,ignore
//! use shade_route::{GeometryKind, ObjectFlags, Predicate};
//!
//! let textured_block =
//!     Predicate::kind(GeometryKind::Block) & Predicate::flags(ObjectFlags::TEXTURED);
//! println!("{textured_block}"); // all(kind(block), flags(TEXTURED))
//! ```
//!
//! The combinators simplify constants as they build (`x & always == x`,
//! `!!x == x`, …) so combined predicates produced by the resolver stay
//! readable in logs.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::descriptor::{GeometryKind, ObjectFlags, RenderObjectDescriptor};
use crate::utils::interner::{self, Symbol};

/// A pure boolean test over a [`RenderObjectDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Always,
    Never,
    /// Geometry kind equals the given kind.
    Kind(GeometryKind),
    /// Every given flag is set.
    Flags(ObjectFlags),
    /// Material tag equals the given symbol.
    Tag(Symbol),
    Not(Box<Predicate>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    #[inline]
    #[must_use]
    pub fn kind(kind: GeometryKind) -> Self {
        Predicate::Kind(kind)
    }

    /// Requires all of `flags`. An empty set is trivially satisfied.
    #[must_use]
    pub fn flags(flags: ObjectFlags) -> Self {
        if flags.is_empty() {
            Predicate::Always
        } else {
            Predicate::Flags(flags)
        }
    }

    #[must_use]
    pub fn tag(tag: &str) -> Self {
        Predicate::Tag(interner::intern(tag))
    }

    /// Conjunction of `parts`, flattened and simplified.
    #[must_use]
    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut terms = Vec::new();
        for part in parts {
            match part {
                Predicate::Always => {}
                Predicate::Never => return Predicate::Never,
                Predicate::All(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Predicate::Always,
            1 => terms.pop().unwrap_or(Predicate::Always),
            _ => Predicate::All(terms),
        }
    }

    /// Disjunction of `parts`, flattened and simplified.
    #[must_use]
    pub fn any(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut terms = Vec::new();
        for part in parts {
            match part {
                Predicate::Never => {}
                Predicate::Always => return Predicate::Always,
                Predicate::Any(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Predicate::Never,
            1 => terms.pop().unwrap_or(Predicate::Never),
            _ => Predicate::Any(terms),
        }
    }

    /// Evaluates the predicate. Pure and reentrant.
    #[must_use]
    pub fn matches(&self, descriptor: &RenderObjectDescriptor) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Never => false,
            Predicate::Kind(kind) => descriptor.kind == *kind,
            Predicate::Flags(flags) => descriptor.flags.contains(*flags),
            Predicate::Tag(tag) => descriptor.tag == Some(*tag),
            Predicate::Not(inner) => !inner.matches(descriptor),
            Predicate::All(parts) => parts.iter().all(|p| p.matches(descriptor)),
            Predicate::Any(parts) => parts.iter().any(|p| p.matches(descriptor)),
        }
    }

    /// Conservative test: `false` only if no descriptor of `kind` can match.
    #[must_use]
    pub fn may_match_kind(&self, kind: GeometryKind) -> bool {
        self.kind_bounds(kind).0
    }

    /// `(may, must)` for descriptors of `kind`: whether some such descriptor
    /// can match, and whether every such descriptor does.
    fn kind_bounds(&self, kind: GeometryKind) -> (bool, bool) {
        match self {
            Predicate::Always => (true, true),
            Predicate::Never => (false, false),
            Predicate::Kind(k) => {
                let same = *k == kind;
                (same, same)
            }
            Predicate::Flags(_) | Predicate::Tag(_) => (true, false),
            Predicate::Not(inner) => {
                let (may, must) = inner.kind_bounds(kind);
                (!must, !may)
            }
            Predicate::All(parts) => parts.iter().fold((true, true), |(may, must), p| {
                let (m, n) = p.kind_bounds(kind);
                (may && m, must && n)
            }),
            Predicate::Any(parts) => parts.iter().fold((false, false), |(may, must), p| {
                let (m, n) = p.kind_bounds(kind);
                (may || m, must || n)
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        match self {
            Predicate::Always => Predicate::Never,
            Predicate::Never => Predicate::Always,
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        Predicate::all([self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        Predicate::any([self, rhs])
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, name: &str, parts: &[Predicate]) -> fmt::Result {
            write!(f, "{name}(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{part}")?;
            }
            f.write_str(")")
        }

        match self {
            Predicate::Always => f.write_str("always"),
            Predicate::Never => f.write_str("never"),
            Predicate::Kind(kind) => write!(f, "kind({})", kind.name()),
            Predicate::Flags(flags) => {
                f.write_str("flags(")?;
                bitflags::parser::to_writer(flags, &mut *f)?;
                f.write_str(")")
            }
            Predicate::Tag(tag) => write!(f, "tag({:?})", interner::resolve(*tag)),
            Predicate::Not(inner) => write!(f, "!{inner}"),
            Predicate::All(parts) => list(f, "all", parts),
            Predicate::Any(parts) => list(f, "any", parts),
        }
    }
}
