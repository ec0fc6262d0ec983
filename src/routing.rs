//! Routing Table
//!
//! The resolved, immutable classification artifact consumed by the draw
//! path. Built in one piece by the [`Resolver`] from a pack snapshot and
//! superseded wholesale by the next resolution, never patched.
//!
//! # Classification
//!
//! Entries are stored in pre-order. Classification scans them in *reverse*
//! pre-order: every stage's descendants are tested before the stage itself,
//! and sibling subtrees are already disjoint through their combined
//! predicates, so the first hit is the deepest stage claiming the object.
//! The root comes last and always matches, so the scan cannot fail.
//!
//! With kind partitioning enabled, the scan is narrowed to a per
//! [`GeometryKind`] bucket of entries whose combined predicate can match
//! that kind at all. Buckets keep the reverse pre-order.
//!
//! [`Resolver`]: crate::resolver::Resolver

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_64;

use crate::descriptor::{GeometryKind, RenderObjectDescriptor};
use crate::predicate::Predicate;
use crate::utils::interner::{self, Symbol};

/// Routing of one taxonomy stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// The stage this entry routes.
    pub stage: Symbol,
    /// Effective program: the stage's own, or its nearest present ancestor's.
    pub program: Symbol,
    /// Intrinsic ∧ ¬earlier siblings ∧ parent's combined predicate.
    pub combined: Predicate,
    /// Combined predicate minus the share claimed by the stage's children.
    pub exclusive: Predicate,
    pub depth: u32,
}

impl RouteEntry {
    #[inline]
    #[must_use]
    pub fn stage_name(&self) -> &'static str {
        interner::resolve(self.stage)
    }

    #[inline]
    #[must_use]
    pub fn program_name(&self) -> &'static str {
        interner::resolve(self.program)
    }

    /// Whether this stage borrows an ancestor's program.
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.stage != self.program
    }
}

type KindBuckets = Box<[SmallVec<[u32; 8]>; GeometryKind::COUNT]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    /// Pre-order; index 0 is the root.
    entries: Vec<RouteEntry>,
    by_stage: FxHashMap<Symbol, usize>,
    /// Distinct effective programs in first-use (pre-order) order.
    programs: Vec<Symbol>,
    /// Draw filter per program, parallel to `programs`.
    filters: Vec<Predicate>,
    buckets: Option<KindBuckets>,
    fingerprint: u64,
}

impl RoutingTable {
    /// Assembles the lookup structures over resolved entries.
    ///
    /// `entries` must be in pre-order with the root first.
    pub(crate) fn from_entries(entries: Vec<RouteEntry>, partition_by_kind: bool) -> Self {
        debug_assert!(!entries.is_empty(), "routing table needs a root entry");

        let by_stage = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.stage, i))
            .collect();

        let mut programs: Vec<Symbol> = Vec::new();
        let mut shares: Vec<Vec<Predicate>> = Vec::new();
        for entry in &entries {
            let slot = if let Some(i) = programs.iter().position(|&p| p == entry.program) {
                i
            } else {
                programs.push(entry.program);
                shares.push(Vec::new());
                programs.len() - 1
            };
            shares[slot].push(entry.exclusive.clone());
        }
        let filters = shares.into_iter().map(Predicate::any).collect();

        let buckets = partition_by_kind.then(|| {
            let mut buckets: KindBuckets = Box::new(std::array::from_fn(|_| SmallVec::new()));
            for kind in GeometryKind::ALL {
                buckets[kind.index()] = (0..entries.len())
                    .rev()
                    .filter(|&i| entries[i].combined.may_match_kind(kind))
                    .map(|i| i as u32)
                    .collect();
            }
            buckets
        });

        let mut table = Self {
            entries,
            by_stage,
            programs,
            filters,
            buckets,
            fingerprint: 0,
        };
        table.fingerprint = xxh3_64(table.to_string().as_bytes());
        table
    }

    /// Picks the entry claiming `descriptor`.
    #[must_use]
    pub fn classify_entry(&self, descriptor: &RenderObjectDescriptor) -> &RouteEntry {
        let hit = match &self.buckets {
            Some(buckets) => buckets[descriptor.kind.index()]
                .iter()
                .map(|&i| &self.entries[i as usize])
                .find(|e| e.combined.matches(descriptor)),
            None => self
                .entries
                .iter()
                .rev()
                .find(|e| e.combined.matches(descriptor)),
        };
        // The root's combined predicate is `always`.
        hit.unwrap_or(&self.entries[0])
    }

    /// Effective program for `descriptor`.
    #[inline]
    #[must_use]
    pub fn classify(&self, descriptor: &RenderObjectDescriptor) -> Symbol {
        self.classify_entry(descriptor).program
    }

    #[must_use]
    pub fn entry(&self, stage: &str) -> Option<&RouteEntry> {
        let sym = interner::get(stage)?;
        self.by_stage.get(&sym).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn effective_program(&self, stage: &str) -> Option<&'static str> {
        self.entry(stage).map(RouteEntry::program_name)
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &RouteEntry {
        &self.entries[0]
    }

    /// All entries in pre-order.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct effective programs, in first-use order.
    #[inline]
    #[must_use]
    pub fn programs(&self) -> &[Symbol] {
        &self.programs
    }

    #[must_use]
    pub fn references(&self, program: Symbol) -> bool {
        self.programs.contains(&program)
    }

    /// Predicate selecting exactly the objects drawn with `program`.
    ///
    /// The filters of all programs partition the descriptor space.
    #[must_use]
    pub fn filter_for(&self, program: &str) -> Option<&Predicate> {
        let sym = interner::get(program)?;
        let i = self.programs.iter().position(|&p| p == sym)?;
        Some(&self.filters[i])
    }

    pub fn filters(&self) -> impl Iterator<Item = (Symbol, &Predicate)> {
        self.programs.iter().copied().zip(self.filters.iter())
    }

    /// xxh3 of the canonical dump. Equal tables have equal fingerprints.
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let indent = entry.depth as usize * 2;
            write!(f, "{:indent$}{} -> {}", "", entry.stage_name(), entry.program_name())?;
            if entry.is_fallback() {
                f.write_str(" (fallback)")?;
            }
            writeln!(f, " : {}", entry.combined)?;
        }
        Ok(())
    }
}
