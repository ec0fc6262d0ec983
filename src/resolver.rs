//! Fallback Resolver
//!
//! Walks the canonical taxonomy against the set of available programs and
//! produces a [`RoutingTable`]. Each stage is visited once and reads only its
//! parent's entry, independent of how many objects are classified afterwards.
//!
//! # Algorithm
//!
//! Pre-order, carrying the nearest present ancestor's program:
//!
//! 1. The root must be available; it is the universal fallback.
//! 2. A stage whose program is available routes to itself, otherwise to the
//!    inherited program. Missing intermediate stages are skipped over, so a
//!    grandchild's objects may land on its grandparent.
//! 3. The combined predicate is
//!    `intrinsic ∧ ¬(earlier siblings' intrinsics) ∧ parent's combined`.
//!    Siblings are therefore tried in declaration order and the first match
//!    wins; overlapping siblings never double-claim an object.
//! 4. Children inherit the stage's effective program.

use slotmap::SecondaryMap;

use crate::errors::{Result, ShadingError};
use crate::pack::PackDefinitions;
use crate::predicate::Predicate;
use crate::routing::{RouteEntry, RoutingTable};
use crate::taxonomy::{ShadingTaxonomy, StageKey};

pub struct Resolver<'a> {
    taxonomy: &'a ShadingTaxonomy,
    partition_by_kind: bool,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(taxonomy: &'a ShadingTaxonomy) -> Self {
        Self {
            taxonomy,
            partition_by_kind: true,
        }
    }

    /// Enables or disables per-kind scan buckets in produced tables.
    #[must_use]
    pub fn with_kind_partition(mut self, enabled: bool) -> Self {
        self.partition_by_kind = enabled;
        self
    }

    /// Resolves against the programs a pack supplies.
    pub fn resolve_pack(&self, pack: &PackDefinitions) -> Result<RoutingTable> {
        self.resolve(pack.name(), |program| pack.contains(program))
    }

    /// Resolves against an arbitrary availability test.
    ///
    /// `pack_name` only labels the error when the root is unavailable.
    pub fn resolve(
        &self,
        pack_name: &str,
        is_available: impl Fn(&str) -> bool,
    ) -> Result<RoutingTable> {
        let taxonomy = self.taxonomy;
        let root = taxonomy.root_node();
        if !is_available(root.name()) {
            return Err(ShadingError::MissingRoot {
                pack: pack_name.to_string(),
                root: root.name().to_string(),
            });
        }

        let mut slots: SecondaryMap<StageKey, usize> = SecondaryMap::with_capacity(taxonomy.len());
        let mut entries: Vec<RouteEntry> = Vec::with_capacity(taxonomy.len());

        for visit in taxonomy.depth_first() {
            let node = visit.node;

            let (program, combined) = match visit.parent {
                None => (node.symbol(), Predicate::Always),
                Some(parent_key) => {
                    let parent = &entries[slots[parent_key]];
                    let program = if is_available(node.name()) {
                        node.symbol()
                    } else {
                        log::debug!(
                            "Stage '{}' not supplied by '{pack_name}', falling back to '{}'",
                            node.name(),
                            parent.program_name()
                        );
                        parent.program
                    };

                    let earlier = taxonomy[parent_key]
                        .children()
                        .iter()
                        .take_while(|&&sibling| sibling != visit.key)
                        .map(|&sibling| taxonomy[sibling].predicate().clone());

                    let combined = Predicate::all([
                        node.predicate().clone(),
                        !Predicate::any(earlier),
                        parent.combined.clone(),
                    ]);
                    (program, combined)
                }
            };

            let claimed_by_children =
                Predicate::any(node.children().iter().map(|&c| taxonomy[c].predicate().clone()));
            let exclusive = combined.clone() & !claimed_by_children;

            slots.insert(visit.key, entries.len());
            entries.push(RouteEntry {
                stage: node.symbol(),
                program,
                combined,
                exclusive,
                depth: node.depth(),
            });
        }

        let table = RoutingTable::from_entries(entries, self.partition_by_kind);
        log::debug!(
            "Resolved {} stages onto {} programs for '{pack_name}'",
            table.len(),
            table.programs().len()
        );
        Ok(table)
    }
}
