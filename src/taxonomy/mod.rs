//! Canonical Shading Taxonomy
//!
//! The fixed tree of shading stages. Each stage specializes its parent: an
//! object routed to `gbuffers_terrain` is also, logically, a
//! `gbuffers_textured_lit` object, and falls back to that stage's program
//! when the pack does not supply terrain.
//!
//! Stages live in a [`SlotMap`] arena addressed by [`StageKey`]. The tree is
//! built once (from a [`TaxonomyBuilder`] or a nested [`StageSpec`] literal)
//! and never mutated afterwards, so it can be shared between the loader and
//! render threads behind an `Arc` without locking.
//!
//! # Sibling order
//!
//! Children are kept in declaration order, and that order is a priority: when
//! the intrinsic predicates of two siblings both match an object, the one
//! declared first claims it.

pub mod gbuffers;

use std::fmt;
use std::ops::Index;

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::errors::{Result, ShadingError};
use crate::predicate::Predicate;
use crate::utils::interner::{self, Symbol};

new_key_type! {
    /// Stable handle of a stage inside a [`ShadingTaxonomy`].
    pub struct StageKey;
}

/// Chain of parents of a stage, nearest first.
pub type Ancestry = SmallVec<[StageKey; 8]>;

/// One entry of the taxonomy.
#[derive(Debug, Clone)]
pub struct StageNode {
    name: Symbol,
    predicate: Predicate,
    parent: Option<StageKey>,
    children: SmallVec<[StageKey; 4]>,
    depth: u32,
}

impl StageNode {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        interner::resolve(self.name)
    }

    #[inline]
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.name
    }

    /// The stage's own, unmodified matching rule.
    #[inline]
    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<StageKey> {
        self.parent
    }

    /// Children in priority (declaration) order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[StageKey] {
        &self.children
    }

    /// Distance from the root (the root has depth 0).
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// Nested literal form of a taxonomy.
///
/// ```rust,ignore
/// let spec = StageSpec::root("catch_all").with_child(
///     StageSpec::new("block", Predicate::kind(GeometryKind::Block)).with_child(
///         StageSpec::new("textured_block", Predicate::flags(ObjectFlags::TEXTURED)),
///     ),
/// );
/// let taxonomy = ShadingTaxonomy::from_spec(&spec)?;
/// ```
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: String,
    pub predicate: Predicate,
    pub children: Vec<StageSpec>,
}

impl StageSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            name: name.into(),
            predicate,
            children: Vec::new(),
        }
    }

    /// A root stage. Its predicate is the universal `always`.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self::new(name, Predicate::Always)
    }

    #[must_use]
    pub fn with_child(mut self, child: StageSpec) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = StageSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Incremental taxonomy construction.
///
/// Stages are attached to an already declared parent by name. Sibling
/// priority follows the order of the calls.
pub struct TaxonomyBuilder {
    nodes: SlotMap<StageKey, StageNode>,
    root: StageKey,
    by_name: FxHashMap<Symbol, StageKey>,
    error: Option<ShadingError>,
}

impl TaxonomyBuilder {
    #[must_use]
    pub fn new(root: &str) -> Self {
        let mut nodes = SlotMap::with_key();
        let name = interner::intern(root);
        let root_key = nodes.insert(StageNode {
            name,
            predicate: Predicate::Always,
            parent: None,
            children: SmallVec::new(),
            depth: 0,
        });

        let mut by_name = FxHashMap::default();
        by_name.insert(name, root_key);

        Self {
            nodes,
            root: root_key,
            by_name,
            error: None,
        }
    }

    /// Chainable form of [`Self::try_stage`]. The first error is reported by
    /// [`Self::build`].
    #[must_use]
    pub fn stage(mut self, parent: &str, name: &str, predicate: Predicate) -> Self {
        if self.error.is_none()
            && let Err(e) = self.try_stage(parent, name, predicate)
        {
            self.error = Some(e);
        }
        self
    }

    /// Attaches `name` as the last child of `parent`.
    pub fn try_stage(&mut self, parent: &str, name: &str, predicate: Predicate) -> Result<StageKey> {
        let parent_key = interner::get(parent)
            .and_then(|sym| self.by_name.get(&sym).copied())
            .ok_or_else(|| ShadingError::UnknownParent {
                parent: parent.to_string(),
                child: name.to_string(),
            })?;
        self.attach(parent_key, name, predicate)
    }

    fn attach(&mut self, parent: StageKey, name: &str, predicate: Predicate) -> Result<StageKey> {
        let sym = interner::intern(name);
        if self.by_name.contains_key(&sym) {
            return Err(ShadingError::DuplicateStage {
                name: name.to_string(),
            });
        }

        let depth = self.nodes[parent].depth + 1;
        let key = self.nodes.insert(StageNode {
            name: sym,
            predicate,
            parent: Some(parent),
            children: SmallVec::new(),
            depth,
        });
        self.nodes[parent].children.push(key);
        self.by_name.insert(sym, key);
        Ok(key)
    }

    pub fn build(self) -> Result<ShadingTaxonomy> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(ShadingTaxonomy {
            nodes: self.nodes,
            root: self.root,
            by_name: self.by_name,
        })
    }
}

/// The canonical, immutable tree of shading stages.
#[derive(Debug, Clone)]
pub struct ShadingTaxonomy {
    nodes: SlotMap<StageKey, StageNode>,
    root: StageKey,
    by_name: FxHashMap<Symbol, StageKey>,
}

impl ShadingTaxonomy {
    /// Builds a taxonomy from a nested literal.
    ///
    /// The root's predicate is always treated as `always`: the root is the
    /// universal fallback and must match every object.
    pub fn from_spec(spec: &StageSpec) -> Result<Self> {
        if !spec.predicate.is_always() {
            log::warn!(
                "Taxonomy root '{}' declares predicate {}; the root always matches, ignoring it",
                spec.name,
                spec.predicate
            );
        }

        let mut builder = TaxonomyBuilder::new(&spec.name);
        let root = builder.root;
        let mut pending: Vec<(StageKey, &StageSpec)> = vec![(root, spec)];

        while let Some((key, node)) = pending.pop() {
            for child in &node.children {
                let child_key = builder.attach(key, &child.name, child.predicate.clone())?;
                pending.push((child_key, child));
            }
        }

        builder.build()
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> StageKey {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn root_node(&self) -> &StageNode {
        &self.nodes[self.root]
    }

    #[must_use]
    pub fn root_name(&self) -> &'static str {
        self.root_node().name()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<StageKey> {
        interner::get(name).and_then(|sym| self.by_name.get(&sym).copied())
    }

    #[must_use]
    pub fn get_by_symbol(&self, name: Symbol) -> Option<StageKey> {
        self.by_name.get(&name).copied()
    }

    #[inline]
    #[must_use]
    pub fn node(&self, key: StageKey) -> Option<&StageNode> {
        self.nodes.get(key)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The stage's own matching rule, looked up by name.
    #[must_use]
    pub fn intrinsic_predicate(&self, name: &str) -> Option<&Predicate> {
        self.get(name).map(|key| &self.nodes[key].predicate)
    }

    #[must_use]
    pub fn parent_of(&self, name: &str) -> Option<&StageNode> {
        let key = self.get(name)?;
        self.nodes[key].parent.map(|p| &self.nodes[p])
    }

    /// Parents of `key`, nearest first, ending with the root.
    #[must_use]
    pub fn ancestry(&self, key: StageKey) -> Ancestry {
        let mut chain = Ancestry::new();
        let mut cursor = self.nodes.get(key).and_then(StageNode::parent);
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.nodes[parent].parent;
        }
        chain
    }

    /// Names of the parents of `name`, nearest first.
    #[must_use]
    pub fn ancestors(&self, name: &str) -> Option<Vec<&'static str>> {
        let key = self.get(name)?;
        Some(
            self.ancestry(key)
                .into_iter()
                .map(|k| self.nodes[k].name())
                .collect(),
        )
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a taxonomy always has its root.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order traversal, children in priority order.
    #[must_use]
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            taxonomy: self,
            stack: vec![self.root],
        }
    }

    /// Stage names in pre-order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.depth_first().map(|visit| visit.node.name())
    }
}

impl Index<StageKey> for ShadingTaxonomy {
    type Output = StageNode;

    fn index(&self, key: StageKey) -> &StageNode {
        &self.nodes[key]
    }
}

/// A stage reached by [`ShadingTaxonomy::depth_first`].
pub struct StageVisit<'a> {
    pub key: StageKey,
    pub node: &'a StageNode,
    pub parent: Option<StageKey>,
    taxonomy: &'a ShadingTaxonomy,
}

impl<'a> StageVisit<'a> {
    /// Parent chain, nearest first, walked lazily.
    pub fn ancestors(&self) -> impl Iterator<Item = StageKey> + use<'a> {
        let taxonomy = self.taxonomy;
        std::iter::successors(self.parent, move |&key| taxonomy.nodes[key].parent)
    }
}

pub struct DepthFirst<'a> {
    taxonomy: &'a ShadingTaxonomy,
    stack: Vec<StageKey>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = StageVisit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.stack.pop()?;
        let node = &self.taxonomy.nodes[key];
        self.stack.extend(node.children.iter().rev().copied());
        Some(StageVisit {
            key,
            node,
            parent: node.parent,
            taxonomy: self.taxonomy,
        })
    }
}

impl fmt::Display for ShadingTaxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for visit in self.depth_first() {
            let indent = visit.node.depth as usize * 2;
            writeln!(f, "{:indent$}{}: {}", "", visit.node.name(), visit.node.predicate)?;
        }
        Ok(())
    }
}
