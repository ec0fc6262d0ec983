//! Pack Definitions
//!
//! The shader sources an installed pack actually supplies, keyed by stage
//! name. A pack is replaced wholesale on every (re)load and is read-only
//! once submitted; the router only cares whether a name is present.

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::Xxh3;

use crate::taxonomy::ShadingTaxonomy;

/// Source bundle of one shader program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    #[must_use]
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// xxh3 hash of both stages; identifies a source version.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(self.vertex.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.fragment.as_bytes());
        hasher.digest()
    }
}

/// An immutable snapshot of the programs a pack provides.
#[derive(Debug, Clone, Default)]
pub struct PackDefinitions {
    name: String,
    shaders: FxHashMap<String, ShaderSource>,
}

impl PackDefinitions {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shaders: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_shader(mut self, name: impl Into<String>, source: ShaderSource) -> Self {
        self.insert(name, source);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: ShaderSource) {
        self.shaders.insert(name.into(), source);
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, program: &str) -> bool {
        self.shaders.contains_key(program)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, program: &str) -> Option<&ShaderSource> {
        self.shaders.get(program)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShaderSource)> {
        self.shaders.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Taxonomy stages this pack does not supply, in pre-order.
    #[must_use]
    pub fn missing_stages(&self, taxonomy: &ShadingTaxonomy) -> Vec<&'static str> {
        taxonomy.names().filter(|name| !self.contains(name)).collect()
    }

    /// Programs this pack supplies that no taxonomy stage routes to, sorted.
    #[must_use]
    pub fn unknown_programs(&self, taxonomy: &ShadingTaxonomy) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .shaders
            .keys()
            .map(String::as_str)
            .filter(|name| !taxonomy.contains(name))
            .collect();
        unknown.sort_unstable();
        unknown
    }
}
