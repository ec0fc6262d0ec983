//! Render Object Descriptor
//!
//! Immutable per-draw classification attributes. A descriptor is produced
//! once per draw submission and copied into every classification call.

use bitflags::bitflags;

use crate::utils::interner::{self, Symbol};

/// Broad category of a piece of geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum GeometryKind {
    Block,
    BlockEntity,
    Entity,
    Hand,
    Sky,
    Cloud,
    Weather,
    Particle,
    Beacon,
    Gui,
    Text,
    #[default]
    Other,
}

impl GeometryKind {
    pub const COUNT: usize = 12;

    pub const ALL: [GeometryKind; Self::COUNT] = [
        GeometryKind::Block,
        GeometryKind::BlockEntity,
        GeometryKind::Entity,
        GeometryKind::Hand,
        GeometryKind::Sky,
        GeometryKind::Cloud,
        GeometryKind::Weather,
        GeometryKind::Particle,
        GeometryKind::Beacon,
        GeometryKind::Gui,
        GeometryKind::Text,
        GeometryKind::Other,
    ];

    /// Dense index, usable for per-kind lookup arrays.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Block => "block",
            GeometryKind::BlockEntity => "block_entity",
            GeometryKind::Entity => "entity",
            GeometryKind::Hand => "hand",
            GeometryKind::Sky => "sky",
            GeometryKind::Cloud => "cloud",
            GeometryKind::Weather => "weather",
            GeometryKind::Particle => "particle",
            GeometryKind::Beacon => "beacon",
            GeometryKind::Gui => "gui",
            GeometryKind::Text => "text",
            GeometryKind::Other => "other",
        }
    }
}

bitflags! {
    /// Boolean material/geometry attributes of a render object.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u16 {
        const TEXTURED    = 1 << 0;
        const LIT         = 1 << 1;
        const TRANSPARENT = 1 << 2;
        const EMISSIVE    = 1 << 3;
        const GLINT       = 1 << 4;
        const DAMAGED     = 1 << 5;
        const FLUID       = 1 << 6;
    }
}

/// Classification metadata for one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderObjectDescriptor {
    pub kind: GeometryKind,
    pub flags: ObjectFlags,
    /// Optional material tag, e.g. a block or entity family name.
    pub tag: Option<Symbol>,
}

impl RenderObjectDescriptor {
    #[inline]
    #[must_use]
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            flags: ObjectFlags::empty(),
            tag: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Attaches a material tag, interning it.
    #[must_use]
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(interner::intern(tag));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_tag_symbol(mut self, tag: Symbol) -> Self {
        self.tag = Some(tag);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_block(&self) -> bool {
        self.kind == GeometryKind::Block
    }

    #[inline]
    #[must_use]
    pub fn has(&self, flags: ObjectFlags) -> bool {
        self.flags.contains(flags)
    }
}
