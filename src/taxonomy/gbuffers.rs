//! Default gbuffers fallback tree.
//!
//! The compiled-in stage taxonomy used by shader packs:
//!
//! ```text
//! gbuffers_basic                     always
//! ├── gbuffers_skybasic              sky, untextured
//! └── gbuffers_textured              TEXTURED
//!     ├── gbuffers_skytextured       sky
//!     ├── gbuffers_clouds            cloud
//!     ├── gbuffers_beaconbeam        beacon
//!     ├── gbuffers_armor_glint       GLINT
//!     ├── gbuffers_spidereyes        entity, EMISSIVE
//!     └── gbuffers_textured_lit      LIT
//!         ├── gbuffers_hand          hand
//!         ├── gbuffers_weather       weather
//!         ├── gbuffers_entities      entity
//!         ├── gbuffers_block         block entity
//!         └── gbuffers_terrain       block
//!             ├── gbuffers_damagedblock  DAMAGED
//!             └── gbuffers_water         FLUID
//! ```
//!
//! Child predicates only state what distinguishes them from the parent;
//! the resolver intersects them with the ancestor chain.

use crate::descriptor::{GeometryKind, ObjectFlags};
use crate::errors::Result;
use crate::predicate::Predicate;
use crate::taxonomy::{ShadingTaxonomy, StageSpec};

pub const BASIC: &str = "gbuffers_basic";
pub const SKY_BASIC: &str = "gbuffers_skybasic";
pub const TEXTURED: &str = "gbuffers_textured";
pub const SKY_TEXTURED: &str = "gbuffers_skytextured";
pub const CLOUDS: &str = "gbuffers_clouds";
pub const BEACON_BEAM: &str = "gbuffers_beaconbeam";
pub const ARMOR_GLINT: &str = "gbuffers_armor_glint";
pub const SPIDER_EYES: &str = "gbuffers_spidereyes";
pub const TEXTURED_LIT: &str = "gbuffers_textured_lit";
pub const HAND: &str = "gbuffers_hand";
pub const WEATHER: &str = "gbuffers_weather";
pub const ENTITIES: &str = "gbuffers_entities";
pub const BLOCK: &str = "gbuffers_block";
pub const TERRAIN: &str = "gbuffers_terrain";
pub const DAMAGED_BLOCK: &str = "gbuffers_damagedblock";
pub const WATER: &str = "gbuffers_water";

/// The nested literal of the default tree.
#[must_use]
pub fn default_spec() -> StageSpec {
    let kind = Predicate::kind;
    let flags = Predicate::flags;

    let terrain = StageSpec::new(TERRAIN, kind(GeometryKind::Block)).with_children([
        // Cracks are drawn over fluids too; they win.
        StageSpec::new(DAMAGED_BLOCK, flags(ObjectFlags::DAMAGED)),
        StageSpec::new(WATER, flags(ObjectFlags::FLUID)),
    ]);

    let textured_lit = StageSpec::new(TEXTURED_LIT, flags(ObjectFlags::LIT)).with_children([
        StageSpec::new(HAND, kind(GeometryKind::Hand)),
        StageSpec::new(WEATHER, kind(GeometryKind::Weather)),
        StageSpec::new(ENTITIES, kind(GeometryKind::Entity)),
        StageSpec::new(BLOCK, kind(GeometryKind::BlockEntity)),
        terrain,
    ]);

    let textured = StageSpec::new(TEXTURED, flags(ObjectFlags::TEXTURED)).with_children([
        StageSpec::new(SKY_TEXTURED, kind(GeometryKind::Sky)),
        StageSpec::new(CLOUDS, kind(GeometryKind::Cloud)),
        StageSpec::new(BEACON_BEAM, kind(GeometryKind::Beacon)),
        // Glint and glowing eyes are overlays on lit geometry, so they are
        // declared before textured_lit to take priority over it.
        StageSpec::new(ARMOR_GLINT, flags(ObjectFlags::GLINT)),
        StageSpec::new(
            SPIDER_EYES,
            kind(GeometryKind::Entity) & flags(ObjectFlags::EMISSIVE),
        ),
        textured_lit,
    ]);

    StageSpec::root(BASIC).with_children([
        StageSpec::new(
            SKY_BASIC,
            kind(GeometryKind::Sky) & !flags(ObjectFlags::TEXTURED),
        ),
        textured,
    ])
}

/// Builds the default gbuffers taxonomy.
pub fn default_taxonomy() -> Result<ShadingTaxonomy> {
    ShadingTaxonomy::from_spec(&default_spec())
}
