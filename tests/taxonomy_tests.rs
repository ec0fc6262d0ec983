//! Taxonomy Tests
//!
//! Tests for:
//! - Construction from nested literals and the builder
//! - Construction errors
//! - Routing through the default gbuffers tree

mod common;

use common::pack;
use shade_route::{
    GeometryKind, ObjectFlags, Predicate, RenderObjectDescriptor, Resolver, ShadingError,
    ShadingTaxonomy, StageSpec, TaxonomyBuilder, gbuffers, interner,
};

// ============================================================================
// Construction
// ============================================================================

#[test]
fn nested_literal_keeps_declaration_order() -> anyhow::Result<()> {
    let spec = StageSpec::root("nl_root")
        .with_child(
            StageSpec::new("nl_first", Predicate::kind(GeometryKind::Sky))
                .with_child(StageSpec::new("nl_first_leaf", Predicate::tag("stars"))),
        )
        .with_child(StageSpec::new("nl_second", Predicate::kind(GeometryKind::Cloud)));
    let taxonomy = ShadingTaxonomy::from_spec(&spec)?;

    let order: Vec<_> = taxonomy.names().collect();
    assert_eq!(order, ["nl_root", "nl_first", "nl_first_leaf", "nl_second"]);

    let leaf = taxonomy
        .get("nl_first_leaf")
        .ok_or_else(|| anyhow::anyhow!("leaf missing"))?;
    assert_eq!(taxonomy[leaf].depth(), 2);
    assert_eq!(
        taxonomy.ancestors("nl_first_leaf"),
        Some(vec!["nl_first", "nl_root"])
    );
    assert_eq!(taxonomy.parent_of("nl_second").map(|n| n.name()), Some("nl_root"));
    assert!(taxonomy.parent_of("nl_root").is_none());
    Ok(())
}

#[test]
fn builder_and_literal_produce_the_same_tree() -> anyhow::Result<()> {
    let built = TaxonomyBuilder::new("eq_root")
        .stage("eq_root", "eq_block", Predicate::kind(GeometryKind::Block))
        .stage("eq_block", "eq_water", Predicate::flags(ObjectFlags::FLUID))
        .stage("eq_root", "eq_sky", Predicate::kind(GeometryKind::Sky))
        .build()?;
    let literal = ShadingTaxonomy::from_spec(&StageSpec::root("eq_root").with_children([
        StageSpec::new("eq_block", Predicate::kind(GeometryKind::Block))
            .with_child(StageSpec::new("eq_water", Predicate::flags(ObjectFlags::FLUID))),
        StageSpec::new("eq_sky", Predicate::kind(GeometryKind::Sky)),
    ]))?;

    assert_eq!(built.to_string(), literal.to_string());
    assert!(built.names().eq(literal.names()));
    Ok(())
}

#[test]
fn root_predicate_is_always() {
    let spec = StageSpec::new("rp_root", Predicate::kind(GeometryKind::Block));
    let taxonomy = ShadingTaxonomy::from_spec(&spec).expect("valid spec");
    assert!(taxonomy.root_node().predicate().is_always());
}

// ============================================================================
// Construction Errors
// ============================================================================

#[test]
fn duplicate_stage_names_are_rejected() {
    let spec = StageSpec::root("du_root").with_children([
        StageSpec::new("du_leaf", Predicate::kind(GeometryKind::Block)),
        StageSpec::new("du_other", Predicate::kind(GeometryKind::Sky))
            .with_child(StageSpec::new("du_leaf", Predicate::tag("x"))),
    ]);

    assert_eq!(
        ShadingTaxonomy::from_spec(&spec).unwrap_err(),
        ShadingError::DuplicateStage {
            name: "du_leaf".into()
        }
    );
}

#[test]
fn reusing_the_root_name_is_rejected() {
    let err = TaxonomyBuilder::new("ru_root")
        .stage("ru_root", "ru_root", Predicate::Always)
        .build()
        .unwrap_err();
    assert!(matches!(err, ShadingError::DuplicateStage { name } if name == "ru_root"));
}

#[test]
fn unknown_parent_is_rejected_and_first_error_wins() {
    let err = TaxonomyBuilder::new("up_root")
        .stage("up_missing", "up_child", Predicate::Always)
        .stage("up_root", "up_root", Predicate::Always)
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        ShadingError::UnknownParent {
            parent: "up_missing".into(),
            child: "up_child".into(),
        }
    );
}

// ============================================================================
// Default gbuffers Tree
// ============================================================================

fn full_default_table() -> shade_route::RoutingTable {
    let taxonomy = gbuffers::default_taxonomy().expect("default taxonomy");
    let all: Vec<&str> = taxonomy.names().collect();
    Resolver::new(&taxonomy)
        .resolve_pack(&pack("complete", &all))
        .expect("root present")
}

fn route(table: &shade_route::RoutingTable, kind: GeometryKind, flags: ObjectFlags) -> &'static str {
    interner::resolve(table.classify(&RenderObjectDescriptor::new(kind).with_flags(flags)))
}

#[test]
fn default_tree_routes_typical_objects() {
    let table = full_default_table();
    let lit = ObjectFlags::TEXTURED | ObjectFlags::LIT;

    assert_eq!(route(&table, GeometryKind::Block, lit), gbuffers::TERRAIN);
    assert_eq!(route(&table, GeometryKind::Block, lit | ObjectFlags::FLUID), gbuffers::WATER);
    assert_eq!(route(&table, GeometryKind::BlockEntity, lit), gbuffers::BLOCK);
    assert_eq!(route(&table, GeometryKind::Entity, lit), gbuffers::ENTITIES);
    assert_eq!(route(&table, GeometryKind::Hand, lit), gbuffers::HAND);
    assert_eq!(route(&table, GeometryKind::Weather, lit), gbuffers::WEATHER);
    assert_eq!(route(&table, GeometryKind::Cloud, ObjectFlags::TEXTURED), gbuffers::CLOUDS);
    assert_eq!(route(&table, GeometryKind::Beacon, ObjectFlags::TEXTURED), gbuffers::BEACON_BEAM);
    assert_eq!(route(&table, GeometryKind::Particle, ObjectFlags::TEXTURED), gbuffers::TEXTURED);
    assert_eq!(route(&table, GeometryKind::Particle, lit), gbuffers::TEXTURED_LIT);
    assert_eq!(route(&table, GeometryKind::Gui, ObjectFlags::empty()), gbuffers::BASIC);
}

#[test]
fn default_tree_sky_split_on_texturing() {
    let table = full_default_table();
    assert_eq!(route(&table, GeometryKind::Sky, ObjectFlags::empty()), gbuffers::SKY_BASIC);
    assert_eq!(route(&table, GeometryKind::Sky, ObjectFlags::TEXTURED), gbuffers::SKY_TEXTURED);
}

#[test]
fn default_tree_overlays_take_priority() {
    let table = full_default_table();
    let lit = ObjectFlags::TEXTURED | ObjectFlags::LIT;

    assert_eq!(
        route(&table, GeometryKind::Block, lit | ObjectFlags::DAMAGED | ObjectFlags::FLUID),
        gbuffers::DAMAGED_BLOCK
    );
    assert_eq!(
        route(&table, GeometryKind::Entity, lit | ObjectFlags::EMISSIVE),
        gbuffers::SPIDER_EYES
    );
    assert_eq!(
        route(&table, GeometryKind::Entity, lit | ObjectFlags::GLINT),
        gbuffers::ARMOR_GLINT
    );
    // Emissive non-entities are ordinary lit geometry.
    assert_eq!(
        route(&table, GeometryKind::Block, lit | ObjectFlags::EMISSIVE),
        gbuffers::TERRAIN
    );
}

#[test]
fn default_tree_dump_lists_every_stage() {
    let taxonomy = gbuffers::default_taxonomy().expect("default taxonomy");
    let dump = taxonomy.to_string();

    assert_eq!(dump.lines().count(), taxonomy.len());
    assert!(dump.starts_with("gbuffers_basic: always"), "{dump}");
    for name in taxonomy.names() {
        assert!(dump.contains(name), "{name} missing from\n{dump}");
    }
}
