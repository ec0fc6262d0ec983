//! Classification throughput over the default gbuffers tree.
//!
//! Compares the per-kind bucket scan against the plain reverse scan, for a
//! complete pack and a sparse one.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use shade_route::{
    GeometryKind, ObjectFlags, PackDefinitions, RenderObjectDescriptor, Resolver, RoutingTable,
    ShaderSource, ShadingTaxonomy, gbuffers,
};

fn pack(name: &str, stages: &[&str]) -> PackDefinitions {
    stages.iter().fold(PackDefinitions::new(name), |pack, stage| {
        pack.with_shader(*stage, ShaderSource::new("void main() {}", *stage))
    })
}

fn workload() -> Vec<RenderObjectDescriptor> {
    let lit = ObjectFlags::TEXTURED | ObjectFlags::LIT;
    let mut objects = Vec::with_capacity(4096);
    for i in 0..4096_u32 {
        let kind = GeometryKind::ALL[(i as usize * 7) % GeometryKind::COUNT];
        let extra = ObjectFlags::from_bits_truncate((i % 128) as u16);
        let flags = if i % 5 == 0 { extra } else { lit | extra };
        let object = RenderObjectDescriptor::new(kind).with_flags(flags);
        objects.push(if i % 11 == 0 { object.with_tag("glass") } else { object });
    }
    objects
}

fn table(taxonomy: &ShadingTaxonomy, stages: &[&str], bucketed: bool) -> RoutingTable {
    Resolver::new(taxonomy)
        .with_kind_partition(bucketed)
        .resolve_pack(&pack("bench", stages))
        .expect("root present")
}

fn bench_classify(c: &mut Criterion) {
    let taxonomy = gbuffers::default_taxonomy().expect("default taxonomy");
    let complete: Vec<&str> = taxonomy.names().collect();
    let sparse = [gbuffers::BASIC, gbuffers::TEXTURED_LIT, gbuffers::WATER];
    let objects = workload();

    let mut group = c.benchmark_group("classify_4096");
    for (label, stages) in [("complete", complete.as_slice()), ("sparse", &sparse[..])] {
        for bucketed in [false, true] {
            let routing = table(&taxonomy, stages, bucketed);
            let id = BenchmarkId::new(label, if bucketed { "buckets" } else { "linear" });
            group.bench_with_input(id, &objects, |b, objects| {
                b.iter(|| {
                    for object in objects {
                        black_box(routing.classify(black_box(object)));
                    }
                });
            });
        }
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let taxonomy = gbuffers::default_taxonomy().expect("default taxonomy");
    let complete: Vec<&str> = taxonomy.names().collect();
    let supplied = pack("bench", &complete);

    c.bench_function("resolve_default_tree", |b| {
        b.iter(|| {
            Resolver::new(&taxonomy)
                .resolve_pack(black_box(&supplied))
                .expect("root present")
        });
    });
}

criterion_group!(benches, bench_classify, bench_resolve);
criterion_main!(benches);
