//! Shared helpers for integration tests.

#![allow(dead_code)]

use shade_route::{
    GeometryKind, GpuBackend, ObjectFlags, PackDefinitions, RenderObjectDescriptor, ShaderSource,
    ShadingTaxonomy,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Program object handed out by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProgram {
    pub id: u32,
    pub label: String,
}

/// Records compile/release calls. Sources whose fragment contains `#error`
/// fail to compile.
#[derive(Debug, Default)]
pub struct MockBackend {
    next_id: u32,
    pub compiled: Vec<String>,
    pub released: Vec<u32>,
}

impl GpuBackend for MockBackend {
    type Program = MockProgram;

    fn compile(&mut self, label: &str, source: &ShaderSource) -> Result<MockProgram, String> {
        if source.fragment.contains("#error") {
            return Err(format!("ERROR: 0:1: '{label}' : syntax error"));
        }
        self.next_id += 1;
        self.compiled.push(label.to_string());
        Ok(MockProgram {
            id: self.next_id,
            label: label.to_string(),
        })
    }

    fn release(&mut self, program: MockProgram) {
        self.released.push(program.id);
    }
}

pub fn source(stage: &str) -> ShaderSource {
    ShaderSource::new(
        format!("// {stage}.vsh\nvoid main() {{}}"),
        format!("// {stage}.fsh\nvoid main() {{}}"),
    )
}

pub fn broken_source(stage: &str) -> ShaderSource {
    ShaderSource::new(format!("// {stage}.vsh"), "#error broken")
}

pub fn pack(name: &str, stages: &[&str]) -> PackDefinitions {
    stages
        .iter()
        .fold(PackDefinitions::new(name), |pack, stage| {
            pack.with_shader(*stage, source(stage))
        })
}

/// Every combination of kind, flags and the given tags (plus no tag).
pub fn all_descriptors(tags: &[&str]) -> Vec<RenderObjectDescriptor> {
    let mut out = Vec::new();
    for kind in GeometryKind::ALL {
        for bits in 0..=ObjectFlags::all().bits() {
            let base = RenderObjectDescriptor::new(kind)
                .with_flags(ObjectFlags::from_bits_truncate(bits));
            out.push(base);
            for tag in tags {
                out.push(base.with_tag(tag));
            }
        }
    }
    out
}

/// Straightforward per-object tree walk: descend into the first child whose
/// intrinsic predicate matches, then fall back along the path to the
/// nearest stage the pack supplies.
pub fn reference_classify(
    taxonomy: &ShadingTaxonomy,
    is_present: impl Fn(&str) -> bool,
    descriptor: &RenderObjectDescriptor,
) -> &'static str {
    let mut cursor = taxonomy.root();
    let mut program = taxonomy.root_name();
    loop {
        let node = &taxonomy[cursor];
        if is_present(node.name()) {
            program = node.name();
        }
        let next = node
            .children()
            .iter()
            .copied()
            .find(|&child| taxonomy[child].predicate().matches(descriptor));
        match next {
            Some(child) => cursor = child,
            None => return program,
        }
    }
}

/// Deterministic pseudo-random stage subsets that always keep the root.
pub fn sample_subsets(taxonomy: &ShadingTaxonomy, count: usize) -> Vec<Vec<&'static str>> {
    let names: Vec<&'static str> = taxonomy.names().collect();
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            names
                .iter()
                .enumerate()
                .filter(|&(i, _)| {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    i == 0 || (state >> 33) % 2 == 0
                })
                .map(|(_, &name)| name)
                .collect()
        })
        .collect()
}
