//! Render actor side of the pipeline.

use std::sync::Arc;

use flume::Receiver;
use rustc_hash::FxHashMap;

use super::{PendingBuild, PublishedRouting, Shared};
use crate::descriptor::RenderObjectDescriptor;
use crate::errors::{Result, ShadingError};
use crate::registry::{CompileDiagnostics, GpuBackend, ProgramHandle, ProgramRegistry};
use crate::routing::RoutingTable;
use crate::settings::CompileFailurePolicy;
use crate::utils::interner::{self, Symbol};

/// What one [`ShadingRenderer::pump`] call did.
#[derive(Debug, Default)]
pub struct PumpReport {
    /// Sequence number swapped in, if any.
    pub published: Option<u64>,
    /// Builds dropped because a newer one was pending or published.
    pub superseded: Vec<u64>,
    /// Builds that failed on the render actor.
    pub rejected: Vec<(u64, ShadingError)>,
    /// Programs that failed to compile and were routed to an ancestor.
    pub fallbacks: Vec<CompileDiagnostics>,
}

impl PumpReport {
    /// Nothing was pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.published.is_none() && self.superseded.is_empty() && self.rejected.is_empty()
    }
}

/// Owns the GPU programs and performs the compile-then-swap handoff.
///
/// Lives on the thread that owns the GPU context. It is the only publisher,
/// so it keeps its own copy of the published snapshot and never locks to
/// classify.
pub struct ShadingRenderer<B: GpuBackend> {
    shared: Arc<Shared>,
    receiver: Receiver<PendingBuild>,
    registry: ProgramRegistry<B>,
    /// Last snapshot this renderer published.
    routing: Arc<PublishedRouting>,
}

impl<B: GpuBackend> ShadingRenderer<B> {
    pub(crate) fn new(
        shared: Arc<Shared>,
        receiver: Receiver<PendingBuild>,
        registry: ProgramRegistry<B>,
    ) -> Self {
        let routing = shared.current();
        Self {
            shared,
            receiver,
            registry,
            routing,
        }
    }

    /// Processes pending builds. Call once per frame, before
    /// [`Self::begin_frame`].
    ///
    /// Only the newest pending build is compiled; older ones are reported as
    /// superseded. A rejected build leaves the published routing untouched.
    pub fn pump(&mut self) -> PumpReport {
        let mut report = PumpReport::default();

        let mut newest: Option<PendingBuild> = None;
        for build in self.receiver.try_iter() {
            if newest.as_ref().is_none_or(|kept| build.sequence > kept.sequence) {
                if let Some(older) = newest.replace(build) {
                    report.superseded.push(older.sequence);
                }
            } else {
                report.superseded.push(build.sequence);
            }
        }

        let Some(build) = newest else {
            return report;
        };

        let published = self.shared.published_sequence();
        if build.sequence <= published {
            log::debug!(
                "Dropping reload #{}, #{published} is already published",
                build.sequence
            );
            report.superseded.push(build.sequence);
            return report;
        }

        let sequence = build.sequence;
        match self.compile_and_swap(build, &mut report.fallbacks) {
            Ok(()) => report.published = Some(sequence),
            Err(e) => {
                log::error!("Reload #{sequence} rejected: {e}");
                self.registry.discard_unreferenced();
                report.rejected.push((sequence, e));
            }
        }
        report
    }

    fn compile_and_swap(
        &mut self,
        build: PendingBuild,
        fallbacks: &mut Vec<CompileDiagnostics>,
    ) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let taxonomy = &shared.taxonomy;

        let mut compiled: FxHashMap<Symbol, ProgramHandle> = FxHashMap::default();
        let mut failures: Vec<CompileDiagnostics> = Vec::new();
        for visit in taxonomy.depth_first() {
            let Some(source) = build.pack.get(visit.node.name()) else {
                continue;
            };
            match self.registry.ensure_compiled(visit.node.symbol(), source) {
                Ok(handle) => {
                    compiled.insert(visit.node.symbol(), handle);
                }
                Err(diagnostics) => failures.push(diagnostics),
            }
        }

        let root = taxonomy.root_node();
        if !compiled.contains_key(&root.symbol()) {
            let diagnostics = failures
                .into_iter()
                .find(|d| d.program == root.name())
                .unwrap_or_else(|| CompileDiagnostics {
                    program: root.name().to_string(),
                    log: "no compiled root program".to_string(),
                });
            return Err(ShadingError::RootCompileFailed(diagnostics));
        }

        let table: RoutingTable = if failures.is_empty() {
            build.table
        } else {
            match shared.settings.compile_failure {
                CompileFailurePolicy::RejectPack => {
                    return Err(ShadingError::CompileFailed(failures.swap_remove(0)));
                }
                CompileFailurePolicy::FallbackToAncestor => {
                    for failure in &failures {
                        log::warn!(
                            "Routing stage '{}' of pack '{}' to its ancestors",
                            failure.program,
                            build.pack.name()
                        );
                    }
                    fallbacks.extend(failures);
                    shared.resolver().resolve(build.pack.name(), |name| {
                        interner::get(name).is_some_and(|sym| compiled.contains_key(&sym))
                    })?
                }
            }
        };

        let binding: FxHashMap<Symbol, ProgramHandle> = table
            .programs()
            .iter()
            .filter_map(|&program| compiled.get(&program).map(|&handle| (program, handle)))
            .collect();
        debug_assert_eq!(binding.len(), table.programs().len());

        let pack_name = build.pack.name().to_string();
        let routing = shared.publish(PublishedRouting {
            sequence: build.sequence,
            pack: Arc::new(build.pack),
            table,
        })?;
        self.registry.commit(binding);
        self.routing = Arc::clone(&routing);

        log::info!(
            "Published pack '{pack_name}' (reload #{}): {} stages onto {} programs",
            routing.sequence,
            routing.table.len(),
            routing.table.programs().len()
        );
        Ok(())
    }

    /// Starts a frame: recycles expired programs and snapshots the routing.
    pub fn begin_frame(&mut self) -> Frame<'_, B> {
        let index = self.registry.begin_frame();
        Frame {
            routing: Arc::clone(&self.routing),
            registry: &self.registry,
            index,
        }
    }

    /// Effective program for `descriptor` under the current routing.
    #[must_use]
    pub fn classify(&self, descriptor: &RenderObjectDescriptor) -> &'static str {
        interner::resolve(self.routing.table.classify(descriptor))
    }

    /// Checks that every program the current routing names has a handle.
    pub fn verify(&self) -> Result<()> {
        for entry in self.routing.table.entries() {
            if self.registry.handle(entry.program).is_none() {
                return Err(ShadingError::StaleReference {
                    stage: entry.stage_name().to_string(),
                    program: entry.program_name().to_string(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn current(&self) -> Arc<PublishedRouting> {
        Arc::clone(&self.routing)
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ProgramRegistry<B> {
        &self.registry
    }
}

/// One frame's view of the routing and the programs it references.
pub struct Frame<'r, B: GpuBackend> {
    routing: Arc<PublishedRouting>,
    registry: &'r ProgramRegistry<B>,
    index: u64,
}

impl<'r, B: GpuBackend> Frame<'r, B> {
    #[inline]
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.routing.sequence
    }

    #[inline]
    #[must_use]
    pub fn table(&self) -> &RoutingTable {
        &self.routing.table
    }

    #[inline]
    #[must_use]
    pub fn pack_name(&self) -> &str {
        self.routing.pack.name()
    }

    #[must_use]
    pub fn classify(&self, descriptor: &RenderObjectDescriptor) -> &'static str {
        interner::resolve(self.routing.table.classify(descriptor))
    }

    /// Program for `descriptor`, or [`ShadingError::StaleReference`] if the
    /// routing names a program without a compiled handle.
    ///
    /// Diagnostics only. A stale reference is a broken publication protocol,
    /// not a condition to recover from; draw paths use
    /// [`Self::program_for`], which treats it as fatal. This exists for
    /// tooling that wants to report the offending stage instead of aborting.
    pub fn try_program_for(
        &self,
        descriptor: &RenderObjectDescriptor,
    ) -> Result<(ProgramHandle, &'r B::Program)> {
        let entry = self.routing.table.classify_entry(descriptor);
        let registry = self.registry;
        registry
            .handle(entry.program)
            .and_then(|handle| registry.get(handle).map(|program| (handle, program)))
            .ok_or_else(|| ShadingError::StaleReference {
                stage: entry.stage_name().to_string(),
                program: entry.program_name().to_string(),
            })
    }

    /// Program for `descriptor`.
    ///
    /// # Panics
    ///
    /// If the routing names a program with no compiled handle. The
    /// compile-then-swap order makes this unreachable; reaching it means the
    /// publication protocol was broken.
    #[must_use]
    pub fn program_for(&self, descriptor: &RenderObjectDescriptor) -> &'r B::Program {
        match self.try_program_for(descriptor) {
            Ok((_, program)) => program,
            Err(e) => panic!("routing protocol violated: {e}"),
        }
    }
}
