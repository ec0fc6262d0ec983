//! Pack Publication Pipeline
//!
//! Connects the two actors that share routing state:
//!
//! - the **loading actor** ([`PackLoader`]) receives pack snapshots, resolves
//!   them off the render path and hands the result over a channel;
//! - the **render actor** ([`ShadingRenderer`]) owns the GPU context. Once per
//!   frame it drains pending builds, compiles their programs, and only then
//!   swaps the new routing in (compile-then-swap).
//!
//! # Snapshots
//!
//! The current [`PublishedRouting`] (routing table + pack) is an immutable
//! `Arc` snapshot. A swap replaces the pointer under a short write lock;
//! readers clone the `Arc` and never observe a partial table.
//!
//! # Ordering
//!
//! Every reload gets a monotonic sequence number at [`PackLoader::reserve`].
//! A build only publishes if its number is higher than the published one,
//! so two racing reloads can never publish in reverse order.

mod loader;
mod render;

pub use loader::{PackLoader, ReloadTicket};
pub use render::{Frame, PumpReport, ShadingRenderer};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::errors::{Result, ShadingError};
use crate::pack::PackDefinitions;
use crate::registry::{GpuBackend, ProgramRegistry};
use crate::resolver::Resolver;
use crate::routing::RoutingTable;
use crate::settings::ShadingSettings;
use crate::taxonomy::ShadingTaxonomy;

/// Name of the pack published before any external pack succeeds.
pub const BUILTIN_PACK: &str = "builtin";

/// A published routing state.
#[derive(Debug)]
pub struct PublishedRouting {
    pub sequence: u64,
    pub pack: Arc<PackDefinitions>,
    pub table: RoutingTable,
}

/// A resolved pack waiting for the render actor.
pub(crate) struct PendingBuild {
    pub sequence: u64,
    pub pack: PackDefinitions,
    pub table: RoutingTable,
}

pub(crate) struct Shared {
    pub taxonomy: ShadingTaxonomy,
    pub settings: ShadingSettings,
    /// Highest sequence number handed out.
    issued: AtomicU64,
    /// Sequence number of `current`.
    published: AtomicU64,
    current: RwLock<Arc<PublishedRouting>>,
    swap_guard: Mutex<()>,
}

impl Shared {
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.taxonomy).with_kind_partition(self.settings.partition_by_kind)
    }

    pub fn next_sequence(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn latest_sequence(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }

    pub fn published_sequence(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    pub fn current(&self) -> Arc<PublishedRouting> {
        Arc::clone(&self.current.read())
    }

    /// Swaps in `routing` unless an equal or newer sequence is published.
    pub fn publish(&self, routing: PublishedRouting) -> Result<Arc<PublishedRouting>> {
        let _guard = self.swap_guard.lock();

        let published = self.published.load(Ordering::Acquire);
        if routing.sequence <= published {
            return Err(ShadingError::Superseded {
                sequence: routing.sequence,
                latest: published,
            });
        }

        let sequence = routing.sequence;
        let routing = Arc::new(routing);
        *self.current.write() = Arc::clone(&routing);
        self.published.store(sequence, Ordering::Release);
        Ok(routing)
    }
}

/// Sets up the loader / renderer pair.
///
/// Compiles `settings.builtin_root_source` as the root program and publishes
/// it as sequence 0, so classification works before any pack is loaded.
pub fn create<B: GpuBackend>(
    taxonomy: ShadingTaxonomy,
    settings: ShadingSettings,
    backend: B,
) -> Result<(PackLoader, ShadingRenderer<B>)> {
    let root = taxonomy.root_node().symbol();
    let root_name = taxonomy.root_name();

    let mut registry = ProgramRegistry::new(backend, settings.frames_in_flight);
    let handle = registry
        .ensure_compiled(root, &settings.builtin_root_source)
        .map_err(ShadingError::RootCompileFailed)?;

    let pack = PackDefinitions::new(BUILTIN_PACK)
        .with_shader(root_name, settings.builtin_root_source.clone());
    let table = Resolver::new(&taxonomy)
        .with_kind_partition(settings.partition_by_kind)
        .resolve_pack(&pack)?;

    let mut binding = FxHashMap::default();
    binding.insert(root, handle);
    registry.commit(binding);

    log::info!(
        "Shading router ready: {} stages, built-in '{root_name}' program",
        taxonomy.len()
    );

    let current = PublishedRouting {
        sequence: 0,
        pack: Arc::new(pack),
        table,
    };
    let shared = Arc::new(Shared {
        taxonomy,
        settings,
        issued: AtomicU64::new(0),
        published: AtomicU64::new(0),
        current: RwLock::new(Arc::new(current)),
        swap_guard: Mutex::new(()),
    });

    let (sender, receiver) = flume::unbounded();
    Ok((
        PackLoader::new(Arc::clone(&shared), sender),
        ShadingRenderer::new(shared, receiver, registry),
    ))
}
