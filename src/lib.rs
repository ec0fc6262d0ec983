//! # Shade Route
//!
//! Classifies render objects into shader programs when the installed shader
//! pack only covers part of a fixed taxonomy of shading stages.
//!
//! Objects that logically belong to a stage the pack does not supply are
//! routed to the nearest ancestor stage that it does supply. The routing is
//! computed once per pack (re)load into an immutable [`RoutingTable`] and
//! published to the render thread together with the compiled programs it
//! references.
//!
//! ```rust,ignore
//! use shade_route::prelude::*;
//!
//! let taxonomy = gbuffers::default_taxonomy()?;
//! let (loader, mut renderer) =
//!     pipeline::create(taxonomy, ShadingSettings::default(), MyBackend::new())?;
//!
//! // Loader thread
//! loader.submit_pack(pack)?;
//!
//! // Render thread, once per frame
//! renderer.pump();
//! let frame = renderer.begin_frame();
//! let program = frame.program_for(&descriptor);
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod descriptor;
pub mod errors;
pub mod pack;
pub mod pipeline;
pub mod predicate;
pub mod registry;
pub mod resolver;
pub mod routing;
pub mod settings;
pub mod taxonomy;
pub mod utils;

pub use descriptor::{GeometryKind, ObjectFlags, RenderObjectDescriptor};
pub use errors::{Result, ShadingError};
pub use pack::{PackDefinitions, ShaderSource};
pub use pipeline::{Frame, PackLoader, PumpReport, ReloadTicket, ShadingRenderer};
pub use predicate::Predicate;
pub use registry::{CompileDiagnostics, GpuBackend, ProgramHandle, ProgramRegistry};
pub use resolver::Resolver;
pub use routing::{RouteEntry, RoutingTable};
pub use settings::{CompileFailurePolicy, ShadingSettings};
pub use taxonomy::{ShadingTaxonomy, StageKey, StageNode, StageSpec, TaxonomyBuilder, gbuffers};
pub use utils::interner::{self, Symbol};

pub mod prelude {
    //! Common imports for hosts embedding the router.
    pub use crate::descriptor::{GeometryKind, ObjectFlags, RenderObjectDescriptor};
    pub use crate::errors::{Result, ShadingError};
    pub use crate::pack::{PackDefinitions, ShaderSource};
    pub use crate::pipeline::{self, Frame, PackLoader, ShadingRenderer};
    pub use crate::predicate::Predicate;
    pub use crate::registry::{CompileDiagnostics, GpuBackend};
    pub use crate::settings::{CompileFailurePolicy, ShadingSettings};
    pub use crate::taxonomy::{ShadingTaxonomy, StageSpec, TaxonomyBuilder, gbuffers};
}
