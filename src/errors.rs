//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`ShadingError`] covers:
//! - Taxonomy construction errors (duplicate or orphaned stages)
//! - Resolution errors (a pack without the root program)
//! - Program compilation errors reported by the GPU backend
//! - Publication errors (superseded reloads, disconnected render actor)
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ShadingError>`.
//!
//! ```rust,ignore
//! use shade_route::errors::{Result, ShadingError};
//!
//! fn reload(loader: &PackLoader, pack: PackDefinitions) -> Result<u64> {
//!     loader.submit_pack(pack)
//! }
//! ```

use thiserror::Error;

use crate::registry::CompileDiagnostics;

/// The main error type for shading-stage routing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShadingError {
    // ========================================================================
    // Taxonomy Errors
    // ========================================================================
    /// Two stages in the taxonomy declare the same name.
    #[error("Duplicate shading stage in taxonomy: {name}")]
    DuplicateStage {
        /// The repeated stage name
        name: String,
    },

    /// A stage was attached to a parent that does not exist.
    #[error("Shading stage '{child}' refers to unknown parent '{parent}'")]
    UnknownParent {
        /// The parent name that could not be found
        parent: String,
        /// The stage being attached
        child: String,
    },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The pack does not supply the taxonomy root, the universal fallback.
    #[error("Shader pack '{pack}' is missing the root program '{root}'")]
    MissingRoot {
        /// Name of the rejected pack
        pack: String,
        /// Name of the taxonomy root
        root: String,
    },

    // ========================================================================
    // Compilation Errors
    // ========================================================================
    /// The root program failed to compile, so no fallback exists.
    #[error("Root program failed to compile: {0}")]
    RootCompileFailed(CompileDiagnostics),

    /// A program failed to compile under [`CompileFailurePolicy::RejectPack`].
    ///
    /// [`CompileFailurePolicy::RejectPack`]: crate::settings::CompileFailurePolicy::RejectPack
    #[error("Program failed to compile: {0}")]
    CompileFailed(CompileDiagnostics),

    // ========================================================================
    // Publication Errors
    // ========================================================================
    /// A newer reload was requested before this one could publish.
    #[error("Pack reload #{sequence} superseded by #{latest}")]
    Superseded {
        /// Sequence number of the discarded reload
        sequence: u64,
        /// Newest sequence number known at the time
        latest: u64,
    },

    /// A routing entry names a program with no compiled handle.
    ///
    /// Only reachable if the compile-then-swap protocol was violated.
    #[error("Stage '{stage}' routes to program '{program}' which has no compiled handle")]
    StaleReference {
        /// Stage whose entry was consulted
        stage: String,
        /// Program the entry routes to
        program: String,
    },

    /// The render actor was dropped; no build can be published any more.
    #[error("Render actor disconnected")]
    RendererDisconnected,
}

/// Alias for `Result<T, ShadingError>`.
pub type Result<T> = std::result::Result<T, ShadingError>;
