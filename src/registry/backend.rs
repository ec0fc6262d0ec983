//! GPU backend seam.
//!
//! The registry never talks to a graphics API directly. Hosts implement
//! [`GpuBackend`] over their device (OpenGL program objects, wgpu pipelines,
//! …) and hand it to the render actor, which owns it exclusively.

use thiserror::Error;

use crate::pack::ShaderSource;

/// Compiler output for a program that failed to build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{program}': {log}")]
pub struct CompileDiagnostics {
    /// Name of the program that failed
    pub program: String,
    /// Compiler / linker log
    pub log: String,
}

/// Compiles and releases GPU programs.
///
/// Called only from the thread that owns the GPU context.
pub trait GpuBackend {
    /// Backend-specific compiled program object.
    type Program;

    /// Compiles `source`. On failure returns the compiler log.
    fn compile(&mut self, label: &str, source: &ShaderSource) -> Result<Self::Program, String>;

    /// Destroys a program previously returned by [`Self::compile`].
    fn release(&mut self, program: Self::Program);
}
