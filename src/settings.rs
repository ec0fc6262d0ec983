//! Router Settings
//!
//! ```rust,ignore
//! use shade_route::{CompileFailurePolicy, ShadingSettings};
//!
//! // Default: broken programs fall back to their ancestors
//! let settings = ShadingSettings::default();
//!
//! // Strict: any compile error rejects the whole pack
//! let settings = ShadingSettings {
//!     compile_failure: CompileFailurePolicy::RejectPack,
//!     frames_in_flight: 3,
//!     ..Default::default()
//! };
//! ```

use crate::pack::ShaderSource;

/// What a pack build does when one of its programs fails to compile.
///
/// A root that fails to compile always rejects the pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileFailurePolicy {
    /// Treat the broken stage as absent: its objects are rerouted to the
    /// nearest ancestor whose program did compile.
    #[default]
    FallbackToAncestor,
    /// Reject the whole pack; the previous routing stays in effect.
    RejectPack,
}

const BUILTIN_VERTEX: &str = r"#version 450
layout(location = 0) in vec3 position;
layout(location = 1) in vec4 color;
layout(location = 0) out vec4 v_color;
layout(set = 0, binding = 0) uniform Camera { mat4 view_proj; };
void main() {
    v_color = color;
    gl_Position = view_proj * vec4(position, 1.0);
}
";

const BUILTIN_FRAGMENT: &str = r"#version 450
layout(location = 0) in vec4 v_color;
layout(location = 0) out vec4 out_color;
void main() {
    out_color = v_color;
}
";

/// Configuration of the routing pipeline.
#[derive(Debug, Clone)]
pub struct ShadingSettings {
    pub compile_failure: CompileFailurePolicy,

    /// Number of frames a program handle stays alive after the routing
    /// table that referenced it was replaced.
    ///
    /// Must cover every frame the GPU may still be executing. Default: 2.
    pub frames_in_flight: u32,

    /// Build per-[`GeometryKind`] scan buckets in routing tables.
    ///
    /// [`GeometryKind`]: crate::descriptor::GeometryKind
    pub partition_by_kind: bool,

    /// Root program used until the first pack publishes successfully.
    pub builtin_root_source: ShaderSource,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            compile_failure: CompileFailurePolicy::FallbackToAncestor,
            frames_in_flight: 2,
            partition_by_kind: true,
            builtin_root_source: ShaderSource::new(BUILTIN_VERTEX, BUILTIN_FRAGMENT),
        }
    }
}
