//! Utility Module
//!
//! - [`interner`]: String interning for stage, program and tag names
//!
//! # String Interning
//!
//! Interned strings (Symbols) can be compared in O(1) time.
//!
//! ```rust,ignore
//! use shade_route::utils::interner;
//!
//! let sym1 = interner::intern("gbuffers_terrain");
//! let sym2 = interner::intern("gbuffers_terrain");
//! assert_eq!(sym1, sym2);
//! ```

pub mod interner;

pub use interner::Symbol;
