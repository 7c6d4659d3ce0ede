//! pathchain-core: path-definition extraction and resolution engine.
//!
//! Turns Java source files containing path declarations (named values,
//! poses, bezier lines/curves, path chains) into a typed document, indexes
//! it, validates every reference, and resolves references into concrete
//! 2-D geometry.
//!
//! # Pipeline
//!
//! - [`extract_source`] / [`extract_file`] -- source text -> [`PathChainFile`]
//! - [`build_index`] -- document -> [`ResolvedIndex`] (total, never fails)
//! - [`validate`] -- all violations aggregated into one [`Violations`] report
//! - [`resolve::*`](resolve) -- references -> points, point sequences,
//!   headings in radians
//!
//! The engine is synchronous and owns no global state: indexes are passed
//! into every resolver call, and each call tracks its own cycle state, so
//! concurrent resolution against a shared index is safe.

pub mod ast;
pub mod error;
pub mod extract;
pub mod index;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::ExtractError;
pub use index::ResolvedIndex;
pub use model::PathChainFile;
pub use resolve::{ConcreteHeading, Point, ResolveError};
pub use validate::Violations;

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use extract::{extract_file, extract_source};
pub use index::build_index;
pub use resolve::{
    resolve_bezier, resolve_chain, resolve_heading, resolve_pose, resolve_pose_heading,
    resolve_value,
};
pub use validate::validate;
