//! pathchain-interchange: structural deserialization of untrusted
//! path-definition documents.
//!
//! A document arriving over a process or network boundary is JSON shaped
//! like the engine's own serialization, but it cannot be assumed
//! well-typed. [`from_document`] walks a `serde_json::Value` and rebuilds a
//! [`pathchain_core::PathChainFile`], rejecting anything whose shape or tag
//! is wrong with a field-precise [`DocumentError`]. Referential integrity
//! (dangling names, arity, uniqueness) stays with the core validator; this
//! crate only guarantees the shapes.

pub mod deserialize;

pub use deserialize::{from_document, DocumentError};
