//! The source patcher.
//!
//! This module handles:
//! - Literal replacement rules and the validated patch set
//! - Exhaustive, idempotent application to module text
//! - The browser-safe shims substituted for Node references

pub mod apply;
pub mod rules;
pub mod shim;

pub use apply::{apply_patches, occurrence_count, would_change};
pub use rules::{PatchRule, PatchSet};
