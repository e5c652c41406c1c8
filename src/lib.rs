//! Shimpatch - CLI tool for patching Node-only module references out of
//! browser library bundles.
//!
//! This library provides the core functionality for shimpatch, including:
//! - Configuration file parsing and nearest-config discovery
//! - The literal patch set and its disjointness validation
//! - Pure, idempotent patch application to module text
//! - The fixed build pipeline (compile, patch, bundle, emit-types,
//!   write-assets) with subprocess stage commands
//!
//! # Example
//!
//! ```
//! use shimpatch_cli::patch::{PatchSet, apply_patches};
//!
//! let set = PatchSet::builtin();
//!
//! let module_text = r#"if (ENVIRONMENT_IS_NODE) { fs = require("fs"); }"#;
//! let patched = apply_patches(&set, module_text);
//!
//! assert_eq!(patched, "if (ENVIRONMENT_IS_NODE) { fs = {}; }");
//! assert_eq!(apply_patches(&set, &patched), patched);
//! ```

pub mod config;
pub mod error;
pub mod naming;
pub mod patch;
pub mod pipeline;

pub use error::{Result, ShimpatchError};
