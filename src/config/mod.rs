//! Configuration loading for shimpatch.
//!
//! This module handles:
//! - `shimpatch.toml` parsing and validation
//! - Nearest-config discovery with a user-level fallback

pub mod discovery;
pub mod parser;
pub mod types;

pub use discovery::{CONFIG_FILE_NAME, discover_config, user_config_path};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{AssetsSection, BuildSection, Config, LoadedConfig, PipelineSection, RuleConfig};

/// Template written by `shimpatch --init`.
pub fn init_template() -> &'static str {
	r#"# shimpatch.toml -- browser-shim patching and build pipeline configuration

# Builtin rules rewrite require("fs") / require('fs') to an inert object and
# require("path") / require('path') to an inline browser-safe shim.
use-builtin-rules = true

[build]
out-dir = "dist"
formats = ["es", "cjs"]
externals = ["react", "react-dom", "maplibre-gl"]

[build.entries]
index = "src/index.ts"

[assets]
include = ["**/*.wasm"]

# [assets.rename]
# "style.css" = "my-library.css"

# External stages run through `sh -c`; absent stages are skipped.
# [pipeline]
# compile = "tsc -p ."
# bundle = "rollup -c"
# emit-types = "tsc --emitDeclarationOnly"

# Extra literal replacement rules, applied together with the builtin set.
# [[patch]]
# pattern = 'require("os")'
# replace = "{}"
"#
}
