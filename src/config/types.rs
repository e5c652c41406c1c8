use crate::naming::{Format, output_file_name};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration from a `shimpatch.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If false, start from an empty patch set instead of the builtin
	/// Node-reference rules.
	#[serde(default = "default_true")]
	pub use_builtin_rules: bool,

	/// Bundle layout: entry points, output formats, externals.
	#[serde(default)]
	pub build: BuildSection,

	/// Asset include globs and rename rules for the write-assets stage.
	#[serde(default)]
	pub assets: AssetsSection,

	/// Commands for the external pipeline stages. Absent stages are skipped.
	#[serde(default)]
	pub pipeline: PipelineSection,

	/// Extra replacement rules, applied together with the builtin set.
	#[serde(default, rename = "patch")]
	pub patch_rules: Vec<RuleConfig>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			use_builtin_rules: true,
			build: BuildSection::default(),
			assets: AssetsSection::default(),
			pipeline: PipelineSection::default(),
			patch_rules: Vec::new(),
		}
	}
}

/// Bundle layout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSection {
	/// Directory the pipeline compiles into and patches in place.
	#[serde(default = "default_out_dir")]
	pub out_dir: PathBuf,

	/// Entry name to source file. Names become output file stems.
	#[serde(default)]
	pub entries: BTreeMap<String, PathBuf>,

	/// Output module formats emitted per entry.
	#[serde(default = "default_formats")]
	pub formats: Vec<Format>,

	/// Runtime dependencies left unresolved in the bundle.
	#[serde(default)]
	pub externals: Vec<String>,
}

impl Default for BuildSection {
	fn default() -> Self {
		Self {
			out_dir: default_out_dir(),
			entries: BTreeMap::new(),
			formats: default_formats(),
			externals: Vec::new(),
		}
	}
}

impl BuildSection {
	/// Output file names the bundle stage is expected to produce, in
	/// deterministic (entry, format) order.
	pub fn expected_outputs(&self) -> Vec<String> {
		self.entries
			.keys()
			.flat_map(|entry| {
				self.formats
					.iter()
					.map(|format| output_file_name(entry, *format))
			})
			.collect()
	}
}

/// Asset handling for the write-assets stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetsSection {
	/// Globs (relative to out-dir) selecting files treated as assets.
	#[serde(default)]
	pub include: Vec<String>,

	/// Output file name to final asset name.
	#[serde(default)]
	pub rename: BTreeMap<String, String>,
}

/// Subprocess commands for the external pipeline stages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineSection {
	/// Runs before patching, typically the compiler emitting into out-dir.
	pub compile: Option<String>,

	/// Runs after patching, assembling the final bundle.
	pub bundle: Option<String>,

	/// Runs after bundling, emitting type declarations.
	pub emit_types: Option<String>,
}

/// A `[[patch]]` rule as written in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleConfig {
	/// Literal text to search for.
	pub pattern: String,

	/// Literal replacement text. May be empty to delete the pattern.
	pub replace: String,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

fn default_true() -> bool {
	true
}

fn default_out_dir() -> PathBuf {
	PathBuf::from("dist")
}

fn default_formats() -> Vec<Format> {
	vec![Format::Es, Format::Cjs]
}

impl Config {
	/// Validate everything checkable without building the patch set.
	/// Patch-rule disjointness is checked when the set is constructed.
	pub fn validate(&self) -> Result<(), crate::error::ShimpatchError> {
		use crate::error::ShimpatchError;

		if self.build.formats.is_empty() {
			return Err(ShimpatchError::InvalidConfig {
				reason: "build.formats must name at least one output format".to_string(),
			});
		}

		let mut seen_formats = Vec::new();
		for format in &self.build.formats {
			if seen_formats.contains(format) {
				return Err(ShimpatchError::InvalidConfig {
					reason: format!("duplicate output format: {}", format.as_str()),
				});
			}
			seen_formats.push(*format);
		}

		let mut seen_externals = Vec::new();
		for external in &self.build.externals {
			if seen_externals.contains(external) {
				return Err(ShimpatchError::InvalidConfig {
					reason: format!("duplicate external: {external}"),
				});
			}
			seen_externals.push(external.clone());
		}

		for entry in self.build.entries.keys() {
			if entry.is_empty() || entry.contains('/') {
				return Err(ShimpatchError::InvalidConfig {
					reason: format!("invalid entry name: {entry:?}"),
				});
			}
		}

		for (from, to) in &self.assets.rename {
			if from.is_empty() || to.is_empty() {
				return Err(ShimpatchError::InvalidConfig {
					reason: "asset rename entries must not be empty".to_string(),
				});
			}
		}

		for rule in &self.patch_rules {
			if rule.pattern.is_empty() {
				return Err(ShimpatchError::InvalidRule {
					reason: "pattern must not be empty".to_string(),
				});
			}
		}

		Ok(())
	}
}
