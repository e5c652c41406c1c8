//! The build pipeline.
//!
//! This module handles:
//! - Driving the fixed stage order: compile, patch, bundle, emit-types,
//!   write-assets
//! - The in-place patch stage over emitted module files
//! - Asset renaming during the write-assets stage

pub mod stage;

pub use stage::{Stage, StageContext, build_stage_env, run_stage_command};

use crate::config::types::{Config, LoadedConfig};
use crate::error::{Result, ShimpatchError};
use crate::naming::AssetMatcher;
use crate::patch::{PatchSet, apply_patches, occurrence_count};
use std::path::{Path, PathBuf};

/// Result of the patch stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatchStats {
	/// Module files read and scanned.
	pub files_scanned: usize,

	/// Module files that changed and were rewritten.
	pub files_patched: usize,

	/// Total pattern occurrences replaced.
	pub replacements: usize,
}

/// A build pipeline bound to one configuration.
#[derive(Debug)]
pub struct Pipeline {
	config: Config,
	config_path: Option<PathBuf>,
	patch_set: PatchSet,
	cwd: PathBuf,
}

impl Pipeline {
	/// Build a pipeline from a discovered configuration.
	pub fn new(loaded: LoadedConfig, cwd: PathBuf) -> Result<Self> {
		Self::from_parts(loaded.config, Some(loaded.path), cwd)
	}

	/// Build a pipeline from explicit parts. The configuration is taken by
	/// value and never mutated afterwards.
	pub fn from_parts(config: Config, config_path: Option<PathBuf>, cwd: PathBuf) -> Result<Self> {
		let patch_set = PatchSet::from_config(&config)?;
		Ok(Self {
			config,
			config_path,
			patch_set,
			cwd,
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn patch_set(&self) -> &PatchSet {
		&self.patch_set
	}

	/// Output directory resolved against the working directory.
	pub fn out_dir(&self) -> PathBuf {
		self.cwd.join(&self.config.build.out_dir)
	}

	/// Run all stages in their fixed order.
	pub fn run(&self) -> Result<PatchStats> {
		if let Some(ref command) = self.config.pipeline.compile {
			run_stage_command(command, &self.cwd, &self.stage_context(Stage::Compile, None))?;
		}

		let stats = self.patch_stage()?;

		if let Some(ref command) = self.config.pipeline.bundle {
			run_stage_command(
				command,
				&self.cwd,
				&self.stage_context(Stage::Bundle, Some(stats.files_patched)),
			)?;
			self.warn_missing_outputs();
		}

		if let Some(ref command) = self.config.pipeline.emit_types {
			run_stage_command(
				command,
				&self.cwd,
				&self.stage_context(Stage::EmitTypes, Some(stats.files_patched)),
			)?;
		}

		self.write_assets_stage()?;

		Ok(stats)
	}

	/// Patch every module file under the output directory, in place.
	pub fn patch_stage(&self) -> Result<PatchStats> {
		let out_dir = self.out_dir();
		let targets = collect_module_files(&out_dir)?;

		if targets.is_empty() {
			log::debug!("no module files under {}", out_dir.display());
		}

		patch_files(&self.patch_set, &targets)
	}

	/// Rename emitted assets according to the configured rules.
	///
	/// A file counts as an asset when it matches an include glob or its name
	/// is a rename key. Missing output directory means nothing was emitted
	/// and is not an error.
	pub fn write_assets_stage(&self) -> Result<()> {
		let rename = &self.config.assets.rename;
		let matcher = AssetMatcher::new(&self.config.assets.include)?;
		if rename.is_empty() {
			return Ok(());
		}

		let out_dir = self.out_dir();
		if !out_dir.exists() {
			return Ok(());
		}

		for path in collect_files(&out_dir)? {
			let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
				continue;
			};
			let relative = relative_slash_path(&path, &out_dir);

			if !matcher.matches(&relative) && !rename.contains_key(name) {
				continue;
			}

			if let Some(new_name) = rename.get(name) {
				let to = path.with_file_name(new_name);
				log::debug!("renaming asset {relative} -> {new_name}");
				std::fs::rename(&path, &to).map_err(|source| {
					ShimpatchError::AssetRenameError {
						from: path.clone(),
						to: to.clone(),
						source,
					}
				})?;
			}
		}

		Ok(())
	}

	fn stage_context(&self, stage: Stage, patched_count: Option<usize>) -> StageContext<'_> {
		StageContext {
			stage,
			out_dir: &self.config.build.out_dir,
			config_path: self.config_path.as_deref(),
			patched_count,
		}
	}

	fn warn_missing_outputs(&self) {
		let out_dir = self.out_dir();
		for name in self.config.build.expected_outputs() {
			if !out_dir.join(&name).exists() {
				log::warn!("expected bundle output missing: {name}");
			}
		}
	}
}

/// Patch the given module files in place.
///
/// All modules are read and patched in memory before anything is written, so
/// a failure on any module aborts the stage with no partial output on disk.
pub fn patch_files(set: &PatchSet, paths: &[PathBuf]) -> Result<PatchStats> {
	struct Patched {
		path: PathBuf,
		text: String,
		replacements: usize,
	}

	let mut stats = PatchStats::default();
	let mut changed = Vec::new();

	for path in paths {
		let text = read_module(path)?;
		stats.files_scanned += 1;

		let replacements = occurrence_count(set, &text);
		if replacements == 0 {
			continue;
		}

		changed.push(Patched {
			path: path.clone(),
			text: apply_patches(set, &text),
			replacements,
		});
	}

	for module in &changed {
		std::fs::write(&module.path, &module.text).map_err(|source| {
			ShimpatchError::ModuleWriteError {
				path: module.path.clone(),
				source,
			}
		})?;
		log::debug!(
			"patched {} ({} replacements)",
			module.path.display(),
			module.replacements
		);
		stats.files_patched += 1;
		stats.replacements += module.replacements;
	}

	Ok(stats)
}

/// Report which of the given module files the set would change, without
/// writing anything.
pub fn check_files(set: &PatchSet, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
	let mut changed = Vec::new();

	for path in paths {
		let text = read_module(path)?;
		if crate::patch::would_change(set, &text) {
			changed.push(path.clone());
		}
	}

	Ok(changed)
}

fn read_module(path: &Path) -> Result<String> {
	std::fs::read_to_string(path).map_err(|source| ShimpatchError::ModuleReadError {
		path: path.to_path_buf(),
		source,
	})
}

/// Collect module files (`.js`, `.mjs`, `.cjs`) under `root`, sorted.
/// A missing root yields an empty list.
pub fn collect_module_files(root: &Path) -> Result<Vec<PathBuf>> {
	let mut files: Vec<_> = collect_files(root)?
		.into_iter()
		.filter(|path| is_module_file(path))
		.collect();
	files.sort();
	Ok(files)
}

fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	if root.exists() {
		walk(root, &mut files)?;
		files.sort();
	}
	Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
	let entries = std::fs::read_dir(dir).map_err(|source| ShimpatchError::ModuleReadError {
		path: dir.to_path_buf(),
		source,
	})?;

	for entry in entries {
		let entry = entry.map_err(|source| ShimpatchError::ModuleReadError {
			path: dir.to_path_buf(),
			source,
		})?;
		let path = entry.path();
		if path.is_dir() {
			walk(&path, files)?;
		} else {
			files.push(path);
		}
	}

	Ok(())
}

fn is_module_file(path: &Path) -> bool {
	matches!(
		path.extension().and_then(|e| e.to_str()),
		Some("js" | "mjs" | "cjs")
	)
}

fn relative_slash_path(path: &Path, root: &Path) -> String {
	let relative = path.strip_prefix(root).unwrap_or(path);
	relative
		.components()
		.map(|c| c.as_os_str().to_string_lossy())
		.collect::<Vec<_>>()
		.join("/")
}
