use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use shimpatch_cli::config::{
	CONFIG_FILE_NAME, Config, LoadedConfig, discover_config, init_template, user_config_path,
};
use shimpatch_cli::patch::{PatchSet, apply_patches};
use shimpatch_cli::pipeline::{Pipeline, check_files, collect_module_files, patch_files};

#[derive(Parser)]
#[command(name = "shimpatch")]
#[command(
	author,
	version,
	about = "CLI tool for patching Node-only module references out of browser library bundles"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template shimpatch.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing shimpatch.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},

	/// Apply the patch set to module files, or to stdin with `-`
	Patch {
		/// Files or directories to patch; defaults to the configured out-dir
		paths: Vec<PathBuf>,

		/// Report files that would change, write nothing, exit nonzero if any
		#[arg(long)]
		check: bool,

		/// Ignore the builtin Node-reference rules
		#[arg(long)]
		no_builtin: bool,
	},

	/// Run the full pipeline: compile, patch, bundle, emit-types, write-assets
	Run,
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the discovered configuration and the effective patch set
	Show,
	/// Check the discovered config file for errors without running anything
	Validate,
}

fn main() -> ExitCode {
	env_logger::init();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(),
				ConfigAction::Validate => handle_config_validate(),
			},
			Commands::Patch {
				paths,
				check,
				no_builtin,
			} => handle_patch(&paths, check, no_builtin),
			Commands::Run => handle_run(),
		};
	}

	// No command specified - this shouldn't happen due to arg_required_else_help
	Ok(ExitCode::SUCCESS)
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let loaded = discover_config(&cwd).context("Failed to discover config file")?;

	let Some(loaded) = loaded else {
		println!("No configuration file found.");
		if let Ok(user_path) = user_config_path() {
			println!("User config path: {}", user_path.display());
			if user_path.exists() {
				println!("  (exists)");
			} else {
				println!("  (not found)");
			}
		}
		return Ok(ExitCode::SUCCESS);
	};

	let config = &loaded.config;
	println!("# Source: {}", loaded.path.display());
	println!("# use-builtin-rules: {}", config.use_builtin_rules);
	println!();

	println!("Build:");
	println!("  out-dir: {}", config.build.out_dir.display());
	let formats: Vec<_> = config.build.formats.iter().map(|f| f.as_str()).collect();
	println!("  formats: {}", formats.join(", "));
	for (entry, source) in &config.build.entries {
		println!("  entry {}: {}", entry, source.display());
	}
	if !config.build.externals.is_empty() {
		println!("  externals: {}", config.build.externals.join(", "));
	}
	let outputs = config.build.expected_outputs();
	if !outputs.is_empty() {
		println!("  expected outputs: {}", outputs.join(", "));
	}
	println!();

	if !config.assets.include.is_empty() || !config.assets.rename.is_empty() {
		println!("Assets:");
		for glob in &config.assets.include {
			println!("  include: {glob}");
		}
		for (from, to) in &config.assets.rename {
			println!("  rename: {from} -> {to}");
		}
		println!();
	}

	println!("Pipeline:");
	for (stage, command) in [
		("compile", &config.pipeline.compile),
		("bundle", &config.pipeline.bundle),
		("emit-types", &config.pipeline.emit_types),
	] {
		match command {
			Some(command) => println!("  {stage}: {command}"),
			None => println!("  {stage}: (skipped)"),
		}
	}
	println!();

	let set = PatchSet::from_config(config).context("Failed to build patch set")?;
	println!("Patch set ({} rules):", set.len());
	for rule in set.rules() {
		println!(
			"  {} -> {}",
			rule.pattern,
			first_line_summary(&rule.replacement)
		);
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	let loaded = match discover_config(&cwd) {
		Ok(loaded) => loaded,
		Err(e) => {
			eprintln!("Configuration error: {e}");
			return Ok(ExitCode::FAILURE);
		}
	};

	let Some(loaded) = loaded else {
		println!("No configuration file found.");
		return Ok(ExitCode::SUCCESS);
	};

	// Parsing validated the shape; the patch set checks disjointness.
	match PatchSet::from_config(&loaded.config) {
		Ok(set) => {
			println!(
				"{} is valid ({} patch rules)",
				loaded.path.display(),
				set.len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e}");
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_patch(paths: &[PathBuf], check: bool, no_builtin: bool) -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let loaded = discover_config(&cwd).context("Failed to load configuration")?;

	let set = effective_patch_set(loaded.as_ref(), no_builtin)?;
	if set.is_empty() {
		anyhow::bail!("Patch set is empty; nothing to apply");
	}

	// `-` patches stdin to stdout
	if paths.len() == 1 && paths[0] == PathBuf::from("-") {
		let mut module_text = String::new();
		std::io::stdin()
			.read_to_string(&mut module_text)
			.context("Failed to read stdin")?;
		print!("{}", apply_patches(&set, &module_text));
		return Ok(ExitCode::SUCCESS);
	}
	if paths.iter().any(|p| *p == PathBuf::from("-")) {
		anyhow::bail!("Cannot mix '-' with file paths");
	}

	let targets = resolve_targets(paths, loaded.as_ref(), &cwd)?;

	if check {
		let changed = check_files(&set, &targets).context("Failed to check modules")?;
		if changed.is_empty() {
			println!("No changes needed ({} files scanned)", targets.len());
			return Ok(ExitCode::SUCCESS);
		}
		for path in &changed {
			println!("would patch: {}", path.display());
		}
		return Ok(ExitCode::FAILURE);
	}

	let stats = patch_files(&set, &targets).context("Failed to patch modules")?;
	println!(
		"Patched {} of {} files ({} replacements)",
		stats.files_patched, stats.files_scanned, stats.replacements
	);
	Ok(ExitCode::SUCCESS)
}

fn handle_run() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let loaded = discover_config(&cwd)
		.context("Failed to load configuration")?
		.ok_or_else(|| {
			anyhow::anyhow!("No {CONFIG_FILE_NAME} found (run `shimpatch --init` to create one)")
		})?;

	let pipeline = Pipeline::new(loaded, cwd).context("Failed to build pipeline")?;
	let stats = pipeline.run().context("Build pipeline failed")?;

	println!(
		"Patched {} of {} files ({} replacements)",
		stats.files_patched, stats.files_scanned, stats.replacements
	);
	Ok(ExitCode::SUCCESS)
}

/// The patch set for a `patch` invocation: the discovered config's rules, or
/// the builtin set when no config exists.
fn effective_patch_set(loaded: Option<&LoadedConfig>, no_builtin: bool) -> Result<PatchSet> {
	let mut config = loaded.map_or_else(Config::default, |l| l.config.clone());
	if no_builtin {
		config.use_builtin_rules = false;
	}
	PatchSet::from_config(&config).context("Failed to build patch set")
}

/// Module files to patch: explicit paths (directories are walked), or the
/// configured out-dir when no paths are given.
fn resolve_targets(
	paths: &[PathBuf],
	loaded: Option<&LoadedConfig>,
	cwd: &std::path::Path,
) -> Result<Vec<PathBuf>> {
	if paths.is_empty() {
		let out_dir = loaded.map_or_else(
			|| PathBuf::from("dist"),
			|l| l.config.build.out_dir.clone(),
		);
		let out_dir = cwd.join(out_dir);
		return collect_module_files(&out_dir)
			.with_context(|| format!("Failed to scan {}", out_dir.display()));
	}

	let mut targets = Vec::new();
	for path in paths {
		if path.is_dir() {
			let found = collect_module_files(path)
				.with_context(|| format!("Failed to scan {}", path.display()))?;
			targets.extend(found);
		} else {
			// Explicitly named files are patched regardless of extension.
			targets.push(path.clone());
		}
	}
	Ok(targets)
}

fn first_line_summary(replacement: &str) -> String {
	match replacement.split_once('\n') {
		Some((first, _)) => format!("{first} ..."),
		None => replacement.to_string(),
	}
}
