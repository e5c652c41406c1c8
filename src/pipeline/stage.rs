use crate::error::{Result, ShimpatchError};
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Stdio};

/// A stage of the build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Compile,
	Patch,
	Bundle,
	EmitTypes,
	WriteAssets,
}

impl Stage {
	/// The fixed, sequential stage order. Not configurable at runtime.
	pub const ORDER: [Stage; 5] = [
		Stage::Compile,
		Stage::Patch,
		Stage::Bundle,
		Stage::EmitTypes,
		Stage::WriteAssets,
	];

	/// Get the string representation for SHIMPATCH_STAGE env var.
	pub fn as_str(&self) -> &'static str {
		match self {
			Stage::Compile => "compile",
			Stage::Patch => "patch",
			Stage::Bundle => "bundle",
			Stage::EmitTypes => "emit-types",
			Stage::WriteAssets => "write-assets",
		}
	}
}

/// Context for external stage command execution.
#[derive(Debug)]
pub struct StageContext<'a> {
	/// The stage being run.
	pub stage: Stage,

	/// The configured output directory.
	pub out_dir: &'a Path,

	/// The config file driving the run, when one was discovered.
	pub config_path: Option<&'a Path>,

	/// Modules changed by the patch stage (stages after patch only).
	pub patched_count: Option<usize>,
}

/// Build environment variables for stage command execution.
pub fn build_stage_env(ctx: &StageContext) -> HashMap<String, String> {
	let mut env = HashMap::new();

	env.insert(
		"SHIMPATCH_STAGE".to_string(),
		ctx.stage.as_str().to_string(),
	);
	env.insert(
		"SHIMPATCH_OUT_DIR".to_string(),
		ctx.out_dir.to_string_lossy().to_string(),
	);

	if let Some(config_path) = ctx.config_path {
		env.insert(
			"SHIMPATCH_CONFIG".to_string(),
			config_path.to_string_lossy().to_string(),
		);
	}

	if let Some(patched_count) = ctx.patched_count {
		env.insert(
			"SHIMPATCH_PATCHED_COUNT".to_string(),
			patched_count.to_string(),
		);
	}

	env
}

/// Run an external stage command with inherited stdio.
///
/// A nonzero exit aborts the build with the stage named; there is no retry,
/// since a failing stage command fails deterministically.
pub fn run_stage_command(command: &str, cwd: &Path, ctx: &StageContext) -> Result<()> {
	let env = build_stage_env(ctx);

	log::debug!("running {} stage: {command}", ctx.stage.as_str());

	let mut cmd = Command::new("sh");
	cmd.arg("-c")
		.arg(command)
		.current_dir(cwd)
		.stdin(Stdio::inherit())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit())
		.envs(&env);

	let status = cmd.status().map_err(|source| ShimpatchError::StageSpawnError {
		stage: ctx.stage.as_str(),
		command: command.to_string(),
		source,
	})?;

	let exit_code = status.code().unwrap_or(-1);
	if exit_code != 0 {
		return Err(ShimpatchError::StageFailed {
			stage: ctx.stage.as_str(),
			exit_code,
		});
	}

	Ok(())
}
