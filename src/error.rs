use std::path::PathBuf;

/// Library-level structured errors for shimpatch.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum ShimpatchError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid configuration: {reason}")]
	InvalidConfig { reason: String },

	#[error("Invalid patch rule: {reason}")]
	InvalidRule { reason: String },

	#[error("Substitute for pattern {pattern:?} reintroduces pattern {reintroduced:?}")]
	SubstituteCollision {
		pattern: String,
		reintroduced: String,
	},

	#[error("Pattern {outer:?} contains pattern {inner:?}, so rule order would matter")]
	PatternOverlap { outer: String, inner: String },

	#[error("Invalid asset glob: {glob}")]
	InvalidGlob {
		glob: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to read module: {path}")]
	ModuleReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write module: {path}")]
	ModuleWriteError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to rename asset: {from} -> {to}")]
	AssetRenameError {
		from: PathBuf,
		to: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to run {stage} stage command: {command}")]
	StageSpawnError {
		stage: &'static str,
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{stage} stage command exited with code {exit_code}")]
	StageFailed { stage: &'static str, exit_code: i32 },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using ShimpatchError.
pub type Result<T> = std::result::Result<T, ShimpatchError>;
