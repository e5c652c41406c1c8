use crate::config::parser::parse_config_file;
use crate::config::types::LoadedConfig;
use crate::error::{Result, ShimpatchError};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory and its ancestors.
pub const CONFIG_FILE_NAME: &str = "shimpatch.toml";

/// Truthy values of this variable skip the `~/.shimpatch.toml` fallback.
/// Useful for CI environments.
pub const NO_USER_CONFIG_ENV_VAR: &str = "SHIMPATCH_NO_USER_CONFIG";

/// Discover the effective configuration.
///
/// Looks for `shimpatch.toml` starting at `start_dir` and walking up the
/// directory tree; the nearest file wins and configs are never merged.
/// Falls back to `~/.shimpatch.toml` when no project config exists, unless
/// that lookup is disabled via [`NO_USER_CONFIG_ENV_VAR`].
pub fn discover_config(start_dir: &Path) -> Result<Option<LoadedConfig>> {
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			log::debug!("using config at {}", config_path.display());
			let config = parse_config_file(&config_path)?;
			return Ok(Some(LoadedConfig {
				config,
				path: config_path,
			}));
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	load_user_config()
}

/// Load the user's ~/.shimpatch.toml if it exists and isn't disabled.
fn load_user_config() -> Result<Option<LoadedConfig>> {
	if is_env_truthy(NO_USER_CONFIG_ENV_VAR) {
		return Ok(None);
	}

	let path = user_config_path()?;

	if path.exists() {
		log::debug!("using user config at {}", path.display());
		let config = parse_config_file(&path)?;
		Ok(Some(LoadedConfig { config, path }))
	} else {
		Ok(None)
	}
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(ShimpatchError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(".shimpatch.toml"))
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}
