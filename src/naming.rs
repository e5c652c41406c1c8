//! Output naming and asset matching.
//!
//! This module handles:
//! - Mapping (entry, format) to the bundle's output file name
//! - Matching emitted files against asset include globs

use crate::error::{Result, ShimpatchError};
use regex::Regex;
use serde::Deserialize;

/// Output module format for a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
	Es,
	Cjs,
	Iife,
}

impl Format {
	/// Config-facing name of the format.
	pub fn as_str(&self) -> &'static str {
		match self {
			Format::Es => "es",
			Format::Cjs => "cjs",
			Format::Iife => "iife",
		}
	}

	/// File extension for bundles emitted in this format.
	pub fn extension(&self) -> &'static str {
		match self {
			Format::Es => "mjs",
			Format::Cjs => "cjs",
			Format::Iife => "js",
		}
	}
}

/// File name of the bundle output for an entry point in a given format.
pub fn output_file_name(entry: &str, format: Format) -> String {
	format!("{entry}.{}", format.extension())
}

/// Compiled asset include globs.
#[derive(Debug)]
pub struct AssetMatcher {
	patterns: Vec<Regex>,
}

impl AssetMatcher {
	/// Compile include globs. Supported syntax: `**` spans directories,
	/// `*` matches within a path segment, `?` matches one character.
	pub fn new(globs: &[String]) -> Result<Self> {
		let patterns = globs
			.iter()
			.map(|glob| glob_to_regex(glob))
			.collect::<Result<Vec<_>>>()?;

		Ok(Self { patterns })
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}

	/// Match a path relative to the output directory, `/`-separated.
	pub fn matches(&self, relative_path: &str) -> bool {
		self.patterns.iter().any(|p| p.is_match(relative_path))
	}
}

fn glob_to_regex(glob: &str) -> Result<Regex> {
	let mut pattern = String::from("^");
	let mut chars = glob.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'*' => {
				if chars.peek() == Some(&'*') {
					chars.next();
					if chars.peek() == Some(&'/') {
						// `**/` also matches zero directories deep.
						chars.next();
						pattern.push_str("(?:.*/)?");
					} else {
						pattern.push_str(".*");
					}
				} else {
					pattern.push_str("[^/]*");
				}
			}
			'?' => pattern.push_str("[^/]"),
			other => pattern.push_str(&regex::escape(&other.to_string())),
		}
	}

	pattern.push('$');

	Regex::new(&pattern).map_err(|source| ShimpatchError::InvalidGlob {
		glob: glob.to_string(),
		source,
	})
}
