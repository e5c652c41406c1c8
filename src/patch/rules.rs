use crate::config::types::Config;
use crate::error::{Result, ShimpatchError};
use crate::patch::shim;

/// A single literal replacement rule.
///
/// The pattern is matched as literal text, never as a pattern language.
/// Quote-style variants of the same reference are separate rules because
/// module text is not normalized before matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
	/// Literal text to search for.
	pub pattern: String,

	/// Literal text substituted for every occurrence of the pattern.
	pub replacement: String,
}

impl PatchRule {
	pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
		Self {
			pattern: pattern.into(),
			replacement: replacement.into(),
		}
	}
}

/// An ordered, validated collection of replacement rules.
///
/// Construction enforces the disjointness invariant: no replacement contains
/// any rule's pattern, and no two patterns contain one another. Under that
/// invariant rule order cannot affect the result and applying the set twice
/// equals applying it once.
#[derive(Debug, Clone)]
pub struct PatchSet {
	rules: Vec<PatchRule>,
}

impl PatchSet {
	/// Build a patch set from rules, rejecting empty patterns and collisions.
	pub fn new(rules: Vec<PatchRule>) -> Result<Self> {
		validate_rules(&rules)?;
		Ok(Self { rules })
	}

	/// The builtin Node-reference rules: `require("fs")` / `require('fs')`
	/// become an inert empty object, `require("path")` / `require('path')`
	/// become the inline path shim.
	///
	/// Disjointness of this set is pinned by tests rather than revalidated
	/// on every construction.
	pub fn builtin() -> Self {
		Self {
			rules: builtin_rules(),
		}
	}

	/// Build the effective patch set for a configuration: the builtin rules
	/// (unless disabled) followed by the config's own `[[patch]]` rules.
	pub fn from_config(config: &Config) -> Result<Self> {
		let mut rules = if config.use_builtin_rules {
			builtin_rules()
		} else {
			Vec::new()
		};

		for rule in &config.patch_rules {
			rules.push(PatchRule::new(rule.pattern.clone(), rule.replace.clone()));
		}

		Self::new(rules)
	}

	pub fn rules(&self) -> &[PatchRule] {
		&self.rules
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

fn builtin_rules() -> Vec<PatchRule> {
	vec![
		PatchRule::new(r#"require("fs")"#, shim::FS_SHIM),
		PatchRule::new("require('fs')", shim::FS_SHIM),
		PatchRule::new(r#"require("path")"#, shim::PATH_SHIM),
		PatchRule::new("require('path')", shim::PATH_SHIM),
	]
}

/// Check the disjointness invariant across a rule list.
fn validate_rules(rules: &[PatchRule]) -> Result<()> {
	for rule in rules {
		if rule.pattern.is_empty() {
			return Err(ShimpatchError::InvalidRule {
				reason: "pattern must not be empty".to_string(),
			});
		}
	}

	for (i, a) in rules.iter().enumerate() {
		for (j, b) in rules.iter().enumerate() {
			// A replacement reintroducing any pattern (its own included)
			// would break idempotence.
			if a.replacement.contains(&b.pattern) {
				return Err(ShimpatchError::SubstituteCollision {
					pattern: a.pattern.clone(),
					reintroduced: b.pattern.clone(),
				});
			}

			// Nested patterns would make application order observable.
			if i != j && a.pattern.contains(&b.pattern) {
				return Err(ShimpatchError::PatternOverlap {
					outer: a.pattern.clone(),
					inner: b.pattern.clone(),
				});
			}
		}
	}

	Ok(())
}
