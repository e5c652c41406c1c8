use crate::patch::rules::PatchSet;

/// Replace every occurrence of every rule's pattern in `module_text`.
///
/// A pure function of the input and the patch set: text matching no pattern
/// passes through byte-for-byte, substitution is global per pattern, and the
/// set's disjointness invariant makes the transform idempotent and
/// order-independent. Absence of matches is not an error.
pub fn apply_patches(set: &PatchSet, module_text: &str) -> String {
	let mut patched = module_text.to_string();
	for rule in set.rules() {
		if patched.contains(&rule.pattern) {
			patched = patched.replace(&rule.pattern, &rule.replacement);
		}
	}
	patched
}

/// Whether applying the set to `module_text` would change it.
pub fn would_change(set: &PatchSet, module_text: &str) -> bool {
	set.rules()
		.iter()
		.any(|rule| module_text.contains(&rule.pattern))
}

/// Total number of pattern occurrences across all rules.
pub fn occurrence_count(set: &PatchSet, module_text: &str) -> usize {
	set.rules()
		.iter()
		.map(|rule| module_text.matches(&rule.pattern).count())
		.sum()
}
