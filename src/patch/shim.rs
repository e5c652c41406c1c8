//! Browser-safe stand-in for the Node `path` module.
//!
//! Emscripten-compiled decoders keep `require('path')` calls inside
//! `ENVIRONMENT_IS_NODE` guards. Those branches never run in a browser, but
//! bundler resolvers still try to resolve the reference eagerly, so the
//! patcher swaps the call for this inline object expression. The Rust
//! functions below are the reference model for the shim's three operations;
//! tests pin the observable behavior against them.

/// Inline JavaScript expression substituted for `require("path")`.
pub const PATH_SHIM: &str = r"({
  dirname: (p) => { const i = p.lastIndexOf('/'); return i === -1 ? '.' : p.substring(0, i) || '/'; },
  normalize: (p) => p,
  join: (...a) => a.join('/')
})";

/// Inline expression substituted for `require("fs")`.
///
/// An empty object is enough: any property access on it happens only inside
/// branches that are unreachable in a browser host.
pub const FS_SHIM: &str = "{}";

/// Portion of `p` preceding the last `/` separator.
///
/// Returns `"."` when `p` contains no separator, and `"/"` when the only
/// separator is the leading one.
pub fn dirname(p: &str) -> &str {
	match p.rfind('/') {
		None => ".",
		Some(0) => "/",
		Some(i) => &p[..i],
	}
}

/// Identity. Call sites in the guarded branches never rely on real
/// normalization semantics.
pub fn normalize(p: &str) -> &str {
	p
}

/// Concatenate segments with `/`, without collapsing duplicate separators
/// or resolving `.`/`..` segments.
pub fn join(segments: &[&str]) -> String {
	segments.join("/")
}
