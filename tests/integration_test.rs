#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use std::fs;

fn shimpatch_cmd() -> assert_cmd::Command {
	let mut cmd = assert_cmd::Command::cargo_bin("shimpatch").unwrap();
	// Keep test runs independent of any ~/.shimpatch.toml on the machine.
	cmd.env("SHIMPATCH_NO_USER_CONFIG", "1");
	cmd
}

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_help_flag() {
	shimpatch_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains(
			"CLI tool for patching Node-only module references",
		));
}

#[test]
fn test_version_flag() {
	shimpatch_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("shimpatch"));
}

#[test]
fn test_no_args_shows_help() {
	// With arg_required_else_help, no args should show help
	shimpatch_cmd()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// --init tests
// ============================================================================

#[test]
fn test_init_creates_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	shimpatch_cmd()
		.arg("--init")
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Created shimpatch.toml"));

	assert!(config_path.exists());

	let content = fs::read_to_string(&config_path).unwrap();
	assert!(content.contains("use-builtin-rules = true"));
	assert!(content.contains("[build]"));
	assert!(content.contains("**/*.wasm"));
}

#[test]
fn test_init_fails_if_exists() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	// Create existing file
	fs::write(&config_path, "# existing").unwrap();

	shimpatch_cmd()
		.arg("--init")
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_init_force_overwrites() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	// Create existing file
	fs::write(&config_path, "# existing").unwrap();

	shimpatch_cmd()
		.args(["--init", "--force"])
		.current_dir(temp_dir.path())
		.assert()
		.success();

	let content = fs::read_to_string(&config_path).unwrap();
	assert!(content.contains("use-builtin-rules = true"));
}

#[test]
fn test_init_template_is_valid_config() {
	let temp_dir = tempfile::tempdir().unwrap();

	shimpatch_cmd()
		.arg("--init")
		.current_dir(temp_dir.path())
		.assert()
		.success();

	shimpatch_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("valid"));
}

// ============================================================================
// config subcommand tests
// ============================================================================

#[test]
fn test_config_validate_no_config() {
	let temp_dir = tempfile::tempdir().unwrap();

	shimpatch_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("No configuration file found"));
}

#[test]
fn test_config_validate_valid_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	fs::write(
		&config_path,
		r#"
[build]
out-dir = "dist"

[[patch]]
pattern = "process.browser"
replace = "true"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("valid"))
		.stdout(predicate::str::contains("5 patch rules"));
}

#[test]
fn test_config_validate_invalid_toml() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	fs::write(&config_path, "invalid toml [[[").unwrap();

	shimpatch_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure();
}

#[test]
fn test_config_validate_rejects_rule_collision() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	// The substitute reintroduces a builtin pattern, which would break
	// idempotence of the patch set.
	fs::write(
		&config_path,
		r#"
[[patch]]
pattern = "readFileSync"
replace = "require('fs').readFileSync"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("reintroduces"));
}

#[test]
fn test_config_show_displays_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	let config_path = temp_dir.path().join("shimpatch.toml");

	fs::write(
		&config_path,
		r#"
[build]
out-dir = "dist"
formats = ["es", "cjs"]
externals = ["maplibre-gl"]

[build.entries]
index = "src/index.ts"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.args(["config", "show"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("out-dir: dist"))
		.stdout(predicate::str::contains("index.mjs, index.cjs"))
		.stdout(predicate::str::contains("maplibre-gl"))
		.stdout(predicate::str::contains(r#"require("fs")"#));
}

// ============================================================================
// patch subcommand tests
// ============================================================================

#[test]
fn test_patch_file_in_place() {
	let temp_dir = tempfile::tempdir().unwrap();
	let module = temp_dir.path().join("decoder.js");
	fs::write(&module, r#"var fs = require("fs");"#).unwrap();

	shimpatch_cmd()
		.args(["patch", "decoder.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Patched 1 of 1 files"));

	assert_eq!(fs::read_to_string(&module).unwrap(), "var fs = {};");
}

#[test]
fn test_patch_replaces_every_occurrence() {
	let temp_dir = tempfile::tempdir().unwrap();
	let module = temp_dir.path().join("decoder.js");
	fs::write(
		&module,
		r#"var a = require("fs"); var b = require("fs"); var p = require('path');"#,
	)
	.unwrap();

	shimpatch_cmd()
		.args(["patch", "decoder.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("3 replacements"));

	let patched = fs::read_to_string(&module).unwrap();
	assert!(!patched.contains("require("));
	assert!(patched.contains("dirname"));
}

#[test]
fn test_patch_is_idempotent() {
	let temp_dir = tempfile::tempdir().unwrap();
	let module = temp_dir.path().join("decoder.js");
	fs::write(
		&module,
		"var fs = require('fs');\nvar path = require('path');\n",
	)
	.unwrap();

	shimpatch_cmd()
		.args(["patch", "decoder.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success();
	let once = fs::read_to_string(&module).unwrap();

	shimpatch_cmd()
		.args(["patch", "decoder.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Patched 0 of 1 files"));
	let twice = fs::read_to_string(&module).unwrap();

	assert_eq!(once, twice);
}

#[test]
fn test_patch_leaves_clean_files_untouched() {
	let temp_dir = tempfile::tempdir().unwrap();
	let module = temp_dir.path().join("clean.js");
	let original = "export const layer = new LidarLayer();\n";
	fs::write(&module, original).unwrap();

	shimpatch_cmd()
		.args(["patch", "clean.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Patched 0 of 1 files"));

	assert_eq!(fs::read_to_string(&module).unwrap(), original);
}

#[test]
fn test_patch_scans_configured_out_dir_by_default() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		"[build]\nout-dir = \"out\"\n",
	)
	.unwrap();

	let out_dir = temp_dir.path().join("out");
	fs::create_dir_all(out_dir.join("chunks")).unwrap();
	fs::write(out_dir.join("index.mjs"), "const x = require('fs');").unwrap();
	fs::write(out_dir.join("chunks/laz.js"), "const p = require('path');").unwrap();
	fs::write(out_dir.join("notes.txt"), "require('fs')").unwrap();

	shimpatch_cmd()
		.arg("patch")
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Patched 2 of 2 files"));

	assert_eq!(
		fs::read_to_string(out_dir.join("index.mjs")).unwrap(),
		"const x = {};"
	);
	// Non-module files are not scanned.
	assert_eq!(
		fs::read_to_string(out_dir.join("notes.txt")).unwrap(),
		"require('fs')"
	);
}

#[test]
fn test_patch_check_mode_reports_and_writes_nothing() {
	let temp_dir = tempfile::tempdir().unwrap();
	let module = temp_dir.path().join("decoder.js");
	let original = r#"var fs = require("fs");"#;
	fs::write(&module, original).unwrap();

	shimpatch_cmd()
		.args(["patch", "--check", "decoder.js"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stdout(predicate::str::contains("would patch: decoder.js"));

	assert_eq!(fs::read_to_string(&module).unwrap(), original);
}

#[test]
fn test_patch_check_mode_passes_on_clean_tree() {
	let temp_dir = tempfile::tempdir().unwrap();
	let module = temp_dir.path().join("clean.js");
	fs::write(&module, "export {};").unwrap();

	shimpatch_cmd()
		.args(["patch", "--check", "clean.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("No changes needed"));
}

#[test]
fn test_patch_stdin_to_stdout() {
	shimpatch_cmd()
		.args(["patch", "-"])
		.write_stdin(r#"const x = require("fs");"#)
		.assert()
		.success()
		.stdout("const x = {};");
}

#[test]
fn test_patch_stdin_cannot_mix_with_paths() {
	shimpatch_cmd()
		.args(["patch", "-", "decoder.js"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("Cannot mix"));
}

#[test]
fn test_patch_custom_rules_from_config() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		r#"
use-builtin-rules = false

[[patch]]
pattern = "__DEV__"
replace = "false"
"#,
	)
	.unwrap();

	let module = temp_dir.path().join("flags.js");
	fs::write(&module, "if (__DEV__) { debug(); } var fs = require('fs');").unwrap();

	shimpatch_cmd()
		.args(["patch", "flags.js"])
		.current_dir(temp_dir.path())
		.assert()
		.success();

	// Only the configured rule applies; the builtin set was disabled.
	assert_eq!(
		fs::read_to_string(&module).unwrap(),
		"if (false) { debug(); } var fs = require('fs');"
	);
}

#[test]
fn test_patch_missing_module_fails() {
	let temp_dir = tempfile::tempdir().unwrap();

	shimpatch_cmd()
		.args(["patch", "no-such-file.js"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("Failed to"));
}

// ============================================================================
// run subcommand tests (Unix only - stage commands use the shell)
// ============================================================================

#[test]
fn test_run_without_config_fails() {
	let temp_dir = tempfile::tempdir().unwrap();

	shimpatch_cmd()
		.arg("run")
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("No shimpatch.toml found"));
}

#[cfg(unix)]
#[test]
fn test_run_patches_between_compile_and_bundle() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		r#"
[build]
out-dir = "dist"

[pipeline]
compile = "mkdir -p dist && printf 'var fs = require(\"fs\");' > dist/index.mjs"
bundle = "cp dist/index.mjs bundle-input.txt"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.arg("run")
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Patched 1 of 1 files"));

	// The bundle stage must have seen the patched text.
	assert_eq!(
		fs::read_to_string(temp_dir.path().join("bundle-input.txt")).unwrap(),
		"var fs = {};"
	);
}

#[cfg(unix)]
#[test]
fn test_run_stage_order_is_fixed() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		r#"
[pipeline]
compile = "echo $SHIMPATCH_STAGE >> stages.log"
bundle = "echo $SHIMPATCH_STAGE >> stages.log"
emit-types = "echo $SHIMPATCH_STAGE >> stages.log"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.arg("run")
		.current_dir(temp_dir.path())
		.assert()
		.success();

	let log = fs::read_to_string(temp_dir.path().join("stages.log")).unwrap();
	assert_eq!(log, "compile\nbundle\nemit-types\n");
}

#[cfg(unix)]
#[test]
fn test_run_exports_patched_count_to_later_stages() {
	let temp_dir = tempfile::tempdir().unwrap();
	let out_dir = temp_dir.path().join("dist");
	fs::create_dir_all(&out_dir).unwrap();
	fs::write(out_dir.join("a.js"), "require('fs')").unwrap();
	fs::write(out_dir.join("b.js"), "require('path')").unwrap();
	fs::write(out_dir.join("c.js"), "clean").unwrap();

	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		r#"
[pipeline]
bundle = "echo $SHIMPATCH_PATCHED_COUNT > patched_count"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.arg("run")
		.current_dir(temp_dir.path())
		.assert()
		.success();

	let count = fs::read_to_string(temp_dir.path().join("patched_count")).unwrap();
	assert_eq!(count.trim(), "2");
}

#[cfg(unix)]
#[test]
fn test_run_failing_stage_aborts_build() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		r#"
[pipeline]
bundle = "exit 3"
emit-types = "touch emit-types-ran"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.arg("run")
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("bundle stage"));

	assert!(
		!temp_dir.path().join("emit-types-ran").exists(),
		"Later stages should not run after a stage failure"
	);
}

#[cfg(unix)]
#[test]
fn test_run_renames_assets() {
	let temp_dir = tempfile::tempdir().unwrap();
	let out_dir = temp_dir.path().join("dist");
	fs::create_dir_all(&out_dir).unwrap();
	fs::write(out_dir.join("style.css"), ".lidar {}").unwrap();

	fs::write(
		temp_dir.path().join("shimpatch.toml"),
		r#"
[assets]
include = ["**/*.css"]

[assets.rename]
"style.css" = "maplibre-gl-lidar.css"
"#,
	)
	.unwrap();

	shimpatch_cmd()
		.arg("run")
		.current_dir(temp_dir.path())
		.assert()
		.success();

	assert!(!out_dir.join("style.css").exists());
	assert_eq!(
		fs::read_to_string(out_dir.join("maplibre-gl-lidar.css")).unwrap(),
		".lidar {}"
	);
}
