mod common;

use lexdef_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use similar_asserts::assert_eq;

/// Lays out `lexf/{a.lex, b.txt, sub/c.LEX}` below `root`.
fn sample_project(root: &std::path::Path) -> AnyEmptyResult {
	common::write_file(&root.join("lexf/a.lex"), ":: a\n1/x/y\n")?;
	common::write_file(&root.join("lexf/b.txt"), "notes\n")?;
	common::write_file(&root.join("lexf/sub/c.LEX"), ":: c\n2/x/y\n")?;
	Ok(())
}

#[test]
fn discover_lists_immediate_children_by_default() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_project(tmp.path())?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("lexf/a.lex\n");

	Ok(())
}

#[test]
fn discover_deep_walks_subdirectories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_project(tmp.path())?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--deep")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("lexf/a.lex\nlexf/sub/c.LEX\n");

	Ok(())
}

#[test]
fn discover_ext_overrides_configured_extensions() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_project(tmp.path())?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--ext")
		.arg("TXT")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("lexf/b.txt").and(predicates::str::contains("a.lex").not()));

	Ok(())
}

#[test]
fn discover_reads_config_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(&tmp.path().join("grammars/nested/one.lexdef"), "")?;
	common::write_file(&tmp.path().join("grammars/skip/two.lexdef"), "")?;
	common::write_file(&tmp.path().join("lexf/ignored.lex"), "")?;
	common::write_file(
		&tmp.path().join("lexdef.toml"),
		"extensions = [\"lexdef\"]\npaths = [\"grammars\"]\ndeep = true\n\n[exclude]\npatterns = \
		 [\"skip/\"]\n",
	)?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("grammars/nested/one.lexdef\n");

	Ok(())
}

#[test]
fn discover_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_project(tmp.path())?;

	let output = common::lexdef_cmd()
		.arg("discover")
		.arg("--deep")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(
		json,
		serde_json::json!([
			{ "path": "lexf/a.lex", "extension": "lex" },
			{ "path": "lexf/sub/c.LEX", "extension": "lex" },
		])
	);

	Ok(())
}

#[test]
fn discover_without_search_directory_finds_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No definition files found."));

	Ok(())
}

#[test]
fn discover_reports_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(&tmp.path().join("lexdef.toml"), "extensions = lex\n")?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn verbose_flag_logs_core_activity() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	sample_project(tmp.path())?;

	common::lexdef_cmd()
		.arg("discover")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("shallow discovery finished"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn discover_keeps_going_past_unreadable_directories() -> AnyEmptyResult {
	use std::os::unix::fs::PermissionsExt;

	let tmp = tempfile::tempdir()?;
	common::write_file(&tmp.path().join("lexf/a.lex"), "")?;
	common::write_file(&tmp.path().join("lexf/open/b.lex"), "")?;
	common::write_file(&tmp.path().join("lexf/locked/c.lex"), "")?;
	let locked = tmp.path().join("lexf/locked");

	std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000))?;
	if std::fs::read_dir(&locked).is_ok() {
		// Permission bits are not enforced for this user (root).
		std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))?;
		return Ok(());
	}

	let output = common::lexdef_cmd()
		.arg("discover")
		.arg("--deep")
		.arg("--path")
		.arg(tmp.path())
		.output();
	std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))?;
	let output = output?;

	assert_eq!(output.status.code(), Some(1));
	assert_eq!(String::from_utf8(output.stdout)?, "lexf/a.lex\nlexf/open/b.lex\n");
	assert!(String::from_utf8(output.stderr)?.contains("failed to read"));

	Ok(())
}
