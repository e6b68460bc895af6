mod common;

use clap::Parser;
use lexdef_cli::Commands;
use lexdef_cli::LexdefCli;
use lexdef_cli::OutputFormat;
use lexdef_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use similar_asserts::assert_eq;

#[test]
fn parse_flags_are_accepted_by_cli_parser() {
	let cli = LexdefCli::parse_from(["lexdef", "parse", "one.lex", "two.lex", "--require-namespace"]);
	match cli.command {
		Some(Commands::Parse {
			files,
			deep,
			require_namespace,
			format,
		}) => {
			assert_eq!(files.len(), 2);
			assert!(!deep);
			assert!(require_namespace);
			assert!(matches!(format, OutputFormat::Text));
		}
		_ => panic!("expected Parse command"),
	}
}

#[test]
fn parse_prints_rules_of_discovered_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		&tmp.path().join("lexf/numbers.lex"),
		":: numbers\n10/[0-9]+/digit\n20/[0-9]+//[0-9]+/fraction\n",
	)?;

	common::lexdef_cmd()
		.arg("parse")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("lexf/numbers.lex (2 rules)")
				.and(predicates::str::contains("numbers 10 [0-9]+ digit"))
				.and(predicates::str::contains("numbers 20 [0-9]+/[0-9]+ fraction"))
				.and(predicates::str::contains("ok: parsed 1 file(s)")),
		);

	Ok(())
}

#[test]
fn parse_reports_broken_file_and_keeps_going() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		&tmp.path().join("lexf/a_broken.lex"),
		":: n\n10/[0-9]+/digit\n20/abc\n30/x/y\n",
	)?;
	common::write_file(&tmp.path().join("lexf/b_good.lex"), ":: words\n5/[a-z]+/word\n")?;

	common::lexdef_cmd()
		.arg("parse")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(
			predicates::str::contains("lexf/a_broken.lex (1 rule)")
				.and(predicates::str::contains("lexf/b_good.lex (1 rule)")),
		)
		.stderr(
			predicates::str::contains("lexf/a_broken.lex: line 3")
				.and(predicates::str::contains("1 of 2 file(s) failed to parse")),
		);

	Ok(())
}

#[test]
fn parse_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(&tmp.path().join("lexf/a.lex"), ":: numbers\n10/[0-9]+/digit\n")?;
	common::write_file(&tmp.path().join("lexf/b.lex"), "oops\n")?;

	let output = common::lexdef_cmd()
		.arg("parse")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;

	assert_eq!(output.status.code(), Some(1));
	let json: Value = serde_json::from_slice(&output.stdout)?;

	assert_eq!(json[0]["file"], "lexf/a.lex");
	assert_eq!(json[0]["ok"], true);
	assert_eq!(
		json[0]["rules"],
		serde_json::json!([{
			"namespace": "numbers",
			"priority": "10",
			"pattern": "[0-9]+",
			"captures": "digit",
			"line": 2,
		}])
	);
	assert_eq!(json[1]["file"], "lexf/b.lex");
	assert_eq!(json[1]["ok"], false);
	assert_eq!(json[1]["line"], 1);
	assert_eq!(json[1]["rules"], serde_json::json!([]));

	Ok(())
}

#[test]
fn parse_explicit_files_reports_missing_ones() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let good = tmp.path().join("good.lex");
	common::write_file(&good, ":: a\n1/x/y\n")?;

	common::lexdef_cmd()
		.arg("parse")
		.arg(&good)
		.arg(tmp.path().join("missing.lex"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(predicates::str::contains("good.lex (1 rule)"))
		.stderr(predicates::str::contains("failed to read"));

	Ok(())
}

#[test]
fn parse_require_namespace_flag() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = tmp.path().join("loose.lex");
	common::write_file(&file, "1/x/y\n")?;

	common::lexdef_cmd()
		.arg("parse")
		.arg(&file)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::lexdef_cmd()
		.arg("parse")
		.arg(&file)
		.arg("--require-namespace")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("rule declared before any namespace"));

	Ok(())
}

#[test]
fn parse_require_namespace_from_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(&tmp.path().join("lexf/loose.lex"), "1/x/y\n")?;
	common::write_file(&tmp.path().join(".lexdef.toml"), "require_namespace = true\n")?;

	common::lexdef_cmd()
		.arg("parse")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1);

	Ok(())
}
