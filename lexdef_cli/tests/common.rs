use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;
use lexdef_core::AnyEmptyResult;

pub fn lexdef_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("lexdef"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

#[allow(dead_code)]
pub fn write_file(path: &Path, content: &str) -> AnyEmptyResult {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)?;
	Ok(())
}
