use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LexdefError;
use crate::LexdefResult;
use crate::discovery::DEFAULT_EXTENSION;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["lexdef.toml", ".lexdef.toml", ".config/lexdef.toml"];

/// The directory searched for definition files when no `paths` are
/// configured.
pub const DEFAULT_SEARCH_PATH: &str = "lexf";

/// Configuration loaded from a `lexdef.toml` file.
///
/// ```toml
/// extensions = ["lex", "lexdef"]
/// paths = ["lexf", "grammars"]
/// deep = true
/// require_namespace = true
///
/// [exclude]
/// patterns = ["vendor/", "*.draft.lex"]
/// ```
#[derive(Debug, Deserialize)]
pub struct LexdefConfig {
	/// File extensions that mark definition files, compared
	/// case-insensitively.
	#[serde(default = "default_extensions")]
	pub extensions: Vec<String>,
	/// Directories searched for definition files, relative to the project
	/// root.
	#[serde(default = "default_paths")]
	pub paths: Vec<PathBuf>,
	/// Search the full tree below each path instead of its immediate
	/// children.
	#[serde(default)]
	pub deep: bool,
	/// Reject rules that appear before the first `::` namespace declaration.
	#[serde(default)]
	pub require_namespace: bool,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
}

/// Configuration for excluding paths from discovery.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns, relative to each search path.
	#[serde(default)]
	pub patterns: Vec<String>,
}

impl Default for LexdefConfig {
	fn default() -> Self {
		Self {
			extensions: default_extensions(),
			paths: default_paths(),
			deep: false,
			require_namespace: false,
			exclude: ExcludeConfig::default(),
		}
	}
}

fn default_extensions() -> Vec<String> {
	vec![DEFAULT_EXTENSION.to_string()]
}

fn default_paths() -> Vec<PathBuf> {
	vec![PathBuf::from(DEFAULT_SEARCH_PATH)]
}

impl LexdefConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> LexdefResult<Option<LexdefConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path).map_err(|source| {
			LexdefError::FileRead {
				path: config_path.clone(),
				source,
			}
		})?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	pub fn parse(content: &str) -> LexdefResult<LexdefConfig> {
		toml::from_str(content).map_err(|e| LexdefError::ConfigParse(e.to_string()))
	}

	/// The configured search paths resolved against `root`.
	pub fn search_paths(&self, root: &Path) -> Vec<PathBuf> {
		self.paths.iter().map(|path| root.join(path)).collect()
	}
}
