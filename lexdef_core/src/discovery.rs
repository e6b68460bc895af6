use std::collections::BTreeSet;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::LexdefConfig;
use crate::LexdefError;
use crate::LexdefResult;

/// The extension given to definition files when nothing else is configured.
pub const DEFAULT_EXTENSION: &str = "lex";

/// A file found by [`PathDiscovery`] together with the extension it matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiscoveredPath {
	pub path: PathBuf,
	/// The matched extension, lower-cased.
	pub extension: String,
}

/// The outcome of a deep discovery. Directories below the root that could
/// not be listed are recorded in `errors` while the walk carries on.
#[derive(Debug, Default, Deref)]
pub struct Discovery {
	#[deref]
	pub found: Vec<DiscoveredPath>,
	pub errors: Vec<LexdefError>,
}

impl Discovery {
	/// Whether every directory in the walk could be listed.
	pub fn is_complete(&self) -> bool {
		self.errors.is_empty()
	}

	/// Fold another discovery into this one.
	pub fn merge(&mut self, other: Discovery) {
		self.found.extend(other.found);
		self.errors.extend(other.errors);
	}
}

/// A set of file extensions compared case-insensitively. Entries are stored
/// lower-cased and without a leading dot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct ExtensionSet(BTreeSet<String>);

impl ExtensionSet {
	pub fn insert(&mut self, extension: &str) -> bool {
		let extension = extension.trim().trim_start_matches('.').to_lowercase();
		if extension.is_empty() {
			return false;
		}

		self.0.insert(extension)
	}

	/// The configured extension matching `path`, if any.
	pub fn matching(&self, path: &Path) -> Option<&str> {
		let extension = path.extension()?.to_str()?.to_lowercase();
		self.0.get(&extension).map(String::as_str)
	}
}

impl<S: AsRef<str>> FromIterator<S> for ExtensionSet {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		let mut set = Self::default();
		for extension in iter {
			set.insert(extension.as_ref());
		}
		set
	}
}

/// Locates definition files by extension.
///
/// Extensions must be registered before anything can be found:
///
/// ```rust,no_run
/// use lexdef_core::PathDiscovery;
/// use std::path::Path;
///
/// let mut discovery = PathDiscovery::new();
/// discovery.add_extension("lex");
///
/// let discovery = discovery.deep(Path::new("lexf")).unwrap();
/// for found in discovery.iter() {
///     println!("{}", found.path.display());
/// }
/// for error in &discovery.errors {
///     eprintln!("{error}");
/// }
/// ```
///
/// Results follow directory listing order, which differs between platforms
/// and runs. Sort them when a stable order matters.
#[derive(Debug, Clone, Default)]
pub struct PathDiscovery {
	extensions: ExtensionSet,
	exclude_patterns: Vec<String>,
}

impl PathDiscovery {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a discovery from the `extensions` and `[exclude]` settings of a
	/// config, falling back to [`DEFAULT_EXTENSION`].
	pub fn from_config(config: Option<&LexdefConfig>) -> Self {
		let mut discovery = Self::new();

		match config {
			Some(config) => {
				discovery.add_extensions(&config.extensions);
				discovery.exclude_patterns.clone_from(&config.exclude.patterns);
			}
			None => {
				discovery.add_extension(DEFAULT_EXTENSION);
			}
		}

		discovery
	}

	pub fn add_extension(&mut self, extension: &str) -> &mut Self {
		self.extensions.insert(extension);
		self
	}

	pub fn add_extensions<S: AsRef<str>>(&mut self, extensions: &[S]) -> &mut Self {
		for extension in extensions {
			self.extensions.insert(extension.as_ref());
		}
		self
	}

	/// Add gitignore-style patterns, evaluated relative to the discovery
	/// root, for paths that should never be returned or descended into.
	pub fn add_exclude_patterns<S: AsRef<str>>(&mut self, patterns: &[S]) -> &mut Self {
		self.exclude_patterns
			.extend(patterns.iter().map(|pattern| pattern.as_ref().to_string()));
		self
	}

	pub fn extensions(&self) -> &ExtensionSet {
		&self.extensions
	}

	/// Matching files among the immediate children of `dir`.
	pub fn shallow(&self, dir: &Path) -> LexdefResult<Vec<DiscoveredPath>> {
		if !dir.is_dir() {
			tracing::debug!(dir = %dir.display(), "discovery root is not a directory");
			return Ok(Vec::new());
		}

		let exclude = build_exclude_matcher(dir, &self.exclude_patterns)?;
		let mut found = Vec::new();

		for path in list_dir(dir)? {
			let is_dir = path.is_dir();
			if is_dir || exclude.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if let Some(discovered) = self.accept(path) {
				found.push(discovered);
			}
		}

		tracing::debug!(dir = %dir.display(), count = found.len(), "shallow discovery finished");
		Ok(found)
	}

	/// Matching files anywhere below `dir`.
	///
	/// The tree is walked breadth first from an explicit queue, so depth is
	/// bounded by memory rather than stack size. Directories reached twice
	/// (through symlinks) are only expanded once. Failing to list the root is
	/// an error; failing to list a directory below it is recorded in
	/// [`Discovery::errors`].
	pub fn deep(&self, dir: &Path) -> LexdefResult<Discovery> {
		if !dir.is_dir() {
			tracing::debug!(dir = %dir.display(), "discovery root is not a directory");
			return Ok(Discovery::default());
		}

		let exclude = build_exclude_matcher(dir, &self.exclude_patterns)?;
		let mut discovery = Discovery::default();
		let mut visited = HashSet::new();
		let mut pending = VecDeque::from([dir.to_path_buf()]);

		while let Some(current) = pending.pop_front() {
			let canonical = current.canonicalize().unwrap_or_else(|_| current.clone());
			if !visited.insert(canonical) {
				tracing::debug!(dir = %current.display(), "skipping directory already visited");
				continue;
			}

			let entries = match list_dir(&current) {
				Ok(entries) => entries,
				Err(error) if current.as_path() == dir => return Err(error),
				Err(error) => {
					tracing::warn!(dir = %current.display(), %error, "skipping unreadable directory");
					discovery.errors.push(error);
					continue;
				}
			};

			for path in entries {
				let is_dir = path.is_dir();
				if exclude.matched(&path, is_dir).is_ignore() {
					continue;
				}

				if is_dir {
					pending.push_back(path);
				} else if let Some(discovered) = self.accept(path) {
					discovery.found.push(discovered);
				}
			}
		}

		tracing::debug!(
			dir = %dir.display(),
			count = discovery.found.len(),
			errors = discovery.errors.len(),
			"deep discovery finished"
		);
		Ok(discovery)
	}

	/// [`PathDiscovery::shallow`] on a directory given as path fragments.
	pub fn shallow_from_fragments<S: AsRef<str>>(
		&self,
		fragments: &[S],
	) -> LexdefResult<Vec<DiscoveredPath>> {
		self.shallow(&join_fragments(fragments)?)
	}

	/// [`PathDiscovery::deep`] on a directory given as path fragments.
	pub fn deep_from_fragments<S: AsRef<str>>(&self, fragments: &[S]) -> LexdefResult<Discovery> {
		self.deep(&join_fragments(fragments)?)
	}

	fn accept(&self, path: PathBuf) -> Option<DiscoveredPath> {
		let extension = self.extensions.matching(&path)?.to_string();
		Some(DiscoveredPath { path, extension })
	}
}

/// Join path fragments with the platform separator.
pub fn join_fragments<S: AsRef<str>>(fragments: &[S]) -> LexdefResult<PathBuf> {
	if fragments.is_empty() {
		return Err(LexdefError::InvalidArgument(
			"can't construct a path from an empty fragment list".to_string(),
		));
	}

	let mut path = PathBuf::new();
	for fragment in fragments {
		let fragment: &str = fragment.as_ref();
		path.push(fragment);
	}

	Ok(path)
}

fn list_dir(dir: &Path) -> LexdefResult<Vec<PathBuf>> {
	let read_error = |source| {
		LexdefError::FileRead {
			path: dir.to_path_buf(),
			source,
		}
	};

	let mut paths = Vec::new();
	for entry in std::fs::read_dir(dir).map_err(read_error)? {
		paths.push(entry.map_err(read_error)?.path());
	}

	Ok(paths)
}

/// Build a `Gitignore` matcher from `[exclude]` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> LexdefResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			LexdefError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| LexdefError::ConfigParse(format!("failed to build exclude rules: {e}")))
}
