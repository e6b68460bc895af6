use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Lines;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::LexdefConfig;
use crate::LexdefError;
use crate::LexdefResult;
use crate::StringChunker;

/// Marks a line that opens a namespace section.
pub const NAMESPACE_MARKER: &str = "::";

/// Separates the priority, pattern and captures of a rule line.
pub const FIELD_DELIMITER: &str = "/";

/// One tokenization directive parsed from a definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
	/// The namespace section the rule was declared in. `None` when the rule
	/// precedes every namespace declaration.
	pub namespace: Option<String>,
	/// Numeric text; ordering is left to the consumer of the rules.
	pub priority: String,
	/// The pattern with `//` escapes resolved to `/`.
	pub pattern: String,
	pub captures: String,
	/// 1-indexed line number in the source.
	pub line: usize,
}

/// Options for parsing definition files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
	/// Reject rule lines that appear before any `::` namespace declaration.
	pub require_namespace: bool,
}

impl ParseOptions {
	pub fn from_config(config: Option<&LexdefConfig>) -> Self {
		Self {
			require_namespace: config.is_some_and(|c| c.require_namespace),
		}
	}
}

/// Streams rules out of a line source.
///
/// Each item is either a parsed rule or the error for one offending line.
/// Malformed lines do not stop the iterator, so callers decide whether to
/// bail out or keep collecting. An I/O failure ends the stream.
pub struct RuleReader<R> {
	lines: Lines<R>,
	path: Option<PathBuf>,
	options: ParseOptions,
	namespace: Option<String>,
	line_number: usize,
	finished: bool,
}

impl<R: BufRead> RuleReader<R> {
	pub fn new(source: R, options: ParseOptions) -> Self {
		Self {
			lines: source.lines(),
			path: None,
			options,
			namespace: None,
			line_number: 0,
			finished: false,
		}
	}

	/// The namespace that applies to the next rule line.
	pub fn current_namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	fn parse_line(&mut self, line: &str) -> LexdefResult<Option<Rule>> {
		if line.trim().is_empty() {
			return Ok(None);
		}

		let number = self.line_number;
		let mut chunker = StringChunker::new(line);

		if chunker.peek_next(NAMESPACE_MARKER.len()) == NAMESPACE_MARKER {
			chunker.skip(NAMESPACE_MARKER.len());
			let namespace = chunker.tail().trim();

			if namespace.is_empty() {
				return Err(parse_error(
					number,
					line,
					"namespace declaration without a name",
				));
			}

			tracing::debug!(namespace, line = number, "entering namespace");
			self.namespace = Some(namespace.to_string());
			return Ok(None);
		}

		if self.options.require_namespace && self.namespace.is_none() {
			return Err(parse_error(
				number,
				line,
				"rule declared before any namespace",
			));
		}

		let priority = chunker
			.split_until(FIELD_DELIMITER, false)
			.ok_or_else(|| parse_error(number, line, "missing `/` after the priority"))?;
		let pattern = chunker
			.split_until(FIELD_DELIMITER, true)
			.ok_or_else(|| parse_error(number, line, "missing `/` after the pattern"))?;
		let captures = chunker.tail().trim();

		let rule = Rule {
			namespace: self.namespace.clone(),
			priority: priority.trim().to_string(),
			pattern: pattern.into_owned(),
			captures: captures.to_string(),
			line: number,
		};

		tracing::trace!(?rule, "parsed rule");
		Ok(Some(rule))
	}
}

impl RuleReader<BufReader<File>> {
	/// Open a definition file for streaming. The file handle lives as long as
	/// the reader.
	pub fn open(path: &Path, options: ParseOptions) -> LexdefResult<Self> {
		let file = File::open(path).map_err(|source| {
			LexdefError::FileRead {
				path: path.to_path_buf(),
				source,
			}
		})?;

		let mut reader = Self::new(BufReader::new(file), options);
		reader.path = Some(path.to_path_buf());
		Ok(reader)
	}
}

impl<R: BufRead> Iterator for RuleReader<R> {
	type Item = LexdefResult<Rule>;

	fn next(&mut self) -> Option<Self::Item> {
		while !self.finished {
			let line = match self.lines.next()? {
				Ok(line) => line,
				Err(source) => {
					self.finished = true;
					let error = match &self.path {
						Some(path) => {
							LexdefError::FileRead {
								path: path.clone(),
								source,
							}
						}
						None => LexdefError::Io(source),
					};
					return Some(Err(error));
				}
			};

			self.line_number += 1;

			match self.parse_line(&line) {
				Ok(Some(rule)) => return Some(Ok(rule)),
				Ok(None) => {}
				Err(error) => return Some(Err(error)),
			}
		}

		None
	}
}

/// Parse definition text, failing on the first malformed line.
pub fn parse_definitions(content: &str, options: ParseOptions) -> LexdefResult<Vec<Rule>> {
	RuleReader::new(content.as_bytes(), options).collect()
}

/// Parse definition text and return every rule that could be parsed together
/// with the errors for the lines that could not.
pub fn parse_definitions_with_diagnostics(
	content: &str,
	options: ParseOptions,
) -> (Vec<Rule>, Vec<LexdefError>) {
	let mut rules = Vec::new();
	let mut errors = Vec::new();

	for result in RuleReader::new(content.as_bytes(), options) {
		match result {
			Ok(rule) => rules.push(rule),
			Err(error) => errors.push(error),
		}
	}

	(rules, errors)
}

/// Read and parse a single definition file, failing on the first malformed
/// line.
pub fn read_definition_file(path: &Path, options: ParseOptions) -> LexdefResult<Vec<Rule>> {
	tracing::debug!(path = %path.display(), "parsing definition file");
	RuleReader::open(path, options)?.collect()
}

/// The outcome of parsing one file of a batch.
#[derive(Debug)]
pub struct ParsedFile {
	pub path: PathBuf,
	/// Rules parsed before `error` occurred, or all of them on success.
	pub rules: Vec<Rule>,
	pub error: Option<LexdefError>,
}

impl ParsedFile {
	pub fn is_ok(&self) -> bool {
		self.error.is_none()
	}
}

/// Parse one file of a batch, keeping whatever was parsed before a failure.
pub fn parse_file(path: &Path, options: ParseOptions) -> ParsedFile {
	tracing::debug!(path = %path.display(), "parsing definition file");

	let mut parsed = ParsedFile {
		path: path.to_path_buf(),
		rules: Vec::new(),
		error: None,
	};

	let reader = match RuleReader::open(path, options) {
		Ok(reader) => reader,
		Err(error) => {
			parsed.error = Some(error);
			return parsed;
		}
	};

	for result in reader {
		match result {
			Ok(rule) => parsed.rules.push(rule),
			Err(error) => {
				parsed.error = Some(error);
				break;
			}
		}
	}

	parsed
}

/// Parse every file independently. A failure in one file never prevents the
/// remaining files from being parsed.
pub fn parse_files<I, P>(paths: I, options: ParseOptions) -> Vec<ParsedFile>
where
	I: IntoIterator<Item = P>,
	P: AsRef<Path>,
{
	paths
		.into_iter()
		.map(|path| parse_file(path.as_ref(), options))
		.collect()
}

fn parse_error(line: usize, content: &str, reason: &str) -> LexdefError {
	LexdefError::Parse {
		line,
		content: content.to_string(),
		reason: reason.to_string(),
	}
}
