use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum LexdefError {
	#[error(transparent)]
	#[diagnostic(code(lexdef::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read `{}`: {source}", .path.display())]
	#[diagnostic(code(lexdef::io_error))]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid token header: expected `LexTok`, found `{found}`")]
	#[diagnostic(
		code(lexdef::format),
		help("serialized tokens have the form `LexTok#<name>#<namespace>#<type>#<value>`")
	)]
	InvalidHeader { found: String },

	#[error("truncated token: {0}")]
	#[diagnostic(
		code(lexdef::format),
		help("serialized tokens have the form `LexTok#<name>#<namespace>#<type>#<value>`")
	)]
	TruncatedToken(String),

	#[error("invalid `{tag}` payload `{payload}`: {reason}")]
	#[diagnostic(code(lexdef::format))]
	InvalidPayload {
		tag: String,
		payload: String,
		reason: String,
	},

	#[error("unknown value type: `{0}`")]
	#[diagnostic(
		code(lexdef::unknown_type),
		help("available types: dtNull, dtLong, dtDouble, dtString")
	)]
	UnknownType(String),

	#[error("line {line}: {reason}: `{content}`")]
	#[diagnostic(
		code(lexdef::parse),
		help("rule lines have the form `<priority>/<pattern>/<captures>`; write `//` for a literal `/`")
	)]
	Parse {
		line: usize,
		content: String,
		reason: String,
	},

	#[error("invalid argument: {0}")]
	#[diagnostic(code(lexdef::invalid_argument))]
	InvalidArgument(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(lexdef::config_parse),
		help("check that lexdef.toml is valid TOML with top level keys and an optional [exclude] section")
	)]
	ConfigParse(String),
}

/// The broad category an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// A malformed serialized token or an unparsable payload.
	Format,
	/// An unrecognized type tag inside a serialized token.
	UnknownType,
	/// A malformed line in a definition file.
	Parse,
	/// A file that is missing or unreadable.
	Io,
	/// Invalid input handed to an operation.
	Argument,
	/// An invalid configuration file.
	Config,
}

impl LexdefError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_) | Self::FileRead { .. } => ErrorKind::Io,
			Self::InvalidHeader { .. } | Self::TruncatedToken(_) | Self::InvalidPayload { .. } => {
				ErrorKind::Format
			}
			Self::UnknownType(_) => ErrorKind::UnknownType,
			Self::Parse { .. } => ErrorKind::Parse,
			Self::InvalidArgument(_) => ErrorKind::Argument,
			Self::ConfigParse(_) => ErrorKind::Config,
		}
	}

	/// The 1-indexed definition file line this error points at, if any.
	pub fn line(&self) -> Option<usize> {
		match self {
			Self::Parse { line, .. } => Some(*line),
			_ => None,
		}
	}
}

pub type LexdefResult<T> = Result<T, LexdefError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
