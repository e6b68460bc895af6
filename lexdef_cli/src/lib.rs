use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use lexdef_core::ScalarKind;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Discover and parse lexical rule definition files.",
	long_about = "lexdef reads lexical rule definition files (`*.lex`), where each `::` line \
	              opens a namespace and every other line is a `priority/pattern/captures` \
	              rule.\n\nIt also encodes and decodes the `LexTok#...` lines used to persist \
	              named scalar values.\n\nQuick start:\n  lexdef discover  List definition \
	              files\n  lexdef parse     Parse every discovered file\n  lexdef encode    \
	              Print a serialized token\n  lexdef decode    Read serialized tokens"
)]
pub struct LexdefCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Log core activity to stderr. `RUST_LOG` takes precedence when set.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// List the definition files found under the configured search paths.
	///
	/// Search paths, extensions and exclusions come from `lexdef.toml` when
	/// present. Without a config file the `lexf` directory is searched for
	/// `*.lex` files.
	Discover {
		/// Search every subdirectory instead of only the immediate children
		/// of each search path.
		#[arg(long, default_value_t = false)]
		deep: bool,

		/// Match these extensions instead of the configured ones. May be
		/// repeated.
		#[arg(long = "ext", value_name = "EXT")]
		extensions: Vec<String>,

		/// Output format. Use `text` for one path per line or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Parse definition files and print their rules.
	///
	/// Parses the given files, or every discovered file when none are given.
	/// Each file is parsed independently, so one broken file never hides the
	/// results of the others. Exits with status 1 when any file failed.
	Parse {
		/// Files to parse instead of the discovered ones.
		files: Vec<PathBuf>,

		/// Search every subdirectory when discovering files.
		#[arg(long, default_value_t = false)]
		deep: bool,

		/// Reject rules declared before the first `::` namespace line.
		#[arg(long, default_value_t = false)]
		require_namespace: bool,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Print the serialized `LexTok#...` line for a named value.
	///
	/// Without `--kind` the value is stored as a string, or as null when no
	/// value is given.
	Encode {
		/// The value name.
		name: String,

		/// The value to store, interpreted according to `--kind`.
		#[arg(allow_negative_numbers = true)]
		value: Option<String>,

		/// The namespace the value belongs to.
		#[arg(long, short, default_value = lexdef_core::DEFAULT_NAMESPACE)]
		namespace: String,

		/// The type of the value.
		#[arg(long, short, value_enum)]
		kind: Option<ValueKind>,
	},
	/// Decode serialized `LexTok#...` lines.
	///
	/// Decodes the given token, or every non-blank line of stdin when no
	/// token is given. Exits with status 1 when any line failed to decode.
	Decode {
		/// A single serialized token.
		token: Option<String>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
	Null,
	Long,
	Double,
	String,
}

impl From<ValueKind> for ScalarKind {
	fn from(kind: ValueKind) -> Self {
		match kind {
			ValueKind::Null => ScalarKind::Null,
			ValueKind::Long => ScalarKind::Long,
			ValueKind::Double => ScalarKind::Double,
			ValueKind::String => ScalarKind::String,
		}
	}
}
