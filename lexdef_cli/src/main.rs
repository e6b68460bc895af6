use std::io::BufRead;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use lexdef_cli::Commands;
use lexdef_cli::LexdefCli;
use lexdef_cli::OutputFormat;
use lexdef_cli::ValueKind;
use lexdef_core::Discovery;
use lexdef_core::LexdefConfig;
use lexdef_core::LexdefError;
use lexdef_core::LexdefResult;
use lexdef_core::NamedValue;
use lexdef_core::ParseOptions;
use lexdef_core::ParsedFile;
use lexdef_core::PathDiscovery;
use lexdef_core::Scalar;
use lexdef_core::ScalarKind;
use lexdef_core::parse_files;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Settings built once from the global flags and passed to every command.
struct Context {
	root: PathBuf,
	use_color: bool,
}

impl Context {
	fn new(args: &LexdefCli) -> Self {
		let root = args
			.path
			.clone()
			.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
		// Respect NO_COLOR env var and --no-color flag.
		let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();

		Self { root, use_color }
	}

	/// The project config, or the defaults when no config file exists.
	fn load_config(&self) -> LexdefResult<LexdefConfig> {
		Ok(LexdefConfig::load(&self.root)?.unwrap_or_default())
	}
}

/// Apply an `owo-colors` style only when color is enabled.
macro_rules! colored {
	($ctx:expr, $text:expr, $style:ident) => {
		if $ctx.use_color {
			format!("{}", $text.$style())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
	let args = LexdefCli::parse();
	let ctx = Context::new(&args);
	let use_color = ctx.use_color;

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Discover {
			deep,
			extensions,
			format,
		}) => run_discover(&ctx, *deep, extensions, *format),
		Some(Commands::Parse {
			files,
			deep,
			require_namespace,
			format,
		}) => run_parse(&ctx, files, *deep, *require_namespace, *format),
		Some(Commands::Encode {
			name,
			value,
			namespace,
			kind,
		}) => run_encode(name, namespace, *kind, value.as_deref()),
		Some(Commands::Decode { token, format }) => run_decode(&ctx, token.as_deref(), *format),
		None => {
			eprintln!("No subcommand specified. Run `lexdef --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			match e.downcast::<LexdefError>() {
				Ok(lexdef_err) => {
					let report: miette::Report = (*lexdef_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!(ctx, "error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Log to stderr using `RUST_LOG`, or core debug events when `--verbose` is
/// set.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) if verbose => EnvFilter::new("lexdef_core=debug"),
		Err(_) => EnvFilter::new("warn"),
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::fmt::layer()
				.with_target(true)
				.with_ansi(use_color)
				.with_writer(std::io::stderr),
		)
		.with(filter)
		.init();
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Find definition files under every configured search path, sorted by
/// path. A search path or directory that fails to list is recorded and the
/// remaining ones are still searched.
fn discover(
	root: &Path,
	config: &LexdefConfig,
	discovery: &PathDiscovery,
	deep: bool,
) -> Discovery {
	let mut combined = Discovery::default();

	for search_path in config.search_paths(root) {
		let result = if deep {
			discovery.deep(&search_path)
		} else {
			discovery.shallow(&search_path).map(|found| {
				Discovery {
					found,
					errors: Vec::new(),
				}
			})
		};

		match result {
			Ok(found) => combined.merge(found),
			Err(error) => combined.errors.push(error),
		}
	}

	combined.found.sort_by(|a, b| a.path.cmp(&b.path));
	combined.found.dedup();

	combined
}

fn report_discovery_errors(ctx: &Context, discovery: &Discovery) {
	for error in &discovery.errors {
		eprintln!("{} {error}", colored!(ctx, "error:", red));
	}
}

fn run_discover(
	ctx: &Context,
	deep: bool,
	extensions: &[String],
	format: OutputFormat,
) -> CliResult<bool> {
	let root = &ctx.root;
	let config = ctx.load_config()?;

	let discovery = if extensions.is_empty() {
		PathDiscovery::from_config(Some(&config))
	} else {
		let mut discovery = PathDiscovery::new();
		discovery
			.add_extensions(extensions)
			.add_exclude_patterns(&config.exclude.patterns);
		discovery
	};

	let found = discover(root, &config, &discovery, deep || config.deep);
	report_discovery_errors(ctx, &found);

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = found
				.iter()
				.map(|entry| {
					serde_json::json!({
						"path": make_relative(&entry.path, root),
						"extension": entry.extension,
					})
				})
				.collect();
			println!("{}", serde_json::Value::Array(entries));
		}
		OutputFormat::Text => {
			if found.is_empty() {
				println!("No definition files found.");
			}

			for entry in found.iter() {
				println!("{}", make_relative(&entry.path, root));
			}
		}
	}

	Ok(found.is_complete())
}

fn run_parse(
	ctx: &Context,
	files: &[PathBuf],
	deep: bool,
	require_namespace: bool,
	format: OutputFormat,
) -> CliResult<bool> {
	let root = &ctx.root;
	let config = ctx.load_config()?;

	let mut options = ParseOptions::from_config(Some(&config));
	options.require_namespace |= require_namespace;

	let mut discovery_ok = true;
	let paths: Vec<PathBuf> = if files.is_empty() {
		let discovery = PathDiscovery::from_config(Some(&config));
		let found = discover(root, &config, &discovery, deep || config.deep);
		report_discovery_errors(ctx, &found);
		discovery_ok = found.is_complete();
		found.found.into_iter().map(|entry| entry.path).collect()
	} else {
		files.to_vec()
	};

	let parsed = parse_files(&paths, options);
	let ok = discovery_ok && parsed.iter().all(ParsedFile::is_ok);

	match format {
		OutputFormat::Json => print_parsed_json(&parsed, root),
		OutputFormat::Text => print_parsed_text(ctx, &parsed),
	}

	Ok(ok)
}

fn print_parsed_json(parsed: &[ParsedFile], root: &Path) {
	let entries: Vec<serde_json::Value> = parsed
		.iter()
		.map(|file| {
			serde_json::json!({
				"file": make_relative(&file.path, root),
				"ok": file.is_ok(),
				"rules": file.rules,
				"error": file.error.as_ref().map(ToString::to_string),
				"line": file.error.as_ref().and_then(LexdefError::line),
			})
		})
		.collect();

	println!("{}", serde_json::Value::Array(entries));
}

fn print_parsed_text(ctx: &Context, parsed: &[ParsedFile]) {
	if parsed.is_empty() {
		println!("No definition files found.");
		return;
	}

	let mut failed = 0;

	for file in parsed {
		let rel = make_relative(&file.path, &ctx.root);
		let count = file.rules.len();
		let noun = if count == 1 { "rule" } else { "rules" };

		println!("{} ({count} {noun})", colored!(ctx, rel, bold));

		for rule in &file.rules {
			let namespace = rule.namespace.as_deref().unwrap_or("-");
			println!(
				"  {} {namespace} {} {} {}",
				colored!(ctx, format!("{:>4}", rule.line), dimmed),
				rule.priority,
				rule.pattern,
				rule.captures
			);
		}

		if let Some(error) = &file.error {
			failed += 1;
			eprintln!("{} {rel}: {error}", colored!(ctx, "error:", red));
		}
	}

	let total = parsed.len();
	if failed == 0 {
		println!("{} parsed {total} file(s)", colored!(ctx, "ok:", green));
	} else {
		eprintln!("{failed} of {total} file(s) failed to parse");
	}
}

fn run_encode(
	name: &str,
	namespace: &str,
	kind: Option<ValueKind>,
	value: Option<&str>,
) -> CliResult<bool> {
	let scalar = match (kind, value) {
		(None, None) => Scalar::Null,
		(None, Some(text)) => Scalar::Text(text.to_string()),
		(Some(kind), value) => ScalarKind::from(kind).parse_payload(value.unwrap_or_default())?,
	};

	let named = NamedValue::with_namespace(name, namespace, scalar)?;
	print!("{}", named.encode());

	Ok(true)
}

fn run_decode(ctx: &Context, token: Option<&str>, format: OutputFormat) -> CliResult<bool> {
	let lines = match token {
		Some(token) => vec![Ok(token.to_string())],
		None => read_stdin_lines()?,
	};

	let mut decoded = Vec::new();
	let mut ok = true;

	for (index, line) in lines.iter().enumerate() {
		let line = match line {
			Ok(line) if line.trim().is_empty() => continue,
			Ok(line) => line,
			Err(reason) => {
				ok = false;
				eprintln!("{} line {}: {reason}", colored!(ctx, "error:", red), index + 1);
				continue;
			}
		};

		match NamedValue::decode(line) {
			Ok(value) => decoded.push(value),
			Err(error) => {
				ok = false;
				eprintln!("{} line {}: {error}", colored!(ctx, "error:", red), index + 1);
			}
		}
	}

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string(&decoded)?);
		}
		OutputFormat::Text => {
			for value in &decoded {
				println!(
					"{}::{} {} {}",
					value.namespace(),
					colored!(ctx, value.name(), bold),
					colored!(ctx, value.value().kind(), dimmed),
					value.value().payload()
				);
			}
		}
	}

	Ok(ok)
}

/// Read stdin line by line. A line that is not valid UTF-8 becomes an `Err`
/// entry instead of ending the read.
fn read_stdin_lines() -> CliResult<Vec<Result<String, &'static str>>> {
	let mut lines = Vec::new();

	for line in std::io::stdin().lock().split(b'\n') {
		let mut bytes = line?;
		if bytes.last() == Some(&b'\r') {
			bytes.pop();
		}
		lines.push(String::from_utf8(bytes).map_err(|_| "line is not valid UTF-8"));
	}

	Ok(lines)
}
