//! `lexdef_core` is the core library for lexdef. It reads lexical rule
//! definition files, finds them on disk, and provides the reversible text
//! encoding used to persist named scalar values.
//!
//! ## Definition files
//!
//! ```text
//! :: numbers
//! 10/[0-9]+/digit
//! 20/[0-9]+//[0-9]+/fraction
//! ```
//!
//! A `::` line opens a namespace section. Every other non-blank line is a
//! rule made of three `/`-separated fields: priority, pattern and captures. A
//! doubled `//` inside the pattern stands for a literal `/`.
//!
//! ## Modules
//!
//! - [`chunker`]: [`StringChunker`], the delimiter cursor used to split
//!   lines and tokens into fields.
//! - [`value`]: [`NamedValue`] and its `LexTok#...` line encoding.
//! - [`definition`]: the definition file parser producing [`Rule`]s.
//! - [`discovery`]: [`PathDiscovery`], which finds definition files by
//!   extension.
//! - [`config`]: [`LexdefConfig`], loaded from `lexdef.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lexdef_core::{LexdefConfig, ParseOptions, PathDiscovery, parse_files};
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let config = LexdefConfig::load(root).unwrap();
//! let discovery = PathDiscovery::from_config(config.as_ref());
//!
//! let found = discovery.deep(&root.join("lexf")).unwrap();
//! let options = ParseOptions::from_config(config.as_ref());
//!
//! for file in parse_files(found.iter().map(|f| &f.path), options) {
//!     println!("{}: {} rule(s)", file.path.display(), file.rules.len());
//! }
//! ```

pub use chunker::*;
pub use config::*;
pub use definition::*;
pub use discovery::*;
pub use error::*;
pub use value::*;

pub mod chunker;
pub mod config;
pub mod definition;
pub mod discovery;
#[allow(unused_assignments)]
mod error;
pub mod value;
