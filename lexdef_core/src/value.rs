use std::fmt::Display;
use std::str::FromStr;

use float_cmp::approx_eq;
use serde::Serialize;
use serde::Serializer;

use crate::LexdefError;
use crate::LexdefResult;
use crate::StringChunker;

/// The namespace given to values created without one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// The literal that opens every serialized token.
pub const TOKEN_HEADER: &str = "LexTok";

/// The character separating the fields of a serialized token.
pub const SERIAL_SEPARATOR: char = '#';

const SEPARATOR: &str = "#";

/// A scalar held by a [`NamedValue`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Scalar {
	#[default]
	Null,
	Integer(i64),
	Float(#[serde(serialize_with = "serialize_float")] f64),
	Text(String),
}

/// JSON has no NaN or infinities, so those are written as their payload
/// text.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_float<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
	if value.is_finite() {
		serializer.serialize_f64(*value)
	} else {
		serializer.serialize_str(&format!("{value:?}"))
	}
}

impl Eq for Scalar {}
impl PartialEq for Scalar {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Scalar::Null, Scalar::Null) => true,
			(Scalar::Integer(value), Scalar::Integer(other_value)) => value == other_value,
			(Scalar::Float(value), Scalar::Float(other_value)) => {
				(value.is_nan() && other_value.is_nan())
					|| approx_eq!(f64, *value, *other_value, ulps = 2)
			}
			(Scalar::Text(value), Scalar::Text(other_value)) => value == other_value,
			_ => false,
		}
	}
}

impl Scalar {
	pub fn kind(&self) -> ScalarKind {
		match self {
			Scalar::Null => ScalarKind::Null,
			Scalar::Integer(_) => ScalarKind::Long,
			Scalar::Float(_) => ScalarKind::Double,
			Scalar::Text(_) => ScalarKind::String,
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Scalar::Null)
	}

	/// The payload text written after the type tag.
	pub fn payload(&self) -> String {
		match self {
			Scalar::Null => String::new(),
			Scalar::Integer(value) => value.to_string(),
			// `Debug` keeps a fractional part (`1.0`) and round trips exactly.
			Scalar::Float(value) => format!("{value:?}"),
			Scalar::Text(value) => value.clone(),
		}
	}
}

impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Scalar::Integer(value)
	}
}

impl From<f64> for Scalar {
	fn from(value: f64) -> Self {
		Scalar::Float(value)
	}
}

impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Scalar::Text(value)
	}
}

impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Scalar::Text(value.to_string())
	}
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
	fn from(value: Option<T>) -> Self {
		value.map_or(Scalar::Null, Into::into)
	}
}

/// The type tag recorded in a serialized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
	/// `dtNull`
	Null,
	/// `dtLong`
	Long,
	/// `dtDouble`
	Double,
	/// `dtString`
	String,
}

impl ScalarKind {
	pub const ALL: [ScalarKind; 4] = [
		ScalarKind::Null,
		ScalarKind::Long,
		ScalarKind::Double,
		ScalarKind::String,
	];

	pub fn tag(self) -> &'static str {
		match self {
			ScalarKind::Null => "dtNull",
			ScalarKind::Long => "dtLong",
			ScalarKind::Double => "dtDouble",
			ScalarKind::String => "dtString",
		}
	}

	/// Convert a payload into a scalar of this kind.
	pub fn parse_payload(self, payload: &str) -> LexdefResult<Scalar> {
		let invalid = |reason: String| {
			LexdefError::InvalidPayload {
				tag: self.tag().to_string(),
				payload: payload.to_string(),
				reason,
			}
		};

		match self {
			ScalarKind::Null => Ok(Scalar::Null),
			ScalarKind::Long => {
				payload
					.parse::<i64>()
					.map(Scalar::Integer)
					.map_err(|e| invalid(e.to_string()))
			}
			ScalarKind::Double => {
				payload
					.parse::<f64>()
					.map(Scalar::Float)
					.map_err(|e| invalid(e.to_string()))
			}
			ScalarKind::String => Ok(Scalar::Text(payload.to_string())),
		}
	}
}

impl Display for ScalarKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.tag())
	}
}

impl FromStr for ScalarKind {
	type Err = LexdefError;

	fn from_str(tag: &str) -> Result<Self, Self::Err> {
		ScalarKind::ALL
			.into_iter()
			.find(|kind| kind.tag() == tag)
			.ok_or_else(|| LexdefError::UnknownType(tag.to_string()))
	}
}

/// A scalar stored under a name and namespace.
///
/// Values are persisted as a single line of text:
///
/// ```text
/// LexTok#<name>#<namespace>#<dtNull|dtLong|dtDouble|dtString>#<payload>
/// ```
///
/// Names and namespaces may not contain `#` or line breaks, which keeps every
/// constructible value reversible through [`NamedValue::encode`] and
/// [`NamedValue::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
	name: String,
	namespace: String,
	value: Scalar,
}

impl NamedValue {
	/// Create a value in the [`DEFAULT_NAMESPACE`].
	pub fn new(name: impl Into<String>, value: impl Into<Scalar>) -> LexdefResult<Self> {
		Self::with_namespace(name, DEFAULT_NAMESPACE, value)
	}

	pub fn with_namespace(
		name: impl Into<String>,
		namespace: impl Into<String>,
		value: impl Into<Scalar>,
	) -> LexdefResult<Self> {
		let name = name.into();
		let namespace = namespace.into();

		if name.is_empty() {
			return Err(LexdefError::InvalidArgument(
				"a named value needs a non-empty name".to_string(),
			));
		}

		check_key_part("name", &name)?;
		check_key_part("namespace", &namespace)?;

		Ok(Self {
			name,
			namespace,
			value: value.into(),
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn value(&self) -> &Scalar {
		&self.value
	}

	pub fn set_value(&mut self, value: impl Into<Scalar>) {
		self.value = value.into();
	}

	pub fn into_value(self) -> Scalar {
		self.value
	}

	/// Serialize to a token line, including the terminating newline.
	pub fn encode(&self) -> String {
		format!("{self}\n")
	}

	/// Deserialize a token line produced by [`NamedValue::encode`]. A single
	/// trailing newline is optional.
	pub fn decode(data: &str) -> LexdefResult<Self> {
		let data = data.strip_suffix('\n').unwrap_or(data);
		let mut chunker = StringChunker::new(data);

		let header = chunker
			.split_until(SEPARATOR, false)
			.ok_or_else(|| LexdefError::InvalidHeader {
				found: data.to_string(),
			})?;

		if header != TOKEN_HEADER {
			return Err(LexdefError::InvalidHeader {
				found: header.into_owned(),
			});
		}

		let mut field = |label: &str| {
			chunker
				.split_until(SEPARATOR, false)
				.ok_or_else(|| LexdefError::TruncatedToken(format!("missing {label} field")))
		};

		let name = field("name")?.into_owned();
		let namespace = field("namespace")?.into_owned();
		let tag = field("type")?;
		let payload = chunker.tail();

		if name.is_empty() {
			return Err(LexdefError::TruncatedToken("empty name".to_string()));
		}

		let kind: ScalarKind = tag.parse()?;
		let value = kind.parse_payload(payload)?;

		Ok(Self {
			name,
			namespace,
			value,
		})
	}
}

impl Display for NamedValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{TOKEN_HEADER}{SERIAL_SEPARATOR}{}{SERIAL_SEPARATOR}{}{SERIAL_SEPARATOR}{}{SERIAL_SEPARATOR}{}",
			self.name,
			self.namespace,
			self.value.kind(),
			self.value.payload(),
		)
	}
}

impl FromStr for NamedValue {
	type Err = LexdefError;

	fn from_str(data: &str) -> Result<Self, Self::Err> {
		Self::decode(data)
	}
}

fn check_key_part(label: &str, value: &str) -> LexdefResult<()> {
	if value.contains([SERIAL_SEPARATOR, '\n', '\r']) {
		return Err(LexdefError::InvalidArgument(format!(
			"{label} `{value}` may not contain `{SERIAL_SEPARATOR}` or line breaks"
		)));
	}

	Ok(())
}
