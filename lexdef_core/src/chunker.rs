use std::borrow::Cow;

/// A forward-only cursor over an immutable string.
///
/// Each call consumes a prefix of the remaining input and hands it back as a
/// slice of the original source. Only chunks that contained an escaped
/// (doubled) delimiter need a fresh allocation.
///
/// ```rust
/// use lexdef_core::StringChunker;
///
/// let mut chunker = StringChunker::new("a//b/c");
/// assert_eq!(chunker.get_until("/", true), "a/b");
/// assert_eq!(chunker.tail(), "c");
/// ```
#[derive(Debug, Clone)]
pub struct StringChunker<'a> {
	source: &'a str,
	/// Byte offset of the first unconsumed character. Never decreases.
	offset: usize,
}

/// The result of scanning the remaining input for a delimiter.
struct Scan<'a> {
	chunk: Cow<'a, str>,
	/// Bytes to consume, including the terminating delimiter when found.
	consumed: usize,
	terminated: bool,
}

impl<'a> StringChunker<'a> {
	pub fn new(source: &'a str) -> Self {
		Self { source, offset: 0 }
	}

	/// Byte offset of the cursor within the original input.
	pub fn position(&self) -> usize {
		self.offset
	}

	/// Everything that has not been consumed yet.
	pub fn remaining(&self) -> &'a str {
		&self.source[self.offset..]
	}

	pub fn is_exhausted(&self) -> bool {
		self.offset >= self.source.len()
	}

	/// Return the next `count` characters without advancing. Fewer characters
	/// (possibly none) are returned when the input runs out.
	pub fn peek_next(&self, count: usize) -> &'a str {
		let rest = self.remaining();
		let end = rest
			.char_indices()
			.nth(count)
			.map_or(rest.len(), |(index, _)| index);

		&rest[..end]
	}

	/// Consume the next `count` characters and return them.
	pub fn skip(&mut self, count: usize) -> &'a str {
		let chunk = self.peek_next(count);
		self.offset += chunk.len();
		chunk
	}

	/// Consume everything up to the first terminating `delimiter` and step
	/// over the delimiter itself.
	///
	/// With `escaping` enabled a doubled delimiter is read as one literal
	/// delimiter and does not terminate the chunk. When no terminator exists
	/// the rest of the input is returned and the cursor is left exhausted. An
	/// empty delimiter never matches and yields an empty chunk without moving
	/// the cursor.
	pub fn get_until(&mut self, delimiter: &str, escaping: bool) -> Cow<'a, str> {
		if delimiter.is_empty() {
			return Cow::Borrowed("");
		}

		let scan = self.scan(delimiter, escaping);
		self.offset += scan.consumed;
		scan.chunk
	}

	/// Like [`StringChunker::get_until`], but returns `None` and leaves the
	/// cursor untouched when the remaining input has no terminating
	/// delimiter.
	pub fn split_until(&mut self, delimiter: &str, escaping: bool) -> Option<Cow<'a, str>> {
		if delimiter.is_empty() {
			return None;
		}

		let scan = self.scan(delimiter, escaping);
		if !scan.terminated {
			return None;
		}

		self.offset += scan.consumed;
		Some(scan.chunk)
	}

	/// Consume and return everything that is left, without interpreting any
	/// delimiters.
	pub fn tail(&mut self) -> &'a str {
		let rest = self.remaining();
		self.offset = self.source.len();
		rest
	}

	fn scan(&self, delimiter: &str, escaping: bool) -> Scan<'a> {
		let rest = self.remaining();
		let mut unescaped: Option<String> = None;
		// Start of the stretch of `rest` not yet copied into `unescaped`.
		let mut start = 0;
		let mut search_from = 0;

		while let Some(found) = rest[search_from..].find(delimiter) {
			let at = search_from + found;
			let after = at + delimiter.len();

			if escaping && rest[after..].starts_with(delimiter) {
				// Keep one copy of the doubled delimiter.
				unescaped
					.get_or_insert_with(String::new)
					.push_str(&rest[start..after]);
				start = after + delimiter.len();
				search_from = start;
				continue;
			}

			let chunk = match unescaped {
				Some(mut buffer) => {
					buffer.push_str(&rest[start..at]);
					Cow::Owned(buffer)
				}
				None => Cow::Borrowed(&rest[..at]),
			};

			return Scan {
				chunk,
				consumed: after,
				terminated: true,
			};
		}

		let chunk = match unescaped {
			Some(mut buffer) => {
				buffer.push_str(&rest[start..]);
				Cow::Owned(buffer)
			}
			None => Cow::Borrowed(rest),
		};

		Scan {
			chunk,
			consumed: rest.len(),
			terminated: false,
		}
	}
}
