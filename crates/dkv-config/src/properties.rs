//! Parser for `.properties` files.
//!
//! Follows the Java properties text format: `key=value`, `key: value` or
//! `key value` entries, `#`/`!` comment lines, backslash line continuations and
//! escapes (including `\uXXXX`). Values may reference other keys of the same
//! file with `${name}`.

use std::collections::HashMap;

use crate::prelude::*;

/// Maximum nesting of `${...}` references
pub const MAX_EXPANSION_DEPTH: usize = 64;
/// Maximum length of a single value after expansion
pub const MAX_EXPANDED_LEN: usize = 1024 * 1024;
/// Maximum number of bytes copied in by `${...}` references across one file
pub const MAX_EXPANDED_TOTAL: usize = 16 * 1024 * 1024;

fn is_blank(c: char) -> bool {
	matches!(c, ' ' | '\t' | '\x0c')
}

/// Parses a whole file, then expands references.
pub fn parse(input: &[u8]) -> ClResult<PropertyMap> {
	let text = std::str::from_utf8(input)
		.map_err(|err| Error::Parse(format!("not valid UTF-8 at byte {}", err.valid_up_to())))?;
	expand_all(&parse_raw(text)?)
}

/// Parses entries without expanding `${...}` references
pub fn parse_raw(text: &str) -> ClResult<PropertyMap> {
	let mut map = PropertyMap::new();
	for (line_no, line) in logical_lines(text) {
		let (key, value) = split_entry(&line);
		let key = unescape(key).map_err(|msg| Error::Parse(format!("line {}: {}", line_no, msg)))?;
		if key.is_empty() {
			debug!("line {}: entry without key ignored", line_no);
			continue;
		}
		let value =
			unescape(value).map_err(|msg| Error::Parse(format!("line {}: {}", line_no, msg)))?;
		map.insert(key, value);
	}
	Ok(map)
}

/// Joins continued lines and drops comments. Yields the starting line number
/// (1-based) with each logical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
	let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
	let mut lines = Vec::new();
	let mut current: Option<(usize, String)> = None;

	for (idx, natural) in normalized.split('\n').enumerate() {
		let trimmed = natural.trim_start_matches(is_blank);
		let (start, mut buf) = match current.take() {
			Some(pending) => pending,
			None => {
				if trimmed.is_empty() || trimmed.starts_with(['#', '!']) {
					continue;
				}
				(idx + 1, String::new())
			}
		};
		buf.push_str(trimmed);

		let backslashes = buf.chars().rev().take_while(|c| *c == '\\').count();
		if backslashes % 2 == 1 {
			buf.pop();
			current = Some((start, buf));
		} else {
			lines.push((start, buf));
		}
	}
	if let Some(pending) = current {
		lines.push(pending);
	}
	lines
}

/// Splits a logical line into its raw (still escaped) key and value
fn split_entry(line: &str) -> (&str, &str) {
	let mut key_end = line.len();
	let mut escaped = false;
	for (i, c) in line.char_indices() {
		if escaped {
			escaped = false;
		} else if c == '\\' {
			escaped = true;
		} else if c == '=' || c == ':' || is_blank(c) {
			key_end = i;
			break;
		}
	}

	let key = &line[..key_end];
	let mut rest = line[key_end..].trim_start_matches(is_blank);
	if let Some(stripped) = rest.strip_prefix(['=', ':']) {
		rest = stripped.trim_start_matches(is_blank);
	}
	(key, rest)
}

fn hex4(chars: &mut std::str::Chars<'_>) -> Result<u32, String> {
	let digits: String = chars.by_ref().take(4).collect();
	if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(format!("malformed \\u escape: \\u{}", digits));
	}
	u32::from_str_radix(&digits, 16).map_err(|_| format!("malformed \\u escape: \\u{}", digits))
}

fn unescape(raw: &str) -> Result<String, String> {
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('t') => out.push('\t'),
			Some('n') => out.push('\n'),
			Some('r') => out.push('\r'),
			Some('f') => out.push('\x0c'),
			Some('u') => {
				let mut code = hex4(&mut chars)?;
				if (0xD800..0xDC00).contains(&code) {
					// UTF-16 surrogate pair spelled as two escapes
					if chars.next() != Some('\\') || chars.next() != Some('u') {
						return Err("unpaired surrogate in \\u escape".into());
					}
					let low = hex4(&mut chars)?;
					if !(0xDC00..0xE000).contains(&low) {
						return Err("unpaired surrogate in \\u escape".into());
					}
					code = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
				}
				let ch = char::from_u32(code)
					.ok_or_else(|| format!("invalid code point in \\u escape: {:04X}", code))?;
				out.push(ch);
			}
			Some(other) => out.push(other),
			None => {}
		}
	}
	Ok(out)
}

fn expand_all(raw: &PropertyMap) -> ClResult<PropertyMap> {
	let mut expander = Expander { raw, done: HashMap::new(), stack: Vec::new(), total: 0 };
	for (key, value) in raw {
		expander.resolve(key, value)?;
	}
	Ok(expander.done.into_iter().map(|(key, (value, _))| (key.to_string(), value)).collect())
}

fn too_deep() -> Error {
	Error::Parse(format!("references nested deeper than {}", MAX_EXPANSION_DEPTH))
}

/// Expands every key at most once. A finished value is kept together with the
/// height of its reference chain, so reusing it still honours the depth limit.
struct Expander<'a> {
	raw: &'a PropertyMap,
	done: HashMap<&'a str, (String, usize)>,
	stack: Vec<&'a str>,
	total: usize,
}

impl<'a> Expander<'a> {
	/// Expands `key` into `done` and returns the height of its reference chain
	fn resolve(&mut self, key: &'a str, value: &'a str) -> ClResult<usize> {
		if let Some((_, height)) = self.done.get(key) {
			let height = *height;
			if self.stack.len() + 1 + height > MAX_EXPANSION_DEPTH {
				return Err(too_deep());
			}
			return Ok(height);
		}
		if self.stack.contains(&key) {
			return Err(Error::Parse(format!("circular reference to '{}'", key)));
		}
		self.stack.push(key);
		if self.stack.len() > MAX_EXPANSION_DEPTH {
			return Err(too_deep());
		}

		let raw = self.raw;
		let mut out = String::with_capacity(value.len());
		let mut height = 0;
		let mut rest = value;
		while let Some(start) = rest.find("${") {
			out.push_str(&rest[..start]);
			let after = &rest[start + 2..];
			let Some(end) = after.find('}') else {
				// Unterminated reference stays literal
				out.push_str(&rest[start..]);
				rest = "";
				break;
			};
			if let Some((ref_key, target)) = raw.get_key_value(&after[..end]) {
				height = height.max(self.resolve(ref_key, target)? + 1);
				if let Some((expanded, _)) = self.done.get(ref_key.as_str()) {
					if out.len() + expanded.len() > MAX_EXPANDED_LEN {
						return Err(Error::Parse(format!(
							"value of '{}' expands beyond {} bytes",
							key, MAX_EXPANDED_LEN
						)));
					}
					self.total += expanded.len();
					if self.total > MAX_EXPANDED_TOTAL {
						return Err(Error::Parse(format!(
							"references expand beyond {} bytes in total",
							MAX_EXPANDED_TOTAL
						)));
					}
					out.push_str(expanded);
				}
			}
			rest = &after[end + 1..];
		}
		out.push_str(rest);

		self.stack.pop();
		self.done.insert(key, (out, height));
		Ok(height)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_str(s: &str) -> PropertyMap {
		parse(s.as_bytes()).unwrap_or_default()
	}

	fn get<'a>(map: &'a PropertyMap, key: &str) -> Option<&'a str> {
		map.get(key).map(String::as_str)
	}

	#[test]
	fn test_separators() {
		let map = parse_str("a=1\nb: 2\nc 3\nd = 4 \ne\n  f\t=\tx y\n");
		assert_eq!(get(&map, "a"), Some("1"));
		assert_eq!(get(&map, "b"), Some("2"));
		assert_eq!(get(&map, "c"), Some("3"));
		assert_eq!(get(&map, "d"), Some("4 "));
		assert_eq!(get(&map, "e"), Some(""));
		assert_eq!(get(&map, "f"), Some("x y"));
	}

	#[test]
	fn test_comments_and_blank_lines() {
		let map = parse_str("# comment\n! other\n\n   \nhost=1.2.3.4\n  # indented=comment\n");
		assert_eq!(map.len(), 1);
		assert_eq!(get(&map, "host"), Some("1.2.3.4"));
	}

	#[test]
	fn test_continuation_lines() {
		let map = parse_str("list=a,\\\n    b,\\\r\n    c\nnext=1\n# comment \\\nafter=2");
		assert_eq!(get(&map, "list"), Some("a,b,c"));
		assert_eq!(get(&map, "next"), Some("1"));
		assert_eq!(get(&map, "after"), Some("2"));
	}

	#[test]
	fn test_even_backslashes_do_not_continue() {
		let map = parse_str("path=c:\\\\\nnext=1");
		assert_eq!(get(&map, "path"), Some("c:\\"));
		assert_eq!(get(&map, "next"), Some("1"));
	}

	#[test]
	fn test_escapes() {
		let map = parse_str("key\\ with\\=sep=tab\\there\nuni=\\u00e9t\\u00E9\nemoji=\\uD83D\\uDE00\nother=\\q");
		assert_eq!(get(&map, "key with=sep"), Some("tab\there"));
		assert_eq!(get(&map, "uni"), Some("été"));
		assert_eq!(get(&map, "emoji"), Some("😀"));
		assert_eq!(get(&map, "other"), Some("q"));
	}

	#[test]
	fn test_malformed_unicode_escape() {
		assert!(matches!(parse(b"a=\\u12"), Err(Error::Parse(_))));
		assert!(matches!(parse(b"a=\\uZZZZ"), Err(Error::Parse(_))));
		assert!(matches!(parse(b"a=\\uD83Dx"), Err(Error::Parse(_))));
		assert!(matches!(parse(b"a=\\u+0FF"), Err(Error::Parse(_))));
		assert!(matches!(parse(b"a=\\u-0FF"), Err(Error::Parse(_))));
	}

	#[test]
	fn test_invalid_utf8() {
		assert!(matches!(parse(b"a=\xff\xfe"), Err(Error::Parse(_))));
	}

	#[test]
	fn test_duplicate_key_last_wins() {
		let map = parse_str("a=1\na=2\n");
		assert_eq!(get(&map, "a"), Some("2"));
	}

	#[test]
	fn test_expansion() {
		let map = parse_str("host=db\nport=5432\nurl=postgres://${host}:${port}/${missing}x\nbroken=${host");
		assert_eq!(get(&map, "url"), Some("postgres://db:5432/x"));
		assert_eq!(get(&map, "broken"), Some("${host"));
	}

	#[test]
	fn test_nested_expansion() {
		let map = parse_str("a=${b}${b}\nb=${c}\nc=z");
		assert_eq!(get(&map, "a"), Some("zz"));
	}

	#[test]
	fn test_circular_reference() {
		assert!(matches!(parse(b"a=${b}\nb=${a}"), Err(Error::Parse(_))));
		assert!(matches!(parse(b"a=${a}"), Err(Error::Parse(_))));
	}

	#[test]
	fn test_deep_nesting() {
		let mut text = String::new();
		for i in 0..100 {
			text.push_str(&format!("k{}=${{k{}}}\n", i, i + 1));
		}
		text.push_str("k100=end\n");
		assert!(matches!(parse(text.as_bytes()), Err(Error::Parse(_))));

		let map = parse_str("k0=${k1}\nk1=${k2}\nk2=end");
		assert_eq!(get(&map, "k0"), Some("end"));
	}

	fn doubling_chain(levels: usize) -> String {
		let mut text = String::new();
		for i in 0..levels {
			text.push_str(&format!("k{}=${{k{}}}${{k{}}}\n", i, i + 1, i + 1));
		}
		text.push_str(&format!("k{}=x\n", levels));
		text
	}

	#[test]
	fn test_doubling_references_are_capped() {
		let map = parse_str(&doubling_chain(10));
		assert_eq!(get(&map, "k0").map(str::len), Some(1024));
		assert_eq!(get(&map, "k9"), Some("xx"));

		let res = parse(doubling_chain(24).as_bytes());
		assert!(matches!(res, Err(Error::Parse(_))));
		let res = parse(doubling_chain(40).as_bytes());
		assert!(matches!(res, Err(Error::Parse(_))));
	}

	#[test]
	fn test_many_large_values_are_capped() {
		// Each value stays under the per-value limit, together they do not
		let mut text = format!("big={}\n", "x".repeat(512 * 1024));
		for i in 0..40 {
			text.push_str(&format!("copy{}=${{big}}\n", i));
		}
		assert!(matches!(parse(text.as_bytes()), Err(Error::Parse(_))));
	}

	#[test]
	fn test_reused_values_count_toward_depth() {
		// The `a` chain sorts first and is expanded before `b` reuses it
		let mut text = String::new();
		for i in 0..40 {
			text.push_str(&format!("a{}=${{a{}}}\n", i, i + 1));
		}
		text.push_str("a40=end\n");
		assert_eq!(get(&parse_str(&text), "a0"), Some("end"));

		for i in 0..30 {
			text.push_str(&format!("b{}=${{b{}}}\n", i, i + 1));
		}
		text.push_str("b30=${a0}\n");
		assert!(matches!(parse(text.as_bytes()), Err(Error::Parse(_))));
	}
}

// vim: ts=4
