//! `---`-delimited `key: value` metadata blocks.
//!
//! This is deliberately not YAML. A block is a run of `key: value` lines
//! between an opening `---` line at the very start of the document and the
//! next `---` line. A key with an empty value takes its value from the
//! indented lines that follow, joined with single spaces. Values wrapped in
//! matching single or double quotes are unquoted. Blank lines, `#` comment
//! lines, and lines without a `:` are ignored. Duplicate keys keep the last
//! value.

use rustc_hash::FxHashMap;

const DELIMITER: &str = "---";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    fields: FxHashMap<String, String>,
}

impl FrontMatter {
    /// Parses the lines of a metadata block (without its delimiters).
    pub fn parse_block(block: &str) -> Self {
        let lines = block.lines().collect::<Vec<_>>();
        let mut fields = FxHashMap::default();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            i += 1;

            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let Some((key, rest)) = line.split_once(':') else {
                continue;
            };

            let value = rest.trim();
            if !value.is_empty() {
                fields.insert(key.trim().to_string(), strip_quotes(value).to_string());
                continue;
            }

            let mut folded = vec![];
            while let Some(next) = lines.get(i) {
                if next.trim().is_empty() {
                    i += 1;
                } else if next.starts_with(char::is_whitespace) {
                    folded.push(next.trim());
                    i += 1;
                } else {
                    break;
                }
            }

            let joined = folded.join(" ");
            fields.insert(key.trim().to_string(), strip_quotes(joined.trim()).to_string());
        }

        FrontMatter { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    /// The value for `key`, or `""` when absent.
    pub fn field(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// The first present, non-empty value among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> &str {
        keys.iter()
            .map(|k| self.field(k))
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Splits `input` into its front matter and body. The body has its leading
/// newlines removed. Without an opening delimiter on the first line, the front
/// matter is empty and the body is all of `input`.
pub fn split(input: &str) -> (FrontMatter, &str) {
    match delimit(input) {
        Some((block, body)) => {
            let body = body.trim_start_matches(|c| c == '\n' || c == '\r');
            (FrontMatter::parse_block(block), body)
        }
        None => (FrontMatter::default(), input),
    }
}

/// Parses only the front matter of `input`.
pub fn parse(input: &str) -> FrontMatter {
    split(input).0
}

/// Returns `(block, rest)`: the text between the delimiter lines and the text
/// after the closing delimiter line.
fn delimit(input: &str) -> Option<(&str, &str)> {
    let after_open = input.strip_prefix(DELIMITER)?;
    let (opening_tail, block_and_rest) = after_open.split_once('\n')?;
    if !opening_tail.trim().is_empty() {
        return None;
    }

    let mut offset = 0;
    loop {
        let remaining = &block_and_rest[offset..];
        let (line, next) = match remaining.split_once('\n') {
            Some((line, next)) => (line, Some(next)),
            None => (remaining, None),
        };

        if line.trim_end() == DELIMITER {
            return Some((&block_and_rest[..offset], next.unwrap_or_default()));
        }

        offset += line.len() + 1;
        next?;
    }
}

fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(&a), Some(&b)) if bytes.len() >= 2 && a == b && (a == b'"' || a == b'\'') => {
            trimmed[1..trimmed.len() - 1].trim()
        }
        _ => trimmed,
    }
}
