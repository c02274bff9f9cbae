//! Java-style `.properties` decoder.
//!
//! Supports `key=value`, `key: value` and `key value` pairs, `#`/`!` comments,
//! backslash line continuations and the usual escapes (`\t`, `\n`, `\r`, `\f`,
//! `\uXXXX`). Dotted keys are nested, so `server.port=80` lands at `server.port`.

use super::error::DecodeError;
use super::file::{Decoder, PROPERTIES};
use super::store::set_path;
use super::value::{Table, Value};

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertiesDecoder;

impl Decoder for PropertiesDecoder {
    fn name(&self) -> &'static str {
        PROPERTIES
    }

    fn suffixes(&self) -> &[&'static str] {
        &[PROPERTIES]
    }

    fn decode(&self, contents: &str) -> Result<Table, DecodeError> {
        let mut table = Table::new();
        for (number, line) in logical_lines(contents) {
            let (key, value) = split_pair(&line);
            let key = unescape(key).map_err(|e| format!("line {number}: {e}"))?;
            let value = unescape(value).map_err(|e| format!("line {number}: {e}"))?;
            set_path(&mut table, &key, Value::String(value));
        }
        Ok(table)
    }
}

/// Joins continuation lines and drops blanks and comments.
/// Yields the 1-based number of the first physical line of each logical line.
fn logical_lines(contents: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in contents.lines().enumerate() {
        let trimmed = raw.trim_start();
        let (number, mut current) = match pending.take() {
            Some((number, mut joined)) => {
                joined.push_str(trimmed);
                (number, joined)
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (index + 1, trimmed.to_string())
            }
        };

        if ends_with_continuation(&current) {
            current.pop();
            pending = Some((number, current));
        } else {
            lines.push((number, current));
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits at the first unescaped `=`, `:` or whitespace.
fn split_pair(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..i], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\u escape: \\u{hex}"))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(text: &str) -> Table {
        PropertiesDecoder.decode(text).unwrap()
    }

    fn lookup<'a>(table: &'a Table, path: &str) -> Option<&'a Value> {
        crate::config::store::get_path(table, path)
    }

    #[test]
    fn test_separators() {
        let table = decode("a=1\nb: 2\nc 3\nd = 4\ne   :   5\n");
        for (key, expected) in [("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5")] {
            assert_eq!(lookup(&table, key), Some(&Value::from(expected)), "key {key}");
        }
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let table = decode("# comment\n! also comment\n\n   \nkey=value\n");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_dotted_keys_are_nested() {
        let table = decode("server.host=localhost\nserver.port=8080\n");
        assert_eq!(lookup(&table, "server.host"), Some(&Value::from("localhost")));
        assert_eq!(lookup(&table, "server.port"), Some(&Value::from("8080")));
    }

    #[test]
    fn test_line_continuation() {
        let table = decode("fruits = apple, \\\n         banana, \\\n         pear\n");
        assert_eq!(lookup(&table, "fruits"), Some(&Value::from("apple, banana, pear")));
    }

    #[test]
    fn test_escaped_backslash_is_not_continuation() {
        let table = decode("path=c:\\\\\nnext=1\n");
        assert_eq!(lookup(&table, "path"), Some(&Value::from("c:\\")));
        assert_eq!(lookup(&table, "next"), Some(&Value::from("1")));
    }

    #[test]
    fn test_escapes() {
        let table = decode("key\\ with\\ spaces=tab\\there\ngreek=\\u03B1\n");
        assert_eq!(lookup(&table, "key with spaces"), Some(&Value::from("tab\there")));
        assert_eq!(lookup(&table, "greek"), Some(&Value::from("α")));
    }

    #[test]
    fn test_key_without_value() {
        let table = decode("empty\n");
        assert_eq!(lookup(&table, "empty"), Some(&Value::from("")));
    }

    #[test]
    fn test_malformed_unicode_escape() {
        assert!(PropertiesDecoder.decode("bad=\\u12\n").is_err());
    }
}
