//! Marker tokenizer.
//!
//! Splits SQL text into plain text, positional markers (`?`) and named markers
//! (`:name`). This is not a SQL parser; the only syntax it knows about is:
//!
//! - a named marker is `:` followed by `[A-Za-z0-9_]+`, read to the end of the word;
//! - `::` is a PostgreSQL cast and never starts a marker, so a `:` preceded or followed
//!   by another `:` is text;
//! - quoted spans (`'...'`, `"..."`, `` `...` ``, with doubled-quote escapes) are text,
//!   so markers inside literals and quoted identifiers are never rewritten.

use std::fmt::Write as _;

/// A lexical piece of SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// `?`
    Positional,
    /// `:name`, holding `name`.
    Named(&'a str),
}

impl Token<'_> {
    /// Append the token's original text to `out`.
    pub fn write_to(&self, out: &mut String) {
        match self {
            Token::Text(s) => out.push_str(s),
            Token::Positional => out.push('?'),
            Token::Named(name) => {
                let _ = write!(out, ":{}", name);
            }
        }
    }
}

pub(crate) fn is_name_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Tokenize `sql` left to right.
pub fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i = skip_quoted(bytes, i, quote);
            }
            b'?' => {
                flush(&mut tokens, sql, text_start, i);
                tokens.push(Token::Positional);
                i += 1;
                text_start = i;
            }
            b':' => {
                if bytes.get(i + 1) == Some(&b':') {
                    // `::type` cast; skip the whole run of colons.
                    while bytes.get(i) == Some(&b':') {
                        i += 1;
                    }
                    continue;
                }
                let preceded_by_colon = i > 0 && bytes[i - 1] == b':';
                let end = name_end(bytes, i + 1);
                if preceded_by_colon || end == i + 1 {
                    i += 1;
                    continue;
                }
                flush(&mut tokens, sql, text_start, i);
                tokens.push(Token::Named(&sql[i + 1..end]));
                i = end;
                text_start = i;
            }
            _ => i += 1,
        }
    }
    flush(&mut tokens, sql, text_start, bytes.len());
    tokens
}

fn flush<'a>(tokens: &mut Vec<Token<'a>>, sql: &'a str, start: usize, end: usize) {
    if end > start {
        tokens.push(Token::Text(&sql[start..end]));
    }
}

fn name_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_name_byte(bytes[end]) {
        end += 1;
    }
    end
}

/// Return the index just past the closing quote (or the end of input when unclosed).
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Rebuild SQL text from tokens.
pub fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.write_to(&mut out);
    }
    out
}

/// Number of `?` markers in `sql`.
pub fn count_positional(sql: &str) -> usize {
    tokenize(sql)
        .iter()
        .filter(|t| matches!(t, Token::Positional))
        .count()
}

/// Whether `sql` contains at least one named marker.
pub fn has_named(sql: &str) -> bool {
    tokenize(sql).iter().any(|t| matches!(t, Token::Named(_)))
}
