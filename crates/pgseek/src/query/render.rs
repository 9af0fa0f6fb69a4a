//! SQL rendering for [`QueryConfig`].
//!
//! Rendering is split in two steps:
//! - `to_*_sql` lays out the clauses in a fixed order and keeps placeholders
//!   exactly as they were written (caller `$N` and generated `?` markers).
//! - [`rebind`] rewrites `?` markers into Postgres `$N` placeholders so the
//!   executed statement uses one convention end-to-end.

use super::config::QueryConfig;
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::CharIndices;

impl QueryConfig {
    /// Render the SELECT statement against `table`.
    ///
    /// Clause order: SELECT → FROM → JOIN → WHERE → GROUP BY → HAVING →
    /// ORDER BY → LIMIT → OFFSET → FOR UPDATE.
    pub fn to_select_sql(&self, table: &str) -> String {
        let mut sql = if self.select_fields.is_empty() {
            format!("SELECT * FROM {table}")
        } else {
            format!("SELECT {} FROM {table}", self.select_fields.join(", "))
        };

        for join in &self.join_clauses {
            sql.push(' ');
            sql.push_str(join);
        }

        push_clause(&mut sql, " WHERE ", &self.where_clause);
        push_clause(&mut sql, " GROUP BY ", &self.group_by);
        push_clause(&mut sql, " HAVING ", &self.having);
        push_clause(&mut sql, " ORDER BY ", &self.order_by);

        if self.limit > 0 {
            let _ = write!(sql, " LIMIT {}", self.limit);
        }
        if self.offset > 0 {
            let _ = write!(sql, " OFFSET {}", self.offset);
        }
        if self.for_update {
            sql.push_str(" FOR UPDATE");
        }

        sql
    }

    /// Render `SELECT COUNT(*)` sharing only the WHERE fragment.
    pub fn to_count_sql(&self, table: &str) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        push_clause(&mut sql, " WHERE ", &self.where_clause);
        sql
    }

    /// Render the `SELECT 1 … LIMIT 1` probe used by `exists`.
    pub fn to_exists_sql(&self, table: &str) -> String {
        let mut probe = self.clone();
        probe.select_fields = vec!["1".to_string()];
        probe.limit = 1;
        probe.to_select_sql(table)
    }
}

fn push_clause(sql: &mut String, keyword: &str, fragment: &str) {
    if !fragment.is_empty() {
        sql.push_str(keyword);
        sql.push_str(fragment);
    }
}

/// Rewrite `?` markers into numbered `$N` placeholders.
///
/// Numbering continues after the highest `$N` already present, so caller
/// fragments written with native placeholders keep their indices and
/// generated cursor markers bind to the arguments appended after them.
/// Markers inside quoted literals (including `E'...'` escape strings and
/// `$tag$...$tag$` bodies), quoted identifiers and comments are left untouched.
pub fn rebind(sql: &str) -> String {
    if !sql.contains('?') {
        return sql.to_string();
    }

    let mut next = highest_numbered_placeholder(sql);
    let mut out = String::with_capacity(sql.len() + 8);
    for (ch, in_code) in CodeChars::new(sql) {
        if in_code && ch == '?' {
            next += 1;
            let _ = write!(out, "${next}");
        } else {
            out.push(ch);
        }
    }
    out
}

/// Highest `$N` placeholder index in `sql` (0 if none).
fn highest_numbered_placeholder(sql: &str) -> usize {
    let mut max = 0;
    let mut iter = CodeChars::new(sql).peekable();
    while let Some((ch, in_code)) = iter.next() {
        if !(in_code && ch == '$') {
            continue;
        }
        let mut n: usize = 0;
        let mut has_digits = false;
        while let Some(&(d, true)) = iter.peek() {
            let Some(digit) = d.to_digit(10) else {
                break;
            };
            n = n.saturating_mul(10).saturating_add(digit as usize);
            has_digits = true;
            iter.next();
        }
        if has_digits {
            max = max.max(n);
        }
    }
    max
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Quoted { quote: char, backslash: bool },
    Escaped,
    LineComment,
    BlockComment,
    BlockCommentEnd,
    /// Inside a dollar-quoted body that ends at this byte offset.
    DollarQuoted(usize),
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Byte offset just past the dollar-quoted string opening at `start`, or
/// `None` when the `$` there is not an opening `$tag$` delimiter.
/// An unterminated body runs to the end of `sql`.
fn dollar_quote_end(sql: &str, start: usize) -> Option<usize> {
    let rest = &sql[start + 1..];
    let tag = &rest[..rest.find('$')?];
    if tag.starts_with(|c: char| c.is_ascii_digit())
        || !tag.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    let delim = &sql[start..start + tag.len() + 2];
    let body = start + delim.len();
    Some(
        sql[body..]
            .find(delim)
            .map_or(sql.len(), |at| body + at + delim.len()),
    )
}

/// Iterates the characters of a SQL string, flagging whether each one is
/// part of executable SQL (`true`) or inside a literal/identifier/comment.
struct CodeChars<'a> {
    sql: &'a str,
    chars: Peekable<CharIndices<'a>>,
    state: Scan,
    // Last two characters seen, most recent first.
    prev: [Option<char>; 2],
}

impl<'a> CodeChars<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            sql,
            chars: sql.char_indices().peekable(),
            state: Scan::Code,
            prev: [None, None],
        }
    }

    fn peek_is(&mut self, expected: char) -> bool {
        self.chars.peek().is_some_and(|&(_, c)| c == expected)
    }
}

impl Iterator for CodeChars<'_> {
    type Item = (char, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, ch) = self.chars.next()?;
        let in_code = match self.state {
            Scan::Code => match ch {
                '\'' => {
                    // `E'...'` (not the tail of an identifier) honors backslash escapes.
                    let backslash = matches!(self.prev[0], Some('E' | 'e'))
                        && !self.prev[1].is_some_and(is_ident_char);
                    self.state = Scan::Quoted { quote: ch, backslash };
                    false
                }
                '"' => {
                    self.state = Scan::Quoted { quote: ch, backslash: false };
                    false
                }
                '$' if !self.prev[0].is_some_and(is_ident_char) => {
                    match dollar_quote_end(self.sql, idx) {
                        Some(end) => {
                            self.state = Scan::DollarQuoted(end);
                            false
                        }
                        None => true,
                    }
                }
                '-' if self.peek_is('-') => {
                    self.state = Scan::LineComment;
                    false
                }
                '/' if self.peek_is('*') => {
                    self.state = Scan::BlockComment;
                    false
                }
                _ => true,
            },
            // A doubled quote closes and immediately reopens, which keeps
            // escaped quotes inside the literal.
            Scan::Quoted { quote, backslash } => {
                if backslash && ch == '\\' {
                    self.state = Scan::Escaped;
                } else if ch == quote {
                    self.state = Scan::Code;
                }
                false
            }
            Scan::Escaped => {
                self.state = Scan::Quoted { quote: '\'', backslash: true };
                false
            }
            Scan::LineComment => {
                if ch == '\n' {
                    self.state = Scan::Code;
                }
                false
            }
            Scan::BlockComment => {
                if ch == '*' && self.peek_is('/') {
                    self.state = Scan::BlockCommentEnd;
                }
                false
            }
            Scan::BlockCommentEnd => {
                self.state = Scan::Code;
                false
            }
            Scan::DollarQuoted(end) => {
                if idx + ch.len_utf8() >= end {
                    self.state = Scan::Code;
                }
                false
            }
        };
        self.prev = [Some(ch), self.prev[0]];
        Some((ch, in_code))
    }
}
