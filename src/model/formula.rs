//! Aggregation formula classification.
//!
//! A custom aggregation is either a bare number (a fixed reward per
//! converting user) or an arbitrary SQL expression in which `COUNT(*)`
//! stands for the per-row value.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{SqlGenError, SqlGenResult};

/// Plain decimal number, optionally signed, optionally with an exponent.
static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").unwrap());

/// `COUNT(*)` placeholder, any case, whitespace allowed inside the parens.
static COUNT_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcount\(\s*\*\s*\)").unwrap());

/// A classified aggregation formula.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationFormula {
    NumericLiteral(f64),
    RawExpression(String),
}

impl AggregationFormula {
    /// Classify a formula after a light structural check.
    ///
    /// Raw expressions are otherwise passed through untouched; SQL errors
    /// surface when the query runs.
    pub fn classify(text: &str) -> SqlGenResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(malformed(text, "formula is empty"));
        }
        if let Some(n) = parse_numeric_literal(trimmed) {
            return Ok(AggregationFormula::NumericLiteral(n));
        }
        check_balanced_parens(text)?;
        Ok(AggregationFormula::RawExpression(text.to_string()))
    }

    /// Substitute the value column into the formula.
    ///
    /// Literals render as `(CASE WHEN <col> IS NOT NULL THEN <n> ELSE 0 END)`.
    pub fn render(&self, value_column: &str) -> String {
        match self {
            AggregationFormula::NumericLiteral(n) => format!(
                "(CASE WHEN {} IS NOT NULL THEN {} ELSE 0 END)",
                value_column,
                format_number(*n)
            ),
            AggregationFormula::RawExpression(text) => substitute_value(text, value_column),
        }
    }
}

/// Replace every `COUNT(*)` placeholder with `COUNT(<value_column>)`.
pub fn substitute_value(formula: &str, value_column: &str) -> String {
    let replacement = format!("COUNT({})", value_column);
    COUNT_STAR
        .replace_all(formula, regex::NoExpand(&replacement))
        .into_owned()
}

/// Parse `text` as a plain finite number (no `inf`, `NaN`, hex, ...).
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    let text = text.trim();
    if !NUMERIC_LITERAL.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a number as a SQL numeric literal.
///
/// Whole numbers render without a fractional part (`33`, not `33.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        let mut buffer = ryu::Buffer::new();
        buffer.format(n).to_string()
    }
}

/// Count parentheses outside string literals, quoted identifiers and
/// comments. Backslash escapes are honored inside quotes.
fn check_balanced_parens(text: &str) -> SqlGenResult<()> {
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                if !skip_quoted(&mut chars, c) {
                    return Err(malformed(text, "unterminated string literal"));
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        closed = true;
                        break;
                    }
                    prev = c;
                }
                if !closed {
                    return Err(malformed(text, "unterminated comment"));
                }
            }
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed(text, "unexpected ')'"))?;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(malformed(text, "unclosed '('"));
    }
    Ok(())
}

/// Advance past the closing `quote`. Doubled quotes simply close and reopen.
fn skip_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> bool {
    while let Some(c) = chars.next() {
        if c == '\\' && quote != '`' {
            chars.next();
        } else if c == quote {
            return true;
        }
    }
    false
}

fn malformed(formula: &str, reason: &str) -> SqlGenError {
    SqlGenError::MalformedAggregationFormula {
        formula: formula.to_string(),
        reason: reason.to_string(),
    }
}
