//! Query-string parser.
//!
//! Covers the statement shapes the execution core itself exercises:
//! `YIELD <literal> [AS <alias>][, ...]`, `EXPLAIN [PROFILE] <stmt>`,
//! `PROFILE <stmt>` and `;`-separated sequential statements. The full
//! language grammar lives with the frontend; anything unrecognized here is
//! a syntax error.

use crate::core::{GraphResult, Status, Value};
use crate::expression::Expression;

use super::sentence::{Sentence, YieldItem, YieldSentence};

#[derive(Debug, Default)]
pub struct GQLParser;

impl GQLParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> GraphResult<Sentence> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Status::StatementEmpty);
        }

        let parts: Vec<&str> = trimmed
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(Status::StatementEmpty);
        }
        if parts.len() == 1 {
            return self.parse_single(parts[0]);
        }

        let mut sentences = Vec::with_capacity(parts.len());
        for part in parts {
            sentences.push(self.parse_single(part)?);
        }
        Ok(Sentence::Sequential(sentences))
    }

    fn parse_single(&self, text: &str) -> GraphResult<Sentence> {
        let (keyword, rest) = split_keyword(text);
        match keyword.to_ascii_uppercase().as_str() {
            "EXPLAIN" => {
                let (next, inner_text) = split_keyword(rest);
                if next.eq_ignore_ascii_case("PROFILE") {
                    let inner = self.parse_single(inner_text)?;
                    Ok(Sentence::Explain {
                        inner: Box::new(inner),
                        is_profile: true,
                    })
                } else {
                    let inner = self.parse_single(rest)?;
                    Ok(Sentence::Explain {
                        inner: Box::new(inner),
                        is_profile: false,
                    })
                }
            }
            "PROFILE" => {
                let inner = self.parse_single(rest)?;
                Ok(Sentence::Explain {
                    inner: Box::new(inner),
                    is_profile: true,
                })
            }
            "YIELD" => self.parse_yield(rest),
            _ => Err(Status::syntax_error(format!(
                "syntax error near `{}'",
                keyword
            ))),
        }
    }

    fn parse_yield(&self, rest: &str) -> GraphResult<Sentence> {
        if rest.trim().is_empty() {
            return Err(Status::syntax_error("expected expression after `YIELD'"));
        }

        let mut items = Vec::new();
        for item_text in split_top_level_commas(rest) {
            items.push(self.parse_yield_item(item_text.trim())?);
        }
        Ok(Sentence::Yield(YieldSentence { items }))
    }

    fn parse_yield_item(&self, text: &str) -> GraphResult<YieldItem> {
        if text.is_empty() {
            return Err(Status::syntax_error("empty yield item"));
        }

        // Split off a trailing `AS <alias>` if present, scanning outside
        // string literals.
        let upper = text.to_ascii_uppercase();
        let mut expr_text = text;
        let mut alias = None;
        if let Some(pos) = find_keyword_outside_strings(&upper, " AS ") {
            let alias_text = text[pos + 4..].trim();
            if !is_identifier(alias_text) {
                return Err(Status::syntax_error(format!(
                    "invalid alias `{}'",
                    alias_text
                )));
            }
            expr_text = text[..pos].trim();
            alias = Some(alias_text.to_string());
        }

        let expr = self.parse_literal(expr_text)?;
        Ok(YieldItem { expr, alias })
    }

    fn parse_literal(&self, text: &str) -> GraphResult<Expression> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Status::syntax_error("expected expression"));
        }

        if text.eq_ignore_ascii_case("true") {
            return Ok(Expression::literal(true));
        }
        if text.eq_ignore_ascii_case("false") {
            return Ok(Expression::literal(false));
        }
        if (text.starts_with('"') && text.ends_with('"') && text.len() >= 2)
            || (text.starts_with('\'') && text.ends_with('\'') && text.len() >= 2)
        {
            return Ok(Expression::literal(Value::String(
                text[1..text.len() - 1].to_string(),
            )));
        }
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Expression::literal(i));
        }
        if let Ok(f) = text.parse::<f64>() {
            return Ok(Expression::literal(f));
        }

        Err(Status::syntax_error(format!("syntax error near `{}'", text)))
    }
}

/// Split the leading keyword off a statement.
fn split_keyword(text: &str) -> (&str, &str) {
    let trimmed = text.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(pos) => (&trimmed[..pos], trimmed[pos..].trim_start()),
        None => (trimmed, ""),
    }
}

/// Split on commas that are not inside string literals.
fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_string: Option<char> = None;
    for (i, c) in text.char_indices() {
        match in_string {
            Some(quote) => {
                if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => in_string = Some(c),
                ',' => {
                    parts.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte offset of `keyword` in `upper`, skipping string literals. Both
/// arguments must be byte-aligned views of the same text.
fn find_keyword_outside_strings(upper: &str, keyword: &str) -> Option<usize> {
    let bytes = upper.as_bytes();
    let mut in_string: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match in_string {
            Some(quote) => {
                if b == quote {
                    in_string = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    in_string = Some(b);
                } else if upper[i..].starts_with(keyword) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !text.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::sentence::SentenceKind;

    #[test]
    fn test_yield_with_alias() {
        let parser = GQLParser::new();
        let sentence = parser.parse("YIELD 1 AS a").expect("parse");
        match sentence {
            Sentence::Yield(y) => {
                assert_eq!(y.items.len(), 1);
                assert_eq!(y.items[0].column_name(), "a");
                assert_eq!(y.items[0].expr, Expression::literal(1i64));
            }
            other => panic!("unexpected sentence: {:?}", other),
        }
    }

    #[test]
    fn test_yield_multiple_items() {
        let parser = GQLParser::new();
        let sentence = parser
            .parse("YIELD 1 AS a, \"x,y\" AS s, 2.5")
            .expect("parse");
        match sentence {
            Sentence::Yield(y) => {
                assert_eq!(y.items.len(), 3);
                assert_eq!(y.items[1].expr, Expression::literal(Value::String("x,y".to_string())));
                assert_eq!(y.items[2].column_name(), "2.5");
            }
            other => panic!("unexpected sentence: {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error() {
        let parser = GQLParser::new();
        let err = parser.parse("YIEL 1").expect_err("bad keyword");
        assert!(matches!(err, Status::SyntaxError(_)));
        assert!(err.to_string().contains("YIEL"));
    }

    #[test]
    fn test_statement_empty() {
        let parser = GQLParser::new();
        assert_eq!(parser.parse("   "), Err(Status::StatementEmpty));
        assert_eq!(parser.parse(" ; ;"), Err(Status::StatementEmpty));
    }

    #[test]
    fn test_explain_variants() {
        let parser = GQLParser::new();

        let plain = parser.parse("EXPLAIN YIELD 1").expect("parse");
        assert!(plain.is_explain());
        assert!(!plain.is_profile());

        let profile = parser.parse("EXPLAIN PROFILE YIELD 1").expect("parse");
        assert!(profile.is_profile());

        let bare_profile = parser.parse("PROFILE YIELD 1").expect("parse");
        assert!(bare_profile.is_profile());
    }

    #[test]
    fn test_sequential() {
        let parser = GQLParser::new();
        let sentence = parser.parse("YIELD 1; YIELD 2; YIELD 3").expect("parse");
        assert_eq!(sentence.kind(), SentenceKind::Sequential);
        assert_eq!(sentence.num_sentences(), 3);
    }

    #[test]
    fn test_trailing_semicolon_is_single() {
        let parser = GQLParser::new();
        let sentence = parser.parse("YIELD 1;").expect("parse");
        assert_eq!(sentence.kind(), SentenceKind::Yield);
        assert_eq!(sentence.num_sentences(), 1);
    }
}
