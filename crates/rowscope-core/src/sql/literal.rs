//! String literals and statements embedded in other statements.

/// Quotes a string literal, doubling any embedded single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Reverses [`quote_literal`].
///
/// Returns `None` unless `literal` is exactly one quoted literal with every
/// inner quote doubled.
fn unquote_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            // A lone quote would have terminated the literal early
            if chars.next() != Some('\'') {
                return None;
            }
        }
        out.push(ch);
    }
    Some(out)
}

/// A statement meant to be passed as a string argument to another statement.
///
/// The planner-estimate path hands a complete `select` to a server-side
/// function that runs `EXPLAIN` on it, so the inner text travels as a
/// literal. Keeping it in its own type means escaping happens exactly once,
/// at [`to_literal`](Self::to_literal).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NestedStatement {
    sql: String,
}

impl NestedStatement {
    /// Wraps raw statement text.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }

    /// Returns the raw statement text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Renders the statement as a string literal.
    #[must_use]
    pub fn to_literal(&self) -> String {
        quote_literal(&self.sql)
    }

    /// Recovers a statement from a literal produced by [`to_literal`](Self::to_literal).
    #[must_use]
    pub fn from_literal(literal: &str) -> Option<Self> {
        unquote_literal(literal).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("abc"), "'abc'");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal(""), "''");
    }

    #[test]
    fn test_nested_statement_doubles_inner_quotes() {
        let inner = NestedStatement::new("select * from \"users\" where \"name\" = 'O''Brien';");
        assert_eq!(
            inner.to_literal(),
            "'select * from \"users\" where \"name\" = ''O''''Brien'';'"
        );
    }

    #[test]
    fn test_from_literal_rejects_malformed_text() {
        assert!(NestedStatement::from_literal("no quotes").is_none());
        assert!(NestedStatement::from_literal("'unterminated").is_none());
        assert!(NestedStatement::from_literal("'lone ' quote'").is_none());
        assert!(NestedStatement::from_literal("'").is_none());
        assert_eq!(
            NestedStatement::from_literal("''").unwrap().as_str(),
            ""
        );
    }

    proptest! {
        #[test]
        fn prop_literal_round_trip_is_lossless(sql in ".*") {
            let nested = NestedStatement::new(sql.clone());
            let restored = NestedStatement::from_literal(&nested.to_literal()).unwrap();
            prop_assert_eq!(restored.as_str(), sql.as_str());
        }

        #[test]
        fn prop_quote_heavy_round_trip(sql in "['a-z ]{0,40}") {
            let literal = quote_literal(&sql);
            // Every inner quote is doubled, so the quote count is always even
            prop_assert_eq!(literal.matches('\'').count() % 2, 0);
            let restored = NestedStatement::from_literal(&literal).unwrap();
            prop_assert_eq!(restored.as_str(), sql.as_str());
        }

        #[test]
        fn prop_nesting_twice_round_trips(sql in "[a-z' ]{0,30}") {
            let once = NestedStatement::new(sql.clone()).to_literal();
            let twice = NestedStatement::new(once.clone()).to_literal();
            let back_once = NestedStatement::from_literal(&twice).unwrap();
            prop_assert_eq!(back_once.as_str(), once.as_str());
            let back = NestedStatement::from_literal(back_once.as_str()).unwrap();
            prop_assert_eq!(back.as_str(), sql.as_str());
        }
    }
}
