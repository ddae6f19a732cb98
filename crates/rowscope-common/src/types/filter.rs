//! Column filters as entered in the console's data grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::Error;

/// Comparison operator of a [`FilterClause`].
///
/// Operators serialize as their SQL token (`"="`, `"~~*"`, `"in"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `<>`
    #[serde(rename = "<>")]
    NotEq,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    Gte,
    /// `<=`
    #[serde(rename = "<=")]
    Lte,
    /// `~~` (LIKE)
    #[serde(rename = "~~")]
    Like,
    /// `~~*` (ILIKE)
    #[serde(rename = "~~*")]
    ILike,
    /// `in` with a comma-separated value list.
    #[serde(rename = "in")]
    In,
    /// `is` with `null`, `not null`, `true` or `false`.
    #[serde(rename = "is")]
    Is,
}

impl FilterOperator {
    /// All operators, in the order the console offers them.
    pub const ALL: [FilterOperator; 10] = [
        Self::Eq,
        Self::NotEq,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::Like,
        Self::ILike,
        Self::In,
        Self::Is,
    ];

    /// Returns the SQL token for this operator.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "~~",
            Self::ILike => "~~*",
            Self::In => "in",
            Self::Is => "is",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for FilterOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        // Spellings people type instead of the operator tokens
        if token == "!=" {
            return Ok(Self::NotEq);
        }
        if token.eq_ignore_ascii_case("like") {
            return Ok(Self::Like);
        }
        if token.eq_ignore_ascii_case("ilike") {
            return Ok(Self::ILike);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_sql().eq_ignore_ascii_case(token))
            .ok_or_else(|| Error::InvalidFilter(format!("unknown operator '{token}'")))
    }
}

/// Right-hand side of an `is` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsTarget {
    /// `is null`
    Null,
    /// `is not null`
    NotNull,
    /// `is true`
    True,
    /// `is false`
    False,
}

impl IsTarget {
    /// Parses an `is` operand, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        match words.as_slice() {
            ["null"] => Some(Self::Null),
            ["not", "null"] => Some(Self::NotNull),
            ["true"] => Some(Self::True),
            ["false"] => Some(Self::False),
            _ => None,
        }
    }

    /// Returns the SQL keyword(s) for this target.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::NotNull => "not null",
            Self::True => "true",
            Self::False => "false",
        }
    }
}

/// A single column filter.
///
/// Filters without a value (absent or empty) are inactive and never reach
/// the generated statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterClause {
    /// Column name, unquoted.
    pub column: String,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Raw value as typed by the user.
    #[serde(default)]
    pub value: Option<String>,
}

impl FilterClause {
    /// Creates a filter with a value.
    #[must_use]
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// Creates a filter with no value yet.
    #[must_use]
    pub fn without_value(column: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            column: column.into(),
            operator,
            value: None,
        }
    }

    /// Returns whether this filter contributes to a WHERE clause.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self.value.as_deref() {
            None | Some("") => false,
            Some(_) if self.operator == FilterOperator::In => !self.in_values().is_empty(),
            Some(_) => true,
        }
    }

    /// Splits an `in` value into its trimmed, non-empty items.
    #[must_use]
    pub fn in_values(&self) -> Vec<&str> {
        self.value
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_round_trip_through_token() {
        for op in FilterOperator::ALL {
            assert_eq!(op.as_sql().parse::<FilterOperator>().unwrap(), op);
        }
        assert_eq!("!=".parse::<FilterOperator>().unwrap(), FilterOperator::NotEq);
        assert_eq!("ILIKE".parse::<FilterOperator>().unwrap(), FilterOperator::ILike);
        assert_eq!("like".parse::<FilterOperator>().unwrap(), FilterOperator::Like);
        assert_eq!(" IN ".parse::<FilterOperator>().unwrap(), FilterOperator::In);
        assert!("between".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_operator_serializes_as_token() {
        let json = serde_json::to_string(&FilterOperator::ILike).unwrap();
        assert_eq!(json, "\"~~*\"");
        let op: FilterOperator = serde_json::from_str("\"<>\"").unwrap();
        assert_eq!(op, FilterOperator::NotEq);
    }

    #[test]
    fn test_is_target_parse() {
        assert_eq!(IsTarget::parse("NULL"), Some(IsTarget::Null));
        assert_eq!(IsTarget::parse(" not   null "), Some(IsTarget::NotNull));
        assert_eq!(IsTarget::parse("True"), Some(IsTarget::True));
        assert_eq!(IsTarget::parse("false"), Some(IsTarget::False));
        assert_eq!(IsTarget::parse("banana"), None);
    }

    #[test]
    fn test_empty_and_absent_values_are_inactive() {
        assert!(!FilterClause::new("x", FilterOperator::Eq, "").is_active());
        assert!(!FilterClause::without_value("x", FilterOperator::Eq).is_active());
        assert!(FilterClause::new("x", FilterOperator::Eq, "0").is_active());
        // whitespace is a legitimate value for scalar comparisons
        assert!(FilterClause::new("x", FilterOperator::Eq, " ").is_active());
    }

    #[test]
    fn test_in_values() {
        let filter = FilterClause::new("status", FilterOperator::In, " open, closed ,,");
        assert_eq!(filter.in_values(), vec!["open", "closed"]);
        assert!(filter.is_active());

        let empty = FilterClause::new("status", FilterOperator::In, " , ");
        assert!(empty.in_values().is_empty());
        assert!(!empty.is_active());
    }

    #[test]
    fn test_filter_deserializes_without_value() {
        let filter: FilterClause =
            serde_json::from_str(r#"{"column":"age","operator":">="}"#).unwrap();
        assert_eq!(filter.operator, FilterOperator::Gte);
        assert_eq!(filter.value, None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn in_items_are_trimmed_and_non_empty(value in "[ a-z,]{0,24}") {
                let filter = FilterClause::new("c", FilterOperator::In, value.clone());
                let items = filter.in_values();
                for item in &items {
                    prop_assert!(!item.is_empty());
                    prop_assert!(!item.contains(','));
                    prop_assert_eq!(item.trim(), *item);
                }
                prop_assert_eq!(filter.is_active(), !items.is_empty());
            }

            #[test]
            fn scalar_filters_are_active_iff_value_non_empty(value in ".{0,8}") {
                let filter = FilterClause::new("c", FilterOperator::Eq, value.clone());
                prop_assert_eq!(filter.is_active(), !value.is_empty());
            }
        }
    }
}
