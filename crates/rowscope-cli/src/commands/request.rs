//! Count requests from command-line flags or JSON files.

use std::fs;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use rowscope_common::{CountRequest, FilterClause, FilterOperator, TableDescriptor};
use rowscope_core::RowCountEstimator;
use rowscope_engine::Config;

use crate::RequestArgs;

/// `column operator [value]`; the value keeps its inner whitespace.
static FILTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s+(\S+)(?:\s+(.*?))?\s*$").expect("filter pattern compiles")
});

/// Parses a `--filter` argument.
pub fn parse_filter(arg: &str) -> Result<FilterClause> {
    let caps = FILTER_PATTERN
        .captures(arg)
        .with_context(|| format!("filter {arg:?} is not of the form \"column operator value\""))?;

    let column = &caps[1];
    let operator: FilterOperator = caps[2].parse()?;
    let filter = match caps.get(3).map(|m| m.as_str()) {
        Some(value) if !value.is_empty() => FilterClause::new(column, operator, value),
        _ => FilterClause::without_value(column, operator),
    };
    Ok(filter)
}

/// Loads the request described by `args`.
///
/// A request with no table is valid and yields an empty statement.
pub fn load(args: &RequestArgs) -> Result<CountRequest> {
    if let Some(path) = &args.request {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display()))?;
        let request = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse request file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded request file");
        return Ok(request);
    }

    let table = match (args.table_id, &args.table) {
        (Some(id), Some(name)) => {
            let table = TableDescriptor::new(id, name.clone());
            Some(match &args.schema {
                Some(schema) => table.with_schema(schema.clone()),
                None => table,
            })
        }
        (None, None) => None,
        _ => bail!("--table-id and --table must be given together"),
    };

    let filters = args
        .filter
        .iter()
        .map(|arg| parse_filter(arg))
        .collect::<Result<Vec<_>>>()?;

    Ok(CountRequest {
        table,
        filters,
        enforce_exact_count: args.exact,
    })
}

/// Builds the estimator for `args`.
pub fn estimator(args: &RequestArgs) -> RowCountEstimator {
    Config::default()
        .with_estimate_threshold(args.threshold)
        .estimator()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use rowscope_common::TableId;
    use rowscope_core::THRESHOLD_COUNT;

    fn args() -> RequestArgs {
        RequestArgs {
            threshold: THRESHOLD_COUNT,
            ..RequestArgs::default()
        }
    }

    #[test]
    fn test_parse_filter_with_value() {
        let filter = parse_filter("age >= 21").unwrap();
        assert_eq!(filter, FilterClause::new("age", FilterOperator::Gte, "21"));

        let filter = parse_filter("  name ilike  %ann smith%  ").unwrap();
        assert_eq!(filter, FilterClause::new("name", FilterOperator::ILike, "%ann smith%"));

        let filter = parse_filter("status in active, pending").unwrap();
        assert_eq!(filter.in_values(), vec!["active", "pending"]);
    }

    #[test]
    fn test_parse_filter_without_value() {
        let filter = parse_filter("deleted_at is").unwrap();
        assert_eq!(filter, FilterClause::without_value("deleted_at", FilterOperator::Is));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_parse_filter_rejects_garbage() {
        assert!(parse_filter("age").is_err());
        assert!(parse_filter("").is_err());
        assert!(parse_filter("age between 1").is_err());
    }

    #[test]
    fn test_load_from_flags() {
        let request = load(&RequestArgs {
            table_id: Some(42),
            table: Some("users".to_string()),
            schema: Some("public".to_string()),
            filter: vec!["age > 30".to_string()],
            exact: true,
            ..args()
        })
        .unwrap();

        let table = request.table.unwrap();
        assert_eq!(table.id, TableId::new(42));
        assert_eq!(table.schema.as_deref(), Some("public"));
        assert_eq!(request.filters.len(), 1);
        assert!(request.enforce_exact_count);
    }

    #[test]
    fn test_load_without_table() {
        let request = load(&args()).unwrap();
        assert_eq!(request, CountRequest::default());
        assert_eq!(estimator(&args()).build_statement(&request), "");
    }

    #[test]
    fn test_load_rejects_half_a_table() {
        let err = load(&RequestArgs {
            table_id: Some(42),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("--table-id and --table"));
    }

    #[test]
    fn test_load_from_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "table": {{"id": 7, "name": "orders", "schema": "sales"}},
                "filters": [{{"column": "total", "operator": ">", "value": "100"}}]
            }}"#
        )
        .unwrap();

        let request = load(&RequestArgs {
            request: Some(file.path().to_path_buf()),
            ..args()
        })
        .unwrap();
        assert_eq!(request.table.unwrap().name, "orders");
        assert_eq!(
            request.filters,
            vec![FilterClause::new("total", FilterOperator::Gt, "100")]
        );
        assert!(!request.enforce_exact_count);
    }

    #[test]
    fn test_load_reports_bad_request_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load(&RequestArgs {
            request: Some(file.path().to_path_buf()),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("failed to parse request file"));

        let dir = tempfile::tempdir().unwrap();
        let err = load(&RequestArgs {
            request: Some(dir.path().join("missing.json")),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("failed to read request file"));
    }

    #[test]
    fn test_estimator_uses_threshold() {
        let sql = estimator(&RequestArgs {
            threshold: 10,
            ..args()
        })
        .build_statement(&CountRequest::new(TableDescriptor::new(1, "t")));
        assert!(sql.contains("when estimate > 10 then"));
    }
}
