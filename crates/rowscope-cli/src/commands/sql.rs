//! Statement printing command.

use anyhow::Result;
use serde::Serialize;

use crate::output::{self, Format};
use crate::{OutputFormat, RequestArgs};

use super::request;

/// A built statement.
#[derive(Serialize)]
struct SqlOutput {
    table: Option<String>,
    enforce_exact_count: bool,
    active_filters: usize,
    threshold: u64,
    sql: String,
}

fn build(args: &RequestArgs) -> Result<SqlOutput> {
    let request = request::load(args)?;
    let sql = request::estimator(args).build_statement(&request);
    Ok(SqlOutput {
        table: request.table.as_ref().map(|t| t.name.clone()),
        enforce_exact_count: request.enforce_exact_count,
        active_filters: request.active_filters().count(),
        threshold: args.threshold,
        sql,
    })
}

/// Run the sql command.
pub fn run(args: &RequestArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let output = build(args)?;
    if output.sql.is_empty() {
        output::status("No table selected, nothing to count.", quiet);
    }

    match Format::from(format) {
        Format::Json => output::print_json(&output)?,
        Format::Table => {
            if !output.sql.is_empty() {
                println!("{}", output.sql);
            }
        }
    }

    Ok(())
}
