//! Strategy explanation command.

use anyhow::{Context, Result, bail};
use rowscope_core::CountStrategy;
use serde::Serialize;

use crate::output::{self, Format};
use crate::{OutputFormat, RequestArgs};

use super::request;

/// Which branch a request takes.
#[derive(Serialize)]
struct StrategyOutput {
    strategy: CountStrategy,
    description: &'static str,
    is_estimate: bool,
    catalog_estimate: f64,
    threshold: u64,
    active_filters: usize,
    enforce_exact_count: bool,
}

fn explain(args: &RequestArgs, estimate: f64) -> Result<StrategyOutput> {
    if !estimate.is_finite() {
        bail!("catalog estimate must be a finite number, got {estimate}");
    }

    let request = request::load(args)?;
    let strategy = request::estimator(args)
        .strategy_for(&request, estimate)
        .context("no table selected: pass --table-id and --table, or --request")?;

    Ok(StrategyOutput {
        strategy,
        description: strategy.description(),
        is_estimate: strategy.is_estimate(),
        catalog_estimate: estimate,
        threshold: args.threshold,
        active_filters: request.active_filters().count(),
        enforce_exact_count: request.enforce_exact_count,
    })
}

/// Run the strategy command.
pub fn run(args: &RequestArgs, estimate: f64, format: OutputFormat, quiet: bool) -> Result<()> {
    let output = explain(args, estimate)?;
    if output.catalog_estimate < 0.0 && output.catalog_estimate != -1.0 {
        output::status(
            "Note: reltuples is only ever -1 or non-negative; treating as a small table.",
            quiet,
        );
    }

    match Format::from(format) {
        Format::Json => output::print_json(&output)?,
        Format::Table => {
            let items = vec![
                ("Strategy", output.strategy.name().to_string()),
                ("Description", output.description.to_string()),
                ("Estimated", output.is_estimate.to_string()),
                ("Catalog estimate", output.catalog_estimate.to_string()),
                ("Threshold", output.threshold.to_string()),
                ("Active filters", output.active_filters.to_string()),
                ("Exact count enforced", output.enforce_exact_count.to_string()),
            ];
            output::print_key_value_table(&items);
        }
    }

    Ok(())
}
