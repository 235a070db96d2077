use super::ask::runway_summary;
use super::ui::{format_pct, format_usd};
use crate::core::analytics;
use crate::core::model::Dataset;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::info;

/// Builds a plain-text one-page summary of the headline metrics.
pub fn render_snapshot(
    data: &Dataset,
    entity: Option<&str>,
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::from("CFO Snapshot\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M")
    ));

    match data.latest_common_month() {
        Some(month) => {
            let res =
                analytics::revenue_vs_budget(&data.actuals, &data.budget, &data.fx, &month, entity);
            out.push_str(&format!("Revenue vs Budget ({}, {})\n", res.month, res.entity));
            out.push_str(&format!("  Actual: {} USD\n", format_usd(res.actual_usd)));
            out.push_str(&format!("  Budget: {} USD\n", format_usd(res.budget_usd)));
            out.push_str(&format!(
                "  Delta:  {} USD ({})\n\n",
                format_usd(res.delta_usd),
                res.delta_pct.map_or("N/A".to_string(), format_pct)
            ));
        }
        None => out.push_str("Revenue vs Budget: no month with both actuals and budget\n\n"),
    }

    let margin = analytics::gross_margin_trend(&data.actuals, &data.fx)
        .pop()
        .map_or("N/A".to_string(), |p| {
            format!(
                "{} ({})",
                p.gross_margin_pct.map_or("N/A".to_string(), format_pct),
                p.month
            )
        });
    out.push_str(&format!("Gross Margin: {margin}\n"));

    let ebitda = analytics::ebitda_trend(&data.actuals, &data.fx)
        .pop()
        .map_or("N/A".to_string(), |p| {
            format!("{} USD ({})", format_usd(p.ebitda_usd), p.month)
        });
    out.push_str(&format!("EBITDA: {ebitda}\n"));

    let runway = analytics::cash_runway(&data.cash, &data.actuals, &data.fx);
    out.push_str(&format!("Cash: {}\n", runway_summary(runway)));

    out
}

/// Writes the snapshot to `output`, or prints it when no path is given.
pub fn run(data: &Dataset, entity: Option<&str>, output: Option<&Path>) -> Result<()> {
    let text = render_snapshot(data, entity, Local::now());
    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
            info!("Wrote snapshot to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
