//! Provides the FP&A metric calculations over ledger, cash and FX tables.
//!
//! Every function here is pure: inputs are borrowed, nothing is mutated and the same
//! inputs always produce the same output. Amounts are converted to USD with
//! [`normalize`] before they are aggregated.
use crate::core::currency::{FxTable, normalize};
use crate::core::model::{
    COGS_ACCOUNT, CashRow, FxRate, LedgerRow, REVENUE_ACCOUNT, is_opex_category,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Number of trailing EBITDA months averaged for the burn rate.
pub const RUNWAY_WINDOW_MONTHS: usize = 3;

pub const ALL_ENTITIES: &str = "All";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueVsBudget {
    pub month: String,
    pub entity: String,
    pub actual_usd: f64,
    pub budget_usd: f64,
    pub delta_usd: f64,
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrossMarginPoint {
    pub month: String,
    pub revenue_usd: f64,
    pub cogs_usd: f64,
    pub gross_margin_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpexLine {
    pub account_category: String,
    pub usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EbitdaPoint {
    pub month: String,
    pub revenue_usd: f64,
    pub cogs_usd: f64,
    pub opex_usd: f64,
    pub ebitda_usd: f64,
}

/// Months of cash left at the trailing average burn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "months", rename_all = "snake_case")]
pub enum Runway {
    Months(f64),
    /// No burn in the trailing window.
    Infinite,
}

impl Runway {
    pub fn months(&self) -> f64 {
        match self {
            Runway::Months(m) => *m,
            Runway::Infinite => f64::INFINITY,
        }
    }
}

/// Per-month sums of the categories the trend metrics need. `None` means the month had
/// no row of that kind.
#[derive(Debug, Default, Clone, Copy)]
struct MonthTotals {
    revenue: Option<f64>,
    cogs: Option<f64>,
    opex: Option<f64>,
}

enum Bucket {
    Revenue,
    Cogs,
    Opex,
}

impl Bucket {
    fn of(category: &str) -> Option<Self> {
        if category == REVENUE_ACCOUNT {
            Some(Bucket::Revenue)
        } else if category == COGS_ACCOUNT {
            Some(Bucket::Cogs)
        } else if is_opex_category(category) {
            Some(Bucket::Opex)
        } else {
            None
        }
    }
}

fn add(slot: &mut Option<f64>, usd: f64) {
    *slot = Some(slot.unwrap_or(0.0) + usd);
}

/// Groups actuals by `(month, account_category)` and folds each group into the month's
/// revenue, COGS and opex buckets.
fn monthly_totals(actuals: &[LedgerRow], fx: &FxTable) -> BTreeMap<String, MonthTotals> {
    let mut by_category: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for n in normalize(actuals, fx) {
        *by_category
            .entry((n.row.month.as_str(), n.row.account_category.as_str()))
            .or_insert(0.0) += n.usd;
    }

    let mut months: BTreeMap<String, MonthTotals> = BTreeMap::new();
    for ((month, category), usd) in by_category {
        let Some(bucket) = Bucket::of(category) else {
            continue;
        };
        let totals = months.entry(month.to_string()).or_default();
        match bucket {
            Bucket::Revenue => add(&mut totals.revenue, usd),
            Bucket::Cogs => add(&mut totals.cogs, usd),
            Bucket::Opex => add(&mut totals.opex, usd),
        }
    }
    months
}

/// Compares actual and budgeted revenue for one month, optionally for a single entity.
pub fn revenue_vs_budget(
    actuals: &[LedgerRow],
    budget: &[LedgerRow],
    fx: &[FxRate],
    month: &str,
    entity: Option<&str>,
) -> RevenueVsBudget {
    let table = FxTable::new(fx);
    let entity = entity.filter(|e| !e.is_empty());

    let revenue_usd = |rows: &[LedgerRow]| -> f64 {
        normalize(rows, &table)
            .iter()
            .filter(|n| n.row.month == month && n.row.is_revenue())
            .filter(|n| entity.is_none_or(|e| n.row.entity == e))
            .map(|n| n.usd)
            .sum()
    };

    let actual_usd = revenue_usd(actuals);
    let budget_usd = revenue_usd(budget);
    let delta_usd = actual_usd - budget_usd;
    let delta_pct = (budget_usd != 0.0).then(|| delta_usd / budget_usd * 100.0);

    debug!("Revenue vs budget for {month}: actual {actual_usd}, budget {budget_usd}");

    RevenueVsBudget {
        month: month.to_string(),
        entity: entity.unwrap_or(ALL_ENTITIES).to_string(),
        actual_usd,
        budget_usd,
        delta_usd,
        delta_pct,
    }
}

/// Gross margin % for every month with revenue or COGS, oldest first.
pub fn gross_margin_trend(actuals: &[LedgerRow], fx: &[FxRate]) -> Vec<GrossMarginPoint> {
    monthly_totals(actuals, &FxTable::new(fx))
        .into_iter()
        .filter(|(_, t)| t.revenue.is_some() || t.cogs.is_some())
        .map(|(month, t)| {
            let revenue_usd = t.revenue.unwrap_or(0.0);
            let cogs_usd = t.cogs.unwrap_or(0.0);
            let gross_margin_pct =
                (revenue_usd != 0.0).then(|| (revenue_usd - cogs_usd) / revenue_usd * 100.0);
            GrossMarginPoint {
                month,
                revenue_usd,
                cogs_usd,
                gross_margin_pct,
            }
        })
        .collect()
}

/// Opex for one month by sub-category, largest first.
pub fn opex_breakdown(actuals: &[LedgerRow], fx: &[FxRate], month: &str) -> Vec<OpexLine> {
    let table = FxTable::new(fx);
    let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for n in normalize(actuals, &table) {
        if n.row.month == month && n.row.is_opex() {
            *by_category
                .entry(n.row.account_category.as_str())
                .or_insert(0.0) += n.usd;
        }
    }

    let mut lines: Vec<OpexLine> = by_category
        .into_iter()
        .map(|(category, usd)| OpexLine {
            account_category: category.to_string(),
            usd,
        })
        .collect();
    // Stable sort keeps ties in category order.
    lines.sort_by(|a, b| b.usd.total_cmp(&a.usd));
    lines
}

/// EBITDA (revenue - COGS - opex) for every month with any of the three, oldest first.
pub fn ebitda_trend(actuals: &[LedgerRow], fx: &[FxRate]) -> Vec<EbitdaPoint> {
    monthly_totals(actuals, &FxTable::new(fx))
        .into_iter()
        .map(|(month, t)| {
            let revenue_usd = t.revenue.unwrap_or(0.0);
            let cogs_usd = t.cogs.unwrap_or(0.0);
            let opex_usd = t.opex.unwrap_or(0.0);
            EbitdaPoint {
                month,
                revenue_usd,
                cogs_usd,
                opex_usd,
                ebitda_usd: revenue_usd - cogs_usd - opex_usd,
            }
        })
        .collect()
}

/// Average monthly burn over the trailing EBITDA values. Only negative months burn cash.
pub fn average_burn(ebitda: &[f64]) -> f64 {
    let burns: Vec<f64> = ebitda.iter().filter(|e| **e < 0.0).map(|e| -e).collect();
    if burns.is_empty() {
        return 0.0;
    }
    burns.iter().sum::<f64>() / burns.len() as f64
}

/// Runway from the latest cash balance and a burn averaged over the trailing
/// [`RUNWAY_WINDOW_MONTHS`] EBITDA months.
///
/// Returns `None` when there is no EBITDA history, or when cash is burning but there is
/// no cash balance to divide.
pub fn cash_runway(cash: &[CashRow], actuals: &[LedgerRow], fx: &[FxRate]) -> Option<Runway> {
    let series = ebitda_trend(actuals, fx);
    if series.is_empty() {
        debug!("No EBITDA history, runway undefined");
        return None;
    }

    let start = series.len().saturating_sub(RUNWAY_WINDOW_MONTHS);
    let trailing: Vec<f64> = series[start..].iter().map(|p| p.ebitda_usd).collect();
    let avg_burn = average_burn(&trailing);
    debug!("Trailing EBITDA {trailing:?}, average burn {avg_burn}");

    if avg_burn == 0.0 {
        return Some(Runway::Infinite);
    }

    let latest = cash.iter().max_by(|a, b| a.month.cmp(&b.month))?;
    Some(Runway::Months(latest.cash_usd / avg_burn))
}
