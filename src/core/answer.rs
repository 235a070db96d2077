//! Routes a classified question to the matching metric calculation.

use crate::core::analytics::{
    self, EbitdaPoint, GrossMarginPoint, OpexLine, RevenueVsBudget, Runway,
};
use crate::core::intent::{Intent, IntentKind, parse_intent};
use crate::core::model::{CashRow, Dataset};
use serde::Serialize;
use tracing::debug;

/// Structured result of one question, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Answer {
    RevenueVsBudget(RevenueVsBudget),
    GrossMarginTrend {
        points: Vec<GrossMarginPoint>,
    },
    OpexBreakdown {
        month: String,
        lines: Vec<OpexLine>,
    },
    EbitdaTrend {
        points: Vec<EbitdaPoint>,
    },
    CashRunway {
        runway: Option<Runway>,
        cash_history: Vec<CashRow>,
    },
    /// The question was understood but no month could be resolved from the data.
    NoData {
        kind: IntentKind,
    },
    Help,
}

/// Classifies and answers a question in one step.
pub fn ask(question: &str, data: &Dataset, entity: Option<&str>) -> (Intent, Answer) {
    let intent = parse_intent(question);
    debug!(?intent, "Classified question");
    let answer = answer(&intent, data, entity);
    (intent, answer)
}

/// Computes the answer for an intent. A missing month falls back to the latest month
/// available for that metric.
pub fn answer(intent: &Intent, data: &Dataset, entity: Option<&str>) -> Answer {
    match intent.kind {
        IntentKind::RevenueVsBudget => {
            match intent.month.clone().or_else(|| data.latest_common_month()) {
                Some(month) => Answer::RevenueVsBudget(analytics::revenue_vs_budget(
                    &data.actuals,
                    &data.budget,
                    &data.fx,
                    &month,
                    entity,
                )),
                None => Answer::NoData { kind: intent.kind },
            }
        }
        IntentKind::GrossMarginTrend => Answer::GrossMarginTrend {
            points: analytics::gross_margin_trend(&data.actuals, &data.fx),
        },
        IntentKind::OpexBreakdown => {
            match intent.month.clone().or_else(|| data.latest_actuals_month()) {
                Some(month) => Answer::OpexBreakdown {
                    lines: analytics::opex_breakdown(&data.actuals, &data.fx, &month),
                    month,
                },
                None => Answer::NoData { kind: intent.kind },
            }
        }
        IntentKind::EbitdaTrend => Answer::EbitdaTrend {
            points: analytics::ebitda_trend(&data.actuals, &data.fx),
        },
        IntentKind::CashRunway => {
            let mut cash_history = data.cash.clone();
            cash_history.sort_by(|a, b| a.month.cmp(&b.month));
            Answer::CashRunway {
                runway: analytics::cash_runway(&data.cash, &data.actuals, &data.fx),
                cash_history,
            }
        }
        IntentKind::Help => Answer::Help,
    }
}
