//! Question classifier
//!
//! Maps a free-text finance question to one of a closed set of intents using ordered
//! keyword rules. The first rule that matches wins, so rule order is the tie-break when a
//! question mentions several metrics.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    RevenueVsBudget,
    GrossMarginTrend,
    OpexBreakdown,
    EbitdaTrend,
    CashRunway,
    Help,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::RevenueVsBudget,
        IntentKind::GrossMarginTrend,
        IntentKind::OpexBreakdown,
        IntentKind::EbitdaTrend,
        IntentKind::CashRunway,
        IntentKind::Help,
    ];

    /// Wire name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::RevenueVsBudget => "revenue_vs_budget",
            IntentKind::GrossMarginTrend => "gross_margin_trend",
            IntentKind::OpexBreakdown => "opex_breakdown",
            IntentKind::EbitdaTrend => "ebitda_trend",
            IntentKind::CashRunway => "cash_runway",
            IntentKind::Help => "help",
        }
    }
}

impl Serialize for IntentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified question. `month` is only set when the question contains a literal
/// `YYYY-MM` token; month names such as "June 2025" are not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub month: Option<String>,
}

impl Intent {
    pub fn help() -> Self {
        Intent {
            kind: IntentKind::Help,
            month: None,
        }
    }
}

type Rule = (fn(&str) -> bool, IntentKind);

/// Evaluated top to bottom.
const RULES: &[Rule] = &[
    (
        |s| s.contains("revenue") && s.contains("budget"),
        IntentKind::RevenueVsBudget,
    ),
    (|s| s.contains("gross margin"), IntentKind::GrossMarginTrend),
    (
        |s| s.contains("opex") && (s.contains("breakdown") || s.contains("by category")),
        IntentKind::OpexBreakdown,
    ),
    (|s| s.contains("ebitda"), IntentKind::EbitdaTrend),
    (
        |s| s.contains("cash runway") || (s.contains("runway") && s.contains("cash")),
        IntentKind::CashRunway,
    ),
];

fn month_pattern() -> &'static Regex {
    static MONTH: OnceLock<Regex> = OnceLock::new();
    MONTH.get_or_init(|| Regex::new(r"20\d{2}-\d{2}").expect("month pattern is valid"))
}

/// First `20YY-MM` token in the text, if any.
pub fn extract_month(text: &str) -> Option<String> {
    month_pattern().find(text).map(|m| m.as_str().to_string())
}

/// Classifies a question. Unrecognised questions become [`IntentKind::Help`].
pub fn parse_intent(question: &str) -> Intent {
    let s = question.trim().to_lowercase();
    let month = extract_month(&s);

    RULES
        .iter()
        .find(|(matches, _)| matches(&s))
        .map(|(_, kind)| Intent { kind: *kind, month })
        .unwrap_or_else(Intent::help)
}
