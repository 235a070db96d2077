use super::ui;
use crate::core::analytics::{EbitdaPoint, GrossMarginPoint, OpexLine, RevenueVsBudget, Runway};
use crate::core::config::DisplayConfig;
use crate::core::model::CashRow;
use crate::core::{Answer, Dataset, Intent, IntentKind, ask};
use anyhow::{Context, Result};
use comfy_table::Cell;

pub const USAGE_EXAMPLES: &[&str] = &[
    "What was 2025-06 revenue vs budget?",
    "Show Gross Margin % trend",
    "Break down Opex by category for 2025-06",
    "Show EBITDA trend",
    "What is our cash runway?",
];

/// Answers `question` and prints either a rendered report or the JSON answer.
pub fn run(
    question: &str,
    data: &Dataset,
    entity: Option<&str>,
    display: &DisplayConfig,
    json: bool,
) -> Result<()> {
    let (intent, answer) = ask(question, data, entity);
    if json {
        let body = serde_json::json!({ "question": question, "answer": answer });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to serialize answer")?
        );
    } else {
        println!("{}", render(&intent, &answer, display));
    }
    Ok(())
}

/// Renders an answer as styled text with a caption naming the detected intent.
pub fn render(intent: &Intent, answer: &Answer, display: &DisplayConfig) -> String {
    let caption = ui::style_text(
        &format!(
            "Intent: {} | Month: {}",
            intent.kind,
            intent.month.as_deref().unwrap_or("auto")
        ),
        ui::StyleType::Subtle,
    );

    let body = match answer {
        Answer::RevenueVsBudget(res) => render_revenue_vs_budget(res),
        Answer::GrossMarginTrend { points } => {
            render_gross_margin(tail(points, display.gross_margin_months))
        }
        Answer::OpexBreakdown { month, lines } => render_opex(month, lines),
        Answer::EbitdaTrend { points } => render_ebitda(tail(points, display.ebitda_months)),
        Answer::CashRunway {
            runway,
            cash_history,
        } => render_runway(*runway, cash_history),
        Answer::NoData { kind } => no_data_message(*kind),
        Answer::Help => render_help(),
    };

    format!("{caption}\n\n{body}")
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn title(text: &str) -> String {
    ui::style_text(text, ui::StyleType::Title)
}

fn render_revenue_vs_budget(res: &RevenueVsBudget) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Actual (USD)"),
        ui::header_cell("Budget (USD)"),
        ui::header_cell("Δ vs Budget (USD)"),
        ui::header_cell("Δ %"),
    ]);
    table.add_row(vec![
        ui::usd_cell(res.actual_usd),
        ui::usd_cell(res.budget_usd),
        ui::signed_usd_cell(res.delta_usd),
        ui::format_optional_cell(res.delta_pct, ui::format_pct),
    ]);

    format!(
        "{} ({})\n\n{table}",
        title(&format!("Revenue vs Budget: {}", res.month)),
        res.entity
    )
}

fn render_gross_margin(points: &[GrossMarginPoint]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Revenue (USD)"),
        ui::header_cell("COGS (USD)"),
        ui::header_cell("GM %"),
    ]);
    for point in points {
        table.add_row(vec![
            Cell::new(&point.month),
            ui::usd_cell(point.revenue_usd),
            ui::usd_cell(point.cogs_usd),
            ui::format_optional_cell(point.gross_margin_pct, ui::format_pct),
        ]);
    }
    format!("{}\n\n{table}", title("Gross Margin % Trend"))
}

fn render_opex(month: &str, lines: &[OpexLine]) -> String {
    let heading = title(&format!("Opex Breakdown: {month}"));
    if lines.is_empty() {
        return format!(
            "{heading}\n\n{}",
            ui::style_text("No Opex rows for selected month.", ui::StyleType::Warning)
        );
    }

    let total: f64 = lines.iter().map(|l| l.usd).sum();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("USD"),
        ui::header_cell("Share"),
    ]);
    for line in lines {
        let share = (total != 0.0).then(|| line.usd / total * 100.0);
        table.add_row(vec![
            Cell::new(&line.account_category),
            ui::usd_cell(line.usd),
            ui::format_optional_cell(share, ui::format_pct),
        ]);
    }

    format!(
        "{heading}\n\n{table}\n\n{}: {}",
        ui::style_text("Total Opex (USD)", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_usd(total), ui::StyleType::TotalValue)
    )
}

fn render_ebitda(points: &[EbitdaPoint]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Revenue"),
        ui::header_cell("COGS"),
        ui::header_cell("Opex"),
        ui::header_cell("EBITDA (USD)"),
    ]);
    for point in points {
        table.add_row(vec![
            Cell::new(&point.month),
            ui::usd_cell(point.revenue_usd),
            ui::usd_cell(point.cogs_usd),
            ui::usd_cell(point.opex_usd),
            ui::signed_usd_cell(point.ebitda_usd),
        ]);
    }
    format!("{}\n\n{table}", title("EBITDA Trend (USD)"))
}

/// One-line runway summary shared with the snapshot export.
pub fn runway_summary(runway: Option<Runway>) -> String {
    match runway {
        None => "Insufficient data to compute runway.".to_string(),
        Some(Runway::Infinite) => "No burn in the last 3 months, runway is ∞.".to_string(),
        Some(Runway::Months(months)) => format!("Runway: {months:.1} months"),
    }
}

fn render_runway(runway: Option<Runway>, cash_history: &[CashRow]) -> String {
    let summary_style = match runway {
        None => ui::StyleType::Warning,
        Some(_) => ui::StyleType::TotalValue,
    };

    let mut table = ui::new_styled_table();
    let headers = vec![ui::header_cell("Month"), ui::header_cell("Cash (USD)")];
    table.set_header(headers);
    for row in cash_history {
        table.add_row(vec![Cell::new(&row.month), ui::usd_cell(row.cash_usd)]);
    }

    format!(
        "{}\n\n{}\n\n{table}",
        title("Cash Runway"),
        ui::style_text(&runway_summary(runway), summary_style)
    )
}

fn no_data_message(kind: IntentKind) -> String {
    ui::style_text(
        &format!("No data available to answer a {kind} question."),
        ui::StyleType::Warning,
    )
}

fn render_help() -> String {
    let mut out = String::from("Try one of:");
    for example in USAGE_EXAMPLES {
        out.push_str(&format!("\n  • {example}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FxRate, LedgerRow};

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).to_string()
    }

    fn row(month: &str, category: &str, currency: &str, amount: f64) -> LedgerRow {
        LedgerRow::new(month, "ParentCo", category, currency, amount)
    }

    fn dataset() -> Dataset {
        Dataset {
            actuals: vec![
                row("2025-05", "Revenue", "USD", 1000.0),
                row("2025-05", "COGS", "USD", 400.0),
                row("2025-06", "Revenue", "EUR", 1000.0),
                row("2025-06", "Opex:Admin", "USD", 2500.0),
            ],
            budget: vec![row("2025-06", "Revenue", "USD", 1000.0)],
            cash: vec![CashRow::new("2025-06", 36000.0)],
            fx: vec![FxRate::new("2025-06", "EUR", 1.1)],
        }
    }

    fn rendered(question: &str) -> String {
        let (intent, answer) = ask(question, &dataset(), None);
        plain(&render(&intent, &answer, &DisplayConfig::default()))
    }

    #[test]
    fn test_render_revenue_vs_budget() {
        let out = rendered("revenue vs budget 2025-06");
        assert!(out.contains("Intent: revenue_vs_budget | Month: 2025-06"));
        assert!(out.contains("Revenue vs Budget: 2025-06 (All)"));
        assert!(out.contains("1,100"));
        assert!(out.contains("10.0%"));
    }

    #[test]
    fn test_render_gross_margin() {
        let out = rendered("gross margin trend");
        assert!(out.contains("Month: auto"));
        assert!(out.contains("60.0%"));
        assert!(out.contains("100.0%"));
    }

    #[test]
    fn test_render_empty_opex() {
        let out = rendered("opex breakdown 2025-05");
        assert!(out.contains("No Opex rows for selected month."));
    }

    #[test]
    fn test_render_runway() {
        let out = rendered("cash runway");
        // June EBITDA is 1,100 - 2,500 = -1,400; May is +600.
        let expected = format!("Runway: {:.1} months", 36000.0 / 1400.0);
        assert!(out.contains(&expected));
        assert!(out.contains("36,000"));
    }

    #[test]
    fn test_render_help() {
        let out = rendered("xyz nonsense");
        assert!(out.contains("Intent: help | Month: auto"));
        for example in USAGE_EXAMPLES {
            assert!(out.contains(example));
        }
    }

    #[test]
    fn test_runway_summary() {
        assert_eq!(runway_summary(None), "Insufficient data to compute runway.");
        assert_eq!(
            runway_summary(Some(Runway::Infinite)),
            "No burn in the last 3 months, runway is ∞."
        );
        assert_eq!(
            runway_summary(Some(Runway::Months(6.0))),
            "Runway: 6.0 months"
        );
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail(&[1, 2, 3, 4], 2), &[3, 4]);
        assert_eq!(tail(&[1, 2], 5), &[1, 2]);
    }
}
