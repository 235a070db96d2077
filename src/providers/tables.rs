//! CSV parsing for the four input tables.
//!
//! Headers are trimmed and lowercased before lookup, `account` and `account_c` are
//! accepted for `account_category`, and every month is truncated to `YYYY-MM`. A missing
//! required column or an unparseable number fails the whole table.

use crate::core::model::{CashRow, FxRate, LedgerRow};
use crate::core::source::Table;
use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;

const ACCOUNT_ALIASES: &[&str] = &["account_category", "account_c", "account"];

/// Column positions keyed by normalized header name.
struct Columns {
    table: Table,
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(table: Table, headers: &StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            index.entry(normalize_header(header)).or_insert(i);
        }
        Columns { table, index }
    }

    fn required(&self, names: &[&str]) -> Result<usize> {
        names
            .iter()
            .find_map(|name| self.index.get(*name).copied())
            .ok_or_else(|| {
                anyhow!(
                    "{} table is missing required column `{}`",
                    self.table,
                    names[0]
                )
            })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn records(table: Table, csv_text: &str) -> Result<(Columns, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read {table} headers"))?
        .clone();
    let rows = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read {table} rows"))?;
    Ok((Columns::new(table, &headers), rows))
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Parses a numeric cell. Errors name the physical line in the source text.
fn number(table: Table, record: &StringRecord, index: usize) -> Result<f64> {
    let raw = field(record, index).replace(',', "");
    raw.parse::<f64>().with_context(|| {
        let line = record.position().map_or(0, |p| p.line());
        format!("{table} line {line}: `{raw}` is not a number")
    })
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

/// Parses an actuals or budget table.
pub fn parse_ledger(table: Table, csv_text: &str) -> Result<Vec<LedgerRow>> {
    let (columns, rows) = records(table, csv_text)?;
    let month = columns.required(&["month"])?;
    let account = columns.required(ACCOUNT_ALIASES)?;
    let currency = columns.required(&["currency"])?;
    let amount = columns.required(&["amount"])?;
    let entity = columns.optional("entity");

    rows.iter()
        .filter(|r| !is_blank(r))
        .map(|r| {
            Ok(LedgerRow::new(
                field(r, month),
                entity.map_or("", |e| field(r, e)),
                field(r, account),
                field(r, currency),
                number(table, r, amount)?,
            ))
        })
        .collect()
}

pub fn parse_cash(csv_text: &str) -> Result<Vec<CashRow>> {
    let (columns, rows) = records(Table::Cash, csv_text)?;
    let month = columns.required(&["month"])?;
    let cash_usd = columns.required(&["cash_usd"])?;

    rows.iter()
        .filter(|r| !is_blank(r))
        .map(|r| {
            Ok(CashRow::new(
                field(r, month),
                number(Table::Cash, r, cash_usd)?,
            ))
        })
        .collect()
}

pub fn parse_fx(csv_text: &str) -> Result<Vec<FxRate>> {
    let (columns, rows) = records(Table::Fx, csv_text)?;
    let month = columns.required(&["month"])?;
    let currency = columns.required(&["currency"])?;
    let rate = columns.required(&["rate_to_usd"])?;

    rows.iter()
        .filter(|r| !is_blank(r))
        .map(|r| {
            Ok(FxRate::new(
                field(r, month),
                field(r, currency),
                number(Table::Fx, r, rate)?,
            ))
        })
        .collect()
}

/// Guards against a source answering with something that is not a table at all.
pub(crate) fn ensure_not_html(table: Table, body: &str) -> Result<()> {
    if body.trim_start().starts_with('<') {
        bail!("{table} source returned HTML instead of CSV");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ledger_normalizes_headers_and_months() {
        let csv = "\u{feff} Month ,Entity,Account,Currency, AMOUNT\n\
                   2025-06-01,ParentCo,Revenue,USD,\"460,000\"\n\
                   2025-06-30,EMEA,Opex:Admin,EUR,1200.5\n";

        let rows = parse_ledger(Table::Actuals, csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            LedgerRow::new("2025-06", "ParentCo", "Revenue", "USD", 460000.0)
        );
        assert_eq!(rows[1].month, "2025-06");
        assert_eq!(rows[1].account_category, "Opex:Admin");
        assert_eq!(rows[1].amount, 1200.5);
    }

    #[test]
    fn test_parse_ledger_accepts_account_c_and_missing_entity() {
        let csv = "month,account_c,currency,amount\n2025-01,COGS,USD,10\n";

        let rows = parse_ledger(Table::Budget, csv).unwrap();
        assert_eq!(rows[0].account_category, "COGS");
        assert_eq!(rows[0].entity, "");
    }

    #[test]
    fn test_parse_ledger_keeps_blank_currency() {
        let csv = "month,entity,account_category,currency,amount\n2025-01,A,Revenue,,10\n";

        let rows = parse_ledger(Table::Actuals, csv).unwrap();
        assert_eq!(rows[0].currency, "");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "month,entity,account,amount\n2025-01,A,Revenue,10\n";

        let err = parse_ledger(Table::Actuals, csv).unwrap_err();
        assert_eq!(
            err.to_string(),
            "actuals table is missing required column `currency`"
        );
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv = "month,cash_usd\n2025-01,100\n2025-02,lots\n";

        let err = parse_cash(csv).unwrap_err();
        assert_eq!(err.to_string(), "cash line 3: `lots` is not a number");
    }

    #[test]
    fn test_bad_number_line_counts_blank_lines() {
        let csv = "month,cash_usd\n2025-01,100\n\n2025-02,lots\n";

        let err = parse_cash(csv).unwrap_err();
        assert_eq!(err.to_string(), "cash line 4: `lots` is not a number");
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let csv = "month,currency,rate_to_usd\n2025-01,EUR,1.1\n,,\n2025-02,EUR,1.2\n";

        let rates = parse_fx(csv).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[1], FxRate::new("2025-02", "EUR", 1.2));
    }

    #[test]
    fn test_parse_cash() {
        let csv = "month,cash_usd\n2025-05-31,6500000\n2025-06-30,6200000\n";

        let rows = parse_cash(csv).unwrap();
        assert_eq!(
            rows,
            vec![
                CashRow::new("2025-05", 6500000.0),
                CashRow::new("2025-06", 6200000.0),
            ]
        );
    }

    #[test]
    fn test_html_body_is_rejected() {
        assert!(ensure_not_html(Table::Fx, "<!DOCTYPE html><html>").is_err());
        assert!(ensure_not_html(Table::Fx, "month,currency,rate_to_usd\n").is_ok());
    }
}
