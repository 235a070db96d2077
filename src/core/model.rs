//! Row types shared by ingestion and the metrics engine

use serde::{Deserialize, Serialize};

pub const REVENUE_ACCOUNT: &str = "Revenue";
pub const COGS_ACCOUNT: &str = "COGS";
pub const OPEX_PREFIX: &str = "Opex:";

/// One actual or budgeted ledger line in its source currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub month: String,
    pub entity: String,
    pub account_category: String,
    pub currency: String,
    pub amount: f64,
}

impl LedgerRow {
    pub fn new(
        month: &str,
        entity: &str,
        account_category: &str,
        currency: &str,
        amount: f64,
    ) -> Self {
        Self {
            month: normalize_month(month),
            entity: entity.to_string(),
            account_category: account_category.to_string(),
            currency: currency.to_string(),
            amount,
        }
    }

    pub fn is_revenue(&self) -> bool {
        self.account_category == REVENUE_ACCOUNT
    }

    pub fn is_opex(&self) -> bool {
        is_opex_category(&self.account_category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub month: String,
    pub currency: String,
    pub rate_to_usd: f64,
}

impl FxRate {
    pub fn new(month: &str, currency: &str, rate_to_usd: f64) -> Self {
        Self {
            month: normalize_month(month),
            currency: currency.to_string(),
            rate_to_usd,
        }
    }
}

/// Month-end cash balance, already in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRow {
    pub month: String,
    pub cash_usd: f64,
}

impl CashRow {
    pub fn new(month: &str, cash_usd: f64) -> Self {
        Self {
            month: normalize_month(month),
            cash_usd,
        }
    }
}

/// A row carrying its reporting-currency value alongside the source row.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<'a, R> {
    pub row: &'a R,
    pub usd: f64,
}

/// The four tables every metric is computed from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub actuals: Vec<LedgerRow>,
    pub budget: Vec<LedgerRow>,
    pub cash: Vec<CashRow>,
    pub fx: Vec<FxRate>,
}

impl Dataset {
    /// Latest month present in both actuals and budget.
    pub fn latest_common_month(&self) -> Option<String> {
        let budget_months: std::collections::BTreeSet<&str> =
            self.budget.iter().map(|r| r.month.as_str()).collect();
        self.actuals
            .iter()
            .map(|r| r.month.as_str())
            .filter(|m| budget_months.contains(m))
            .max()
            .map(str::to_string)
    }

    pub fn latest_actuals_month(&self) -> Option<String> {
        self.actuals.iter().map(|r| r.month.clone()).max()
    }
}

pub fn is_opex_category(category: &str) -> bool {
    category.starts_with(OPEX_PREFIX)
}

/// Truncates any date-like string to its `YYYY-MM` prefix.
pub fn normalize_month(raw: &str) -> String {
    raw.trim().chars().take(7).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_month_truncates_dates() {
        assert_eq!(normalize_month("2025-06-30"), "2025-06");
        assert_eq!(normalize_month("2025-06-01 00:00:00"), "2025-06");
        assert_eq!(normalize_month(" 2025-06 "), "2025-06");
        assert_eq!(normalize_month("2025"), "2025");
    }

    #[test]
    fn test_category_predicates() {
        let rev = LedgerRow::new("2025-01", "ParentCo", "Revenue", "USD", 1.0);
        let opex = LedgerRow::new("2025-01", "ParentCo", "Opex:Marketing", "USD", 1.0);
        let other = LedgerRow::new("2025-01", "ParentCo", "revenue", "USD", 1.0);

        assert!(rev.is_revenue());
        assert!(opex.is_opex());
        assert!(!opex.is_revenue());
        assert!(!other.is_revenue());
        assert!(!is_opex_category("opex:Marketing"));
    }

    #[test]
    fn test_latest_common_month() {
        let dataset = Dataset {
            actuals: vec![
                LedgerRow::new("2025-05", "A", "Revenue", "USD", 1.0),
                LedgerRow::new("2025-07", "A", "Revenue", "USD", 1.0),
                LedgerRow::new("2025-06", "A", "Revenue", "USD", 1.0),
            ],
            budget: vec![
                LedgerRow::new("2025-05", "A", "Revenue", "USD", 1.0),
                LedgerRow::new("2025-06", "A", "Revenue", "USD", 1.0),
            ],
            ..Default::default()
        };

        assert_eq!(dataset.latest_common_month().as_deref(), Some("2025-06"));
        assert_eq!(dataset.latest_actuals_month().as_deref(), Some("2025-07"));
        assert_eq!(Dataset::default().latest_common_month(), None);
    }
}
