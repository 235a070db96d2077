//! Conversion of source-currency rows into USD

use crate::core::model::{CashRow, FxRate, LedgerRow, Normalized};
use std::collections::HashMap;
use tracing::debug;

/// Factor applied when no rate exists for a `(month, currency)` pair.
pub const MISSING_RATE_FACTOR: f64 = 1.0;

/// Month-specific `rate_to_usd` lookup.
///
/// When the source holds several rates for the same `(month, currency)` key, the one
/// inserted last wins.
#[derive(Debug, Clone, Default)]
pub struct FxTable {
    rates: HashMap<(String, String), f64>,
}

impl FxTable {
    pub fn new(rates: &[FxRate]) -> Self {
        let mut table = FxTable::default();
        for rate in rates {
            table.insert(rate);
        }
        table
    }

    pub fn insert(&mut self, rate: &FxRate) {
        let key = (rate.month.clone(), rate.currency.clone());
        if let Some(previous) = self.rates.insert(key, rate.rate_to_usd) {
            debug!(
                "Duplicate fx rate for {} {}: {} replaced by {}",
                rate.month, rate.currency, previous, rate.rate_to_usd
            );
        }
    }

    pub fn get(&self, month: &str, currency: &str) -> Option<f64> {
        self.rates
            .get(&(month.to_string(), currency.to_string()))
            .copied()
    }

    /// Conversion factor for a pair, defaulting to 1.0 so the amount is treated as USD.
    pub fn factor(&self, month: &str, currency: &str) -> f64 {
        self.get(month, currency).unwrap_or(MISSING_RATE_FACTOR)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// A row whose value can be expressed in USD.
pub trait UsdAmount {
    fn to_usd(&self, fx: &FxTable) -> f64;
}

impl UsdAmount for LedgerRow {
    fn to_usd(&self, fx: &FxTable) -> f64 {
        self.amount * fx.factor(&self.month, &self.currency)
    }
}

impl UsdAmount for CashRow {
    fn to_usd(&self, _fx: &FxTable) -> f64 {
        self.cash_usd
    }
}

/// Attaches a USD value to every row. Missing rates never fail.
pub fn normalize<'a, R: UsdAmount>(rows: &'a [R], fx: &FxTable) -> Vec<Normalized<'a, R>> {
    rows.iter()
        .map(|row| Normalized {
            row,
            usd: row.to_usd(fx),
        })
        .collect()
}
