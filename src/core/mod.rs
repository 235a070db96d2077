//! Metrics engine, question classifier and the abstractions around them

pub mod analytics;
pub mod answer;
pub mod cache;
pub mod config;
pub mod currency;
pub mod intent;
pub mod log;
pub mod model;
pub mod source;

// Re-export main types for cleaner imports
pub use answer::{Answer, answer, ask};
pub use cache::{Cache, CachePolicy};
pub use intent::{Intent, IntentKind, parse_intent};
pub use model::{CashRow, Dataset, FxRate, LedgerRow};
pub use source::{Table, TableSource};
