//! Table source abstractions

use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Actuals,
    Budget,
    Cash,
    Fx,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Actuals, Table::Budget, Table::Cash, Table::Fx];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Actuals => "actuals",
            Table::Budget => "budget",
            Table::Cash => "cash",
            Table::Fx => "fx",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Supplies the raw CSV text of each table.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch_table(&self, table: Table) -> Result<String>;

    /// Stable identifier of the source, used as the loader cache key.
    fn location(&self) -> String;
}

#[async_trait]
impl<T: TableSource + ?Sized> TableSource for Box<T> {
    async fn fetch_table(&self, table: Table) -> Result<String> {
        (**self).fetch_table(table).await
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
