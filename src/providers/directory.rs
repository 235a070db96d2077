use crate::core::source::{Table, TableSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<dir>/<table>.csv` from the local filesystem.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl TableSource for DirectorySource {
    async fn fetch_table(&self, table: Table) -> Result<String> {
        let path = self.dir.join(table.file_name());
        debug!("Reading {} from {}", table, path.display());
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {} table: {}", table, path.display()))
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_table_file() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("cash.csv"), "month,cash_usd\n2025-01,10\n")?;

        let source = DirectorySource::new(dir.path());
        let body = source.fetch_table(Table::Cash).await?;
        assert!(body.starts_with("month,cash_usd"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_names_table() -> Result<()> {
        let dir = TempDir::new()?;
        let source = DirectorySource::new(dir.path());

        let err = source.fetch_table(Table::Fx).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read fx table"));
        Ok(())
    }
}
