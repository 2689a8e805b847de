// salesflow-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::SalesflowError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{ColumnSchema, Connector, TextRow, quote_ident};

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    /// Opens (or creates) a database file. `":memory:"` gives a private in-memory database.
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SalesflowError> {
        self.conn.lock().map_err(|_| {
            SalesflowError::Infrastructure(InfrastructureError::Database(DatabaseError::Poisoned))
        })
    }
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<(), SalesflowError> {
        let conn = self.lock()?;
        debug!(sql = query, "execute");
        conn.execute_batch(query)?;
        Ok(())
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, SalesflowError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "PRAGMA table_info('{}')",
            table_name.replace('\'', "''")
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(ColumnSchema {
                name: row.get("name")?,
                data_type: row.get("type")?,
                is_nullable: !row.get::<_, bool>("notnull")?,
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }

        Ok(columns)
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool, SalesflowError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            [table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn query_rows(&self, query: &str) -> Result<Vec<TextRow>, SalesflowError> {
        let conn = self.lock()?;
        debug!(sql = query, "query_rows");
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;
        let width = rows.as_ref().map(|s| s.column_count()).unwrap_or(0);

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Option<String>>(i)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    async fn query_scalar(&self, query: &str) -> Result<i64, SalesflowError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;

        let row = rows
            .next()?
            .ok_or_else(|| SalesflowError::InternalError("No scalar value returned".into()))?;

        let value: i64 = row.get(0)?;
        Ok(value)
    }

    async fn insert_rows(
        &self,
        table_name: &str,
        columns: &[ColumnSchema],
        rows: &[TextRow],
    ) -> Result<usize, SalesflowError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
        let placeholders: Vec<String> = columns
            .iter()
            .map(|c| format!("CAST(? AS {})", c.data_type))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table_name),
            names.join(", "),
            placeholders.join(", ")
        );

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                if row.len() != columns.len() {
                    return Err(SalesflowError::InternalError(format!(
                        "Row has {} values, table '{}' expects {}",
                        row.len(),
                        table_name,
                        columns.len()
                    )));
                }
                inserted += stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        debug!(table = table_name, inserted, "insert_rows");
        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn test_duckdb_flow() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;

        connector
            .execute("CREATE TABLE sales (id INTEGER, product VARCHAR)")
            .await?;

        let columns = connector.fetch_columns("sales").await?;
        assert_eq!(columns.len(), 2);

        let product_col = columns
            .iter()
            .find(|c| c.name == "product")
            .ok_or_else(|| anyhow::anyhow!("Column 'product' not found"))?;
        assert_eq!(product_col.data_type, "VARCHAR");

        let id_col = columns
            .iter()
            .find(|c| c.name == "id")
            .ok_or_else(|| anyhow::anyhow!("Column 'id' not found"))?;
        assert_eq!(id_col.data_type, "INTEGER");
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_and_read_back_as_text() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        connector
            .execute("CREATE TABLE t (d DATE, q INTEGER, p DECIMAL(18,2))")
            .await?;

        let columns = vec![
            ColumnSchema::new("d", "DATE"),
            ColumnSchema::new("q", "INTEGER"),
            ColumnSchema::new("p", "DECIMAL(18,2)"),
        ];
        let rows = vec![
            vec![Some("2023-05-01".into()), Some("2".into()), Some("10.5".into())],
            vec![Some("2023-05-02".into()), None, Some("3".into())],
        ];
        assert_eq!(connector.insert_rows("t", &columns, &rows).await?, 2);

        let back = connector
            .query_rows("SELECT CAST(d AS VARCHAR), CAST(q AS VARCHAR), CAST(p AS VARCHAR) FROM t ORDER BY d")
            .await?;
        assert_eq!(
            back,
            vec![
                vec![Some("2023-05-01".into()), Some("2".into()), Some("10.50".into())],
                vec![Some("2023-05-02".into()), None, Some("3.00".into())],
            ]
        );
        assert_eq!(connector.query_scalar("SELECT COUNT(*) FROM t").await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_table_exists() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        assert!(!connector.table_exists("missing").await?);
        connector.execute("CREATE TABLE present (x INTEGER)").await?;
        assert!(connector.table_exists("present").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_error() -> Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let result = connector.execute("SELECT * FROM non_existent_table").await;
        assert!(result.is_err());
        Ok(())
    }
}
