// salesflow/src/commands/inspect.rs
//
// USE CASE: Inspect a table (schema + sample rows).

use std::path::PathBuf;

use salesflow_core::ports::connector::{Connector, quote_ident};

use super::{load_config, new_table, open_database};

pub async fn execute(project_dir: PathBuf, table: Option<String>, limit: usize) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let connector = open_database(&project_dir, &config)?;
    let table = table.unwrap_or_else(|| config.database.target_table.clone());

    if !connector.table_exists(&table).await? {
        anyhow::bail!(
            "❌ Table '{}' not found\n👉 Have you run 'salesflow run'?",
            table
        );
    }

    println!("\n🔍 Inspecting Table: '{}'", table);

    let columns = connector.fetch_columns(&table).await?;
    let mut schema = new_table(vec!["Column", "Type", "Nullable"]);
    for column in &columns {
        schema.add_row(vec![
            column.name.clone(),
            column.data_type.clone(),
            if column.is_nullable { "yes" } else { "no" }.to_string(),
        ]);
    }
    println!("{schema}");

    let total = connector
        .query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(&table)))
        .await?;
    println!("   --- Rows ({} of {}) ---", limit.min(usize::try_from(total).unwrap_or(0)), total);

    let select: Vec<String> = columns
        .iter()
        .map(|c| format!("CAST({} AS VARCHAR)", quote_ident(&c.name)))
        .collect();
    let rows = connector
        .query_rows(&format!(
            "SELECT {} FROM {} LIMIT {}",
            select.join(", "),
            quote_ident(&table),
            limit
        ))
        .await?;

    let mut sample = new_table(columns.iter().map(|c| c.name.as_str()).collect());
    for row in rows {
        sample.add_row(
            row.into_iter()
                .map(|v| v.unwrap_or_else(|| "NULL".to_string()))
                .collect::<Vec<_>>(),
        );
    }
    println!("{sample}");

    Ok(())
}
