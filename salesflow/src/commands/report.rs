// salesflow/src/commands/report.rs
//
// USE CASE: Headline numbers of the target table.

use rust_decimal::Decimal;
use std::path::PathBuf;

use salesflow_core::application::{RankedTotal, Report, report};

use super::{load_config, new_table, open_database};

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let connector = open_database(&project_dir, &config)?;

    let summary = report(&connector, &config.database.target_table).await?;
    print_report(&summary);
    Ok(())
}

pub(crate) fn print_report(report: &Report) {
    println!("\n📊 Report: {}", report.table);
    println!("   Rows: {}", report.rows);
    println!("   Gross revenue: {}", report.total_gross_revenue);
    println!("   Net revenue: {}", report.total_net_revenue);
    if let (Some(min), Some(max)) = (&report.min_date, &report.max_date) {
        println!("   Date range: {} → {}", min, max);
    }

    println!("\nTop products");
    println!("{}", ranking(&report.top_products, report.total_net_revenue));
    println!("Top regions");
    println!("{}", ranking(&report.top_regions, report.total_net_revenue));
}

fn ranking(entries: &[RankedTotal], total: Decimal) -> comfy_table::Table {
    let mut table = new_table(vec!["#", "Name", "Net revenue", "Share"]);
    for (i, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            entry.name.clone(),
            entry.net_revenue.to_string(),
            share(entry.net_revenue, total),
        ]);
    }
    table
}

fn share(part: Decimal, total: Decimal) -> String {
    if total.is_zero() {
        return "-".to_string();
    }
    format!("{:.1}%", (part * Decimal::ONE_HUNDRED / total).round_dp(1))
}
