// salesflow/src/commands/run.rs
//
// USE CASE: Run the whole pipeline.

use std::path::PathBuf;

use salesflow_core::application::pipeline::RUN_RESULTS_FILE;
use salesflow_core::application::{RunResult, run_pipeline};

use super::{load_config, new_table, open_database, report::print_report};

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    let config = load_config(&project_dir)?;
    let connector = open_database(&project_dir, &config)?;

    println!("🚀 Running extract → transform → load → report");
    let run = run_pipeline(&project_dir, &config, &connector).await?;

    print_stages(&run);
    if let Some(report) = &run.report {
        print_report(report);
    }
    println!(
        "\n✨ SUCCESS! Pipeline finished in {:.2?} ({})",
        start.elapsed(),
        config.output_dir(&project_dir).join(RUN_RESULTS_FILE).display()
    );
    Ok(())
}

fn print_stages(run: &RunResult) {
    let mut table = new_table(vec!["Stage", "Status", "Rows"]);
    for stage in &run.stages {
        table.add_row(vec![
            stage.stage.to_string(),
            format!("{:?}", stage.status),
            stage.rows.map(|r| r.to_string()).unwrap_or_default(),
        ]);
    }
    println!("{table}");
}
