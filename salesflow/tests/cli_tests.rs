use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A throwaway project directory with its own `salesflow.yaml`.
struct SalesflowTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl SalesflowTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("project");
        fs::create_dir_all(&root)?;
        fs::write(
            root.join("salesflow.yaml"),
            "name: cli_test\noutput_path: out\nload:\n  mode: replace\n",
        )?;
        Ok(Self { _tmp: tmp, root })
    }

    fn salesflow(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("salesflow"));
        cmd.current_dir(&self.root)
            .env_remove("SALESFLOW_DB_PATH")
            .env_remove("SALESFLOW_OUTPUT_PATH")
            .env_remove("SALESFLOW_SOURCE_TABLE")
            .env_remove("SALESFLOW_TARGET_TABLE")
            .env("RUST_LOG", "warn");
        cmd
    }

    fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    fn out(&self, name: &str) -> PathBuf {
        self.root.join("out").join(name)
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

#[test]
fn test_transform_file_to_file() -> Result<()> {
    let env = SalesflowTestEnv::new()?;
    let input = env.write(
        "sales.csv",
        "sale_id,sale_date,product_name,category,region,quantity,unit_price,discount
1,2023-05-01,Widget,Tools,North,2,10.00,0
2,2023-05-01,widget ,tools,north,3,10.00,
3,2023-05-02,Gadget,Toys,South,1,20.00,0.10
3,2023-05-02,Gadget,Toys,South,1,20.00,0.10
",
    )?;

    env.salesflow()
        .args(["transform", "--input"])
        .arg(&input)
        .args(["--output", "agg/result.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("groups"));

    insta::assert_snapshot!(read(&env.root.join("agg/result.csv"))?, @r"
    sale_date,product_name,category,region,total_quantity,avg_unit_price,avg_discount,transaction_count,total_gross_revenue,total_net_revenue
    2023-05-01,Widget,Tools,North,5,10.00,0.0000,2,50.00,50.00
    2023-05-02,Gadget,Toys,South,1,20.00,0.1000,1,20.00,18.00
    ");

    let summary: serde_json::Value =
        serde_json::from_str(&read(&env.root.join("agg/transform_summary.json"))?)?;
    assert_eq!(summary["records_in"], 4);
    assert_eq!(summary["records_after_dedup"], 3);
    assert_eq!(summary["groups_out"], 2);
    assert!(env.root.join("agg/transformed_data_full.csv").exists());
    Ok(())
}

#[test]
fn test_transform_empty_result_exits_with_2() -> Result<()> {
    let env = SalesflowTestEnv::new()?;
    let input = env.write(
        "sales.csv",
        "sale_date,product_name,category,region,quantity,unit_price\n2023-05-01,Widget,Tools,North,-1,10.00\n",
    )?;

    env.salesflow()
        .args(["transform", "--input"])
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("EMPTY RESULT"));

    assert_eq!(read(&env.out("transformed_data.csv"))?.lines().count(), 1);
    let summary: serde_json::Value = serde_json::from_str(&read(&env.out("transform_summary.json"))?)?;
    assert_eq!(summary["status"], "empty_result");
    Ok(())
}

#[test]
fn test_transform_missing_column_fails_without_output() -> Result<()> {
    let env = SalesflowTestEnv::new()?;
    let input = env.write(
        "sales.csv",
        "sale_date,product_name,category,region,quantity\n2023-05-01,Widget,Tools,North,1\n",
    )?;

    env.salesflow()
        .args(["transform", "--input"])
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unit_price"));

    assert!(!env.out("transformed_data.csv").exists());
    Ok(())
}

#[test]
fn test_seed_then_run_then_report() -> Result<()> {
    let env = SalesflowTestEnv::new()?;

    env.salesflow()
        .args(["seed", "--count", "300", "--seed", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 'sales_data'"));

    env.salesflow()
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    for artifact in [
        "extracted_data.csv",
        "transformed_data.csv",
        "transformed_data_full.csv",
        "transform_summary.json",
        "run_results.json",
    ] {
        assert!(env.out(artifact).exists(), "missing {artifact}");
    }
    assert!(env.root.join("data/database.duckdb").exists());

    let run: serde_json::Value = serde_json::from_str(&read(&env.out("run_results.json"))?)?;
    assert_eq!(run["success"], true);
    assert_eq!(run["stages"].as_array().map(Vec::len), Some(4));

    env.salesflow()
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Top products"))
        .stdout(predicate::str::contains("Top regions"));

    env.salesflow()
        .args(["inspect", "--limit", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total_net_revenue"));
    Ok(())
}

#[test]
fn test_load_fail_mode_refuses_existing_table() -> Result<()> {
    let env = SalesflowTestEnv::new()?;
    env.salesflow().args(["seed", "--count", "100"]).assert().success();
    env.salesflow().arg("extract").assert().success();
    env.salesflow().arg("transform").assert().success();
    env.salesflow().arg("load").assert().success();

    env.salesflow()
        .args(["load", "--mode", "fail"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    env.salesflow()
        .args(["load", "--mode", "append"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode: append"));
    Ok(())
}

#[test]
fn test_run_without_source_table_fails() -> Result<()> {
    let env = SalesflowTestEnv::new()?;
    env.salesflow()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));

    let run: serde_json::Value = serde_json::from_str(&read(&env.out("run_results.json"))?)?;
    assert_eq!(run["success"], false);
    assert_eq!(run["stages"][1]["status"], "skipped");
    Ok(())
}
