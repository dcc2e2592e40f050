// End-to-end tests for the `rateio` binary.
// Run with: cargo test -p rateio-cli --test run_tests
//
// The benefits workbook is assembled from the engine's CSV fixtures; the
// auxiliary tables are read straight from those fixtures.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rust_xlsxwriter::Workbook as XlsxWorkbook;
use tempfile::TempDir;

fn rateio() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rateio"))
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures")
}

/// Write an .xlsx with one sheet per fixture CSV, skipping `skip`.
fn write_benefits_workbook(path: &Path, skip: &[&str]) {
    let mut wb = XlsxWorkbook::new();
    for name in ["UNIMED", "CLIN", "VA", "SV"] {
        if skip.contains(&name) {
            continue;
        }
        let csv = std::fs::read_to_string(fixtures_dir().join(format!("benefits/{name}.csv"))).unwrap();
        let ws = wb.add_worksheet();
        ws.set_name(name).unwrap();
        for (r, line) in csv.lines().filter(|l| !l.is_empty()).enumerate() {
            for (c, value) in line.split(',').enumerate() {
                if !value.is_empty() {
                    ws.write_string(r as u32, c as u16, value).unwrap();
                }
            }
        }
    }
    wb.save(path).unwrap();
}

/// Run directory with a benefits workbook and a run file pointing at it.
fn setup(skip: &[&str], extra: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    write_benefits_workbook(&dir.path().join("beneficios.xlsx"), skip);

    let tables = fixtures_dir().join("tables");
    let run_file = dir.path().join("marco.rateio.toml");
    std::fs::write(
        &run_file,
        format!(
            r#"
name = "Março"
month = "03"
year = 2025

[files]
benefits = "beneficios.xlsx"
budget = '{}'
ledger = '{}'
roster = '{}'
{extra}
"#,
            tables.join("budget.csv").display(),
            tables.join("ledger.csv").display(),
            tables.join("roster.csv").display(),
        ),
    )
    .unwrap();
    (dir, run_file)
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}); stderr:\n{}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[test]
fn run_prints_reconciled_json() {
    let (_dir, run_file) = setup(&[], "");
    let output = rateio().arg("run").arg(&run_file).arg("--json").output().unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["outcome"], "reconciled");
    assert_eq!(json["meta"]["period"], "202503");
    assert_eq!(json["records"].as_array().unwrap().len(), 4);
    assert_eq!(json["records"][0]["name"], "Ana Souza");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("run 'Março' (202503): 4 people"), "{stderr}");
}

#[test]
fn run_writes_output_file() {
    let (dir, run_file) = setup(&[], "");
    let out = dir.path().join("result.json");
    let output = rateio()
        .arg("run")
        .arg(&run_file)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["outcome"], "reconciled");
}

#[test]
fn missing_sheet_exits_with_diagnostic() {
    let (_dir, run_file) = setup(&["CLIN"], "");
    let output = rateio().arg("run").arg(&run_file).arg("--json").output().unwrap();

    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["outcome"], "diagnostic");
    assert_eq!(json["missing"][0], "CLIN");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected sheets not found: CLIN"), "{stderr}");
    assert!(stderr.contains("error: benefits workbook could not be reconciled"));
}

#[test]
fn month_flag_overrides_run_file() {
    let (_dir, run_file) = setup(&[], "");
    let output = rateio()
        .args(["run", "--month", "02", "--json"])
        .arg(&run_file)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["meta"]["period"], "202502");
    let ana = &json["records"][0];
    assert_eq!(ana["key"], "11111111111");
    assert_eq!(ana["budgeted"]["va"], 999.0);
}

#[test]
fn validate_reports_missing_inputs() {
    let (dir, run_file) = setup(&[], "");
    std::fs::remove_file(dir.path().join("beneficios.xlsx")).unwrap();

    let output = rateio().arg("validate").arg(&run_file).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("benefits:"), "{stderr}");
}

#[test]
fn validate_rejects_bad_run_file() {
    let (_dir, run_file) = setup(&[], "unknown_key = 1");
    let output = rateio().arg("validate").arg(&run_file).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn validate_accepts_good_run_file() {
    let (_dir, run_file) = setup(&[], "");
    let output = rateio().arg("validate").arg(&run_file).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("valid: run 'Março' for 202503 with 4 input(s)"), "{stderr}");
}

#[test]
fn categories_view() {
    let (_dir, run_file) = setup(&[], "");
    let output = rateio()
        .arg("view")
        .arg(&run_file)
        .args(["categories", "--branch", "31", "--benefit", "va"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["view"], "categories");
    assert_eq!(json["data"]["terminated"][0]["key"], "22222222222");
    assert_eq!(json["data"]["new_hires"][0]["key"], "33333333333");
    assert_eq!(json["data"]["transfers"][0]["category"], "transfer_in");
}

#[test]
fn ledger_view_lists_every_benefit() {
    let (_dir, run_file) = setup(&[], "");
    let output = rateio().arg("view").arg(&run_file).arg("ledger").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["data"].as_array().unwrap().len(), 4);
}

#[test]
fn no_subcommand_prints_usage() {
    let output = rateio().output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: rateio"));
}
