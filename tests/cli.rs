use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with HOME pointed at a scratch directory so saved settings never leak in.
fn tablero(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tablero").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn template_prints_header() {
    let home = TempDir::new().unwrap();
    tablero(&home)
        .arg("template")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Fecha,Categoria,Ingresos,Egresos\n"))
        .stdout(predicate::str::contains("2024-01-01,Ventas,5000,3000"));
}

#[test]
fn json_report_is_a_dashboard() {
    let home = TempDir::new().unwrap();
    let output = tablero(&home)
        .args(["report", "--format", "json", "--seed", "1", "--months", "6"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["rendered"]["state"], "dashboard");
    assert_eq!(value["summary"]["count"], 24);
    assert_eq!(value["palette"]["background"], "#ffffff");
}

#[test]
fn json_report_is_reproducible_with_seed() {
    let home = TempDir::new().unwrap();
    let run = || {
        tablero(&home)
            .args(["report", "--format", "json", "--seed", "7"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn filters_to_empty_state() {
    let home = TempDir::new().unwrap();
    tablero(&home)
        .args(["report", "--format", "json", "--seed", "1", "--min-income", "50000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"empty\""));
}

#[test]
fn html_report_to_file() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("report.html");
    tablero(&home)
        .args(["report", "--format", "html", "--seed", "3", "--theme", "Oscuro", "--output"])
        .arg(&out)
        .assert()
        .success();
    let html = std::fs::read_to_string(out).unwrap();
    assert!(html.contains("<svg"));
    assert!(html.contains("#111111"));
}

#[test]
fn export_writes_filtered_csv() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("filtered.csv");
    tablero(&home)
        .args(["export", "--seed", "2", "--region", "North", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let csv = std::fs::read_to_string(out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Fecha,Categoria,Departamento,Region,Ingresos,Egresos"
    );
    assert!(lines.all(|l| l.contains(",North,")));
}

#[test]
fn export_default_name_lands_in_export_dir() {
    let home = TempDir::new().unwrap();
    tablero(&home)
        .args(["export", "--seed", "2"])
        .assert()
        .success();
    let downloads = home.path().join("Downloads");
    let names: Vec<String> = std::fs::read_dir(downloads)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("datos_filtrados_"));
}

#[test]
fn upload_report_uses_file() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("datos.csv");
    std::fs::write(
        &file,
        "Fecha,Categoria,Ingresos,Egresos\n2024-01-01,Ventas,5000,3000\n2024-02-01,Servicios,7000,4000\n",
    )
    .unwrap();
    tablero(&home)
        .args(["report", "--file"])
        .arg(&file)
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("datos.csv"))
        .stdout(predicate::str::contains("$12,000"));
}

#[test]
fn unreadable_upload_reports_notice() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("broken.pdf");
    std::fs::write(&file, "%PDF-1.4").unwrap();
    tablero(&home)
        .args(["report", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stderr(predicate::str::contains("Error reading broken.pdf"));
}

#[test]
fn out_of_range_months_fails() {
    let home = TempDir::new().unwrap();
    tablero(&home)
        .args(["report", "--months", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid selection"));
}

#[test]
fn unknown_theme_is_rejected() {
    let home = TempDir::new().unwrap();
    tablero(&home)
        .args(["report", "--theme", "Sepia"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sepia"));
}

#[test]
fn completions_for_bash() {
    let home = TempDir::new().unwrap();
    tablero(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tablero"));
}
