use assert_cmd::cargo::{self};
use predicates::str::contains;

#[test]
fn prints_help() {
    let mut cmd = cargo::cargo_bin_cmd!("docgen");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("docgen"));
}

#[test]
fn lists_builtin_templates() {
    let mut cmd = cargo::cargo_bin_cmd!("docgen");
    cmd.arg("templates")
        .assert()
        .success()
        .stdout(contains("Lettera Militare"))
        .stdout(contains("Contratto di Lavoro"));
}

#[test]
fn import_rejects_missing_required_keys() {
    let mut cmd = cargo::cargo_bin_cmd!("docgen");
    cmd.args(["import", "lettera militare", "-"])
        .write_stdin("{\"oggetto\":\"test\"}")
        .assert()
        .failure()
        .stderr(contains("pdc"));
}

#[test]
fn preview_renders_set_values() {
    let mut cmd = cargo::cargo_bin_cmd!("docgen");
    cmd.args([
        "preview",
        "Richiesta Ferie",
        "--set",
        "dipendente.nome=Mario",
    ])
    .assert()
    .success()
    .stdout(contains("Mario"));
}

#[test]
fn package_writes_one_artifact_per_template() {
    let out = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo::cargo_bin_cmd!("docgen");
    cmd.args(["--delay-ms", "0", "package", "Richiesta Ferie", "Contratto di Lavoro", "-o"])
        .arg(out.path())
        .args(["--set", "dipendente.nome=Mario"])
        .assert()
        .success()
        .stdout(contains("Richiesta_Ferie_"))
        .stdout(contains("Contratto_di_Lavoro_"));
    let written = std::fs::read_dir(out.path()).expect("read dir").count();
    assert_eq!(written, 2);
}
