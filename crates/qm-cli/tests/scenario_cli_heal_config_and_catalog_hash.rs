use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

#[test]
fn cli_heal_config_check_fails_then_heal_writes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let custom = dir.path().join("custom_data.ini");
    fs::write(&custom, "[quotas]\nSteelPlate=50\n\n[lcd]\nname=Quota LCD\n")?;

    Command::cargo_bin("qm")?
        .args(["heal-config", "--custom-data", custom.to_str().unwrap(), "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_INCOMPLETE"))
        .stderr(predicate::str::contains("general.should_run"));

    Command::cargo_bin("qm")?
        .args(["heal-config", "--custom-data", custom.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("added=general.should_run"))
        .stdout(predicate::str::contains("custom_data_healed=true"));

    let healed = fs::read_to_string(&custom)?;
    assert!(healed.contains("should_run=false"));
    assert!(healed.contains("SteelPlate=50"), "existing quota kept");
    assert!(healed.contains("[lcd]\nname=Quota LCD\n"), "foreign section kept");

    Command::cargo_bin("qm")?
        .args(["heal-config", "--custom-data", custom.to_str().unwrap(), "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom_data_ok=true"));
    Ok(())
}

#[test]
fn cli_heal_config_refuses_malformed_blob() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let custom = dir.path().join("custom_data.ini");
    fs::write(&custom, "[general\n")?;

    Command::cargo_bin("qm")?
        .args(["heal-config", "--custom-data", custom.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_INVALID"));

    assert_eq!(fs::read_to_string(&custom)?, "[general\n");
    Ok(())
}

#[test]
fn cli_catalog_hash_is_stable() -> anyhow::Result<()> {
    let first = Command::cargo_bin("qm")?.args(["catalog-hash"]).output()?;
    let second = Command::cargo_bin("qm")?.args(["catalog-hash"]).output()?;
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let text = String::from_utf8(first.stdout)?;
    let hash_line = text.lines().next().unwrap_or_default();
    assert!(hash_line.starts_with("config_hash="));
    assert_eq!(hash_line.len(), "config_hash=".len() + 64);
    assert!(text.contains("\"SteelPlate\""));
    Ok(())
}

#[test]
fn cli_rejects_catalog_with_duplicate_subtypes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = dir.path().join("catalog.yaml");
    let custom = dir.path().join("custom_data.ini");
    fs::write(
        &catalog,
        "items:\n  - { category: A, subtype: Plate }\n  - { category: B, subtype: Plate }\n",
    )?;

    Command::cargo_bin("qm")?
        .args([
            "heal-config",
            "--custom-data",
            custom.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate subtype 'Plate'"));
    Ok(())
}
