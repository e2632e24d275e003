use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const CATALOG: &str = r#"
blueprints:
  type_id: "MyObjectBuilder_BlueprintDefinition"
  suffix: "Component"
  queue_category: "MyObjectBuilder_Component"
  suffixed: [Computer]
items:
  - { category: "MyObjectBuilder_Component", subtype: "Computer" }
  - { category: "MyObjectBuilder_Component", subtype: "SteelPlate" }
"#;

/// should_run=true: SteelPlate 50 min / 20 on hand / 10 queued -> one
/// request for 20; Computer is covered by its queue and not requested.
#[test]
fn cli_cycle_enabled_appends_requests_jsonl() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = dir.path().join("catalog.yaml");
    let grid = dir.path().join("grid.json");
    let custom = dir.path().join("custom_data.ini");
    let requests = dir.path().join("requests.jsonl");

    fs::write(&catalog, CATALOG)?;
    fs::write(
        &grid,
        r#"{
            "inventories": [
                { "name": "Cargo 1", "items": [
                    { "category": "MyObjectBuilder_Component", "subtype": "SteelPlate", "amount": 20 }
                ] }
            ],
            "assemblers": [
                { "name": "Asm 1", "mode": "assembly", "queue": [
                    { "blueprint": "SteelPlate", "amount": 10 },
                    { "blueprint": "ComputerComponent", "amount": 4 }
                ] },
                { "name": "Asm 2", "mode": "disassembly", "queue": [
                    { "blueprint": "SteelPlate", "amount": 500 }
                ] }
            ]
        }"#,
    )?;
    let blob = "[general]\nshould_run=true\n\n[quotas]\nComputer=4\nSteelPlate=50\n";
    fs::write(&custom, blob)?;

    Command::cargo_bin("qm")?
        .args([
            "cycle",
            "--grid",
            grid.to_str().unwrap(),
            "--custom-data",
            custom.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
            "--requests-out",
            requests.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "SteelPlate: 50 min/20 avai/10 q'd->20 to add",
        ))
        .stdout(predicate::str::contains("Computer:").not())
        .stdout(predicate::str::contains("mode=ENABLED"));

    let sent = fs::read_to_string(&requests)?;
    let lines: Vec<&str> = sent.lines().collect();
    assert_eq!(lines.len(), 1);
    let req: serde_json::Value = serde_json::from_str(lines[0])?;
    assert_eq!(req["quantity"], 20);
    assert_eq!(req["blueprint"]["subtype"], "SteelPlate");

    assert_eq!(fs::read_to_string(&custom)?, blob, "healthy file is not rewritten");
    Ok(())
}

#[test]
fn cli_cycle_json_outcome() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = dir.path().join("catalog.yaml");
    let grid = dir.path().join("grid.json");
    let custom = dir.path().join("custom_data.ini");

    fs::write(&catalog, CATALOG)?;
    fs::write(&grid, "{}")?;
    fs::write(
        &custom,
        "[general]\nshould_run=false\n\n[quotas]\nComputer=-1\nSteelPlate=7\n",
    )?;

    let out = Command::cargo_bin("qm")?
        .args([
            "cycle",
            "--grid",
            grid.to_str().unwrap(),
            "--custom-data",
            custom.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
            "--json",
        ])
        .output()?;
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(v["settings_source"], "loaded");
    assert_eq!(v["report"]["lines"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(v["report"]["lines"][0]["deficit"], 7);
    assert_eq!(v["dispatch"]["mode"], "DRY_RUN");
    assert_eq!(v["dispatch"]["withheld"][0]["quantity"], 7);
    Ok(())
}
