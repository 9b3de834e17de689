use sqlfs::config::SqlfsConfig;
use sqlfs::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

#[test]
fn ls_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = CliContext::new(temp.path().join("cli.db"), &SqlfsConfig::default()).unwrap();
    cli.execute(&Commands::Mkdir {
        path: "/photos".into(),
        parents: false,
    })
    .unwrap();

    let output = cli
        .execute(&Commands::Ls {
            path: "/".into(),
            format: "json".into(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let entry = &parsed.as_array().unwrap()[0];
    for field in ["id", "kind", "name", "created", "modified", "size", "parent", "children"] {
        assert!(entry.get(field).is_some(), "missing {field}");
    }
    assert_eq!(entry["kind"], "Directory");
}

#[test]
fn info_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let cli = CliContext::new(temp.path().join("cli.db"), &SqlfsConfig::default()).unwrap();
    let output = cli
        .execute(&Commands::Info {
            format: "json".into(),
        })
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    for field in ["path", "version", "createTimeUtc", "fsLabel", "IDSize", "nodes", "payloads"] {
        assert!(parsed.get(field).is_some(), "missing {field}");
    }
    assert!(parsed["nodes"].as_u64().is_some());
}
