//! Dry-run loads driven through the same entry point as `bulkseed load`.

use bulkseed::load::run_load;
use bulkseed::LoadArgs;
use std::io::Write;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const BLOG_SCHEMA: &str = r#"
version: 1
tables:
  - name: authors
    primary_key: id
    columns:
      - { name: id, type: uuid }
      - { name: name, type: text }
  - name: posts
    primary_key: id
    columns:
      - { name: id, type: uuid }
      - { name: author_id, type: uuid }
      - { name: score, type: integer }
      - { name: published_at, type: timestamp }
    foreign_keys:
      - { column: author_id, references: authors }
"#;

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dry_run_with_config_file_writes_report() {
    let dir = TempDir::new().unwrap();
    let schema = write_file(&dir, "blog.yaml", BLOG_SCHEMA);
    let config = write_file(
        &dir,
        "bulkseed.toml",
        &format!(
            "[load]\nschema = {:?}\ntarget_count = 120\nbatch_size = 25\nseed = 7\n",
            schema.display().to_string()
        ),
    );
    let report_path = dir.path().join("report.json");

    let args = LoadArgs {
        dry_run: true,
        report_json: Some(report_path.clone()),
        ..LoadArgs::default()
    };
    let report = run_load(args, Some(&config), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.passed());
    assert_eq!(report.total_inserted, 240);
    assert_eq!(report.seed, Some(7));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    let tables = json["tables"].as_array().unwrap();
    assert_eq!(tables[0]["table"], "authors");
    assert_eq!(tables[1]["table"], "posts");
    assert_eq!(tables[1]["inserted_this_run"], 120);
    assert_eq!(tables[1]["status"], "completed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_flag_overrides_config_target() {
    let dir = TempDir::new().unwrap();
    let schema = write_file(&dir, "blog.yaml", BLOG_SCHEMA);
    let config = write_file(&dir, "bulkseed.toml", "[load]\ntarget_count = 500\n");

    let args = LoadArgs {
        schema: Some(schema),
        target_count: Some(10),
        tables: vec!["authors".to_string()],
        dry_run: true,
        ..LoadArgs::default()
    };
    let report = run_load(args, Some(&config), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].inserted_this_run, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "bulkseed.toml", "[load]\nstrategy = \"turbo\"\n");

    let args = LoadArgs {
        dry_run: true,
        ..LoadArgs::default()
    };
    let err = run_load(args, Some(&config), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Invalid config file"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_builtin_schema_dry_run() {
    let args = LoadArgs {
        target_count: Some(30),
        batch_size: Some(10),
        seed: Some(3),
        dry_run: true,
        ..LoadArgs::default()
    };
    let report = run_load(args, None, CancellationToken::new()).await.unwrap();

    assert!(report.passed(), "{}", report.summary());
    assert_eq!(report.tables.len(), 12);
    assert_eq!(report.total_inserted, 12 * 30);
}
