use addb2db::commands::{execute_check, parse_pid, validate_args, CheckArgs, IngestArgs};
use addb2db::parser::Table;
use addb2db::utils::error::ConfigError;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_parse_pid_from_paths() {
    assert_eq!(parse_pid("/var/log/motr/m0trace_4242.txt").unwrap(), 4242);
    assert_eq!(parse_pid("addb_dump_a0.txt").unwrap(), 160);
    assert!(matches!(
        parse_pid("notes.txt"),
        Err(ConfigError::InvalidPid(_))
    ));
}

#[test]
fn test_check_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("trace_42.txt");
    fs::write(
        &dump,
        "* 2020-11-10-10:50:37.794688309 tx-state id: 5, --> COMMITTED\n\
         * 2019-08-29-12:16:54.279414683 client-to-dix client_id: 1, dix_id: 2\n\
         * 2019-08-29-12:16:54.279414683 client-to-dix client_id: 3, dix_id: 4\n",
    )
    .unwrap();

    let summary = execute_check(&CheckArgs {
        dumps: vec![dump],
        block_lines: 2,
        json: false,
    })
    .unwrap();

    assert_eq!(summary.lines, 3);
    assert_eq!(summary.rows.get(Table::Request), 1);
    assert_eq!(summary.rows.get(Table::Relation), 2);
    assert_eq!(summary.hits.get("client-to-dix"), Some(&2));
    assert_eq!(summary.hits.get("tx-state"), Some(&1));

    let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_validate_args_accepts_existing_dumps() {
    let dir = TempDir::new().unwrap();
    let dump = dir.path().join("trace_1.txt");
    fs::write(&dump, "").unwrap();

    let args = IngestArgs {
        dumps: vec![dump],
        db: dir.path().join("out.db"),
        ..Default::default()
    };
    assert!(validate_args(&args).is_ok());

    let args = IngestArgs {
        db: PathBuf::new(),
        ..Default::default()
    };
    assert!(validate_args(&args).is_err());
}
