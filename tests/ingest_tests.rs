use addb2db::commands::{execute_ingest, CancelFlag, IngestArgs};
use addb2db::output::read_summary;
use addb2db::parser::Table;
use addb2db::store::{Store, StoreConfig};
use addb2db::utils::error::IngestError;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TX_STATE: &str = "* 2020-11-10-10:50:37.794688309 tx-state id: 5, --> COMMITTED";
const CLIENT_TO_DIX: &str = "* 2019-08-29-12:16:54.279414683 client-to-dix client_id: 1170, dix_id: 1171";

fn write_dump(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(&path, contents).unwrap();
    path
}

fn ingest(dumps: Vec<PathBuf>, db: &Path, append_db: bool) -> addb2db::commands::IngestSummary {
    execute_ingest(IngestArgs {
        dumps,
        db: db.to_path_buf(),
        append_db,
        ..Default::default()
    })
    .unwrap()
}

fn open(db: &Path) -> Store {
    Store::open(db, &StoreConfig::default()).unwrap()
}

#[test]
fn test_two_line_dump_end_to_end() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(dir.path(), "trace_42.txt", &[TX_STATE, CLIENT_TO_DIX]);
    let db = dir.path().join("m0play.db");

    let summary = ingest(vec![dump], &db, false);
    assert_eq!(summary.files, 1);
    assert_eq!(summary.lines, 2);
    assert_eq!(summary.rows.total(), 2);

    let store = open(&db);
    let conn = store.connection();

    let request: (i64, i64, i64, String, String) = conn
        .query_row(
            "SELECT time, pid, id, state, type_id FROM request",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(
        request,
        (
            1_605_005_437_794_688_309,
            42,
            5,
            "COMMITTED".to_string(),
            "be_tx".to_string()
        )
    );

    let relation: (i64, i64, i64, i64, String) = conn
        .query_row(
            "SELECT pid1, mid1, pid2, mid2, type_id FROM relation",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(relation, (42, 1170, 42, 1171, "client_to_dix".to_string()));

    assert_eq!(store.row_count(Table::Attr).unwrap(), 0);
    assert_eq!(store.row_count(Table::S3RequestUid).unwrap(), 0);
}

#[test]
fn test_append_doubles_and_reset_is_stable() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(dir.path(), "trace_7.txt", &[TX_STATE, CLIENT_TO_DIX, TX_STATE]);
    let db = dir.path().join("m0play.db");

    ingest(vec![dump.clone()], &db, false);
    let first = open(&db).row_counts().unwrap();
    assert_eq!(first.request, 2);
    assert_eq!(first.relation, 1);

    ingest(vec![dump.clone()], &db, false);
    assert_eq!(open(&db).row_counts().unwrap(), first);

    ingest(vec![dump], &db, true);
    let doubled = open(&db).row_counts().unwrap();
    assert_eq!(doubled.request, 4);
    assert_eq!(doubled.relation, 2);
}

#[test]
fn test_unknown_and_blank_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(
        dir.path(),
        "trace_1.txt",
        &[
            "",
            "* 2019-11-01-20:27:37.467306782 wail nr: 992 min: 1 max: 4",
            TX_STATE,
            "   ",
            "* 2019-11-01-20:27:37.467306782 stob-io-end",
        ],
    );
    let db = dir.path().join("m0play.db");

    let summary = ingest(vec![dump], &db, false);
    assert_eq!(summary.lines, 5);
    assert_eq!(summary.skipped, 4);
    assert_eq!(open(&db).row_counts().unwrap().total(), 1);
}

#[test]
fn test_pid_follows_each_file() {
    let dir = TempDir::new().unwrap();
    let first = write_dump(dir.path(), "m0trace_10.txt", &[TX_STATE]);
    let second = write_dump(dir.path(), "m0trace_1f.txt", &[TX_STATE]);
    let db = dir.path().join("m0play.db");

    ingest(vec![first, second], &db, false);

    let store = open(&db);
    let mut stmt = store
        .connection()
        .prepare("SELECT pid FROM request ORDER BY rowid")
        .unwrap();
    let pids: Vec<i64> = stmt
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(pids, vec![10, 31]);
}

#[test]
fn test_small_blocks_and_batches() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<&str> = std::iter::repeat(CLIENT_TO_DIX).take(25).collect();
    let dump = write_dump(dir.path(), "trace_3.txt", &lines);
    let db = dir.path().join("m0play.db");

    let summary = execute_ingest(IngestArgs {
        dumps: vec![dump],
        db: db.clone(),
        block_lines: 4,
        batch_rows: 3,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(summary.rows.relation, 25);
    assert_eq!(open(&db).row_count(Table::Relation).unwrap(), 25);
}

#[test]
fn test_malformed_known_record_aborts_run() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(
        dir.path(),
        "trace_5.txt",
        &[TX_STATE, "* 2020-11-10 tx-state id: 5, --> OPEN"],
    );
    let db = dir.path().join("m0play.db");

    let err = execute_ingest(IngestArgs {
        dumps: vec![dump],
        db,
        ..Default::default()
    })
    .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("trace_5.txt"), "{}", message);
    assert!(message.contains("Timestamp too short"), "{}", message);
    assert!(message.contains("line 2"), "{}", message);
}

#[test]
fn test_malformed_record_line_counts_across_blocks() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(
        dir.path(),
        "trace_5.txt",
        &[
            TX_STATE,
            CLIENT_TO_DIX,
            "",
            TX_STATE,
            "* 2020-11-10 tx-state id: 5, --> OPEN",
        ],
    );

    let err = execute_ingest(IngestArgs {
        dumps: vec![dump],
        db: dir.path().join("m0play.db"),
        block_lines: 2,
        ..Default::default()
    })
    .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("trace_5.txt at line 5"), "{}", message);
}

#[test]
fn test_bad_file_name_rejected_before_reset() {
    let dir = TempDir::new().unwrap();
    let good = write_dump(dir.path(), "trace_1.txt", &[TX_STATE]);
    let bad = write_dump(dir.path(), "trace_zz.txt", &[TX_STATE]);
    let db = dir.path().join("m0play.db");

    ingest(vec![good.clone()], &db, false);

    let result = execute_ingest(IngestArgs {
        dumps: vec![good, bad],
        db: db.clone(),
        ..Default::default()
    });
    assert!(result.is_err());

    // the earlier run's rows survive: nothing was reset
    assert_eq!(open(&db).row_count(Table::Request).unwrap(), 1);
}

#[test]
fn test_cancelled_run_stops_between_blocks() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(dir.path(), "trace_2.txt", &[TX_STATE, TX_STATE]);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = execute_ingest(IngestArgs {
        dumps: vec![dump],
        db: dir.path().join("m0play.db"),
        cancel,
        ..Default::default()
    })
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<IngestError>(),
        Some(IngestError::Cancelled { lines: 0, .. })
    ));
}

#[test]
fn test_indexes_and_summary_json() {
    let dir = TempDir::new().unwrap();
    let dump = write_dump(dir.path(), "trace_42.txt", &[TX_STATE, CLIENT_TO_DIX]);
    let db = dir.path().join("m0play.db");
    let summary_path = dir.path().join("out/summary.json");

    execute_ingest(IngestArgs {
        dumps: vec![dump],
        db: db.clone(),
        create_indexes: true,
        summary_json: Some(summary_path.clone()),
        ..Default::default()
    })
    .unwrap();

    let names = open(&db).index_names().unwrap();
    assert!(names.contains(&"request_id".to_string()));
    assert!(names.contains(&"relation_pid2".to_string()));

    let json: serde_json::Value = read_summary(&summary_path).unwrap();
    assert_eq!(json["files"], 1);
    assert_eq!(json["rows"]["request"], 1);
    assert_eq!(json["rows"]["relation"], 1);
    assert_eq!(json["retries"], 0);
}
