use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use roi_atlas::{resolve_named, RegionCatalog};
use roi_core::{Analysis, ProjectConfig, ProjectLayout};
use roi_db::{
    write_database_at, Database, DatabaseAssembler, FunctionalTable, HistoryLedger,
    MemoryTableSource, ScopeTables, SizeTable,
};
use serde_json::Value;
use tempfile::tempdir;

fn project(base: &Path) -> ProjectConfig {
    let yaml = format!(
        concat!(
            "project: faces\nbasepath: {}\n",
            "paradigms:\n  FaceAttention: FA\n",
            "contrasts:\n  FaceAttention:\n    face-house: 1\n",
            "analyses:\n  - par: FaceAttention\n    extract: contrast\n",
            "atlases:\n",
            "  aseg:\n    source: parcellation\n    manifold: volume\n    fname: aseg.mgz\n    regions: [1]\n",
        ),
        base.display()
    );
    serde_yaml::from_str(&yaml).expect("project yaml")
}

fn database(config: &ProjectConfig, value: f64) -> Database {
    let atlas = resolve_named(config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(config, 0).expect("analysis");
    let mut source = MemoryTableSource::new();
    source.insert(
        "S1",
        None,
        ScopeTables {
            size: SizeTable::from_rows([(1, 10, 120), (2, 49, 115)]),
            masked_size: SizeTable::from_rows([(1, 10, 80), (2, 49, 70)]),
            functional: FunctionalTable::from_rows(vec![vec![value], vec![-value]]),
        },
    );
    DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&["S1".to_string()], &mut source)
        .expect("assemble")
}

#[test]
fn second_write_archives_the_first_under_its_stamp() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let layout = ProjectLayout::new(&config);
    let first_time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).single().expect("time");
    let second_time = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("time");

    let first = write_database_at(&layout, &database(&config, 2.1), first_time).expect("first");
    assert!(first.archived.is_none());
    assert_eq!(first.timestamp, "20240309-140500.000000");
    let first_bytes = fs::read(&first.path).expect("read first");

    let second =
        write_database_at(&layout, &database(&config, 3.5), second_time).expect("second");
    let archived = second.archived.clone().expect("archived copy");
    assert_eq!(
        archived,
        layout
            .archive_dir()
            .join("aseg_fa_contrast_nomask_20240309-140500.000000.txt")
    );
    assert_eq!(fs::read(&archived).expect("read archive"), first_bytes);
    assert_ne!(fs::read(&second.path).expect("read primary"), first_bytes);

    let ledger = HistoryLedger::load(&layout.ledger_path()).expect("ledger");
    assert_eq!(ledger.len(), 1);
    let entry = ledger.entry("aseg_fa_contrast_nomask").expect("entry");
    assert_eq!(entry.timestamp, "20240310-090000.000000");
    assert!(ledger
        .verify("aseg_fa_contrast_nomask", &second.path)
        .expect("verify"));

    let raw: Value =
        serde_json::from_slice(&fs::read(layout.ledger_path()).expect("read ledger")).expect("json");
    assert_eq!(
        raw["databases"]["aseg_fa_contrast_nomask"]["sha256"],
        Value::String(second.sha256.clone())
    );
}

#[test]
fn rewrites_within_the_same_instant_still_get_distinct_archives() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let layout = ProjectLayout::new(&config);
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).single().expect("time");

    for value in [1.0, 2.0, 3.0] {
        write_database_at(&layout, &database(&config, value), now).expect("write");
    }
    let mut archives: Vec<String> = fs::read_dir(layout.archive_dir())
        .expect("archive dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    archives.sort();
    assert_eq!(
        archives,
        [
            "aseg_fa_contrast_nomask_20240309-140500.000000.txt",
            "aseg_fa_contrast_nomask_20240309-140500.000001.txt",
        ]
    );
}

#[test]
fn missing_primary_is_tolerated_when_archiving() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let layout = ProjectLayout::new(&config);
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).single().expect("time");

    let first = write_database_at(&layout, &database(&config, 1.0), now).expect("first");
    fs::remove_file(&first.path).expect("remove primary");
    let ledger = HistoryLedger::load(&layout.ledger_path()).expect("ledger");
    assert!(!ledger
        .verify("aseg_fa_contrast_nomask", &first.path)
        .expect("verify"));

    let second = write_database_at(&layout, &database(&config, 2.0), now).expect("second");
    assert!(second.archived.is_none());
    assert!(second.path.is_file());
}

#[test]
fn absent_ledger_loads_empty() {
    let dir = tempdir().expect("tempdir");
    let ledger = HistoryLedger::load(&dir.path().join(".faces_history.json")).expect("ledger");
    assert!(ledger.is_empty());
    assert!(!ledger
        .verify("anything", &dir.path().join("anything.txt"))
        .expect("verify"));
}

#[test]
fn archives_left_by_an_interrupted_write_are_kept() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let layout = ProjectLayout::new(&config);
    let first_time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).single().expect("time");
    let second_time = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).single().expect("time");

    write_database_at(&layout, &database(&config, 2.1), first_time).expect("first");
    // archive moved, ledger never updated: the stamp still names the first write
    let stale = layout
        .archive_dir()
        .join("aseg_fa_contrast_nomask_20240309-140500.000000.txt");
    fs::create_dir_all(layout.archive_dir()).expect("mkdir");
    fs::write(&stale, "interrupted\n").expect("stale archive");

    let second =
        write_database_at(&layout, &database(&config, 3.5), second_time).expect("second");
    assert_eq!(
        second.archived.expect("archived copy"),
        layout
            .archive_dir()
            .join("aseg_fa_contrast_nomask_20240309-140500.000000-1.txt")
    );
    assert_eq!(fs::read_to_string(&stale).expect("read stale"), "interrupted\n");
    assert_eq!(fs::read_dir(layout.archive_dir()).expect("list").count(), 2);
}
