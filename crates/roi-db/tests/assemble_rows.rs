use std::fs;
use std::path::Path;

use roi_atlas::{resolve_named, AtlasSession, RegionCatalog};
use roi_core::{Analysis, Hemisphere, ProjectConfig, ProjectLayout, RoiError};
use roi_db::{
    render_tsv, write_database, DatabaseAssembler, FsTableSource, FunctionalLayout,
    FunctionalTable, MemoryTableSource, ScopeTables, SizeTable,
};
use tempfile::tempdir;

fn project(base: &Path) -> ProjectConfig {
    let yaml = format!(
        concat!(
            "project: faces\nbasepath: {}\n",
            "subjects:\n  patients: [S2, S1]\n",
            "paradigms:\n  FaceAttention: FA\n",
            "conditions:\n  FaceAttention: [face, house]\n",
            "contrasts:\n  FaceAttention:\n    face-house: 1\n",
            "analyses:\n",
            "  - par: FaceAttention\n    extract: contrast\n",
            "  - par: FaceAttention\n    extract: beta\n",
            "atlases:\n",
            "  aseg:\n    source: parcellation\n    manifold: volume\n    fname: aseg.mgz\n    regions: [1]\n",
            "  aparc:\n    source: parcellation\n    manifold: surface\n    fname: aparc.annot\n    regions: [8, 1, 5, 6, 7]\n",
            "  faceclusters:\n    source: significance\n    manifold: surface\n    hemi: both\n    file: sig.mgz\n    thresh: [fdr, 0.05]\n    minsize: 100\n",
        ),
        base.display()
    );
    serde_yaml::from_str(&yaml).expect("project yaml")
}

fn subjects(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn thalamus_tables() -> ScopeTables {
    ScopeTables {
        size: SizeTable::from_rows([(1, 10, 120), (2, 49, 115)]),
        masked_size: SizeTable::from_rows([(1, 10, 80), (2, 49, 70)]),
        functional: FunctionalTable::from_rows(vec![vec![2.1], vec![1.9]]),
    }
}

#[test]
fn thalamus_pair_yields_two_rows_in_id_order() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let atlas = resolve_named(&config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 0).expect("analysis");

    let mut source = MemoryTableSource::new();
    source.insert("S1", None, thalamus_tables());
    let database = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&subjects(&["S1"]), &mut source)
        .expect("assemble");

    assert_eq!(database.name(), "aseg_fa_contrast_nomask");
    assert_eq!(
        database.header(),
        ["Subject", "ROI", "base-voxels", "final-voxels", "face-house"]
    );
    let rows: Vec<_> = database
        .rows()
        .iter()
        .map(|row| (row.subject.as_str(), row.region.as_str(), row.base_size, row.final_size, row.values.clone()))
        .collect();
    assert_eq!(
        rows,
        [
            ("S1", "Thalamus", 120, 80, vec![2.1]),
            ("S1", "Thalamus", 115, 70, vec![1.9]),
        ]
    );
    let text = String::from_utf8(render_tsv(&database).expect("render")).expect("utf8");
    assert_eq!(
        text,
        "Subject\tROI\tbase-voxels\tfinal-voxels\tface-house\nS1\tThalamus\t120\t80\t2.1\nS1\tThalamus\t115\t70\t1.9\n"
    );
}

#[test]
fn rows_scale_with_subjects_and_regions() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let atlas = resolve_named(&config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 1).expect("analysis");

    let mut source = MemoryTableSource::new();
    for subject in ["S1", "S2", "S3"] {
        let mut tables = thalamus_tables();
        tables.functional = FunctionalTable::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        source.insert(subject, None, tables);
    }
    let order = subjects(&["S3", "S1", "S2"]);
    let database = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&order, &mut source)
        .expect("assemble");
    assert_eq!(database.len(), 3 * catalog.len());
    assert!(database.rows().iter().all(|row| row.values.len() == 2));
    let firsts: Vec<&str> = database
        .rows()
        .iter()
        .step_by(2)
        .map(|row| row.subject.as_str())
        .collect();
    assert_eq!(firsts, ["S3", "S1", "S2"]);

    let again = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&order, &mut source)
        .expect("assemble again");
    assert_eq!(
        render_tsv(&database).expect("render"),
        render_tsv(&again).expect("render")
    );
}

#[test]
fn functional_width_must_match_the_analysis() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let atlas = resolve_named(&config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 1).expect("analysis");

    let mut source = MemoryTableSource::new();
    source.insert("S1", None, thalamus_tables());
    let err = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&subjects(&["S1"]), &mut source)
        .unwrap_err();
    assert!(matches!(err, RoiError::Extraction(_)));
    assert_eq!(err.info().code, "column_count_mismatch");
}

#[test]
fn row_count_mismatch_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let atlas = resolve_named(&config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 0).expect("analysis");

    let mut tables = thalamus_tables();
    tables.functional = FunctionalTable::from_rows(vec![vec![2.1]]);
    let mut source = MemoryTableSource::new();
    source.insert("S1", None, tables);
    let err = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&subjects(&["S1"]), &mut source)
        .unwrap_err();
    assert_eq!(err.info().code, "row_count_mismatch");
    assert_eq!(err.info().context.get("subject").map(String::as_str), Some("S1"));
}

#[test]
fn missing_region_aborts_before_anything_is_written() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let layout = ProjectLayout::new(&config);
    let atlas = resolve_named(&config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 0).expect("analysis");
    let assembler = DatabaseAssembler::new(&catalog, &analysis);

    let mut source = MemoryTableSource::new();
    source.insert("S1", None, thalamus_tables());
    let first = assembler
        .assemble(&subjects(&["S1"]), &mut source)
        .expect("assemble");
    let written = write_database(&layout, &first).expect("write");
    let before = fs::read(&written.path).expect("read primary");

    let mut broken = thalamus_tables();
    broken.masked_size = SizeTable::from_rows([(1, 10, 80)]);
    source.insert("S2", None, broken);
    let err = match assembler.assemble(&subjects(&["S1", "S2"]), &mut source) {
        Ok(database) => write_database(&layout, &database).map(|_| ()).unwrap_err(),
        Err(err) => err,
    };
    assert!(matches!(err, RoiError::Extraction(_)));
    assert_eq!(err.info().message, "region missing from stats file");
    assert_eq!(err.info().context.get("region").map(String::as_str), Some("49"));
    assert_eq!(fs::read(&written.path).expect("read primary"), before);
    assert!(!layout.archive_dir().exists());
}

#[test]
fn surface_rows_are_left_block_then_right_block() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let atlas = resolve_named(&config, "aparc").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 0).expect("analysis");

    let mut source = MemoryTableSource::new();
    for (hemi, offset) in [(Hemisphere::Left, 1000u32), (Hemisphere::Right, 2000u32)] {
        let codes = [1u32, 5, 6, 7, 8];
        let size = SizeTable::from_rows(
            codes
                .iter()
                .enumerate()
                .rev()
                .map(|(idx, code)| (idx as u64, offset + code, 100 + u64::from(*code))),
        );
        source.insert(
            "S1",
            Some(hemi),
            ScopeTables {
                masked_size: size.clone(),
                size,
                functional: FunctionalTable::from_rows(
                    codes.iter().map(|code| vec![f64::from(offset + code)]).collect(),
                ),
            },
        );
    }

    let database = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&subjects(&["S1"]), &mut source)
        .expect("assemble");
    assert_eq!(database.len(), 10);
    assert_eq!(database.header()[2], "base-vertices");
    let hemis: Vec<_> = database.rows().iter().map(|row| row.hemisphere).collect();
    assert_eq!(&hemis[..5], [Some(Hemisphere::Left); 5]);
    assert_eq!(&hemis[5..], [Some(Hemisphere::Right); 5]);
    let values: Vec<f64> = database.rows().iter().map(|row| row.values[0]).collect();
    assert_eq!(
        values,
        [1001.0, 1005.0, 1006.0, 1007.0, 1008.0, 2001.0, 2005.0, 2006.0, 2007.0, 2008.0]
    );
    assert_eq!(database.rows()[0].region, "ctx-lh-bankssts");
    assert_eq!(database.rows()[9].base_size, 108);
}

#[test]
fn hemispheres_without_clusters_are_never_read() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let cluster_dir = dir.path().join("roi/atlases/sigsurf/faces/source/faceclusters");
    fs::create_dir_all(&cluster_dir).expect("mkdir");
    fs::write(
        cluster_dir.join("lh.faceclusters.sum"),
        concat!(
            "# ClusterNo Max VtxMax Size MNIX MNIY MNIZ NVtxs Annot\n",
            "1 5.2 1021 410.3 -40 -60 -10 310 fusiform\n",
            "2 4.8 2210 250.0 -10 -80 5 180 cuneus\n",
        ),
    )
    .expect("lh summary");
    fs::write(
        cluster_dir.join("rh.faceclusters.sum"),
        "1 3.1 501 40.0 38 -55 -12 30 precuneus\n",
    )
    .expect("rh summary");

    let atlas = resolve_named(&config, "faceclusters").expect("resolve");
    assert!(!atlas.is_pending());
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 0).expect("analysis");

    // only lh tables exist; a request for rh would fail with stats_missing
    let mut source = MemoryTableSource::new();
    for subject in ["S1", "S2"] {
        source.insert(
            subject,
            Some(Hemisphere::Left),
            ScopeTables {
                size: SizeTable::from_rows([(0, 1, 310), (1, 2, 180)]),
                masked_size: SizeTable::from_rows([(0, 1, 300), (1, 2, 170)]),
                functional: FunctionalTable::from_rows(vec![vec![10.0], vec![20.0]]),
            },
        );
    }
    let order = subjects(&["S2", "S1"]);
    let database = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&order, &mut source)
        .expect("assemble");

    assert_eq!(database.len(), order.len() * catalog.len());
    let rows: Vec<_> = database
        .rows()
        .iter()
        .map(|row| (row.subject.as_str(), row.region.as_str(), row.hemisphere, row.values[0]))
        .collect();
    assert_eq!(
        rows,
        [
            ("S2", "lh_fusiform", Some(Hemisphere::Left), 10.0),
            ("S2", "lh_cuneus", Some(Hemisphere::Left), 20.0),
            ("S1", "lh_fusiform", Some(Hemisphere::Left), 10.0),
            ("S1", "lh_cuneus", Some(Hemisphere::Left), 20.0),
        ]
    );
}

#[test]
fn filesystem_source_reads_tables_from_the_project_tree() {
    let dir = tempdir().expect("tempdir");
    let config = project(dir.path());
    let atlas = resolve_named(&config, "aseg").expect("resolve");
    let catalog = RegionCatalog::build(&atlas).expect("catalog");
    let analysis = Analysis::from_index(&config, 0).expect("analysis");

    let mut session = AtlasSession::new(&atlas, &config);
    session.init_subject("S1").expect("subject");
    session.init_analysis(analysis.clone()).expect("analysis");
    let paths = session.table_paths().expect("paths").remove(0);
    for (path, text) in [
        (&paths.size, "# aseg sizes\n1 10 120 0\n2 49 115 0\n"),
        (&paths.masked_size, "1 49 70\n2 10 80\n"),
        (&paths.functional, "2.1 1.9\n"),
    ] {
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write table");
    }

    let mut source = FsTableSource::new(
        AtlasSession::new(&atlas, &config),
        analysis.clone(),
        FunctionalLayout::ConditionMajor,
    );
    let database = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&subjects(&["S1"]), &mut source)
        .expect("assemble");
    let sizes: Vec<(u64, u64)> = database
        .rows()
        .iter()
        .map(|row| (row.base_size, row.final_size))
        .collect();
    assert_eq!(sizes, [(120, 80), (115, 70)]);
    assert_eq!(database.rows()[1].values, [1.9]);

    let err = DatabaseAssembler::new(&catalog, &analysis)
        .assemble(&subjects(&["S9"]), &mut source)
        .unwrap_err();
    assert!(matches!(err, RoiError::Preprocess(_)));
}
