use std::fs;

use roi_core::{Analysis, ProjectConfig, ProjectLayout, RoiError, SubjectSelection};
use tempfile::tempdir;

const PROJECT: &str = r#"
project: faces
basepath: study
subjects:
  patients: [P2, P1]
  controls: [C1]
paradigms:
  FaceAttention: FA
conditions:
  FaceAttention: [face, house]
hrfcomponents: 1
contrasts:
  FaceAttention:
    face-house: 1
    house-face: 2
    face: 3
analyses:
  - par: FaceAttention
    extract: beta
  - PAR: FaceAttention
    Extract: contrast
    maskpar: FaceAttention
    maskcon: face-house
    maskthresh: 2.3
  - par: FaceAttention
    extract: timecourse
atlases:
  aseg:
    source: freesurfer
    manifold: volume
    fname: aseg.mgz
    regions: [1, 2]
"#;

fn load() -> (tempfile::TempDir, ProjectConfig) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("project.yaml");
    fs::write(&path, PROJECT).expect("write config");
    let config = ProjectConfig::load(&path).expect("load config");
    (dir, config)
}

#[test]
fn relative_basepath_is_anchored_at_the_config_file() {
    let (dir, config) = load();
    assert_eq!(config.basepath, dir.path().join("study"));
    let layout = ProjectLayout::new(&config);
    assert_eq!(layout.roi_dir(), dir.path().join("study").join("roi"));
}

#[test]
fn subjects_are_grouped_and_sorted() {
    let (_dir, config) = load();
    let all = config
        .select_subjects(&SubjectSelection::All)
        .expect("all subjects");
    assert_eq!(all, vec!["C1", "P1", "P2"]);
    let patients = config
        .select_subjects(&SubjectSelection::Group("patients".into()))
        .expect("group");
    assert_eq!(patients, vec!["P1", "P2"]);
    assert_eq!(config.group_of("P2"), Some("patients"));
    let err = config
        .select_subjects(&SubjectSelection::Group("nobody".into()))
        .unwrap_err();
    assert!(matches!(err, RoiError::Config(_)));
}

#[test]
fn analyses_resolve_names_and_measurements() {
    let (_dir, config) = load();
    let beta = Analysis::from_index(&config, 0).expect("beta analysis");
    assert_eq!(beta.name(), "fa_beta_nomask");
    assert_eq!(beta.measurements(), ["face", "house"]);

    let contrast = Analysis::from_index(&config, 1).expect("contrast analysis");
    assert_eq!(contrast.name(), "fa_contrast_fa-face-house-abs2.3");
    assert_eq!(contrast.measurements(), ["face-house", "house-face", "face"]);

    let err = Analysis::from_index(&config, 2).unwrap_err();
    assert!(matches!(err, RoiError::Config(_)));
    assert!(Analysis::from_index(&config, 9).is_err());
}

#[test]
fn hrf_components_expand_beta_columns() {
    let (_dir, mut config) = load();
    config.hrfcomponents = 3;
    config.betastoextract = roi_core::BetaSelection::Indices(vec![1, 3]);
    let beta = Analysis::from_index(&config, 0).expect("beta analysis");
    assert_eq!(beta.measurements(), ["face-01", "face-03", "house-01", "house-03"]);

    config.betastoextract = roi_core::BetaSelection::Index(1);
    let beta = Analysis::from_index(&config, 0).expect("beta analysis");
    assert_eq!(beta.measurements(), ["face", "house"]);

    config.betastoextract = roi_core::BetaSelection::Index(4);
    assert!(config.validate().is_err());
}

#[test]
fn unexpected_analysis_field_is_rejected() {
    let (_dir, mut config) = load();
    let mut raw = config.analyses[0].clone();
    raw.insert("smoothing".into(), serde_yaml::Value::from(6));
    config.analyses.push(raw);
    let err = Analysis::from_index(&config, 3).unwrap_err();
    assert_eq!(err.info().message, "unexpected field");
}
