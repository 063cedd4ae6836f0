//! Cluster summaries of thresholded group significance maps.
//!
//! A summary has one whitespace-separated row per cluster; column 0 is the
//! cluster number, column 7 its size and column 8 the annotation label.
//! `#` lines are comments.

use std::collections::BTreeMap;
use std::path::PathBuf;

use roi_core::{ErrorInfo, Hemisphere, ProjectLayout, RoiError};

const SIZE_COLUMN: usize = 7;
const LABEL_COLUMN: usize = 8;

/// One cluster kept as a region.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRegion {
    /// Cluster number as written by the clustering tool.
    pub cluster: u32,
    /// Cluster size.
    pub size: f64,
    /// Region name, `<hemi>_<label>` with a `-N` suffix for repeated labels.
    pub name: String,
}

/// Directory holding a significance atlas's summaries and label files.
pub fn cluster_dir(layout: &ProjectLayout, atlas: &str) -> PathBuf {
    layout
        .project_atlas_dir("sigsurf")
        .join("source")
        .join(atlas)
}

/// `<hemi>.<atlas>.sum` inside [`cluster_dir`].
pub fn cluster_summary_path(layout: &ProjectLayout, atlas: &str, hemi: Hemisphere) -> PathBuf {
    cluster_dir(layout, atlas).join(format!("{}.{atlas}.sum", hemi.tag()))
}

/// Label file written by the clustering tool for one cluster.
pub fn cluster_label_file(hemi: Hemisphere, atlas: &str, cluster: u32) -> String {
    format!("{}_{atlas}-{cluster:04}.label", hemi.tag())
}

/// Parses a summary, keeping clusters whose size reaches `minsize`.
pub fn parse_cluster_summary(
    text: &str,
    hemi: Hemisphere,
    minsize: f64,
) -> Result<Vec<ClusterRegion>, RoiError> {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    let mut regions = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = trimmed.split_whitespace().collect();
        if columns.len() <= LABEL_COLUMN {
            return Err(summary_error("cluster summary row is too short", line_no));
        }
        let cluster: u32 = columns[0]
            .parse()
            .map_err(|_| summary_error("cluster number is not an integer", line_no))?;
        let size: f64 = columns[SIZE_COLUMN]
            .parse()
            .map_err(|_| summary_error("cluster size is not numeric", line_no))?;
        if size < minsize {
            continue;
        }
        let label = columns[LABEL_COLUMN];
        let count = seen.entry(label.to_string()).or_insert(0);
        *count += 1;
        let label = if *count == 1 {
            label.to_string()
        } else {
            format!("{label}-{count}")
        };
        regions.push(ClusterRegion {
            cluster,
            size,
            name: format!("{}_{label}", hemi.tag()),
        });
    }
    Ok(regions)
}

fn summary_error(message: &str, line_no: usize) -> RoiError {
    RoiError::Config(
        ErrorInfo::new("cluster_summary", message).with_context("line", (line_no + 1).to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "\
# ClusterNo  Max   VtxMax   Size(mm^2)  MNIX   MNIY   MNIZ  NVtxs  Annot
   1        5.2   1021     410.3      -40.1  -60.2  -10.5   310   fusiform
   2        4.1   2210     95.0       -30.0  -80.0    5.0    40   lateraloccipital
   3        3.9   3301     220.8      -42.0  -55.0  -12.0   150   fusiform
";

    #[test]
    fn small_clusters_are_dropped_and_repeats_suffixed() {
        let regions = parse_cluster_summary(SUMMARY, Hemisphere::Left, 100.0).expect("parse");
        let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["lh_fusiform", "lh_fusiform-2"]);
        assert_eq!(regions[1].cluster, 3);
    }

    #[test]
    fn label_files_are_zero_padded() {
        assert_eq!(
            cluster_label_file(Hemisphere::Right, "faces", 7),
            "rh_faces-0007.label"
        );
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse_cluster_summary("1 2 3\n", Hemisphere::Left, 0.0).unwrap_err();
        assert!(matches!(err, RoiError::Config(_)));
    }
}
