//! Resolved atlas descriptors and their variant settings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use roi_core::{ErrorInfo, Hemisphere, Manifold, RegionId, RoiError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{cluster_label_file, parse_cluster_summary};
use crate::kind::SourceKind;

/// One requested region as the atlas source names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    /// Numeric id inside the atlas image or annotation.
    pub id: RegionId,
    /// Hemisphere the region belongs to, when the atlas knows it.
    pub hemisphere: Option<Hemisphere>,
    /// Name as given by the lookup table, label file or cluster summary.
    pub name: String,
}

/// A label or mask file backing one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Region id assigned to the file.
    pub id: RegionId,
    /// Hemisphere of the region, for surface sources.
    pub hemisphere: Option<Hemisphere>,
    /// Resolved path; may contain a `$subject` placeholder.
    pub path: PathBuf,
    /// Region name the file contributes.
    pub name: String,
}

/// Region ids of a resolved atlas, flat for volumes and split for surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionIds {
    /// Volume atlases: one globally unique id space.
    Flat(Vec<RegionId>),
    /// Surface atlases: ids are only unique within a hemisphere.
    PerHemisphere(BTreeMap<Hemisphere, Vec<RegionId>>),
}

impl RegionIds {
    /// Total number of regions across every scope.
    pub fn len(&self) -> usize {
        match self {
            RegionIds::Flat(ids) => ids.len(),
            RegionIds::PerHemisphere(map) => map.values().map(Vec::len).sum(),
        }
    }

    /// Returns true when no region is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Files of the FreeSurfer parcellations that can be extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcellationFile {
    /// `aseg.mgz`: subcortical segmentation, volume.
    Aseg,
    /// `aparc.annot`: Desikan-Killiany cortical parcellation, surface.
    Aparc,
    /// `aparc.a2009s.annot`: Destrieux cortical parcellation, surface.
    Aparc2009s,
}

impl ParcellationFile {
    /// File name inside the subject's FreeSurfer directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ParcellationFile::Aseg => "aseg.mgz",
            ParcellationFile::Aparc => "aparc.annot",
            ParcellationFile::Aparc2009s => "aparc.a2009s.annot",
        }
    }

    /// Manifold the file lives on.
    pub fn manifold(&self) -> Manifold {
        match self {
            ParcellationFile::Aseg => Manifold::Volume,
            ParcellationFile::Aparc | ParcellationFile::Aparc2009s => Manifold::Surface,
        }
    }

    /// Parses a configured `fname`.
    pub fn parse(value: &str) -> Result<Self, RoiError> {
        match value.trim() {
            "aseg.mgz" => Ok(ParcellationFile::Aseg),
            "aparc.annot" => Ok(ParcellationFile::Aparc),
            "aparc.a2009s.annot" => Ok(ParcellationFile::Aparc2009s),
            other => Err(RoiError::Config(
                ErrorInfo::new("fname", "unknown parcellation file")
                    .with_context("fname", other)
                    .with_hint("expected aseg.mgz, aparc.annot or aparc.a2009s.annot"),
            )),
        }
    }
}

/// Statistic used to threshold a group significance map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdKind {
    /// False discovery rate.
    Fdr,
    /// Absolute significance value.
    Abs,
}

/// Whether label files are shared by the group or drawn per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLevel {
    /// One label set on the group template.
    Group,
    /// Labels drawn on each subject's own surface.
    Subject,
}

/// Variant-specific settings kept after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AtlasVariant {
    /// Anatomical FreeSurfer parcellation.
    Parcellation {
        /// Parcellation file the regions come from.
        file: ParcellationFile,
    },
    /// Harvard-Oxford probabilistic atlas.
    Probabilistic {
        /// Probability threshold (25 or 50 percent).
        probthresh: u32,
    },
    /// Clusters of a group significance map.
    Significance {
        /// Hemispheres clustered.
        hemispheres: Vec<Hemisphere>,
        /// Group significance image the clusters come from.
        file: String,
        /// Threshold statistic.
        threshold_kind: ThresholdKind,
        /// Threshold value.
        threshold: f64,
        /// Minimum cluster size kept as a region.
        minsize: f64,
        /// Directory holding cluster summaries and label files.
        cluster_dir: PathBuf,
    },
    /// User labels on one hemisphere.
    Label {
        /// Hemisphere the labels live on.
        hemisphere: Hemisphere,
        /// Directory the label files were resolved against.
        sourcedir: PathBuf,
        /// Group or subject labels.
        level: SourceLevel,
    },
    /// User binary masks.
    Mask {
        /// Directory the mask files were resolved against.
        sourcedir: PathBuf,
    },
}

/// Resolution state of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// All regions are known.
    Resolved,
    /// Clusters for these hemispheres have not been summarised yet.
    Pending {
        /// Hemispheres still lacking a cluster summary.
        missing: Vec<Hemisphere>,
    },
}

/// A validated atlas definition with its requested regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasDescriptor {
    pub(crate) name: String,
    pub(crate) kind: SourceKind,
    pub(crate) manifold: Manifold,
    pub(crate) variant: AtlasVariant,
    pub(crate) regions: Vec<RegionEntry>,
    pub(crate) sources: Vec<SourceFile>,
    pub(crate) resolution: Resolution,
    pub(crate) warnings: Vec<String>,
}

impl AtlasDescriptor {
    /// Atlas name as declared in the project.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source kind the atlas was resolved as.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Volume or surface.
    pub fn manifold(&self) -> Manifold {
        self.manifold
    }

    /// Variant-specific settings.
    pub fn variant(&self) -> &AtlasVariant {
        &self.variant
    }

    /// Requested regions in resolution order.
    pub fn regions(&self) -> &[RegionEntry] {
        &self.regions
    }

    /// Label or mask files backing the regions, if any.
    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    /// Non-fatal problems noticed during resolution.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Current resolution state.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Returns true while cluster summaries are still missing.
    pub fn is_pending(&self) -> bool {
        matches!(self.resolution, Resolution::Pending { .. })
    }

    /// Hemispheres a surface atlas is defined on; empty for volumes.
    pub fn hemispheres(&self) -> Vec<Hemisphere> {
        match (&self.manifold, &self.variant) {
            (Manifold::Volume, _) => Vec::new(),
            (_, AtlasVariant::Significance { hemispheres, .. }) => hemispheres.clone(),
            (_, AtlasVariant::Label { hemisphere, .. }) => vec![*hemisphere],
            _ => Hemisphere::ALL.to_vec(),
        }
    }

    /// Region ids, id-sorted within each scope.
    pub fn region_ids(&self) -> Result<RegionIds, RoiError> {
        self.ensure_resolved()?;
        match self.manifold {
            Manifold::Volume => {
                let mut ids: Vec<RegionId> = self.regions.iter().map(|entry| entry.id).collect();
                ids.sort();
                Ok(RegionIds::Flat(ids))
            }
            Manifold::Surface => {
                let mut map: BTreeMap<Hemisphere, Vec<RegionId>> = self
                    .hemispheres()
                    .into_iter()
                    .map(|hemi| (hemi, Vec::new()))
                    .collect();
                for entry in &self.regions {
                    if let Some(hemi) = entry.hemisphere {
                        map.entry(hemi).or_default().push(entry.id);
                    }
                }
                for ids in map.values_mut() {
                    ids.sort();
                }
                Ok(RegionIds::PerHemisphere(map))
            }
        }
    }

    /// Fails with a preprocess error while the descriptor is pending.
    pub fn ensure_resolved(&self) -> Result<(), RoiError> {
        match &self.resolution {
            Resolution::Resolved => Ok(()),
            Resolution::Pending { missing } => {
                let missing = missing
                    .iter()
                    .map(|hemi| hemi.tag())
                    .collect::<Vec<_>>()
                    .join(",");
                Err(RoiError::Preprocess(
                    ErrorInfo::new("clusters_pending", "cluster summary has not been generated")
                        .with_context("atlas", self.name.as_str())
                        .with_context("hemispheres", missing),
                ))
            }
        }
    }

    /// Fills in one hemisphere of a pending significance atlas from its cluster summary text.
    pub fn complete_clusters(&mut self, hemi: Hemisphere, summary: &str) -> Result<(), RoiError> {
        let (minsize, cluster_dir) = match &self.variant {
            AtlasVariant::Significance {
                hemispheres,
                minsize,
                cluster_dir,
                ..
            } if hemispheres.contains(&hemi) => (*minsize, cluster_dir.clone()),
            _ => {
                return Err(RoiError::Config(
                    ErrorInfo::new("not_clustered", "atlas has no clusters for this hemisphere")
                        .with_context("atlas", self.name.as_str())
                        .with_context("hemisphere", hemi.tag()),
                ))
            }
        };
        let clusters = parse_cluster_summary(summary, hemi, minsize)
            .map_err(|err| err.with_context("atlas", self.name.as_str()))?;

        self.regions.retain(|entry| entry.hemisphere != Some(hemi));
        self.sources.retain(|source| source.hemisphere != Some(hemi));
        for (idx, cluster) in clusters.iter().enumerate() {
            let id = RegionId::from_raw(idx as u32 + 1);
            self.regions.push(RegionEntry {
                id,
                hemisphere: Some(hemi),
                name: cluster.name.clone(),
            });
            self.sources.push(SourceFile {
                id,
                hemisphere: Some(hemi),
                path: cluster_dir.join(cluster_label_file(hemi, &self.name, cluster.cluster)),
                name: cluster.name.clone(),
            });
        }
        self.regions.sort_by_key(|entry| (entry.hemisphere, entry.id));
        self.sources.sort_by_key(|source| (source.hemisphere, source.id));

        if let Resolution::Pending { missing } = &mut self.resolution {
            missing.retain(|pending| *pending != hemi);
            if missing.is_empty() {
                self.resolution = Resolution::Resolved;
            }
        }
        debug!(
            atlas = %self.name,
            hemi = %hemi,
            clusters = clusters.len(),
            "cluster summary applied"
        );
        Ok(())
    }
}
