//! Atlas source kinds and their configuration tags.

use std::fmt;
use std::str::FromStr;

use roi_core::{ErrorInfo, RoiError};
use serde::{Deserialize, Serialize};

/// The five ways an atlas can define its regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Anatomical parcellation in native space (FreeSurfer aseg/aparc).
    Parcellation,
    /// Thresholded probabilistic atlas in standard space (Harvard-Oxford).
    Probabilistic,
    /// Clusters derived from a group significance map.
    Significance,
    /// User supplied surface label files.
    Label,
    /// User supplied binary mask volumes.
    Mask,
}

impl SourceKind {
    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Parcellation => "parcellation",
            SourceKind::Probabilistic => "probabilistic",
            SourceKind::Significance => "significance",
            SourceKind::Label => "label",
            SourceKind::Mask => "mask",
        }
    }

    /// Directory under `<roi>/atlases` holding this kind's atlas trees.
    pub fn tree_dir(&self) -> &'static str {
        match self {
            SourceKind::Parcellation => "freesurfer",
            SourceKind::Probabilistic => "fsl",
            SourceKind::Significance => "sigsurf",
            SourceKind::Label => "label",
            SourceKind::Mask => "mask",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = RoiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "parcellation" | "freesurfer" => Ok(SourceKind::Parcellation),
            "probabilistic" | "fsl" => Ok(SourceKind::Probabilistic),
            "significance" | "sigsurf" => Ok(SourceKind::Significance),
            "label" => Ok(SourceKind::Label),
            "mask" => Ok(SourceKind::Mask),
            "sphere" => Err(RoiError::Config(
                ErrorInfo::new("unsupported_source", "unsupported source kind")
                    .with_context("source", "sphere")
                    .with_hint("sphere atlases are not implemented"),
            )),
            other => Err(RoiError::Config(
                ErrorInfo::new("unsupported_source", "unsupported source kind")
                    .with_context("source", other),
            )),
        }
    }
}
