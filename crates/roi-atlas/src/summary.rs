//! Printable atlas summaries.

use std::fmt;

use roi_core::{Hemisphere, Manifold};
use serde::{Deserialize, Serialize};

use crate::catalog::RegionCatalog;
use crate::descriptor::AtlasDescriptor;
use crate::kind::SourceKind;

/// Human readable overview of an atlas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasSummary {
    /// Atlas name.
    pub name: String,
    /// Source kind.
    pub kind: SourceKind,
    /// Volume or surface.
    pub manifold: Manifold,
    /// Hemispheres of a surface atlas.
    pub hemispheres: Vec<Hemisphere>,
    /// Region names, sorted by name; empty while pending.
    pub regions: Vec<String>,
    /// Whether cluster summaries are still missing.
    pub pending: bool,
    /// Warnings raised during resolution.
    pub warnings: Vec<String>,
}

impl AtlasSummary {
    /// Summarises a descriptor, building its catalog when it is resolved.
    pub fn new(descriptor: &AtlasDescriptor) -> Self {
        let regions = RegionCatalog::build(descriptor)
            .map(|catalog| catalog.summary_names())
            .unwrap_or_default();
        Self {
            name: descriptor.name().to_string(),
            kind: descriptor.kind(),
            manifold: descriptor.manifold(),
            hemispheres: descriptor.hemispheres(),
            regions,
            pending: descriptor.is_pending(),
            warnings: descriptor.warnings().to_vec(),
        }
    }
}

impl fmt::Display for AtlasSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Atlas: {}", self.name)?;
        writeln!(f, "Source: {}", self.kind)?;
        write!(f, "Manifold: {}", self.manifold)?;
        if !self.hemispheres.is_empty() {
            let tags: Vec<&str> = self.hemispheres.iter().map(|hemi| hemi.tag()).collect();
            write!(f, " ({})", tags.join(", "))?;
        }
        writeln!(f)?;
        if self.pending {
            writeln!(f, "Regions: pending cluster summary")?;
        } else {
            writeln!(f, "Regions ({}):", self.regions.len())?;
            for name in &self.regions {
                writeln!(f, "    {name}")?;
            }
        }
        for warning in &self.warnings {
            writeln!(f, "Warning: {warning}")?;
        }
        Ok(())
    }
}
