//! Harvard-Oxford probabilistic atlases in standard space.

use std::path::{Path, PathBuf};

use roi_core::{ErrorInfo, Hemisphere, Manifold, RawSpec, RegionId, RoiError};

use crate::descriptor::{AtlasDescriptor, AtlasVariant, RegionEntry, Resolution};
use crate::kind::SourceKind;
use crate::lut::LookupTable;
use crate::resolve::{ensure_unique_requests, expect_manifold, AtlasResolver, ResolveContext};

/// Right-hemisphere structures sit this far above their left counterparts.
pub const RIGHT_HEMISPHERE_OFFSET: u32 = 55;

const THRESHOLDS: &[u32] = &[25, 50];

/// Default lookup table under the project's `roi/` tree.
pub fn default_lut_path(ctx: &ResolveContext<'_>) -> PathBuf {
    ctx.layout
        .atlas_kind_dir(SourceKind::Probabilistic.tree_dir())
        .join("HarvardOxford-LUT.txt")
}

pub(crate) struct ProbabilisticResolver;

impl AtlasResolver for ProbabilisticResolver {
    const REQUIRED: &'static [&'static str] = &["source", "manifold", "probthresh", "regions"];
    const OPTIONAL: &'static [&'static str] = &["lut"];

    fn resolve(
        name: &str,
        manifold: Manifold,
        spec: &RawSpec,
        ctx: &ResolveContext<'_>,
    ) -> Result<AtlasDescriptor, RoiError> {
        expect_manifold(manifold, Manifold::Volume, "probabilistic")?;
        let probthresh: u32 = spec.require("probthresh")?;
        if !THRESHOLDS.contains(&probthresh) {
            return Err(RoiError::Config(
                ErrorInfo::new("probthresh", "probability threshold must be 25 or 50")
                    .with_context("probthresh", probthresh.to_string()),
            ));
        }
        let codes: Vec<u32> = spec.require("regions")?;
        ensure_unique_requests(&codes)?;
        if let Some(code) = codes.iter().find(|code| **code >= RIGHT_HEMISPHERE_OFFSET) {
            return Err(RoiError::Config(
                ErrorInfo::new("region_code", "request left-hemisphere codes only")
                    .with_context("region", code.to_string()),
            ));
        }
        let lut_path = match spec.optional::<String>("lut")? {
            Some(path) => ctx.project_path(Path::new(&path)),
            None => default_lut_path(ctx),
        };
        let lut = LookupTable::load(&lut_path)?;

        let mut regions = Vec::with_capacity(codes.len() * 2);
        for code in &codes {
            let left = RegionId::from_raw(*code);
            let right = left.offset(RIGHT_HEMISPHERE_OFFSET).ok_or_else(|| {
                RoiError::Config(
                    ErrorInfo::new("region_code", "region code out of range")
                        .with_context("region", code.to_string()),
                )
            })?;
            for (hemi, id) in [(Hemisphere::Left, left), (Hemisphere::Right, right)] {
                regions.push(RegionEntry {
                    id,
                    hemisphere: Some(hemi),
                    name: lut.require(id.as_raw())?.to_string(),
                });
            }
        }

        Ok(AtlasDescriptor {
            name: name.to_string(),
            kind: SourceKind::Probabilistic,
            manifold,
            variant: AtlasVariant::Probabilistic { probthresh },
            regions,
            sources: Vec::new(),
            resolution: Resolution::Resolved,
            warnings: Vec::new(),
        })
    }
}
