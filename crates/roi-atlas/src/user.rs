//! Atlases assembled from user supplied label or mask files.

use std::path::{Path, PathBuf};

use roi_core::{ErrorInfo, Hemisphere, Manifold, RawSpec, RegionId, RoiError};

use crate::descriptor::{
    AtlasDescriptor, AtlasVariant, RegionEntry, Resolution, SourceFile, SourceLevel,
};
use crate::kind::SourceKind;
use crate::resolve::{expect_manifold, AtlasResolver, ResolveContext};
use crate::sources::{resolve_sources, SourceFiles, LABEL_EXTENSIONS, MASK_EXTENSIONS};

struct UserRegions {
    sourcedir: PathBuf,
    regions: Vec<RegionEntry>,
    sources: Vec<SourceFile>,
    warnings: Vec<String>,
}

/// Ids are 1..N in discovery order; names come from `sourcenames` or file stems.
fn user_regions(
    spec: &RawSpec,
    ctx: &ResolveContext<'_>,
    extensions: &[&str],
    hemisphere: Option<Hemisphere>,
) -> Result<UserRegions, RoiError> {
    let sourcedir = ctx.project_path(Path::new(&spec.require_str("sourcedir")?));
    let files: SourceFiles = spec.require("sourcefiles")?;
    let resolved = resolve_sources(&sourcedir, &files, extensions)?;
    let names = match spec.optional::<Vec<String>>("sourcenames")? {
        Some(names) if names.len() != resolved.files.len() => {
            return Err(RoiError::Config(
                ErrorInfo::new("sourcenames", "sourcenames must match the number of source files")
                    .with_context("names", names.len().to_string())
                    .with_context("files", resolved.files.len().to_string()),
            ))
        }
        Some(names) => names,
        None => resolved.stems.clone(),
    };

    let mut regions = Vec::with_capacity(names.len());
    let mut sources = Vec::with_capacity(names.len());
    for (idx, (path, name)) in resolved.files.into_iter().zip(names).enumerate() {
        let id = RegionId::from_raw(idx as u32 + 1);
        regions.push(RegionEntry {
            id,
            hemisphere,
            name: name.clone(),
        });
        sources.push(SourceFile {
            id,
            hemisphere,
            path,
            name,
        });
    }
    Ok(UserRegions {
        sourcedir,
        regions,
        sources,
        warnings: resolved.warnings,
    })
}

pub(crate) struct LabelResolver;

impl AtlasResolver for LabelResolver {
    const REQUIRED: &'static [&'static str] = &[
        "source",
        "manifold",
        "hemi",
        "sourcedir",
        "sourcefiles",
        "sourcelevel",
    ];
    const OPTIONAL: &'static [&'static str] = &["sourcenames"];

    fn resolve(
        name: &str,
        manifold: Manifold,
        spec: &RawSpec,
        ctx: &ResolveContext<'_>,
    ) -> Result<AtlasDescriptor, RoiError> {
        expect_manifold(manifold, Manifold::Surface, "label")?;
        let hemisphere: Hemisphere = spec.require_str("hemi")?.parse()?;
        let level = match spec.require_str("sourcelevel")?.to_ascii_lowercase().as_str() {
            "group" => SourceLevel::Group,
            "subject" => SourceLevel::Subject,
            other => {
                return Err(RoiError::Config(
                    ErrorInfo::new("sourcelevel", "sourcelevel must be group or subject")
                        .with_context("value", other),
                ))
            }
        };
        let user = user_regions(spec, ctx, LABEL_EXTENSIONS, Some(hemisphere))?;
        Ok(AtlasDescriptor {
            name: name.to_string(),
            kind: SourceKind::Label,
            manifold,
            variant: AtlasVariant::Label {
                hemisphere,
                sourcedir: user.sourcedir,
                level,
            },
            regions: user.regions,
            sources: user.sources,
            resolution: Resolution::Resolved,
            warnings: user.warnings,
        })
    }
}

pub(crate) struct MaskResolver;

impl AtlasResolver for MaskResolver {
    const REQUIRED: &'static [&'static str] = &["source", "manifold", "sourcedir", "sourcefiles"];
    const OPTIONAL: &'static [&'static str] = &["sourcenames"];

    fn resolve(
        name: &str,
        manifold: Manifold,
        spec: &RawSpec,
        ctx: &ResolveContext<'_>,
    ) -> Result<AtlasDescriptor, RoiError> {
        expect_manifold(manifold, Manifold::Volume, "mask")?;
        let user = user_regions(spec, ctx, MASK_EXTENSIONS, None)?;
        Ok(AtlasDescriptor {
            name: name.to_string(),
            kind: SourceKind::Mask,
            manifold,
            variant: AtlasVariant::Mask {
                sourcedir: user.sourcedir,
            },
            regions: user.regions,
            sources: user.sources,
            resolution: Resolution::Resolved,
            warnings: user.warnings,
        })
    }
}
