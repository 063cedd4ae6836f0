use std::fs;

use roi_core::{ErrorInfo, Hemisphere, Manifold, RawSpec, RoiError};
use serde::Deserialize;
use tracing::info;

use crate::cluster::{cluster_dir, cluster_summary_path};
use crate::descriptor::{AtlasDescriptor, AtlasVariant, Resolution, ThresholdKind};
use crate::kind::SourceKind;
use crate::resolve::{expect_manifold, AtlasResolver, ResolveContext};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HemiField {
    One(String),
    Many(Vec<String>),
}

fn parse_hemispheres(field: HemiField) -> Result<Vec<Hemisphere>, RoiError> {
    let tags = match field {
        HemiField::One(tag) if tag.trim().eq_ignore_ascii_case("both") => {
            return Ok(Hemisphere::ALL.to_vec())
        }
        HemiField::One(tag) => vec![tag],
        HemiField::Many(tags) => tags,
    };
    let mut hemis = tags
        .iter()
        .map(|tag| tag.parse::<Hemisphere>())
        .collect::<Result<Vec<_>, _>>()?;
    hemis.sort();
    hemis.dedup();
    if hemis.is_empty() {
        return Err(RoiError::missing_field("hemi"));
    }
    Ok(hemis)
}

fn parse_threshold_kind(value: &str) -> Result<ThresholdKind, RoiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fdr" => Ok(ThresholdKind::Fdr),
        "abs" => Ok(ThresholdKind::Abs),
        other => Err(RoiError::Config(
            ErrorInfo::new("thresh", "threshold type must be fdr or abs").with_context("value", other),
        )),
    }
}

pub(crate) struct SignificanceResolver;

impl AtlasResolver for SignificanceResolver {
    const REQUIRED: &'static [&'static str] =
        &["source", "manifold", "hemi", "file", "thresh", "minsize"];
    const OPTIONAL: &'static [&'static str] = &[];

    fn resolve(
        name: &str,
        manifold: Manifold,
        spec: &RawSpec,
        ctx: &ResolveContext<'_>,
    ) -> Result<AtlasDescriptor, RoiError> {
        expect_manifold(manifold, Manifold::Surface, "significance")?;
        let hemispheres = parse_hemispheres(spec.require("hemi")?)?;
        let file = spec.require_str("file")?;
        let (kind, threshold): (String, f64) = spec.require("thresh")?;
        let threshold_kind = parse_threshold_kind(&kind)?;
        let minsize: f64 = spec.require("minsize")?;

        let mut descriptor = AtlasDescriptor {
            name: name.to_string(),
            kind: SourceKind::Significance,
            manifold,
            variant: AtlasVariant::Significance {
                hemispheres: hemispheres.clone(),
                file,
                threshold_kind,
                threshold,
                minsize,
                cluster_dir: cluster_dir(&ctx.layout, name),
            },
            regions: Vec::new(),
            sources: Vec::new(),
            resolution: Resolution::Pending {
                missing: hemispheres.clone(),
            },
            warnings: Vec::new(),
        };

        for hemi in hemispheres {
            let path = cluster_summary_path(&ctx.layout, name, hemi);
            if !path.is_file() {
                info!(atlas = name, hemi = %hemi, path = %path.display(), "cluster summary not generated yet");
                continue;
            }
            let text = fs::read_to_string(&path)
                .map_err(|err| RoiError::io("cluster_summary_read", &path, err))?;
            descriptor
                .complete_clusters(hemi, &text)
                .map_err(|err| err.with_context("path", path.display().to_string()))?;
        }
        Ok(descriptor)
    }
}
