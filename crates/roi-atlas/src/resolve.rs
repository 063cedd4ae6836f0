//! Single dispatch point from a raw atlas entry to its per-kind resolver.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use roi_core::{ErrorInfo, Manifold, ProjectConfig, ProjectLayout, RawAttributes, RawSpec, RoiError};
use tracing::debug;

use crate::descriptor::AtlasDescriptor;
use crate::kind::SourceKind;
use crate::{parcellation, probabilistic, significance, user};

/// Shared inputs every resolver may consult.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    /// Project settings.
    pub config: &'a ProjectConfig,
    /// Paths inside the project's `roi/` tree.
    pub layout: ProjectLayout,
}

impl<'a> ResolveContext<'a> {
    /// Context for a loaded project.
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self {
            config,
            layout: ProjectLayout::new(config),
        }
    }

    /// Joins a relative configured path onto the project base path.
    pub fn project_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.basepath.join(path)
        }
    }
}

/// Per-kind resolution of a normalised atlas entry.
pub(crate) trait AtlasResolver {
    /// Fields every entry of this kind must carry.
    const REQUIRED: &'static [&'static str];
    /// Fields an entry of this kind may carry.
    const OPTIONAL: &'static [&'static str];

    /// Builds the descriptor once the field sets have been checked.
    fn resolve(
        name: &str,
        manifold: Manifold,
        spec: &RawSpec,
        ctx: &ResolveContext<'_>,
    ) -> Result<AtlasDescriptor, RoiError>;
}

fn resolve_with<R: AtlasResolver>(
    name: &str,
    spec: &RawSpec,
    ctx: &ResolveContext<'_>,
) -> Result<AtlasDescriptor, RoiError> {
    spec.check_fields(R::REQUIRED, R::OPTIONAL)?;
    let manifold: Manifold = spec.require_str("manifold")?.parse()?;
    R::resolve(name, manifold, spec, ctx)
}

/// Resolves a raw atlas entry into a validated descriptor.
pub fn resolve_atlas(
    name: &str,
    raw: &RawAttributes,
    ctx: &ResolveContext<'_>,
) -> Result<AtlasDescriptor, RoiError> {
    let spec = RawSpec::normalize(raw).map_err(|err| err.with_context("atlas", name))?;
    let kind: SourceKind = spec
        .require_str("source")
        .and_then(|source| source.parse())
        .map_err(|err| err.with_context("atlas", name))?;
    let descriptor = match kind {
        SourceKind::Parcellation => resolve_with::<parcellation::ParcellationResolver>(name, &spec, ctx),
        SourceKind::Probabilistic => {
            resolve_with::<probabilistic::ProbabilisticResolver>(name, &spec, ctx)
        }
        SourceKind::Significance => {
            resolve_with::<significance::SignificanceResolver>(name, &spec, ctx)
        }
        SourceKind::Label => resolve_with::<user::LabelResolver>(name, &spec, ctx),
        SourceKind::Mask => resolve_with::<user::MaskResolver>(name, &spec, ctx),
    }
    .map_err(|err| err.with_context("atlas", name))?;
    debug!(
        atlas = name,
        kind = %descriptor.kind(),
        manifold = %descriptor.manifold(),
        regions = descriptor.regions().len(),
        pending = descriptor.is_pending(),
        "atlas resolved"
    );
    Ok(descriptor)
}

/// Resolves a named atlas declared in the project.
pub fn resolve_named(config: &ProjectConfig, name: &str) -> Result<AtlasDescriptor, RoiError> {
    let raw = config.atlas(name)?;
    resolve_atlas(name, raw, &ResolveContext::new(config))
}

/// Fails when the configured manifold contradicts what the source provides.
pub(crate) fn expect_manifold(
    configured: Manifold,
    expected: Manifold,
    reason: &str,
) -> Result<(), RoiError> {
    if configured == expected {
        return Ok(());
    }
    Err(RoiError::Config(
        ErrorInfo::new("manifold_mismatch", "manifold does not match atlas source")
            .with_context("manifold", configured.as_str())
            .with_context("expected", expected.as_str())
            .with_context("source", reason),
    ))
}

/// Fails on a region code requested more than once.
pub(crate) fn ensure_unique_requests(codes: &[u32]) -> Result<(), RoiError> {
    let mut seen = BTreeSet::new();
    for code in codes {
        if !seen.insert(*code) {
            return Err(RoiError::Config(
                ErrorInfo::new("duplicate_region", "region requested more than once")
                    .with_context("region", code.to_string()),
            ));
        }
    }
    if codes.is_empty() {
        return Err(RoiError::Config(ErrorInfo::new(
            "regions",
            "at least one region must be requested",
        )));
    }
    Ok(())
}
