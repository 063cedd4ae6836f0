//! Per-subject atlas state and the table paths derived from it.

use std::path::PathBuf;

use roi_core::{
    Analysis, ErrorInfo, ExtractKind, Hemisphere, Manifold, ProjectConfig, ProjectLayout, RoiError,
};
use tracing::debug;

use crate::descriptor::{AtlasDescriptor, AtlasVariant};
use crate::kind::SourceKind;

/// Input tables of one extraction scope for the current subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    /// Hemisphere of a surface scope; `None` for volumes.
    pub hemisphere: Option<Hemisphere>,
    /// Region sizes before masking.
    pub size: PathBuf,
    /// Region sizes after the functional mask.
    pub masked_size: PathBuf,
    /// Average functional values per region.
    pub functional: PathBuf,
}

/// An atlas bound to a paradigm, a subject and an analysis.
///
/// Each step must happen in order; operations that depend on a skipped step
/// fail with an init error naming it.
#[derive(Debug, Clone)]
pub struct AtlasSession<'a> {
    descriptor: &'a AtlasDescriptor,
    config: &'a ProjectConfig,
    layout: ProjectLayout,
    paradigm: Option<String>,
    subject: Option<String>,
    analysis: Option<Analysis>,
}

impl<'a> AtlasSession<'a> {
    /// Starts a session; a project with a single paradigm initialises it directly.
    pub fn new(descriptor: &'a AtlasDescriptor, config: &'a ProjectConfig) -> Self {
        Self {
            descriptor,
            config,
            layout: ProjectLayout::new(config),
            paradigm: config.single_paradigm().map(str::to_string),
            subject: None,
            analysis: None,
        }
    }

    /// Descriptor the session works on.
    pub fn descriptor(&self) -> &AtlasDescriptor {
        self.descriptor
    }

    /// Binds a declared paradigm.
    pub fn init_paradigm(&mut self, paradigm: &str) -> Result<(), RoiError> {
        self.config.paradigm_code(paradigm)?;
        self.paradigm = Some(paradigm.to_string());
        Ok(())
    }

    /// Binds a subject; native-space parcellations need a paradigm first.
    pub fn init_subject(&mut self, subject: &str) -> Result<(), RoiError> {
        if self.descriptor.kind() == SourceKind::Parcellation && self.paradigm.is_none() {
            return Err(RoiError::init_required("paradigm").with_context("atlas", self.descriptor.name()));
        }
        self.subject = Some(subject.to_string());
        Ok(())
    }

    /// Binds an analysis; a subject must already be set.
    pub fn init_analysis(&mut self, analysis: Analysis) -> Result<(), RoiError> {
        if self.subject.is_none() {
            return Err(RoiError::init_required("subject").with_context("atlas", self.descriptor.name()));
        }
        self.analysis = Some(analysis);
        Ok(())
    }

    /// Current paradigm.
    pub fn paradigm(&self) -> Result<&str, RoiError> {
        self.paradigm
            .as_deref()
            .ok_or_else(|| RoiError::init_required("paradigm"))
    }

    /// Current subject.
    pub fn subject(&self) -> Result<&str, RoiError> {
        self.subject
            .as_deref()
            .ok_or_else(|| RoiError::init_required("subject"))
    }

    /// Current analysis.
    pub fn analysis(&self) -> Result<&Analysis, RoiError> {
        self.analysis
            .as_ref()
            .ok_or_else(|| RoiError::init_required("analysis"))
    }

    /// Extraction scopes: one per hemisphere for surfaces, a single volume scope otherwise.
    pub fn scopes(&self) -> Vec<Option<Hemisphere>> {
        match self.descriptor.manifold() {
            Manifold::Volume => vec![None],
            Manifold::Surface => self.descriptor.hemispheres().into_iter().map(Some).collect(),
        }
    }

    fn scoped_name(&self, scope: Option<Hemisphere>, stem: &str, ext: &str) -> String {
        match scope {
            Some(hemi) => format!("{}.{stem}.{ext}", hemi.tag()),
            None => format!("{stem}.{ext}"),
        }
    }

    /// Atlas image and size table of one scope.
    fn atlas_files(&self, scope: Option<Hemisphere>) -> Result<(PathBuf, PathBuf), RoiError> {
        let name = self.descriptor.name();
        let kind_dir = self.descriptor.kind().tree_dir();
        let (dir, stem, image_ext) = match self.descriptor.variant() {
            AtlasVariant::Parcellation { .. } => {
                let manifold = self.descriptor.manifold();
                let mut dir = self.layout.atlas_kind_dir(kind_dir).join(manifold.as_str());
                if manifold == Manifold::Volume {
                    dir = dir.join(self.paradigm()?);
                }
                let ext = match manifold {
                    Manifold::Volume => "mgz",
                    Manifold::Surface => "annot",
                };
                (dir.join(self.subject()?).join(name), name.to_string(), ext)
            }
            AtlasVariant::Probabilistic { probthresh } => (
                self.layout.atlas_kind_dir(kind_dir),
                format!("HarvardOxford-{probthresh}"),
                "nii",
            ),
            AtlasVariant::Significance { .. } | AtlasVariant::Label { .. } => (
                self.layout
                    .project_atlas_dir(kind_dir)
                    .join(self.subject()?)
                    .join(name),
                name.to_string(),
                "annot",
            ),
            AtlasVariant::Mask { .. } => (
                self.layout.project_atlas_dir(kind_dir),
                name.to_string(),
                "mgz",
            ),
        };
        Ok((
            dir.join(self.scoped_name(scope, &stem, image_ext)),
            dir.join(self.scoped_name(scope, &stem, "stats")),
        ))
    }

    /// Atlas image read by the extraction tools.
    pub fn atlas_image(&self, scope: Option<Hemisphere>) -> Result<PathBuf, RoiError> {
        self.atlas_files(scope).map(|(image, _)| image)
    }

    /// First-level statistic image the analysis extracts from.
    pub fn source_image(&self, scope: Option<Hemisphere>) -> Result<PathBuf, RoiError> {
        let analysis = self.analysis()?;
        let subject = self.subject()?;
        let stem = match analysis.extract {
            ExtractKind::Beta => "task_betas",
            ExtractKind::Contrast => "all_contrasts",
        };
        Ok(self
            .layout
            .levelone_dir(analysis.extract.as_str(), &analysis.paradigm, subject)
            .join(self.scoped_name(scope, stem, "mgz")))
    }

    /// Size, masked-size and functional table paths, one set per scope.
    pub fn table_paths(&self) -> Result<Vec<TablePaths>, RoiError> {
        let analysis = self.analysis()?;
        let subject = self.subject()?;
        let analysis_name = analysis.name();
        self.scopes()
            .into_iter()
            .map(|scope| {
                let (_, size) = self.atlas_files(scope)?;
                let dir = self
                    .layout
                    .analysis_dir(&analysis_name, self.descriptor.name(), scope);
                Ok(TablePaths {
                    hemisphere: scope,
                    size,
                    masked_size: dir.join("stats").join(format!("{subject}.stats")),
                    functional: dir.join("extracttxt").join(format!("{subject}.txt")),
                })
            })
            .collect()
    }

    /// Checks that the atlas image and the subject's source image exist.
    pub fn check_prerequisites(&self, dry_run: bool) -> Result<(), RoiError> {
        if dry_run {
            debug!(atlas = %self.descriptor.name(), "prerequisite checks skipped in dry run");
            return Ok(());
        }
        self.descriptor.ensure_resolved()?;
        for scope in self.scopes() {
            let atlas = self.atlas_image(scope)?;
            if !atlas.is_file() {
                return Err(missing_artifact("atlas_missing", "the atlas image does not exist", &atlas, self));
            }
            let source = self.source_image(scope)?;
            if !source.is_file() {
                return Err(missing_artifact("source_missing", "the source image does not exist", &source, self));
            }
        }
        Ok(())
    }
}

fn missing_artifact(code: &str, message: &str, path: &std::path::Path, session: &AtlasSession<'_>) -> RoiError {
    let mut info = ErrorInfo::new(code, message)
        .with_context("atlas", session.descriptor.name())
        .with_context("path", path.display().to_string());
    if let Some(subject) = &session.subject {
        info = info.with_context("subject", subject.as_str());
    }
    RoiError::Preprocess(info)
}
