//! Deterministic paths inside the project's `roi/` tree.

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::types::Hemisphere;

/// Path builder rooted at `<basepath>/roi` for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    roi_dir: PathBuf,
    project: String,
}

impl ProjectLayout {
    /// Builds the layout for a loaded project.
    pub fn new(config: &ProjectConfig) -> Self {
        Self::from_parts(&config.basepath, &config.project)
    }

    /// Builds a layout from an explicit base path and project name.
    pub fn from_parts(basepath: &Path, project: &str) -> Self {
        Self {
            roi_dir: basepath.join("roi"),
            project: project.to_string(),
        }
    }

    /// `<basepath>/roi`.
    pub fn roi_dir(&self) -> &Path {
        &self.roi_dir
    }

    /// Project name the layout was built for.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// `<roi>/atlases/<kind>`.
    pub fn atlas_kind_dir(&self, kind: &str) -> PathBuf {
        self.roi_dir.join("atlases").join(kind)
    }

    /// `<roi>/atlases/<kind>/<project>` for project-scoped atlas kinds.
    pub fn project_atlas_dir(&self, kind: &str) -> PathBuf {
        self.atlas_kind_dir(kind).join(&self.project)
    }

    /// `<roi>/analysis/<project>`.
    pub fn analysis_root(&self) -> PathBuf {
        self.roi_dir.join("analysis").join(&self.project)
    }

    /// `<roi>/analysis/<project>/<analysis>/<atlas>[/<hemi>]`.
    pub fn analysis_dir(&self, analysis: &str, atlas: &str, hemi: Option<Hemisphere>) -> PathBuf {
        let dir = self.analysis_root().join(analysis).join(atlas);
        match hemi {
            Some(hemi) => dir.join(hemi.tag()),
            None => dir,
        }
    }

    /// Directory holding the primary database artifacts.
    pub fn database_dir(&self) -> PathBuf {
        self.analysis_root().join("databases")
    }

    /// `<dbdir>/<name>.txt`.
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.database_dir().join(format!("{name}.txt"))
    }

    /// `<dbdir>/.<project>_history.json`.
    pub fn ledger_path(&self) -> PathBuf {
        self.database_dir()
            .join(format!(".{}_history.json", self.project))
    }

    /// `<dbdir>/.old`.
    pub fn archive_dir(&self) -> PathBuf {
        self.database_dir().join(".old")
    }

    /// First-level statistic images for one paradigm and subject.
    pub fn levelone_dir(&self, extract: &str, paradigm: &str, subject: &str) -> PathBuf {
        self.roi_dir
            .join("levelone")
            .join(extract)
            .join(paradigm)
            .join(subject)
    }
}
