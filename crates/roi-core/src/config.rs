//! YAML project configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, RoiError};
use crate::raw::RawAttributes;
use crate::serde::from_yaml_slice;

/// Project-wide settings loaded from a single YAML file.
///
/// The value is passed by reference into every resolver, session and
/// assembler; nothing reads it from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used in database and atlas directory names.
    pub project: String,
    /// Root under which the `roi/` tree lives.
    pub basepath: PathBuf,
    /// Subject groups, keyed by group name.
    #[serde(default)]
    pub subjects: BTreeMap<String, Vec<String>>,
    /// Paradigm full names mapped to their short codes.
    #[serde(default)]
    pub paradigms: IndexMap<String, String>,
    /// Condition names per paradigm.
    #[serde(default)]
    pub conditions: BTreeMap<String, Vec<String>>,
    /// Number of HRF basis components estimated per condition.
    #[serde(default = "default_hrf_components")]
    pub hrfcomponents: u32,
    /// HRF components written into beta databases.
    #[serde(default)]
    pub betastoextract: BetaSelection,
    /// Contrast names and indices per paradigm, in declared order.
    #[serde(default)]
    pub contrasts: BTreeMap<String, IndexMap<String, u32>>,
    /// Analysis entries, resolved lazily into [`crate::analysis::Analysis`].
    #[serde(default)]
    pub analyses: Vec<RawAttributes>,
    /// Atlas entries keyed by atlas name, kept loosely typed until resolution.
    #[serde(default)]
    pub atlases: IndexMap<String, RawAttributes>,
}

fn default_hrf_components() -> u32 {
    1
}

/// Which HRF components to extract: `all`, one index, or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BetaSelection {
    /// A single component index.
    Index(u32),
    /// An explicit set of component indices.
    Indices(Vec<u32>),
    /// The `all` keyword.
    Keyword(String),
}

impl Default for BetaSelection {
    fn default() -> Self {
        BetaSelection::Keyword("all".to_string())
    }
}

impl BetaSelection {
    /// Sorted, deduplicated component indices in `1..=hrf_components`.
    pub fn components(&self, hrf_components: u32) -> Result<Vec<u32>, RoiError> {
        let mut picked = match self {
            BetaSelection::Keyword(word) if word.eq_ignore_ascii_case("all") => {
                (1..=hrf_components).collect::<Vec<_>>()
            }
            BetaSelection::Keyword(word) => {
                return Err(RoiError::Config(
                    ErrorInfo::new("betastoextract", "expected 'all', an index or a list")
                        .with_context("value", word.as_str()),
                ))
            }
            BetaSelection::Index(index) => vec![*index],
            BetaSelection::Indices(indices) => indices.clone(),
        };
        picked.sort_unstable();
        picked.dedup();
        if let Some(bad) = picked.iter().find(|c| **c == 0 || **c > hrf_components) {
            return Err(RoiError::Config(
                ErrorInfo::new("betastoextract", "component outside hrfcomponents")
                    .with_context("component", bad.to_string())
                    .with_context("hrfcomponents", hrf_components.to_string()),
            ));
        }
        Ok(picked)
    }
}

/// How the caller picks subjects for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectSelection {
    /// Every group, in sorted group order.
    All,
    /// One named group.
    Group(String),
    /// An explicit list, used as given.
    List(Vec<String>),
}

impl ProjectConfig {
    /// Reads a project file; a relative `basepath` is taken relative to the file.
    pub fn load(path: &Path) -> Result<Self, RoiError> {
        let bytes = fs::read(path).map_err(|err| RoiError::io("config_read", path, err))?;
        let mut config: ProjectConfig = from_yaml_slice(&bytes)
            .map_err(|err| err.with_context("path", path.display().to_string()))?;
        if config.basepath.is_relative() {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            config.basepath = parent.join(&config.basepath);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the project-level invariants that do not depend on any atlas.
    pub fn validate(&self) -> Result<(), RoiError> {
        if self.project.trim().is_empty() {
            return Err(RoiError::missing_field("project"));
        }
        if self.hrfcomponents == 0 {
            return Err(RoiError::Config(ErrorInfo::new(
                "hrfcomponents",
                "hrfcomponents must be at least 1",
            )));
        }
        self.betastoextract.components(self.hrfcomponents)?;
        Ok(())
    }

    /// Resolves a subject selection to an ordered subject list.
    pub fn select_subjects(&self, selection: &SubjectSelection) -> Result<Vec<String>, RoiError> {
        match selection {
            SubjectSelection::All => Ok(self
                .subjects
                .values()
                .flat_map(|group| sorted(group))
                .collect()),
            SubjectSelection::Group(name) => self
                .subjects
                .get(name)
                .map(|group| sorted(group))
                .ok_or_else(|| {
                    RoiError::Config(
                        ErrorInfo::new("unknown_group", "subject group not declared")
                            .with_context("group", name.as_str()),
                    )
                }),
            SubjectSelection::List(list) => Ok(list.clone()),
        }
    }

    /// Group a subject belongs to, if any.
    pub fn group_of(&self, subject: &str) -> Option<&str> {
        self.subjects
            .iter()
            .find(|(_, members)| members.iter().any(|member| member == subject))
            .map(|(group, _)| group.as_str())
    }

    /// Short code for a paradigm, failing on undeclared paradigms.
    pub fn paradigm_code(&self, paradigm: &str) -> Result<&str, RoiError> {
        self.paradigms
            .get(paradigm)
            .map(String::as_str)
            .ok_or_else(|| unknown_paradigm(paradigm))
    }

    /// The sole paradigm when exactly one is declared.
    pub fn single_paradigm(&self) -> Option<&str> {
        if self.paradigms.len() == 1 {
            self.paradigms.keys().next().map(String::as_str)
        } else {
            None
        }
    }

    /// Raw attributes of a named atlas.
    pub fn atlas(&self, name: &str) -> Result<&RawAttributes, RoiError> {
        self.atlases.get(name).ok_or_else(|| {
            RoiError::Config(
                ErrorInfo::new("unknown_atlas", "atlas not declared in project")
                    .with_context("atlas", name),
            )
        })
    }
}

pub(crate) fn unknown_paradigm(paradigm: &str) -> RoiError {
    RoiError::Config(
        ErrorInfo::new("unknown_paradigm", "paradigm not declared in project")
            .with_context("paradigm", paradigm),
    )
}

fn sorted(group: &[String]) -> Vec<String> {
    let mut members = group.to_vec();
    members.sort();
    members
}
