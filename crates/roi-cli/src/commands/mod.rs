pub mod atlas;
pub mod build_db;
pub mod check;
pub mod history;
pub mod lut;

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use roi_core::{ProjectConfig, SubjectSelection};

/// Project file shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// YAML project configuration.
    #[arg(long)]
    pub config: PathBuf,
}

impl ProjectArgs {
    pub fn load(&self) -> Result<ProjectConfig, Box<dyn Error>> {
        Ok(ProjectConfig::load(&self.config)?)
    }
}

/// Which subjects a run covers; all groups when neither flag is given.
#[derive(Args, Debug, Clone, Default)]
pub struct SubjectArgs {
    /// Restrict the run to one subject group.
    #[arg(long, conflicts_with = "subject")]
    pub group: Option<String>,
    /// Explicit subjects, in the order given.
    #[arg(long = "subject", value_name = "ID")]
    pub subject: Vec<String>,
}

impl SubjectArgs {
    pub fn selection(&self) -> SubjectSelection {
        match (&self.group, self.subject.is_empty()) {
            (Some(group), _) => SubjectSelection::Group(group.clone()),
            (None, false) => SubjectSelection::List(self.subject.clone()),
            (None, true) => SubjectSelection::All,
        }
    }
}
