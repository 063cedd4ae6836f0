use std::error::Error;

use clap::Args;
use roi_atlas::{resolve_named, AtlasSession, RegionCatalog};
use roi_core::{Analysis, ProjectLayout};
use roi_db::{write_database, DatabaseAssembler, FsTableSource, FunctionalLayout};

use super::{ProjectArgs, SubjectArgs};

#[derive(Args, Debug)]
pub struct BuildDbArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Atlas name declared in the project.
    pub atlas: String,
    /// Index into the project's analysis list.
    #[arg(long)]
    pub analysis: usize,
    #[command(flatten)]
    pub subjects: SubjectArgs,
    /// Orientation of the functional tables.
    #[arg(long, default_value = "condition-major")]
    pub layout: FunctionalLayout,
}

/// Assembles the database for one atlas and analysis and writes it.
pub fn run(args: &BuildDbArgs) -> Result<(), Box<dyn Error>> {
    let config = args.project.load()?;
    let descriptor = resolve_named(&config, &args.atlas)?;
    let catalog = RegionCatalog::build(&descriptor)?;
    let analysis = Analysis::from_index(&config, args.analysis)?;
    let subjects = config.select_subjects(&args.subjects.selection())?;

    let mut session = AtlasSession::new(&descriptor, &config);
    session.init_paradigm(&analysis.paradigm)?;
    let mut source = FsTableSource::new(session, analysis.clone(), args.layout);
    let database = DatabaseAssembler::new(&catalog, &analysis).assemble(&subjects, &mut source)?;

    let outcome = write_database(&ProjectLayout::new(&config), &database)?;
    if let Some(archived) = &outcome.archived {
        println!("archived {}", archived.display());
    }
    println!("wrote {} ({} rows)", outcome.path.display(), database.len());
    Ok(())
}
