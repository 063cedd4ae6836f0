use std::error::Error;

use clap::Args;
use roi_atlas::{resolve_named, AtlasSession};
use roi_core::Analysis;
use tracing::warn;

use super::{ProjectArgs, SubjectArgs};

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Atlas name declared in the project.
    pub atlas: String,
    /// Index into the project's analysis list.
    #[arg(long)]
    pub analysis: usize,
    #[command(flatten)]
    pub subjects: SubjectArgs,
    /// Skip existence checks and only print the derived paths.
    #[arg(long)]
    pub dry_run: bool,
}

/// Verifies that every selected subject has its atlas and source images.
pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let config = args.project.load()?;
    let descriptor = resolve_named(&config, &args.atlas)?;
    let analysis = Analysis::from_index(&config, args.analysis)?;
    let subjects = config.select_subjects(&args.subjects.selection())?;

    let mut session = AtlasSession::new(&descriptor, &config);
    session.init_paradigm(&analysis.paradigm)?;
    let mut failures = 0usize;
    for subject in &subjects {
        session.init_subject(subject)?;
        session.init_analysis(analysis.clone())?;
        match session.check_prerequisites(args.dry_run) {
            Ok(()) => {
                for paths in session.table_paths()? {
                    let scope = paths.hemisphere.map(|hemi| hemi.tag()).unwrap_or("-");
                    println!(
                        "{subject}\t{scope}\t{}\t{}\t{}",
                        paths.size.display(),
                        paths.masked_size.display(),
                        paths.functional.display()
                    );
                }
            }
            Err(err) => {
                warn!(subject = %subject, error = %err, "prerequisite missing");
                println!("{subject}\tmissing\t{}", err.info().message);
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} of {} subjects are missing prerequisites", subjects.len()).into());
    }
    Ok(())
}
