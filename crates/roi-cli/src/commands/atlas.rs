use std::error::Error;

use clap::Args;
use roi_atlas::{resolve_named, AtlasSummary};

use super::ProjectArgs;

#[derive(Args, Debug)]
pub struct AtlasArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Atlas name declared in the project.
    pub atlas: String,
    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Resolves one atlas and prints its summary.
pub fn run(args: &AtlasArgs) -> Result<(), Box<dyn Error>> {
    let config = args.project.load()?;
    let descriptor = resolve_named(&config, &args.atlas)?;
    let summary = AtlasSummary::new(&descriptor);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
