use std::error::Error;

use clap::Args;
use roi_core::ProjectLayout;
use roi_db::HistoryLedger;

use super::ProjectArgs;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Lists every tracked database with its last write and whether it still verifies.
pub fn run(args: &HistoryArgs) -> Result<(), Box<dyn Error>> {
    let config = args.project.load()?;
    let layout = ProjectLayout::new(&config);
    let ledger = HistoryLedger::load(&layout.ledger_path())?;
    if ledger.is_empty() {
        println!("no databases written for {}", config.project);
        return Ok(());
    }
    for (name, entry) in ledger.entries() {
        let state = if ledger.verify(name, &layout.database_path(name))? {
            "ok"
        } else {
            "modified"
        };
        println!("{name}\t{}\t{state}", entry.timestamp);
    }
    Ok(())
}
