use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    atlas::{self, AtlasArgs},
    build_db::{self, BuildDbArgs},
    check::{self, CheckArgs},
    history::{self, HistoryArgs},
    lut::{self, LutArgs},
};

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "roi", about = "ROI atlas resolution and extraction databases")]
struct Cli {
    /// Log filter, e.g. `info` or `roi_db=debug`; `ROI_LOG` takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an atlas and print its region summary.
    Atlas(AtlasArgs),
    /// Write a colour lookup table for an atlas.
    Lut(LutArgs),
    /// Check that atlas and source images exist for each subject.
    Check(CheckArgs),
    /// Assemble and write the extraction database for an atlas and analysis.
    BuildDb(BuildDbArgs),
    /// List written databases and their last write stamps.
    History(HistoryArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_json)?;
    match cli.command {
        Command::Atlas(args) => atlas::run(&args),
        Command::Lut(args) => lut::run(&args),
        Command::Check(args) => check::run(&args),
        Command::BuildDb(args) => build_db::run(&args),
        Command::History(args) => history::run(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roi_core::SubjectSelection;
    use roi_db::FunctionalLayout;

    #[test]
    fn build_db_parses_layout_and_subjects() {
        let cli = Cli::try_parse_from([
            "roi",
            "build-db",
            "--config",
            "project.yaml",
            "aseg",
            "--analysis",
            "1",
            "--subject",
            "S2",
            "--subject",
            "S1",
            "--layout",
            "region-major",
            "--log-level",
            "debug",
        ])
        .expect("parse");
        assert_eq!(cli.log_level, "debug");
        let Command::BuildDb(args) = cli.command else {
            panic!("expected build-db");
        };
        assert_eq!(args.analysis, 1);
        assert_eq!(args.layout, FunctionalLayout::RegionMajor);
        assert_eq!(
            args.subjects.selection(),
            SubjectSelection::List(vec!["S2".to_string(), "S1".to_string()])
        );
    }

    #[test]
    fn group_and_subject_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "roi", "check", "--config", "p.yaml", "aseg", "--analysis", "0", "--group",
            "patients", "--subject", "P1",
        ]);
        assert!(parsed.is_err());
    }
}
