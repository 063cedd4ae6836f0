use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use roi_atlas::{resolve_named, write_lut, RegionCatalog};
use roi_core::Hemisphere;

use super::ProjectArgs;

#[derive(Args, Debug)]
pub struct LutArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    /// Atlas name declared in the project.
    pub atlas: String,
    /// Output path; surface atlases get one `<hemi>.`-prefixed file per hemisphere.
    #[arg(long)]
    pub out: PathBuf,
    /// Seed for reproducible colours.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &LutArgs) -> Result<(), Box<dyn Error>> {
    let config = args.project.load()?;
    let descriptor = resolve_named(&config, &args.atlas)?;
    let catalog = RegionCatalog::build(&descriptor)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    if catalog.hemispheres().is_empty() {
        write_lut(&args.out, &catalog, None, &mut rng)?;
        println!("{}", args.out.display());
        return Ok(());
    }
    for hemi in catalog.hemispheres() {
        let path = hemisphere_path(&args.out, *hemi)?;
        write_lut(&path, &catalog, Some(*hemi), &mut rng)?;
        println!("{}", path.display());
    }
    Ok(())
}

fn hemisphere_path(out: &Path, hemi: Hemisphere) -> Result<PathBuf, Box<dyn Error>> {
    let name = out
        .file_name()
        .ok_or_else(|| format!("--out has no file name: {}", out.display()))?;
    Ok(out.with_file_name(format!("{}.{}", hemi.tag(), name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hemisphere_files_sit_next_to_the_requested_path() {
        let path = hemisphere_path(Path::new("/tmp/luts/aparc.txt"), Hemisphere::Right)
            .expect("path");
        assert_eq!(path, PathBuf::from("/tmp/luts/rh.aparc.txt"));
        assert!(hemisphere_path(Path::new("/"), Hemisphere::Left).is_err());
    }
}
