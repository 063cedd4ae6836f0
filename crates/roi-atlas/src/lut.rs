//! Colour lookup tables: FreeSurfer-style `id name r g b a` text.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use rand::Rng;
use roi_core::{ErrorInfo, Hemisphere, Manifold, RoiError};
use tracing::info;

use crate::catalog::RegionCatalog;

/// Id to name mapping read from a colour lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    names: BTreeMap<u32, String>,
}

impl LookupTable {
    /// Parses lookup-table text; blank and `#` lines are skipped.
    pub fn parse(text: &str) -> Result<Self, RoiError> {
        let mut names = BTreeMap::new();
        for (line_no, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut columns = trimmed.split_whitespace();
            let (Some(id), Some(name)) = (columns.next(), columns.next()) else {
                return Err(lut_error("lookup table row needs an id and a name", line_no));
            };
            let id: u32 = id
                .parse()
                .map_err(|_| lut_error("lookup table id is not an integer", line_no))?;
            names.insert(id, name.to_string());
        }
        Ok(Self { names })
    }

    /// Reads a lookup table; a missing file is a preprocess error.
    pub fn load(path: &Path) -> Result<Self, RoiError> {
        if !path.is_file() {
            return Err(RoiError::Preprocess(
                ErrorInfo::new("lut_missing", "lookup table does not exist")
                    .with_context("path", path.display().to_string()),
            ));
        }
        let text = fs::read_to_string(path).map_err(|err| RoiError::io("lut_read", path, err))?;
        Self::parse(&text).map_err(|err| err.with_context("path", path.display().to_string()))
    }

    /// Name stored for an id.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Name for an id, failing when the table lacks it.
    pub fn require(&self, id: u32) -> Result<&str, RoiError> {
        self.name(id).ok_or_else(|| {
            RoiError::Config(
                ErrorInfo::new("lut_region", "region not in lookup table")
                    .with_context("region", id.to_string()),
            )
        })
    }

    /// Number of ids in the table.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when the table holds no ids.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn lut_error(message: &str, line_no: usize) -> RoiError {
    RoiError::Config(
        ErrorInfo::new("lut_parse", message).with_context("line", (line_no + 1).to_string()),
    )
}

/// Renders one line per region id, id order, with random colours and alpha 0.
///
/// Surface catalogs hold one id space per hemisphere, so `scope` picks which
/// hemisphere to render; it is ignored for volumes.
pub fn render_lut<R: Rng + ?Sized>(
    catalog: &RegionCatalog,
    scope: Option<Hemisphere>,
    rng: &mut R,
) -> Result<String, RoiError> {
    if catalog.manifold() == Manifold::Surface && scope.is_none() {
        return Err(RoiError::Config(
            ErrorInfo::new("lut_scope", "surface lookup tables are written per hemisphere")
                .with_context("atlas", catalog.atlas()),
        ));
    }
    let mut text = String::new();
    for entry in catalog.scope_entries(scope) {
        let (id, name) = (entry.id, &entry.display_name);
        let [r, g, b]: [u8; 3] = rng.gen();
        // infallible for String
        let _ = writeln!(text, "{id}\t{name}\t\t\t{r}\t{g}\t{b}\t0");
    }
    Ok(text)
}

/// Writes [`render_lut`] output to `path`, creating parent directories.
pub fn write_lut<R: Rng + ?Sized>(
    path: &Path,
    catalog: &RegionCatalog,
    scope: Option<Hemisphere>,
    rng: &mut R,
) -> Result<(), RoiError> {
    let text = render_lut(catalog, scope, rng)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| RoiError::io("lut_mkdir", parent, err))?;
    }
    fs::write(path, text).map_err(|err| RoiError::io("lut_write", path, err))?;
    info!(atlas = %catalog.atlas(), path = %path.display(), "lookup table written");
    Ok(())
}
