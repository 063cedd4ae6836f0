#![deny(missing_docs)]
#![doc = "Atlas resolution, region catalogs and per-subject atlas sessions."]

pub mod catalog;
pub mod cluster;
pub mod descriptor;
pub mod kind;
pub mod lut;
mod parcellation;
pub mod probabilistic;
pub mod resolve;
pub mod session;
mod significance;
pub mod sources;
pub mod summary;
mod user;

pub use catalog::{strip_hemisphere, CatalogEntry, RegionCatalog};
pub use descriptor::{
    AtlasDescriptor, AtlasVariant, ParcellationFile, RegionEntry, RegionIds, Resolution,
    SourceFile, SourceLevel, ThresholdKind,
};
pub use kind::SourceKind;
pub use lut::{render_lut, write_lut, LookupTable};
pub use resolve::{resolve_atlas, resolve_named, ResolveContext};
pub use session::{AtlasSession, TablePaths};
pub use summary::AtlasSummary;
