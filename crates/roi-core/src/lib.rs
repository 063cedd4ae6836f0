#![deny(missing_docs)]
#![doc = "Shared error taxonomy, value types and project configuration for ROI extraction databases."]

pub mod analysis;
pub mod config;
pub mod errors;
pub mod layout;
pub mod raw;
pub mod serde;
mod types;

pub use analysis::{Analysis, ExtractKind, FunctionalMask, MaskSign};
pub use config::{BetaSelection, ProjectConfig, SubjectSelection};
pub use errors::{ErrorInfo, RoiError};
pub use layout::ProjectLayout;
pub use raw::{RawAttributes, RawSpec};
pub use types::{Hemisphere, Manifold, RegionId};
