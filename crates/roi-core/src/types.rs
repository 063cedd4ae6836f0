use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, RoiError};

/// Numeric identifier of a region inside an atlas image or annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(u32);

impl RegionId {
    /// Creates a new identifier from its raw integer representation.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the identifier shifted by a fixed hemisphere offset, or `None`
    /// when the shifted id does not fit.
    pub fn offset(&self, by: u32) -> Option<Self> {
        self.0.checked_add(by).map(Self)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Left or right half of the brain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    /// Left hemisphere, tagged `lh`.
    #[serde(rename = "lh")]
    Left,
    /// Right hemisphere, tagged `rh`.
    #[serde(rename = "rh")]
    Right,
}

impl Hemisphere {
    /// Both hemispheres in canonical iteration order.
    pub const ALL: [Hemisphere; 2] = [Hemisphere::Left, Hemisphere::Right];

    /// Short tag used in file names and display prefixes.
    pub fn tag(&self) -> &'static str {
        match self {
            Hemisphere::Left => "lh",
            Hemisphere::Right => "rh",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Hemisphere {
    type Err = RoiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lh" | "left" => Ok(Hemisphere::Left),
            "rh" | "right" => Ok(Hemisphere::Right),
            other => Err(RoiError::Config(
                ErrorInfo::new("hemisphere", "unknown hemisphere").with_context("value", other),
            )),
        }
    }
}

/// Whether atlas regions live in a 3-D volume or on a cortical surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manifold {
    /// Cortical surface mesh, counted in vertices.
    Surface,
    /// Volume image, counted in voxels.
    Volume,
}

impl Manifold {
    /// Unit used in database size column headers.
    pub fn unit(&self) -> &'static str {
        match self {
            Manifold::Surface => "vertices",
            Manifold::Volume => "voxels",
        }
    }

    /// Lower-case configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Manifold::Surface => "surface",
            Manifold::Volume => "volume",
        }
    }
}

impl fmt::Display for Manifold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Manifold {
    type Err = RoiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Manifold::Surface),
            "volume" => Ok(Manifold::Volume),
            other => Err(RoiError::Config(
                ErrorInfo::new("manifold", "unknown manifold").with_context("value", other),
            )),
        }
    }
}
