//! Canonical id to name catalogs with hemisphere-aware naming.

use std::collections::{BTreeMap, BTreeSet};

use roi_core::{ErrorInfo, Hemisphere, Manifold, RegionId, RoiError};
use serde::{Deserialize, Serialize};

use crate::descriptor::{AtlasDescriptor, RegionIds};

/// One region in canonical extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Numeric id, unique within its hemisphere scope.
    pub id: RegionId,
    /// Hemisphere, when known.
    pub hemisphere: Option<Hemisphere>,
    /// Anatomical name without any hemisphere prefix.
    pub bare_name: String,
    /// Name written into databases and summaries.
    pub display_name: String,
}

/// Id to name mapping of an atlas, built once and shared by reference.
///
/// Entries are stored in extraction order: id-sorted for volumes, and for
/// surfaces grouped by hemisphere (left before right) and id-sorted inside
/// each group. Summary names are sorted separately by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCatalog {
    atlas: String,
    manifold: Manifold,
    hemispheres: Vec<Hemisphere>,
    entries: Vec<CatalogEntry>,
}

impl RegionCatalog {
    /// Builds the catalog of a resolved descriptor.
    pub fn build(descriptor: &AtlasDescriptor) -> Result<Self, RoiError> {
        descriptor.ensure_resolved()?;
        let manifold = descriptor.manifold();

        let mut seen = BTreeSet::new();
        for entry in descriptor.regions() {
            let scope = match manifold {
                Manifold::Volume => None,
                Manifold::Surface => entry.hemisphere,
            };
            if !seen.insert((scope, entry.id)) {
                return Err(RoiError::Config(
                    ErrorInfo::new("duplicate_region", "region id requested twice")
                        .with_context("atlas", descriptor.name())
                        .with_context("region", entry.id.to_string()),
                ));
            }
        }

        let mut entries: Vec<CatalogEntry> = descriptor
            .regions()
            .iter()
            .map(|entry| {
                let bare_name = match entry.hemisphere {
                    Some(hemi) => strip_hemisphere(&entry.name, hemi).to_string(),
                    None => entry.name.clone(),
                };
                CatalogEntry {
                    id: entry.id,
                    hemisphere: entry.hemisphere,
                    bare_name,
                    display_name: String::new(),
                }
            })
            .collect();

        match manifold {
            Manifold::Volume => {
                entries.sort_by_key(|entry| entry.id);
                for entry in &mut entries {
                    entry.display_name = entry.bare_name.clone();
                }
            }
            Manifold::Surface => {
                entries.sort_by_key(|entry| (entry.hemisphere, entry.id));
                let mut owners: BTreeMap<&str, BTreeSet<Option<Hemisphere>>> = BTreeMap::new();
                for entry in &entries {
                    owners
                        .entry(entry.bare_name.as_str())
                        .or_default()
                        .insert(entry.hemisphere);
                }
                let colliding: BTreeSet<String> = owners
                    .into_iter()
                    .filter(|(_, hemis)| hemis.len() > 1)
                    .map(|(name, _)| name.to_string())
                    .collect();
                for entry in &mut entries {
                    entry.display_name = match entry.hemisphere {
                        Some(hemi) if colliding.contains(&entry.bare_name) => {
                            format!("{}-{}", hemi.tag(), entry.bare_name)
                        }
                        _ => entry.bare_name.clone(),
                    };
                }
            }
        }

        Ok(Self {
            atlas: descriptor.name().to_string(),
            manifold,
            hemispheres: descriptor.hemispheres(),
            entries,
        })
    }

    /// Atlas the catalog was built from.
    pub fn atlas(&self) -> &str {
        &self.atlas
    }

    /// Volume or surface.
    pub fn manifold(&self) -> Manifold {
        self.manifold
    }

    /// Hemispheres in canonical order; empty for volumes.
    pub fn hemispheres(&self) -> &[Hemisphere] {
        &self.hemispheres
    }

    /// All entries in extraction order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the atlas has no regions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries of one surface hemisphere, in id order.
    pub fn hemisphere_entries(&self, hemi: Hemisphere) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.hemisphere == Some(hemi))
    }

    /// Id-sorted entries of one extraction scope: `None` for a volume, a
    /// hemisphere for a surface.
    pub fn scope_entries(&self, scope: Option<Hemisphere>) -> Vec<&CatalogEntry> {
        match (self.manifold, scope) {
            (Manifold::Volume, _) => self.entries.iter().collect(),
            (Manifold::Surface, Some(hemi)) => self.hemisphere_entries(hemi).collect(),
            (Manifold::Surface, None) => Vec::new(),
        }
    }

    /// Ids of [`RegionCatalog::scope_entries`].
    pub fn scope_ids(&self, scope: Option<Hemisphere>) -> Vec<RegionId> {
        self.scope_entries(scope)
            .into_iter()
            .map(|entry| entry.id)
            .collect()
    }

    /// Ids driving downstream extraction.
    pub fn region_ids(&self) -> RegionIds {
        match self.manifold {
            Manifold::Volume => RegionIds::Flat(self.scope_ids(None)),
            Manifold::Surface => RegionIds::PerHemisphere(
                self.hemispheres
                    .iter()
                    .map(|hemi| (*hemi, self.scope_ids(Some(*hemi))))
                    .collect(),
            ),
        }
    }

    /// Display name of a region within its scope.
    pub fn name(&self, id: RegionId, scope: Option<Hemisphere>) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| {
                entry.id == id && (self.manifold == Manifold::Volume || entry.hemisphere == scope)
            })
            .map(|entry| entry.display_name.as_str())
    }

    /// Display names sorted by name, for summaries.
    pub fn summary_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.display_name.clone())
            .collect();
        names.sort();
        names
    }
}

/// Removes a leading hemisphere marker (`lh-`, `Left-`) matching `hemi`.
pub fn strip_hemisphere(name: &str, hemi: Hemisphere) -> &str {
    let prefixes: [&str; 2] = match hemi {
        Hemisphere::Left => ["lh-", "Left-"],
        Hemisphere::Right => ["rh-", "Right-"],
    };
    prefixes
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}
