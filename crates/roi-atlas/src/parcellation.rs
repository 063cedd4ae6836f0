use std::path::Path;

use roi_core::{ErrorInfo, Hemisphere, Manifold, RawSpec, RegionId, RoiError};

use crate::descriptor::{AtlasDescriptor, AtlasVariant, ParcellationFile, RegionEntry, Resolution};
use crate::kind::SourceKind;
use crate::lut::LookupTable;
use crate::resolve::{ensure_unique_requests, expect_manifold, AtlasResolver, ResolveContext};

/// Requested subcortical code to (left id, right id, structure) in `aseg.mgz`.
const SUBCORTICAL_PAIRS: &[(u32, u32, u32, &str)] = &[
    (1, 10, 49, "Thalamus"),
    (2, 11, 50, "Caudate"),
    (3, 12, 51, "Putamen"),
    (4, 13, 52, "Pallidum"),
    (5, 17, 53, "Hippocampus"),
    (6, 18, 54, "Amygdala"),
    (7, 26, 58, "Accumbens-area"),
    (8, 28, 60, "VentralDC"),
];

/// Desikan-Killiany structures, indexed by cortical code.
const DESIKAN_KILLIANY: &[&str] = &[
    "unknown",
    "bankssts",
    "caudalanteriorcingulate",
    "caudalmiddlefrontal",
    "corpuscallosum",
    "cuneus",
    "entorhinal",
    "fusiform",
    "inferiorparietal",
    "inferiortemporal",
    "isthmuscingulate",
    "lateraloccipital",
    "lateralorbitofrontal",
    "lingual",
    "medialorbitofrontal",
    "middletemporal",
    "parahippocampal",
    "paracentral",
    "parsopercularis",
    "parsorbitalis",
    "parstriangularis",
    "pericalcarine",
    "postcentral",
    "posteriorcingulate",
    "precentral",
    "precuneus",
    "rostralanteriorcingulate",
    "rostralmiddlefrontal",
    "superiorfrontal",
    "superiorparietal",
    "superiortemporal",
    "supramarginal",
    "frontalpole",
    "temporalpole",
    "transversetemporal",
    "insula",
];

const LEFT_CORTEX_OFFSET: u32 = 1000;
const RIGHT_CORTEX_OFFSET: u32 = 2000;

pub(crate) struct ParcellationResolver;

impl AtlasResolver for ParcellationResolver {
    const REQUIRED: &'static [&'static str] = &["source", "manifold", "fname", "regions"];
    const OPTIONAL: &'static [&'static str] = &["lut"];

    fn resolve(
        name: &str,
        manifold: Manifold,
        spec: &RawSpec,
        ctx: &ResolveContext<'_>,
    ) -> Result<AtlasDescriptor, RoiError> {
        let file = ParcellationFile::parse(&spec.require_str("fname")?)?;
        expect_manifold(manifold, file.manifold(), file.file_name())?;
        let codes: Vec<u32> = spec.require("regions")?;
        ensure_unique_requests(&codes)?;
        let lut = spec
            .optional::<String>("lut")?
            .map(|path| LookupTable::load(&ctx.project_path(Path::new(&path))))
            .transpose()?;

        let regions = match file {
            ParcellationFile::Aseg => subcortical_regions(&codes, lut.as_ref())?,
            ParcellationFile::Aparc => desikan_regions(&codes, lut.as_ref())?,
            ParcellationFile::Aparc2009s => {
                let lut = lut.ok_or_else(|| {
                    RoiError::missing_field("lut").with_context("fname", file.file_name())
                })?;
                destrieux_regions(&codes, &lut)?
            }
        };

        Ok(AtlasDescriptor {
            name: name.to_string(),
            kind: SourceKind::Parcellation,
            manifold,
            variant: AtlasVariant::Parcellation { file },
            regions,
            sources: Vec::new(),
            resolution: Resolution::Resolved,
            warnings: Vec::new(),
        })
    }
}

fn unknown_code(code: u32, fname: &str) -> RoiError {
    RoiError::Config(
        ErrorInfo::new("region_code", "region code not defined for parcellation")
            .with_context("region", code.to_string())
            .with_context("fname", fname),
    )
}

fn subcortical_regions(codes: &[u32], lut: Option<&LookupTable>) -> Result<Vec<RegionEntry>, RoiError> {
    let mut regions = Vec::with_capacity(codes.len() * 2);
    for code in codes {
        let (_, left, right, structure) = SUBCORTICAL_PAIRS
            .iter()
            .find(|(requested, ..)| requested == code)
            .ok_or_else(|| unknown_code(*code, "aseg.mgz"))?;
        for (hemi, id, prefix) in [
            (Hemisphere::Left, *left, "Left"),
            (Hemisphere::Right, *right, "Right"),
        ] {
            let name = match lut {
                Some(lut) => lut.require(id)?.to_string(),
                None => format!("{prefix}-{structure}"),
            };
            regions.push(RegionEntry {
                id: RegionId::from_raw(id),
                hemisphere: Some(hemi),
                name,
            });
        }
    }
    Ok(regions)
}

/// Cortical codes must stay below the left block so ids never cross into the right one.
fn cortical_id(code: u32, offset: u32) -> Result<RegionId, RoiError> {
    let shifted = if code < LEFT_CORTEX_OFFSET {
        RegionId::from_raw(code).offset(offset)
    } else {
        None
    };
    shifted.ok_or_else(|| {
        RoiError::Config(
            ErrorInfo::new("region_code", "cortical region code out of range")
                .with_context("region", code.to_string())
                .with_context("limit", LEFT_CORTEX_OFFSET.to_string()),
        )
    })
}

fn desikan_regions(codes: &[u32], lut: Option<&LookupTable>) -> Result<Vec<RegionEntry>, RoiError> {
    let mut regions = Vec::with_capacity(codes.len() * 2);
    for hemi in Hemisphere::ALL {
        let offset = match hemi {
            Hemisphere::Left => LEFT_CORTEX_OFFSET,
            Hemisphere::Right => RIGHT_CORTEX_OFFSET,
        };
        for code in codes {
            let id = cortical_id(*code, offset)?;
            let name = match lut {
                Some(lut) => lut.require(id.as_raw())?.to_string(),
                None => {
                    let structure = DESIKAN_KILLIANY
                        .get(*code as usize)
                        .ok_or_else(|| unknown_code(*code, "aparc.annot"))?;
                    format!("ctx-{}-{structure}", hemi.tag())
                }
            };
            regions.push(RegionEntry {
                id,
                hemisphere: Some(hemi),
                name,
            });
        }
    }
    Ok(regions)
}

fn destrieux_regions(codes: &[u32], lut: &LookupTable) -> Result<Vec<RegionEntry>, RoiError> {
    let mut regions = Vec::with_capacity(codes.len() * 2);
    for hemi in Hemisphere::ALL {
        for code in codes {
            regions.push(RegionEntry {
                id: RegionId::from_raw(*code),
                hemisphere: Some(hemi),
                name: lut.require(*code)?.to_string(),
            });
        }
    }
    Ok(regions)
}
