//! Analysis entries: what is extracted, from which paradigm, under which mask.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{unknown_paradigm, ProjectConfig};
use crate::errors::{ErrorInfo, RoiError};
use crate::raw::{RawAttributes, RawSpec};

const REQUIRED: &[&str] = &["par", "extract"];
const OPTIONAL: &[&str] = &["maskpar", "maskcon", "maskthresh", "masksign"];

/// Functional measurement written into each database row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractKind {
    /// Task-response estimates, one column per condition (and HRF component).
    Beta,
    /// Contrast values, one column per declared contrast.
    Contrast,
}

impl ExtractKind {
    /// Lower-case configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractKind::Beta => "beta",
            ExtractKind::Contrast => "contrast",
        }
    }
}

impl fmt::Display for ExtractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractKind {
    type Err = RoiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beta" => Ok(ExtractKind::Beta),
            "contrast" => Ok(ExtractKind::Contrast),
            "timecourse" => Err(RoiError::Config(
                ErrorInfo::new("extract", "timecourse extraction is not supported")
                    .with_context("value", "timecourse"),
            )),
            other => Err(RoiError::Config(
                ErrorInfo::new("extract", "unknown extraction type").with_context("value", other),
            )),
        }
    }
}

/// Which side of the threshold survives the functional mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskSign {
    /// Absolute value above threshold.
    #[default]
    Abs,
    /// Positive values above threshold.
    Pos,
    /// Negative values below minus threshold.
    Neg,
}

impl MaskSign {
    /// Lower-case configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskSign::Abs => "abs",
            MaskSign::Pos => "pos",
            MaskSign::Neg => "neg",
        }
    }
}

impl FromStr for MaskSign {
    type Err = RoiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abs" => Ok(MaskSign::Abs),
            "pos" => Ok(MaskSign::Pos),
            "neg" => Ok(MaskSign::Neg),
            other => Err(RoiError::Config(
                ErrorInfo::new("masksign", "expected abs, pos or neg").with_context("value", other),
            )),
        }
    }
}

/// Significance mask applied before region values are averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalMask {
    /// Paradigm the mask contrast belongs to.
    pub paradigm: String,
    /// Short code of that paradigm.
    pub paradigm_code: String,
    /// Contrast name providing the significance map.
    pub contrast: String,
    /// Significance threshold.
    pub threshold: f64,
    /// Tail of the threshold.
    pub sign: MaskSign,
}

/// A validated analysis: what is extracted, from which paradigm, under which mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Paradigm full name.
    pub paradigm: String,
    /// Paradigm short code.
    pub paradigm_code: String,
    /// Extracted measurement kind.
    pub extract: ExtractKind,
    /// Optional functional mask.
    pub mask: Option<FunctionalMask>,
    measurements: Vec<String>,
}

impl Analysis {
    /// Validates one analysis entry against the project's paradigms.
    pub fn resolve(raw: &RawAttributes, config: &ProjectConfig) -> Result<Self, RoiError> {
        let spec = RawSpec::normalize(raw)?;
        spec.check_fields(REQUIRED, OPTIONAL)?;

        let paradigm = spec.require_str("par")?;
        let paradigm_code = config.paradigm_code(&paradigm)?.to_string();
        let extract: ExtractKind = spec.require_str("extract")?.parse()?;

        let mask = match spec.optional_str("maskpar")? {
            None => None,
            Some(maskpar) if maskpar.eq_ignore_ascii_case("nomask") => None,
            Some(maskpar) => {
                let contrast = spec.require_str("maskcon")?;
                let threshold: f64 = spec.require("maskthresh")?;
                let sign = match spec.optional_str("masksign")? {
                    Some(sign) => sign.parse()?,
                    None => MaskSign::default(),
                };
                let mask_code = config.paradigm_code(&maskpar)?.to_string();
                let declared = config
                    .contrasts
                    .get(&maskpar)
                    .map(|contrasts| contrasts.contains_key(&contrast))
                    .unwrap_or(false);
                if !declared {
                    return Err(RoiError::Config(
                        ErrorInfo::new("maskcon", "mask contrast not declared for paradigm")
                            .with_context("paradigm", maskpar.as_str())
                            .with_context("contrast", contrast.as_str()),
                    ));
                }
                Some(FunctionalMask {
                    paradigm: maskpar,
                    paradigm_code: mask_code,
                    contrast,
                    threshold,
                    sign,
                })
            }
        };

        let measurements = measurement_names(config, &paradigm, extract)?;
        Ok(Self {
            paradigm,
            paradigm_code,
            extract,
            mask,
            measurements,
        })
    }

    /// Resolves the analysis at `index` in the project's analysis list.
    pub fn from_index(config: &ProjectConfig, index: usize) -> Result<Self, RoiError> {
        let raw = config.analyses.get(index).ok_or_else(|| {
            RoiError::Config(
                ErrorInfo::new("unknown_analysis", "no analysis at this index")
                    .with_context("index", index.to_string())
                    .with_context("declared", config.analyses.len().to_string()),
            )
        })?;
        Self::resolve(raw, config)
    }

    /// Directory-safe analysis name, e.g. `fa_beta_nomask` or `fa_contrast_fa-face-abs2.3`.
    pub fn name(&self) -> String {
        let mut name = format!(
            "{}_{}",
            self.paradigm_code.to_ascii_lowercase(),
            self.extract.as_str()
        );
        match &self.mask {
            None => name.push_str("_nomask"),
            Some(mask) => name.push_str(&format!(
                "_{}-{}-{}{}",
                mask.paradigm_code.to_ascii_lowercase(),
                mask.contrast,
                mask.sign.as_str(),
                mask.threshold
            )),
        }
        name
    }

    /// Functional column names, fixed for every row of a database.
    pub fn measurements(&self) -> &[String] {
        &self.measurements
    }
}

fn measurement_names(
    config: &ProjectConfig,
    paradigm: &str,
    extract: ExtractKind,
) -> Result<Vec<String>, RoiError> {
    match extract {
        ExtractKind::Beta => {
            let conditions = config
                .conditions
                .get(paradigm)
                .ok_or_else(|| unknown_paradigm(paradigm).with_context("section", "conditions"))?;
            let components = config.betastoextract.components(config.hrfcomponents)?;
            if config.hrfcomponents == 1 || components == [1] {
                return Ok(conditions.clone());
            }
            Ok(conditions
                .iter()
                .flat_map(|condition| {
                    components
                        .iter()
                        .map(move |component| format!("{condition}-{component:02}"))
                })
                .collect())
        }
        ExtractKind::Contrast => config
            .contrasts
            .get(paradigm)
            .map(|contrasts| contrasts.keys().cloned().collect())
            .ok_or_else(|| unknown_paradigm(paradigm).with_context("section", "contrasts")),
    }
}
