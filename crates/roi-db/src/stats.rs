//! Whitespace-delimited stat tables written by the external extraction tools.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use roi_core::{ErrorInfo, RegionId, RoiError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One row of a size table: `[index, region_id, count, ...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRow {
    /// Row index written by the tool.
    pub index: u64,
    /// Region the count belongs to.
    pub id: RegionId,
    /// Voxel or vertex count.
    pub count: u64,
}

/// Region sizes of one subject and scope, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTable {
    rows: Vec<SizeRow>,
}

impl SizeTable {
    /// Builds a table from `(index, id, count)` triples.
    pub fn from_rows(rows: impl IntoIterator<Item = (u64, u32, u64)>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(index, id, count)| SizeRow {
                    index,
                    id: RegionId::from_raw(id),
                    count,
                })
                .collect(),
        }
    }

    /// Parses size-table text; every data row needs at least three integral columns.
    pub fn parse(text: &str) -> Result<Self, RoiError> {
        let mut rows = Vec::new();
        for (line_no, columns) in data_lines(text) {
            if columns.len() < 3 {
                return Err(table_error(
                    "short_row",
                    "size table rows need index, region id and count",
                    line_no,
                ));
            }
            rows.push(SizeRow {
                index: integral(columns[0], line_no)?,
                id: RegionId::from_raw(integral(columns[1], line_no)?),
                count: integral(columns[2], line_no)?,
            });
        }
        Ok(Self { rows })
    }

    /// Reads a size table; a missing file is a preprocess error.
    pub fn load(path: &Path) -> Result<Self, RoiError> {
        let text = read_table(path)?;
        let table = Self::parse(&text).map_err(|err| with_path(err, path))?;
        debug!(path = %path.display(), rows = table.len(), "size table read");
        Ok(table)
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[SizeRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of the first row whose region id matches.
    pub fn value(&self, id: RegionId) -> Result<u64, RoiError> {
        self.rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.count)
            .ok_or_else(|| {
                RoiError::Extraction(
                    ErrorInfo::new("region_missing", "region missing from stats file")
                        .with_context("region", id.to_string()),
                )
            })
    }
}

/// Orientation of a functional table on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionalLayout {
    /// One line per condition, one column per region; transposed on read.
    #[default]
    ConditionMajor,
    /// One line per region, one column per condition.
    RegionMajor,
}

impl FromStr for FunctionalLayout {
    type Err = RoiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "condition-major" => Ok(FunctionalLayout::ConditionMajor),
            "region-major" => Ok(FunctionalLayout::RegionMajor),
            other => Err(RoiError::Config(
                ErrorInfo::new("layout", "expected condition-major or region-major")
                    .with_context("value", other),
            )),
        }
    }
}

/// Functional values with one row per region and one column per measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionalTable {
    rows: Vec<Vec<f64>>,
}

impl FunctionalTable {
    /// Wraps region-major rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Parses a functional table, transposing condition-major input.
    ///
    /// A file holding a single line is still a table of one line, so a
    /// single-region or single-condition table keeps its two-dimensional shape.
    pub fn parse(text: &str, layout: FunctionalLayout) -> Result<Self, RoiError> {
        let mut lines: Vec<Vec<f64>> = Vec::new();
        for (line_no, columns) in data_lines(text) {
            let values = columns
                .iter()
                .map(|column| {
                    column
                        .parse::<f64>()
                        .map_err(|_| table_error("not_numeric", "value is not numeric", line_no))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(first) = lines.first() {
                if first.len() != values.len() {
                    return Err(RoiError::Extraction(
                        ErrorInfo::new("ragged_table", "functional table rows differ in width")
                            .with_context("line", (line_no + 1).to_string())
                            .with_context("expected", first.len().to_string())
                            .with_context("found", values.len().to_string()),
                    ));
                }
            }
            lines.push(values);
        }
        let rows = match layout {
            FunctionalLayout::RegionMajor => lines,
            FunctionalLayout::ConditionMajor => transpose(&lines),
        };
        Ok(Self { rows })
    }

    /// Reads a functional table; a missing file is a preprocess error.
    pub fn load(path: &Path, layout: FunctionalLayout) -> Result<Self, RoiError> {
        let text = read_table(path)?;
        let table = Self::parse(&text, layout).map_err(|err| with_path(err, path))?;
        debug!(
            path = %path.display(),
            regions = table.region_count(),
            measurements = table.width(),
            "functional table read"
        );
        Ok(table)
    }

    /// Number of region rows.
    pub fn region_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of measurement columns.
    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    /// Values of the region at `row`.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        self.rows.get(row).map(Vec::as_slice)
    }
}

fn transpose(lines: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = lines.first().map(Vec::len).unwrap_or(0);
    (0..width)
        .map(|column| lines.iter().map(|line| line[column]).collect())
        .collect()
}

fn data_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines().enumerate().filter_map(|(line_no, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            None
        } else {
            Some((line_no, trimmed.split_whitespace().collect()))
        }
    })
}

fn integral<T: TryFrom<u64>>(column: &str, line_no: usize) -> Result<T, RoiError> {
    let parsed = match column.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => column
            .parse::<f64>()
            .ok()
            .filter(|value| value.fract() == 0.0 && *value >= 0.0 && *value <= u64::MAX as f64)
            .map(|value| value as u64),
    };
    parsed
        .and_then(|value| T::try_from(value).ok())
        .ok_or_else(|| table_error("not_integral", "expected a non-negative integer", line_no))
}

fn read_table(path: &Path) -> Result<String, RoiError> {
    if !path.is_file() {
        return Err(RoiError::Preprocess(
            ErrorInfo::new("stats_missing", "stats table does not exist")
                .with_context("path", path.display().to_string()),
        ));
    }
    fs::read_to_string(path).map_err(|err| RoiError::io("stats_read", path, err))
}

fn table_error(code: &str, message: &str, line_no: usize) -> RoiError {
    RoiError::Extraction(
        ErrorInfo::new(code, message).with_context("line", (line_no + 1).to_string()),
    )
}

fn with_path(err: RoiError, path: &Path) -> RoiError {
    err.with_context("path", path.display().to_string())
}
