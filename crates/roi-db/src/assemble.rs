//! Joins size, masked-size and functional tables into database rows.

use roi_atlas::RegionCatalog;
use roi_core::{Analysis, ErrorInfo, Hemisphere, Manifold, RoiError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::source::{ScopeTables, TableSource};

/// One subject and region of an extraction database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRow {
    /// Subject identifier.
    pub subject: String,
    /// Catalog display name of the region.
    pub region: String,
    /// Hemisphere of a surface region.
    pub hemisphere: Option<Hemisphere>,
    /// Size before masking.
    pub base_size: u64,
    /// Size after the functional mask.
    pub final_size: u64,
    /// Functional values in the analysis' measurement order.
    pub values: Vec<f64>,
}

/// Header plus rows for one atlas and analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    name: String,
    header: Vec<String>,
    rows: Vec<ExtractionRow>,
}

impl Database {
    /// Artifact name, `<atlas>_<analysis>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, subject-major in catalog order.
    pub fn rows(&self) -> &[ExtractionRow] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when no rows were assembled.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Name under which a database is written and tracked.
pub fn database_name(atlas: &str, analysis: &Analysis) -> String {
    format!("{atlas}_{}", analysis.name())
}

/// Builds databases for one catalog and analysis.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseAssembler<'a> {
    catalog: &'a RegionCatalog,
    analysis: &'a Analysis,
}

impl<'a> DatabaseAssembler<'a> {
    /// Binds the catalog and the analysis whose measurements fill each row.
    pub fn new(catalog: &'a RegionCatalog, analysis: &'a Analysis) -> Self {
        Self { catalog, analysis }
    }

    /// `[Subject, ROI, base-<unit>, final-<unit>, measurements...]`.
    pub fn header(&self) -> Vec<String> {
        let unit = self.catalog.manifold().unit();
        let mut header = vec![
            "Subject".to_string(),
            "ROI".to_string(),
            format!("base-{unit}"),
            format!("final-{unit}"),
        ];
        header.extend(self.analysis.measurements().iter().cloned());
        header
    }

    /// Scopes visited per subject; surface hemispheres without regions are skipped.
    fn scopes(&self) -> Vec<Option<Hemisphere>> {
        match self.catalog.manifold() {
            Manifold::Volume => vec![None],
            Manifold::Surface => self
                .catalog
                .hemispheres()
                .iter()
                .copied()
                .filter(|hemi| self.catalog.hemisphere_entries(*hemi).next().is_some())
                .map(Some)
                .collect(),
        }
    }

    /// Assembles every subject, in the given order, into one database.
    ///
    /// Any missing region or mismatched table aborts the whole assembly.
    pub fn assemble<S>(&self, subjects: &[String], source: &mut S) -> Result<Database, RoiError>
    where
        S: TableSource + ?Sized,
    {
        let scopes = self.scopes();
        let mut rows = Vec::with_capacity(subjects.len() * self.catalog.len());
        for subject in subjects {
            for scope in &scopes {
                let tables = source.tables(subject, *scope)?;
                self.join(subject, *scope, &tables, &mut rows)
                    .map_err(|err| scoped(err, subject, *scope))?;
            }
            debug!(atlas = %self.catalog.atlas(), subject = %subject, "subject assembled");
        }
        let name = database_name(self.catalog.atlas(), self.analysis);
        info!(database = %name, subjects = subjects.len(), rows = rows.len(), "database assembled");
        Ok(Database {
            name,
            header: self.header(),
            rows,
        })
    }

    fn join(
        &self,
        subject: &str,
        scope: Option<Hemisphere>,
        tables: &ScopeTables,
        rows: &mut Vec<ExtractionRow>,
    ) -> Result<(), RoiError> {
        let entries = self.catalog.scope_entries(scope);
        let functional = &tables.functional;
        if functional.region_count() != entries.len() {
            return Err(row_count_mismatch(entries.len(), functional.region_count()));
        }
        let width = self.analysis.measurements().len();
        if functional.width() != width {
            return Err(RoiError::Extraction(
                ErrorInfo::new("column_count_mismatch", "functional table width differs from analysis")
                    .with_context("expected", width.to_string())
                    .with_context("found", functional.width().to_string()),
            ));
        }
        for (position, entry) in entries.iter().enumerate() {
            let base_size = tables
                .size
                .value(entry.id)
                .map_err(|err| err.with_context("table", "size"))?;
            let final_size = tables
                .masked_size
                .value(entry.id)
                .map_err(|err| err.with_context("table", "masked_size"))?;
            let values = functional
                .row(position)
                .ok_or_else(|| row_count_mismatch(entries.len(), functional.region_count()))?
                .to_vec();
            rows.push(ExtractionRow {
                subject: subject.to_string(),
                region: entry.display_name.clone(),
                hemisphere: scope,
                base_size,
                final_size,
                values,
            });
        }
        Ok(())
    }
}

fn row_count_mismatch(expected: usize, found: usize) -> RoiError {
    RoiError::Extraction(
        ErrorInfo::new("row_count_mismatch", "functional table row count differs from catalog")
            .with_context("expected", expected.to_string())
            .with_context("found", found.to_string()),
    )
}

fn scoped(err: RoiError, subject: &str, scope: Option<Hemisphere>) -> RoiError {
    let err = err.with_context("subject", subject);
    match scope {
        Some(hemi) => err.with_context("hemisphere", hemi.tag()),
        None => err,
    }
}
