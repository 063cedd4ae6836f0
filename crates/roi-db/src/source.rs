//! Where the assembler gets each subject's tables from.

use std::collections::BTreeMap;

use roi_atlas::AtlasSession;
use roi_core::{Analysis, ErrorInfo, Hemisphere, RoiError};

use crate::stats::{FunctionalLayout, FunctionalTable, SizeTable};

/// The three tables of one subject in one extraction scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeTables {
    /// Region sizes before masking.
    pub size: SizeTable,
    /// Region sizes after the functional mask.
    pub masked_size: SizeTable,
    /// Region-major functional values.
    pub functional: FunctionalTable,
}

/// Supplies per-subject tables to [`crate::DatabaseAssembler`].
pub trait TableSource {
    /// Tables of `subject` for one scope: `None` for volumes, a hemisphere for surfaces.
    fn tables(&mut self, subject: &str, scope: Option<Hemisphere>)
        -> Result<ScopeTables, RoiError>;
}

/// Reads tables from the project tree through an [`AtlasSession`].
#[derive(Debug)]
pub struct FsTableSource<'a> {
    session: AtlasSession<'a>,
    analysis: Analysis,
    layout: FunctionalLayout,
}

impl<'a> FsTableSource<'a> {
    /// Wraps a session whose paradigm is already set.
    pub fn new(session: AtlasSession<'a>, analysis: Analysis, layout: FunctionalLayout) -> Self {
        Self {
            session,
            analysis,
            layout,
        }
    }
}

impl TableSource for FsTableSource<'_> {
    fn tables(
        &mut self,
        subject: &str,
        scope: Option<Hemisphere>,
    ) -> Result<ScopeTables, RoiError> {
        self.session.init_subject(subject)?;
        self.session.init_analysis(self.analysis.clone())?;
        let paths = self
            .session
            .table_paths()?
            .into_iter()
            .find(|paths| paths.hemisphere == scope)
            .ok_or_else(|| missing_scope(subject, scope))?;
        Ok(ScopeTables {
            size: SizeTable::load(&paths.size)?,
            masked_size: SizeTable::load(&paths.masked_size)?,
            functional: FunctionalTable::load(&paths.functional, self.layout)?,
        })
    }
}

/// Tables held in memory, keyed by subject and scope.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableSource {
    tables: BTreeMap<(String, Option<Hemisphere>), ScopeTables>,
}

impl MemoryTableSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the tables of one subject and scope.
    pub fn insert(
        &mut self,
        subject: impl Into<String>,
        scope: Option<Hemisphere>,
        tables: ScopeTables,
    ) -> &mut Self {
        self.tables.insert((subject.into(), scope), tables);
        self
    }
}

impl TableSource for MemoryTableSource {
    fn tables(
        &mut self,
        subject: &str,
        scope: Option<Hemisphere>,
    ) -> Result<ScopeTables, RoiError> {
        self.tables
            .get(&(subject.to_string(), scope))
            .cloned()
            .ok_or_else(|| missing_scope(subject, scope))
    }
}

fn missing_scope(subject: &str, scope: Option<Hemisphere>) -> RoiError {
    let mut info = ErrorInfo::new("stats_missing", "no stats tables for subject")
        .with_context("subject", subject);
    if let Some(hemi) = scope {
        info = info.with_context("hemisphere", hemi.tag());
    }
    RoiError::Preprocess(info)
}
