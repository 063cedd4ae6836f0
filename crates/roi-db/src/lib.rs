#![deny(missing_docs)]
#![doc = "Stat table parsing, extraction database assembly and database write history."]

pub mod assemble;
pub mod history;
pub mod persist;
pub mod source;
pub mod stats;

pub use assemble::{database_name, Database, DatabaseAssembler, ExtractionRow};
pub use history::{HistoryLedger, LedgerEntry, STAMP_FORMAT};
pub use persist::{render_tsv, write_database, write_database_at, WriteOutcome};
pub use source::{FsTableSource, MemoryTableSource, ScopeTables, TableSource};
pub use stats::{FunctionalLayout, FunctionalTable, SizeRow, SizeTable};
