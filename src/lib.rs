pub mod aggregate;
pub mod cli;
pub mod error;
pub mod model;
pub mod month;
pub mod parse;
pub mod report;
pub mod scan;

pub use aggregate::Aggregate;
pub use error::{Result, StatError};
pub use model::{Attribution, AuthorKey, ChangeCount, MonthKey, Report};
pub use month::MonthWindow;
pub use parse::parse_log;
pub use scan::{run_scans, GitLog, HistorySource, ScanOutcome, ScanPlan, Targets};
