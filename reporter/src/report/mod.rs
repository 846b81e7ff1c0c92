pub mod job;
pub mod period;
pub mod summary;
pub mod table;

pub use job::{ReportJob, ReportOutcome};
pub use period::ReportingPeriod;
pub use table::CsvReportWriter;
