use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexSet;

use crate::{
    error::AppResult,
    tickets::{NormalizedRecord, FIXED_COLUMNS},
};

use super::period::ReportingPeriod;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportRow {
    created: NaiveDateTime,
    cells: Vec<String>,
}

/// Records flattened onto one shared set of columns: the fixed columns, then
/// every form field in the order it was first seen. A record without a field
/// gets an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn from_records(records: &[NormalizedRecord]) -> Self {
        let mut columns: IndexSet<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
        for record in records {
            columns.extend(record.fields.keys().cloned());
        }

        let rows = records
            .iter()
            .map(|record| ReportRow {
                created: record.created,
                cells: columns
                    .iter()
                    .map(|column| record.cell(column).unwrap_or_default().into_owned())
                    .collect(),
            })
            .collect();

        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Drops rows created outside the period. Columns are left alone so the
    /// header doesn't depend on which rows survived.
    pub fn filter_period(mut self, period: &ReportingPeriod) -> Self {
        self.rows.retain(|row| period.contains(row.created));
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|row| row.cells.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut csv = csv_line(&self.columns);
        for row in self.rows() {
            csv.push_str(&csv_line(row));
        }
        csv
    }
}

fn csv_line(cells: &[String]) -> String {
    let mut line = cells
        .iter()
        .map(|cell| escape_csv(cell))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub trait ReportWriter {
    fn write(&self, table: &ReportTable, path: &Path) -> AppResult<()>;
}

pub struct CsvReportWriter;

impl ReportWriter for CsvReportWriter {
    fn write(&self, table: &ReportTable, path: &Path) -> AppResult<()> {
        std::fs::write(path, table.to_csv())?;
        tracing::debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }
}
