//! Report Summary
//!
//! Plain-text overview of a report table for the job log: how many rows
//! made it into the report and how often each column was filled in.

use super::{period::ReportingPeriod, table::ReportTable};

const COLUMN_HEADER: &str = "Column";

pub fn summarize(table: &ReportTable, period: &ReportingPeriod) -> String {
    let fill_counts: Vec<(&str, usize)> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let filled = table.rows().filter(|row| !row[i].is_empty()).count();
            (column.as_str(), filled)
        })
        .collect();

    let name_width = fill_counts
        .iter()
        .map(|(column, _)| column.len())
        .max()
        .unwrap_or(0)
        .max(COLUMN_HEADER.len());

    let mut output = format!(
        "Account report {} - {}: {} requester(s)\n",
        period.start_date(),
        period.end_date(),
        table.len()
    );
    output.push_str(&format!("  {COLUMN_HEADER:<name_width$}  Filled\n"));
    for (column, filled) in fill_counts {
        output.push_str(&format!(
            "  {column:<name_width$}  {filled} / {}\n",
            table.len()
        ));
    }

    output
}
