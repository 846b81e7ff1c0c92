use indoc::{formatdoc, indoc};

use crate::report::period::ReportingPeriod;

pub const REPORT_BODY: &str = indoc! {"
    Attached is a monthly report on freshdesk applications.
    This report is generated via code saved here: https://github.com/path-cc/path-freshticket-report

"};

pub const FAILURE_SUBJECT: &str = "Monthly Freshdesk Report Failure";

pub fn report_subject(period: &ReportingPeriod) -> String {
    format!(
        "Fresh Ticket Monthly Report ({} - {})",
        period.start_date(),
        period.end_date()
    )
}

pub fn failure_body(error: &dyn std::fmt::Display) -> String {
    formatdoc! {"
        Monthly report on freshdesk applications failed!!!

         Errors Recorded: {}",
        error
    }
}
