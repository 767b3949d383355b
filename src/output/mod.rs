pub mod formatter;
pub mod report;

pub use formatter::{
    format_diagnostics, format_import_summary, format_json, format_standings_table, format_tsv,
    should_use_colors,
};
pub use report::{report_header, report_row, write_report, Cell, ReportFormat, DEFAULT_SHEET};
