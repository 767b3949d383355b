use anyhow::{bail, Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

use crate::scoring::{Standings, StandingsRow};
use crate::table::spreadsheet::{read_sheets, write_cells, SheetContents};
use crate::table::storage::write_atomically;

pub const DEFAULT_SHEET: &str = "Standings";

const SUMMARY_COLUMNS: [&str; 6] = ["place", "user", "predictions", "exact", "points", "avg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xlsx,
    Csv,
    Tsv,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") => Ok(ReportFormat::Xlsx),
            Some("csv") => Ok(ReportFormat::Csv),
            Some("tsv") => Ok(ReportFormat::Tsv),
            Some("xls") => bail!(
                "Cannot write legacy .xls report {}; use .xlsx, .csv or .tsv",
                path.display()
            ),
            _ => bail!(
                "Unsupported report extension for {}; use .xlsx, .csv or .tsv",
                path.display()
            ),
        }
    }
}

/// One report cell; numbers stay numbers in the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(u64),
    Decimal(f64),
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Decimal(n) => format!("{:.2}", n),
        }
    }
}

/// Summary columns followed by `Round N exact`, `Round N points` per round.
pub fn report_header(rounds: &[u32]) -> Vec<String> {
    let mut header: Vec<String> = SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect();
    for round in rounds {
        header.push(format!("Round {} exact", round));
        header.push(format!("Round {} points", round));
    }
    header
}

pub fn report_row(row: &StandingsRow, rounds: &[u32]) -> Vec<Cell> {
    let mut cells = vec![
        Cell::Integer(row.place as u64),
        Cell::Text(row.user.clone()),
        Cell::Integer(row.predictions as u64),
        Cell::Integer(row.exact as u64),
        Cell::Integer(u64::from(row.points)),
        Cell::Decimal(row.average),
    ];
    for round in rounds {
        let (exact, points) = row
            .round(*round)
            .map_or((0, 0), |tally| (tally.exact as u64, u64::from(tally.points)));
        cells.push(Cell::Integer(exact));
        cells.push(Cell::Integer(points));
    }
    cells
}

/// Render standings to `path`, choosing the format from its extension.
///
/// An existing workbook keeps its other worksheets (values only); the
/// standings sheet is replaced or appended. The file is replaced
/// atomically; a failed write leaves the old report.
pub fn write_report(path: &Path, standings: &Standings, sheet: &str) -> Result<()> {
    let format = ReportFormat::from_path(path)?;
    let bytes = match format {
        ReportFormat::Xlsx => {
            let existing = if path.exists() {
                read_sheets(path)
                    .with_context(|| format!("Refusing to overwrite {}", path.display()))?
            } else {
                Vec::new()
            };
            workbook_bytes(&existing, standings, sheet)?
        }
        ReportFormat::Csv => delimited_bytes(standings, b',')?,
        ReportFormat::Tsv => delimited_bytes(standings, b'\t')?,
    };
    write_atomically(path, &bytes).context("Failed to write report")?;

    log::info!(
        "Wrote standings for {} participants to {}",
        standings.rows.len(),
        path.display()
    );
    Ok(())
}

fn workbook_bytes(
    existing: &[SheetContents],
    standings: &Standings,
    sheet: &str,
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let mut replaced = false;
    for kept in existing {
        let worksheet = workbook.add_worksheet();
        // Worksheet names compare case-insensitively.
        if kept.name.to_lowercase() == sheet.to_lowercase() {
            worksheet
                .set_name(sheet)
                .with_context(|| format!("Invalid worksheet name '{}'", sheet))?;
            write_standings(worksheet, standings)?;
            replaced = true;
        } else {
            worksheet
                .set_name(&kept.name)
                .with_context(|| format!("Invalid worksheet name '{}'", kept.name))?;
            write_cells(worksheet, &kept.cells)?;
        }
    }
    if !replaced {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet)
            .with_context(|| format!("Invalid worksheet name '{}'", sheet))?;
        write_standings(worksheet, standings)?;
    }
    workbook
        .save_to_buffer()
        .context("Failed to build standings workbook")
}

fn write_standings(worksheet: &mut Worksheet, standings: &Standings) -> Result<()> {
    let bold = Format::new().set_bold();
    let two_decimals = Format::new().set_num_format("0.00");

    for (col_idx, title) in report_header(&standings.rounds).iter().enumerate() {
        worksheet
            .write_string_with_format(0, col_idx as u16, title, &bold)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (row_idx, row) in standings.rows.iter().enumerate() {
        let sheet_row = row_idx as u32 + 1;
        for (col_idx, cell) in report_row(row, &standings.rounds).iter().enumerate() {
            let col = col_idx as u16;
            let written = match cell {
                Cell::Text(text) => worksheet.write_string(sheet_row, col, text),
                Cell::Integer(n) => worksheet.write_number(sheet_row, col, *n as f64),
                Cell::Decimal(n) => {
                    worksheet.write_number_with_format(sheet_row, col, *n, &two_decimals)
                }
            };
            written.with_context(|| format!("write cell ({sheet_row},{col_idx})"))?;
        }
    }
    Ok(())
}

fn delimited_bytes(standings: &Standings, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(report_header(&standings.rounds))?;
    for row in &standings.rows {
        let cells: Vec<String> = report_row(row, &standings.rounds)
            .iter()
            .map(Cell::render)
            .collect();
        writer.write_record(&cells)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush report: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RoundTally;
    use std::collections::BTreeMap;
    use std::fs;

    fn standings() -> Standings {
        let mut rounds = BTreeMap::new();
        rounds.insert(
            1,
            RoundTally {
                predictions: 2,
                exact: 1,
                points: 6,
            },
        );
        rounds.insert(
            3,
            RoundTally {
                predictions: 1,
                exact: 0,
                points: 1,
            },
        );
        Standings {
            rows: vec![
                StandingsRow {
                    place: 1,
                    user_id: Some("U0001".to_string()),
                    user: "Olena".to_string(),
                    predictions: 3,
                    exact: 1,
                    points: 7,
                    average: 3.5,
                    rounds,
                },
                StandingsRow {
                    place: 2,
                    user_id: None,
                    user: "Taras, Jr".to_string(),
                    predictions: 0,
                    exact: 0,
                    points: 0,
                    average: 0.0,
                    rounds: BTreeMap::new(),
                },
            ],
            rounds: vec![1, 3],
            pending: 0,
            diagnostics: vec![],
        }
    }

    #[test]
    fn test_header_has_round_pairs() {
        assert_eq!(
            report_header(&[1, 3]),
            vec![
                "place",
                "user",
                "predictions",
                "exact",
                "points",
                "avg",
                "Round 1 exact",
                "Round 1 points",
                "Round 3 exact",
                "Round 3 points"
            ]
        );
    }

    #[test]
    fn test_csv_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("standings.csv");
        write_report(&path, &standings(), DEFAULT_SHEET).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,Olena,3,1,7,3.50,1,6,0,1");
        assert_eq!(lines[2], "2,\"Taras, Jr\",0,0,0,0.00,0,0,0,0");
    }

    #[test]
    fn test_tsv_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standings.tsv");
        write_report(&path, &standings(), DEFAULT_SHEET).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("place\tuser\tpredictions\texact\tpoints\tavg\tRound 1 exact"));
    }

    #[test]
    fn test_xlsx_report_is_a_zip_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standings.xlsx");
        write_report(&path, &standings(), "Week 3").unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_unsupported_extensions_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["standings.xls", "standings.ods", "standings"] {
            let path = dir.path().join(name);
            assert!(write_report(&path, &standings(), DEFAULT_SHEET).is_err());
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_invalid_sheet_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standings.xlsx");
        assert!(write_report(&path, &standings(), "bad[name]").is_err());
    }

    fn sheet_names(path: &Path) -> Vec<String> {
        read_sheets(path)
            .unwrap()
            .into_iter()
            .map(|sheet| sheet.name)
            .collect()
    }

    #[test]
    fn test_xlsx_report_keeps_other_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("league.xlsx");
        let mut workbook = Workbook::new();
        {
            let notes = workbook.add_worksheet();
            notes.set_name("Notes").unwrap();
            notes.write_string(0, 0, "entry fee paid").unwrap();
            notes.write_number(1, 0, 25.0).unwrap();
        }
        workbook.save(&path).unwrap();

        write_report(&path, &standings(), DEFAULT_SHEET).unwrap();
        assert_eq!(sheet_names(&path), vec!["Notes", "Standings"]);

        let sheets = read_sheets(&path).unwrap();
        let notes: Vec<String> = sheets[0]
            .cells
            .iter()
            .map(|(_, _, value)| crate::table::spreadsheet::cell_text(value))
            .collect();
        assert_eq!(notes, vec!["entry fee paid", "25"]);
        assert!(sheets[1]
            .cells
            .iter()
            .any(|(row, col, value)| (*row, *col) == (1, 1)
                && crate::table::spreadsheet::cell_text(value) == "Olena"));
    }

    #[test]
    fn test_xlsx_report_replaces_its_own_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("league.xlsx");
        write_report(&path, &standings(), "Week 3").unwrap();
        write_report(&path, &standings(), "Archive").unwrap();
        write_report(&path, &standings(), "week 3").unwrap();
        assert_eq!(sheet_names(&path), vec!["week 3", "Archive"]);
    }

    #[test]
    fn test_unreadable_workbook_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("league.xlsx");
        fs::write(&path, "not a workbook").unwrap();
        assert!(write_report(&path, &standings(), DEFAULT_SHEET).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not a workbook");
    }
}
