use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::error::Diagnostic;
use crate::import::ImportReport;
use crate::scoring::{Standings, StandingsRow};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format standings as an aligned table: place, points, exact, predictions, avg, user.
/// Names are truncated to the terminal width when stdout is a terminal.
pub fn format_standings_table(standings: &Standings, use_colors: bool) -> String {
    format_table_with_width(standings, use_colors, get_terminal_width())
}

fn format_table_with_width(
    standings: &Standings,
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    if standings.rows.is_empty() {
        return "No predictions found.".to_string();
    }

    // place "99." + points 5 + exact 5 + predictions 5 + avg 7, two spaces apart
    let fixed_width = 3 + 2 + 5 + 2 + 5 + 2 + 5 + 2 + 7 + 2;
    let header = format!(
        "{:>3}  {:>5}  {:>5}  {:>5}  {:>7}  {}",
        "#", "pts", "exact", "preds", "avg", "user"
    );
    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };

    let lines = standings.rows.iter().map(|row| {
        let name = match term_width {
            Some(width) if width > fixed_width + 10 => truncate_name(&row.user, width - fixed_width),
            Some(_) => truncate_name(&row.user, 20),
            None => row.user.clone(),
        };
        let place = format!("{:>2}.", row.place);
        let points = format!("{:>5}", row.points);
        let rest = format!(
            "{:>5}  {:>5}  {:>7.2}",
            row.exact, row.predictions, row.average
        );
        if use_colors {
            format!("{}  {}  {}  {}", place.dimmed(), points.bold(), rest, name.yellow())
        } else {
            format!("{}  {}  {}  {}", place, points, rest, name)
        }
    });

    std::iter::once(header)
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format standings as tab-separated values for scripting
/// Columns: place, user, predictions, exact, points, avg (no headers, no colors)
pub fn format_tsv(standings: &Standings) -> String {
    standings
        .rows
        .iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{:.2}",
                row.place, row.user, row.predictions, row.exact, row.points, row.average
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct JsonStandings<'a> {
    rounds: &'a [u32],
    pending: usize,
    standings: Vec<JsonRow<'a>>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(flatten)]
    row: &'a StandingsRow,
    avg: String,
}

/// Format standings as pretty-printed JSON, including per-round tallies.
pub fn format_json(standings: &Standings) -> serde_json::Result<String> {
    let document = JsonStandings {
        rounds: &standings.rounds,
        pending: standings.pending,
        standings: standings
            .rows
            .iter()
            .map(|row| JsonRow {
                row,
                avg: format!("{:.2}", row.average),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document)
}

/// One line summary of an import.
pub fn format_import_summary(kind: &str, report: &ImportReport, use_colors: bool) -> String {
    let counts = format!(
        "{} imported ({} new, {} replaced)",
        report.imported, report.created, report.replaced
    );
    if use_colors {
        format!("{}: {}", kind.bold(), counts)
    } else {
        format!("{}: {}", kind, counts)
    }
}

/// Diagnostics block printed at the end of a command.
pub fn format_diagnostics(diagnostics: &[Diagnostic], use_colors: bool) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let title = format!("{} problem(s):", diagnostics.len());
    let title = if use_colors {
        title.yellow().bold().to_string()
    } else {
        title
    };
    std::iter::once(title)
        .chain(diagnostics.iter().map(|d| format!("  - {}", d)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, ParseErrorKind};
    use std::collections::BTreeMap;

    fn sample_row(place: usize, user: &str, points: u32) -> StandingsRow {
        StandingsRow {
            place,
            user_id: None,
            user: user.to_string(),
            predictions: 3,
            exact: 1,
            points,
            average: f64::from(points) / 3.0,
            rounds: BTreeMap::new(),
        }
    }

    fn sample_standings() -> Standings {
        Standings {
            rows: vec![
                sample_row(1, "Olena Petrenko", 10),
                sample_row(2, "Taras", 5),
            ],
            rounds: vec![1, 2, 3],
            pending: 2,
            diagnostics: vec![],
        }
    }

    // truncate_name tests
    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("Olena", 20), "Olena");
    }

    #[test]
    fn test_truncate_name_long() {
        assert_eq!(truncate_name("Olena Petrenko-Kovalenko", 10), "Olena P...");
    }

    #[test]
    fn test_truncate_name_unicode() {
        assert_eq!(truncate_name("Олена Петренко", 8), "Олена...");
    }

    #[test]
    fn test_truncate_name_very_narrow() {
        assert_eq!(truncate_name("Olena", 3), "Ole");
    }

    #[test]
    fn test_format_table_empty() {
        let result = format_standings_table(&Standings::default(), false);
        assert_eq!(result, "No predictions found.");
    }

    #[test]
    fn test_format_table_rows() {
        let result = format_table_with_width(&sample_standings(), false, None);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("user"));
        assert!(lines[1].starts_with(" 1."));
        assert!(lines[1].contains("3.33"));
        assert!(lines[1].ends_with("Olena Petrenko"));
        assert!(lines[2].starts_with(" 2."));
    }

    #[test]
    fn test_format_table_truncates_to_width() {
        let result = format_table_with_width(&sample_standings(), false, Some(46));
        assert!(result.lines().nth(1).unwrap().ends_with("Olena Pe..."));
    }

    #[test]
    fn test_format_tsv() {
        assert_eq!(
            format_tsv(&sample_standings()),
            "1\tOlena Petrenko\t3\t1\t10\t3.33\n2\tTaras\t3\t1\t5\t1.67"
        );
    }

    #[test]
    fn test_format_tsv_empty() {
        assert_eq!(format_tsv(&Standings::default()), "");
    }

    #[test]
    fn test_format_json() {
        let json = format_json(&sample_standings()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pending"], 2);
        assert_eq!(value["standings"][0]["user"], "Olena Petrenko");
        assert_eq!(value["standings"][0]["avg"], "3.33");
        assert_eq!(value["standings"][1]["place"], 2);
    }

    #[test]
    fn test_format_diagnostics() {
        let diagnostics = vec![Diagnostic::Parse(ParseError::new(
            4,
            "Arsenal ~ Chelsea",
            ParseErrorKind::Unrecognized,
        ))];
        let result = format_diagnostics(&diagnostics, false);
        assert_eq!(
            result,
            "1 problem(s):\n  - line 4: unrecognized fixture: 'Arsenal ~ Chelsea'"
        );
        assert_eq!(format_diagnostics(&[], false), "");
    }

    #[test]
    fn test_format_import_summary() {
        let report = ImportReport {
            imported: 5,
            created: 3,
            replaced: 2,
            diagnostics: vec![],
        };
        assert_eq!(
            format_import_summary("results", &report, false),
            "results: 5 imported (3 new, 2 replaced)"
        );
    }
}
