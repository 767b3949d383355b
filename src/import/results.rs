use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::ImportReport;
use crate::error::{ImportError, ParseErrorKind};
use crate::table::{load_results, save_results, FixtureKey, MatchResult, ResultsTable};
use crate::text::{parse_text, Fixture, Line, TeamNames};

#[derive(Debug, Clone)]
pub struct ResultsImportOptions {
    /// Round for every fixture; otherwise taken from the text.
    pub round: Option<u32>,
    /// Prefix of generated match ids.
    pub match_prefix: String,
    /// Abort on the first unreadable line.
    pub strict: bool,
}

impl Default for ResultsImportOptions {
    fn default() -> Self {
        Self {
            round: None,
            match_prefix: crate::config::DEFAULT_MATCH_PREFIX.to_string(),
            strict: false,
        }
    }
}

struct Candidate {
    line: usize,
    round: u32,
    fixture: Fixture,
}

/// Merge a results listing into `existing`, returning the new snapshot.
///
/// A fixture already stored under the same round and teams keeps its
/// `match_id` and is replaced entirely; everything else is left alone.
pub fn merge_results(
    existing: &ResultsTable,
    text: &str,
    options: &ResultsImportOptions,
    teams: &TeamNames,
) -> Result<(ResultsTable, ImportReport), ImportError> {
    let mut report = ImportReport::default();
    let candidates = collect_candidates(text, options, &mut report)?;

    let mut batch: HashMap<FixtureKey, usize> = HashMap::new();
    for candidate in &candidates {
        let key = candidate_key(candidate, teams);
        if let Some(first_line) = batch.insert(key, candidate.line) {
            return Err(ImportError::DuplicateFixture {
                round: candidate.round,
                home: candidate.fixture.home_team.clone(),
                away: candidate.fixture.away_team.clone(),
                first_line,
                second_line: candidate.line,
            });
        }
    }

    let mut stored: HashMap<FixtureKey, &MatchResult> = HashMap::new();
    for row in existing.rows() {
        stored.entry(existing.fixture_key(row, teams)).or_insert(row);
    }
    let mut next_number = highest_match_number(existing, &options.match_prefix);

    let mut incoming = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = candidate_key(&candidate, teams);
        let match_id = match stored.get(&key) {
            Some(row) => row.match_id.clone(),
            None => {
                next_number += 1;
                report.created += 1;
                format!("{}{}", options.match_prefix, next_number)
            }
        };
        log::debug!(
            "line {}: {} -> {}",
            candidate.line,
            candidate.fixture.canonical(),
            match_id
        );
        incoming.push(MatchResult {
            match_id,
            round: candidate.round,
            home_team: candidate.fixture.home_team,
            away_team: candidate.fixture.away_team,
            score: candidate.fixture.score,
        });
    }
    report.imported = incoming.len();

    let mut rows = Vec::with_capacity(existing.len() + incoming.len());
    for row in existing.rows() {
        if batch.contains_key(&existing.fixture_key(row, teams)) {
            report.replaced += 1;
        } else {
            rows.push(row.clone());
        }
    }
    rows.extend(incoming);

    Ok((ResultsTable::from_rows_unchecked(rows), report))
}

fn collect_candidates(
    text: &str,
    options: &ResultsImportOptions,
    report: &mut ImportReport,
) -> Result<Vec<Candidate>, ImportError> {
    let mut candidates = Vec::new();
    let mut malformed = Vec::new();
    let mut current_round = None;

    for (line, parsed) in parse_text(text) {
        match parsed {
            Ok(Line::RoundHeader(round)) => current_round = Some(round),
            Ok(Line::Fixture(fixture)) => {
                let round = options
                    .round
                    .or(fixture.round)
                    .or(current_round)
                    .ok_or_else(|| ImportError::MissingRound {
                        line,
                        text: fixture.canonical(),
                    })?;
                candidates.push(Candidate {
                    line,
                    round,
                    fixture,
                });
            }
            Ok(_) => {}
            Err(err) if err.kind == ParseErrorKind::MalformedScore => malformed.push(err),
            Err(err) if options.strict => return Err(ImportError::Strict(err)),
            Err(err) => report.diagnostics.push(err.into()),
        }
    }

    if !malformed.is_empty() {
        return Err(ImportError::MalformedScores(malformed));
    }
    if candidates.is_empty() {
        return Err(ImportError::NoFixtures);
    }
    Ok(candidates)
}

fn candidate_key(candidate: &Candidate, teams: &TeamNames) -> FixtureKey {
    FixtureKey {
        round: candidate.round,
        home: teams.canonical(&candidate.fixture.home_team),
        away: teams.canonical(&candidate.fixture.away_team),
    }
}

/// Highest `n` among stored ids shaped `<prefix><n>`.
fn highest_match_number(table: &ResultsTable, prefix: &str) -> u64 {
    table
        .rows()
        .iter()
        .filter_map(|row| row.match_id.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

/// Read a text listing, merge it into the results table at `results_path` and save.
pub fn import_results_file(
    text_path: &Path,
    results_path: &Path,
    options: &ResultsImportOptions,
    teams: &TeamNames,
) -> Result<ImportReport> {
    let text = fs::read_to_string(text_path)
        .with_context(|| format!("Failed to read text file at {}", text_path.display()))?;
    let existing = load_results(results_path)?;
    let (table, report) = merge_results(&existing, &text, options, teams)
        .with_context(|| format!("Failed to import results from {}", text_path.display()))?;
    save_results(results_path, &table)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostic;
    use crate::table::Score;

    fn options(round: Option<u32>) -> ResultsImportOptions {
        ResultsImportOptions {
            round,
            ..ResultsImportOptions::default()
        }
    }

    fn import(existing: &ResultsTable, text: &str, round: Option<u32>) -> (ResultsTable, ImportReport) {
        merge_results(existing, text, &options(round), &TeamNames::default()).unwrap()
    }

    #[test]
    fn test_new_fixtures_get_sequential_ids() {
        let (table, report) = import(
            &ResultsTable::default(),
            "Arsenal 2:1 Chelsea\nLiverpool - Everton 0:0\nBrentford v Fulham\n",
            Some(1),
        );
        let ids: Vec<_> = table.rows().iter().map(|r| r.match_id.as_str()).collect();
        assert_eq!(ids, vec!["M1", "M2", "M3"]);
        assert_eq!(report.created, 3);
        assert_eq!(table.get("M3").unwrap().score, None);
        assert_eq!(table.get("M1").unwrap().score, Some(Score::new(2, 1)));
    }

    #[test]
    fn test_reimport_updates_score_and_keeps_id() {
        let (first, _) = import(&ResultsTable::default(), "Arsenal v Chelsea\n", Some(4));
        let (second, report) = import(&first, "Арсенал 3:3 Челси\n", Some(4));
        assert_eq!(second.len(), 1);
        let row = second.get("M1").unwrap();
        assert_eq!(row.score, Some(Score::new(3, 3)));
        assert_eq!(row.home_team, "Арсенал");
        assert_eq!(report.created, 0);
        assert_eq!(report.replaced, 1);
    }

    #[test]
    fn test_other_rounds_untouched() {
        let (first, _) = import(&ResultsTable::default(), "Arsenal 1:0 Chelsea\n", Some(1));
        let (second, _) = import(&first, "Chelsea 2:2 Arsenal\n", Some(2));
        assert_eq!(second.len(), 2);
        assert_eq!(second.get("M1").unwrap().round, 1);
        assert_eq!(second.get("M2").unwrap().round, 2);
    }

    #[test]
    fn test_identical_reimport_is_idempotent() {
        let text = "Round 7\nArsenal 1:0 Chelsea\nR8: Leeds - Burnley 2:2\n";
        let (first, _) = import(&ResultsTable::default(), text, None);
        let (second, _) = import(&first, text, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rounds_from_headers_and_prefixes() {
        let (table, _) = import(
            &ResultsTable::default(),
            "Round 7\nArsenal 1:0 Chelsea\nR8: Leeds - Burnley 2:2\nWolves 0:1 Fulham\n",
            None,
        );
        let rounds: Vec<_> = table.rows().iter().map(|r| (r.match_id.as_str(), r.round)).collect();
        assert_eq!(rounds, vec![("M1", 7), ("M3", 7), ("M2", 8)]);
    }

    #[test]
    fn test_explicit_round_overrides_text() {
        let (table, _) = import(&ResultsTable::default(), "Round 7\nR8: Leeds 2:2 Burnley\n", Some(3));
        assert_eq!(table.rows()[0].round, 3);
    }

    #[test]
    fn test_missing_round_is_fatal() {
        let err = merge_results(
            &ResultsTable::default(),
            "Arsenal 1:0 Chelsea\n",
            &options(None),
            &TeamNames::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::MissingRound { line: 1, .. }));
    }

    #[test]
    fn test_duplicate_pair_in_batch_names_both_lines() {
        let err = merge_results(
            &ResultsTable::default(),
            "Arsenal 1:0 Chelsea\n\nарсенал - челси 2:0\n",
            &options(Some(1)),
            &TeamNames::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ImportError::DuplicateFixture {
                round: 1,
                home: "арсенал".to_string(),
                away: "челси".to_string(),
                first_line: 1,
                second_line: 3,
            }
        );
    }

    #[test]
    fn test_malformed_scores_abort_and_list_lines() {
        let err = merge_results(
            &ResultsTable::default(),
            "Arsenal 1.5:0 Chelsea\nLeeds 1:0 Burnley\nWolves 2:0,5 Fulham\n",
            &options(Some(1)),
            &TeamNames::default(),
        )
        .unwrap_err();
        match err {
            ImportError::MalformedScores(errors) => {
                let lines: Vec<_> = errors.iter().map(|e| e.line).collect();
                assert_eq!(lines, vec![1, 3]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_negative_goals_abort_import() {
        let err = merge_results(
            &ResultsTable::default(),
            "Leeds 1:0 Burnley\nArsenal -1:0 Chelsea\nArsenal - Everton -1:0\n",
            &options(Some(1)),
            &TeamNames::default(),
        )
        .unwrap_err();
        match err {
            ImportError::MalformedScores(errors) => {
                let lines: Vec<_> = errors.iter().map(|e| e.line).collect();
                assert_eq!(lines, vec![2, 3]);
                assert!(errors
                    .iter()
                    .all(|e| e.kind == ParseErrorKind::MalformedScore));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_lines_reported_not_fatal() {
        let (table, report) = import(
            &ResultsTable::default(),
            "Arsenal 1:0 Chelsea\nLeeds - Burnley 2:x\n",
            Some(1),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(matches!(&report.diagnostics[0], Diagnostic::Parse(e) if e.line == 2));
    }

    #[test]
    fn test_strict_mode_aborts_on_unreadable_line() {
        let err = merge_results(
            &ResultsTable::default(),
            "Arsenal 1:0 Chelsea\nLeeds - Burnley 2:x\n",
            &ResultsImportOptions {
                round: Some(1),
                strict: true,
                ..ResultsImportOptions::default()
            },
            &TeamNames::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::Strict(_)));
    }

    #[test]
    fn test_no_fixtures_is_fatal() {
        let err = merge_results(
            &ResultsTable::default(),
            "just some notes\n",
            &options(Some(1)),
            &TeamNames::default(),
        )
        .unwrap_err();
        assert_eq!(err, ImportError::NoFixtures);
    }

    #[test]
    fn test_ids_continue_after_highest_with_prefix() {
        let existing = ResultsTable::new(vec![
            MatchResult {
                match_id: "M9".to_string(),
                round: 1,
                home_team: "A".to_string(),
                away_team: "B".to_string(),
                score: None,
            },
            MatchResult {
                match_id: "X40".to_string(),
                round: 1,
                home_team: "C".to_string(),
                away_team: "D".to_string(),
                score: None,
            },
        ])
        .unwrap();
        let (table, _) = import(&existing, "Leeds 1:0 Burnley\n", Some(2));
        assert!(table.get("M10").is_some());
    }

    #[test]
    fn test_import_results_file_writes_sorted_table() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("round.txt");
        let results_path = dir.path().join("data").join("results.csv");
        fs::write(&text_path, "Arsenal 2:1 Chelsea\n").unwrap();

        let report = import_results_file(
            &text_path,
            &results_path,
            &options(Some(1)),
            &TeamNames::default(),
        )
        .unwrap();
        assert_eq!(report.imported, 1);
        let raw = fs::read_to_string(&results_path).unwrap();
        assert_eq!(
            raw,
            "match_id,round,home_team,away_team,home_goals,away_goals\nM1,1,Arsenal,Chelsea,2,1\n"
        );
    }
}
