use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::ImportReport;
use crate::error::{ImportError, ParseError, ParseErrorKind, ResolutionError};
use crate::table::{
    load_predictions, load_results, normalize_user_name, save_predictions, FixtureKey,
    MatchResult, ParticipantKey, Prediction, PredictionsTable, ResultsTable, Score,
};
use crate::text::{parse_text, Line, TeamNames};

#[derive(Debug, Clone, Default)]
pub struct PredictionsImportOptions {
    /// Round used to resolve every fixture.
    pub round: Option<u32>,
    /// Replace everything stored for the participants in this batch.
    pub clear_users: bool,
    /// Attribute the whole text to one participant.
    pub user: Option<String>,
    pub user_id: Option<String>,
    /// Abort on the first unreadable line.
    pub strict: bool,
}

struct Entry {
    line: usize,
    round: Option<u32>,
    home_team: String,
    away_team: String,
    score: Score,
}

#[derive(Default)]
struct Block {
    metadata: Vec<String>,
    entries: Vec<Entry>,
}

/// Merge per-user predictions into `existing`, returning the new snapshot.
///
/// Each prediction is resolved against `results` by round and teams.
/// Unresolved lines are dropped and reported. Without `clear_users` an
/// incoming prediction replaces the stored one for the same match and
/// participant; with it, every stored prediction of the batch's participants
/// is removed first.
pub fn merge_predictions(
    existing: &PredictionsTable,
    results: &ResultsTable,
    text: &str,
    options: &PredictionsImportOptions,
    teams: &TeamNames,
) -> Result<(PredictionsTable, ImportReport), ImportError> {
    if results.is_empty() {
        return Err(ImportError::EmptyResults);
    }
    let results = &results.with_fallback_teams(existing);

    let mut report = ImportReport::default();
    let mut blocks = split_blocks(text, options, &mut report)?;
    if blocks.iter().all(|block| block.entries.is_empty()) {
        return Err(ImportError::NoFixtures);
    }
    if options.user.is_some() || options.user_id.is_some() {
        blocks = vec![single_block(blocks)];
    }

    let mut ids = UserIds::from_existing(existing);
    let mut incoming: Vec<Prediction> = Vec::new();
    let mut positions: HashMap<(String, ParticipantKey), usize> = HashMap::new();

    for (index, block) in blocks.iter().enumerate() {
        if block.entries.is_empty() {
            continue;
        }
        let (user_id, user) = identify(block, index + 1, options);
        let user_id = ids.assign(user_id, &user);

        for entry in &block.entries {
            let fixture = match resolve(entry, &user, results, options, teams) {
                Ok(fixture) => fixture,
                Err(err) => {
                    report.diagnostics.push(err.into());
                    continue;
                }
            };
            let prediction = Prediction {
                match_id: fixture.match_id.clone(),
                round: fixture.round,
                user_id: Some(user_id.clone()),
                user: user.clone(),
                home_team: Some(fixture.home_team.clone()),
                away_team: Some(fixture.away_team.clone()),
                score: entry.score,
            };
            let key = (prediction.match_id.clone(), prediction.participant());
            match positions.get(&key) {
                Some(&position) => incoming[position] = prediction,
                None => {
                    positions.insert(key, incoming.len());
                    incoming.push(prediction);
                }
            }
        }
    }
    report.imported = incoming.len();

    let mut rows = Vec::with_capacity(existing.len() + incoming.len());
    for row in existing.rows() {
        let superseded = if options.clear_users {
            incoming.iter().any(|new| same_participant(row, new))
        } else {
            incoming
                .iter()
                .any(|new| new.match_id == row.match_id && same_participant(row, new))
        };
        if superseded {
            report.replaced += 1;
        } else {
            rows.push(row.clone());
        }
    }
    report.created = incoming
        .iter()
        .filter(|new| {
            !existing
                .rows()
                .iter()
                .any(|row| row.match_id == new.match_id && same_participant(row, new))
        })
        .count();
    rows.extend(incoming);

    Ok((PredictionsTable::new(rows), report))
}

fn split_blocks(
    text: &str,
    options: &PredictionsImportOptions,
    report: &mut ImportReport,
) -> Result<Vec<Block>, ImportError> {
    let mut blocks = Vec::new();
    let mut current = Block::default();
    let mut current_round = None;
    let mut malformed = Vec::new();

    for (line, parsed) in parse_text(text) {
        match parsed {
            Ok(Line::Blank) => {
                if !current.entries.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
            }
            Ok(Line::Comment(_)) => {}
            Ok(Line::RoundHeader(round)) => current_round = Some(round),
            Ok(Line::Metadata(text)) => {
                if !current.entries.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                current.metadata.push(text);
            }
            Ok(Line::Fixture(fixture)) => match fixture.score {
                Some(score) => current.entries.push(Entry {
                    line,
                    round: fixture.round.or(current_round),
                    home_team: fixture.home_team,
                    away_team: fixture.away_team,
                    score,
                }),
                None => {
                    let err =
                        ParseError::new(line, fixture.canonical(), ParseErrorKind::MissingScore);
                    if options.strict {
                        return Err(ImportError::Strict(err));
                    }
                    report.diagnostics.push(err.into());
                }
            },
            Err(err) if err.kind == ParseErrorKind::MalformedScore => malformed.push(err),
            Err(err) if options.strict => return Err(ImportError::Strict(err)),
            Err(err) => report.diagnostics.push(err.into()),
        }
    }
    if !current.entries.is_empty() {
        blocks.push(current);
    }

    if !malformed.is_empty() {
        return Err(ImportError::MalformedScores(malformed));
    }
    Ok(blocks)
}

/// Everything in one block, keeping the first block's metadata for fallbacks.
fn single_block(blocks: Vec<Block>) -> Block {
    let mut merged = Block::default();
    for block in blocks {
        if merged.metadata.is_empty() {
            merged.metadata = block.metadata;
        }
        merged.entries.extend(block.entries);
    }
    merged
}

/// `letter, then letters/digits/_/-`, with at least one digit: `user42`, `U0007`.
fn looks_like_user_id(text: &str) -> bool {
    let mut chars = text.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_with_letter
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && text.chars().any(|c| c.is_ascii_digit())
}

fn identify(block: &Block, index: usize, options: &PredictionsImportOptions) -> (Option<String>, String) {
    let user_id = block
        .metadata
        .iter()
        .find(|item| looks_like_user_id(item))
        .cloned();
    let name = block
        .metadata
        .iter()
        .rev()
        .find(|item| item.chars().any(char::is_alphabetic) && Some(*item) != user_id.as_ref())
        .cloned();

    let user_id = options.user_id.clone().or(user_id);
    let user = options
        .user
        .clone()
        .or(name)
        .or_else(|| user_id.clone())
        .unwrap_or_else(|| format!("User {}", index));
    (user_id, user)
}

/// Stable participant ids: reuse the stored id for a known name, else `U0001`, `U0002`, ...
struct UserIds {
    by_name: HashMap<String, String>,
    next_generated: u32,
}

impl UserIds {
    fn from_existing(existing: &PredictionsTable) -> Self {
        let mut by_name = HashMap::new();
        let mut highest = 0;
        for row in existing.rows() {
            let Some(id) = row.user_id.as_deref() else {
                continue;
            };
            by_name
                .entry(normalize_user_name(&row.user))
                .or_insert_with(|| id.to_string());
            if let Some(number) = generated_number(id) {
                highest = highest.max(number);
            }
        }
        Self {
            by_name,
            next_generated: highest + 1,
        }
    }

    fn assign(&mut self, user_id: Option<String>, user: &str) -> String {
        let name = normalize_user_name(user);
        match user_id {
            Some(id) => {
                self.by_name.entry(name).or_insert_with(|| id.clone());
                id
            }
            None => {
                if let Some(id) = self.by_name.get(&name) {
                    return id.clone();
                }
                let id = format!("U{:04}", self.next_generated);
                self.next_generated += 1;
                self.by_name.insert(name, id.clone());
                id
            }
        }
    }
}

fn generated_number(id: &str) -> Option<u32> {
    let digits = id.strip_prefix('U')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Same person: equal ids when both rows carry one, else equal normalized names.
fn same_participant(a: &Prediction, b: &Prediction) -> bool {
    match (a.participant(), b.participant()) {
        (ParticipantKey::Id(x), ParticipantKey::Id(y)) => x == y,
        _ => normalize_user_name(&a.user) == normalize_user_name(&b.user),
    }
}

fn resolve<'a>(
    entry: &Entry,
    user: &str,
    results: &'a ResultsTable,
    options: &PredictionsImportOptions,
    teams: &TeamNames,
) -> Result<&'a MatchResult, ResolutionError> {
    let home = teams.canonical(&entry.home_team);
    let away = teams.canonical(&entry.away_team);
    let round = options.round.or(entry.round);
    let unknown = || ResolutionError::UnknownFixture {
        line: entry.line,
        user: user.to_string(),
        home: entry.home_team.clone(),
        away: entry.away_team.clone(),
        round,
    };

    match round {
        Some(round) => results
            .find_fixture(&FixtureKey { round, home, away }, teams)
            .ok_or_else(unknown),
        None => {
            let candidates = results.find_pairing(&home, &away, teams);
            match candidates.as_slice() {
                [] => Err(unknown()),
                [only] => Ok(*only),
                many => Err(ResolutionError::AmbiguousFixture {
                    line: entry.line,
                    home: entry.home_team.clone(),
                    away: entry.away_team.clone(),
                    rounds: many.iter().map(|row| row.round).collect(),
                }),
            }
        }
    }
}

/// Read a predictions listing, merge it into the table at `predictions_path` and save.
///
/// Nothing is written when no prediction could be resolved.
pub fn import_predictions_file(
    text_path: &Path,
    results_path: &Path,
    predictions_path: &Path,
    options: &PredictionsImportOptions,
    teams: &TeamNames,
) -> Result<ImportReport> {
    let text = fs::read_to_string(text_path)
        .with_context(|| format!("Failed to read text file at {}", text_path.display()))?;
    if !results_path.exists() {
        anyhow::bail!("Results file {} was not found", results_path.display());
    }
    let results = load_results(results_path)?;
    let existing = load_predictions(predictions_path)?;

    let (table, report) = merge_predictions(&existing, &results, &text, options, teams)
        .with_context(|| format!("Failed to import predictions from {}", text_path.display()))?;
    if report.imported == 0 {
        log::warn!("No predictions matched known fixtures; {} left unchanged", predictions_path.display());
        return Ok(report);
    }
    save_predictions(predictions_path, &table)?;
    Ok(report)
}
