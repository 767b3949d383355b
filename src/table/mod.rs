pub mod spreadsheet;
pub mod storage;
pub mod types;

pub use storage::{load_predictions, load_results, save_predictions, save_results, TableFormat};
pub use types::{
    compare_match_ids, normalize_user_name, FixtureKey, MatchResult, Outcome, ParticipantKey,
    Prediction, Score,
};

use crate::error::ValidationError;
use crate::text::TeamNames;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Snapshot of the results table for one run. Rows are kept sorted by round,
/// then natural `match_id` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    rows: Vec<MatchResult>,
}

impl ResultsTable {
    /// Build a snapshot, rejecting duplicate match ids.
    pub fn new(mut rows: Vec<MatchResult>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        for row in &rows {
            if !seen.insert(row.match_id.as_str()) {
                return Err(ValidationError::DuplicateMatchId {
                    match_id: row.match_id.clone(),
                });
            }
        }
        rows.sort_by(compare_results);
        Ok(Self { rows })
    }

    /// Sort rows whose ids are already known to be unique.
    pub(crate) fn from_rows_unchecked(mut rows: Vec<MatchResult>) -> Self {
        rows.sort_by(compare_results);
        Self { rows }
    }

    pub fn rows(&self) -> &[MatchResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, match_id: &str) -> Option<&MatchResult> {
        self.rows.iter().find(|row| row.match_id == match_id)
    }

    pub fn fixture_key(&self, row: &MatchResult, teams: &TeamNames) -> FixtureKey {
        FixtureKey {
            round: row.round,
            home: teams.canonical(&row.home_team),
            away: teams.canonical(&row.away_team),
        }
    }

    pub fn find_fixture(&self, key: &FixtureKey, teams: &TeamNames) -> Option<&MatchResult> {
        self.rows
            .iter()
            .find(|row| &self.fixture_key(row, teams) == key)
    }

    /// All fixtures between two teams regardless of round.
    pub fn find_pairing(&self, home: &str, away: &str, teams: &TeamNames) -> Vec<&MatchResult> {
        self.rows
            .iter()
            .filter(|row| teams.canonical(&row.home_team) == home)
            .filter(|row| teams.canonical(&row.away_team) == away)
            .collect()
    }

    /// Copy of the table with blank team names taken from prediction rows of
    /// the same match.
    pub fn with_fallback_teams(&self, predictions: &PredictionsTable) -> ResultsTable {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                let known = predictions
                    .rows()
                    .iter()
                    .filter(|p| p.match_id == row.match_id);
                if row.home_team.is_empty() {
                    if let Some(name) = known.clone().find_map(|p| p.home_team.clone()) {
                        row.home_team = name;
                    }
                }
                if row.away_team.is_empty() {
                    if let Some(name) = known.clone().find_map(|p| p.away_team.clone()) {
                        row.away_team = name;
                    }
                }
                row
            })
            .collect();
        Self { rows }
    }
}

/// Snapshot of the predictions table for one run. Rows are kept sorted by round,
/// `match_id`, `user_id`, `user`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionsTable {
    rows: Vec<Prediction>,
}

impl PredictionsTable {
    pub fn new(mut rows: Vec<Prediction>) -> Self {
        rows.sort_by(compare_predictions);
        Self { rows }
    }

    pub fn rows(&self) -> &[Prediction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn compare_results(a: &MatchResult, b: &MatchResult) -> Ordering {
    a.round
        .cmp(&b.round)
        .then_with(|| compare_match_ids(&a.match_id, &b.match_id))
}

fn compare_predictions(a: &Prediction, b: &Prediction) -> Ordering {
    a.round
        .cmp(&b.round)
        .then_with(|| compare_match_ids(&a.match_id, &b.match_id))
        .then_with(|| a.user_id.cmp(&b.user_id))
        .then_with(|| a.user.cmp(&b.user))
}
