use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::config::Points;
use super::rules::{classify, Tier};
use crate::error::{Diagnostic, ResolutionError};
use crate::table::{normalize_user_name, ParticipantKey, PredictionsTable, ResultsTable};

/// Scored predictions of one participant in one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoundTally {
    pub predictions: usize,
    pub exact: usize,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    /// 1-based position after ranking.
    pub place: usize,
    pub user_id: Option<String>,
    pub user: String,
    /// Scored predictions only; pending fixtures are not counted.
    pub predictions: usize,
    pub exact: usize,
    pub points: u32,
    /// Points per round with at least one scored prediction.
    pub average: f64,
    pub rounds: BTreeMap<u32, RoundTally>,
}

impl StandingsRow {
    pub fn round(&self, round: u32) -> Option<&RoundTally> {
        self.rounds.get(&round)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    pub rows: Vec<StandingsRow>,
    /// Rounds with at least one scored prediction, ascending.
    pub rounds: Vec<u32>,
    /// Predictions whose fixture has no score yet.
    pub pending: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Join predictions to results by `match_id`, score them and rank participants.
pub fn compute_standings(
    predictions: &PredictionsTable,
    results: &ResultsTable,
    points: &Points,
) -> Standings {
    let mut standings = Standings::default();
    let ids_by_name = known_ids(predictions);
    let mut order: Vec<ParticipantKey> = Vec::new();
    let mut rows: HashMap<ParticipantKey, StandingsRow> = HashMap::new();
    let mut rounds = BTreeSet::new();

    for prediction in predictions.rows() {
        let user_id = prediction
            .user_id
            .clone()
            .or_else(|| ids_by_name.get(&normalize_user_name(&prediction.user)).cloned());
        let key = ParticipantKey::new(user_id.as_deref(), &prediction.user);
        let row = rows.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            StandingsRow {
                place: 0,
                user_id,
                user: prediction.user.clone(),
                predictions: 0,
                exact: 0,
                points: 0,
                average: 0.0,
                rounds: BTreeMap::new(),
            }
        });

        let Some(fixture) = results.get(&prediction.match_id) else {
            standings.diagnostics.push(
                ResolutionError::UnknownMatchId {
                    user: prediction.user.clone(),
                    match_id: prediction.match_id.clone(),
                }
                .into(),
            );
            continue;
        };
        let Some(actual) = fixture.score else {
            log::debug!(
                "{} has no result yet; skipping prediction by {}",
                fixture.match_id,
                prediction.user
            );
            standings.pending += 1;
            continue;
        };

        let tier = classify(prediction.score, actual);
        let earned = tier.points(points);
        let exact = usize::from(tier == Tier::Exact);

        row.predictions += 1;
        row.exact += exact;
        row.points = row.points.saturating_add(earned);
        let tally = row.rounds.entry(fixture.round).or_default();
        tally.predictions += 1;
        tally.exact += exact;
        tally.points = tally.points.saturating_add(earned);
        rounds.insert(fixture.round);
    }

    let mut ranked: Vec<StandingsRow> = order
        .into_iter()
        .filter_map(|key| rows.remove(&key))
        .map(|mut row| {
            row.average = average(row.points, row.rounds.len());
            row
        })
        .collect();
    ranked.sort_by(compare_rows);
    for (index, row) in ranked.iter_mut().enumerate() {
        row.place = index + 1;
    }

    standings.rows = ranked;
    standings.rounds = rounds.into_iter().collect();
    standings
}

/// Ids for names that appear without one on some rows.
fn known_ids(predictions: &PredictionsTable) -> HashMap<String, String> {
    let mut ids = HashMap::new();
    for row in predictions.rows() {
        if let Some(id) = row.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
            ids.entry(normalize_user_name(&row.user))
                .or_insert_with(|| id.to_string());
        }
    }
    ids
}

fn average(points: u32, rounds: usize) -> f64 {
    if rounds == 0 {
        0.0
    } else {
        f64::from(points) / rounds as f64
    }
}

/// Points desc, exact desc, name asc, then user id.
fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.exact.cmp(&a.exact))
        .then_with(|| a.user.cmp(&b.user))
        .then_with(|| a.user_id.cmp(&b.user_id))
}
