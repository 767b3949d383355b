use serde::Serialize;
use std::cmp::Ordering;

/// Final or predicted score of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// Outcome category derived from the sign of the goal difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    pub fn difference(&self) -> i64 {
        i64::from(self.home) - i64::from(self.away)
    }

    pub fn outcome(&self) -> Outcome {
        match self.difference().cmp(&0) {
            Ordering::Greater => Outcome::HomeWin,
            Ordering::Less => Outcome::AwayWin,
            Ordering::Equal => Outcome::Draw,
        }
    }

    /// The same score seen from the other side of the pitch.
    pub fn swapped(&self) -> Self {
        Self {
            home: self.away,
            away: self.home,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub match_id: String,
    pub round: u32,
    pub home_team: String,
    pub away_team: String,
    /// `None` until the match has been played.
    pub score: Option<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub match_id: String,
    pub round: u32,
    pub user_id: Option<String>,
    pub user: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub score: Score,
}

impl Prediction {
    pub fn participant(&self) -> ParticipantKey {
        ParticipantKey::new(self.user_id.as_deref(), &self.user)
    }
}

/// Identity of a participant: the user id when present, else the normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticipantKey {
    Id(String),
    Name(String),
}

impl ParticipantKey {
    pub fn new(user_id: Option<&str>, user: &str) -> Self {
        match user_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => ParticipantKey::Id(id.to_lowercase()),
            None => ParticipantKey::Name(normalize_user_name(user)),
        }
    }
}

/// Lowercase, whitespace-collapsed form of a display name.
pub fn normalize_user_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Fixture identity: round plus canonical team names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureKey {
    pub round: u32,
    pub home: String,
    pub away: String,
}

/// Natural ordering of match ids, so `M2` sorts before `M10`.
pub fn compare_match_ids(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_num) = split_numeric_suffix(a);
    let (b_prefix, b_num) = split_numeric_suffix(b);
    a_prefix
        .cmp(b_prefix)
        .then_with(|| a_num.cmp(&b_num))
        .then_with(|| a.cmp(b))
}

fn split_numeric_suffix(id: &str) -> (&str, Option<u64>) {
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    match digits_start {
        Some(i) => (&id[..i], id[i..].parse().ok()),
        None => (id, None),
    }
}
