use std::fmt;
use thiserror::Error;

/// Why a raw-text line could not be read as a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Looks like a fixture but matches no known line pattern.
    Unrecognized,
    /// Score is not a pair of non-negative integers (`2.5:1`, overflow).
    MalformedScore,
    /// Fixture without a score where one is required (predictions).
    MissingScore,
    /// Round marker with a zero or unreadable number.
    InvalidRound,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParseErrorKind::Unrecognized => "unrecognized fixture",
            ParseErrorKind::MalformedScore => "malformed score",
            ParseErrorKind::MissingScore => "missing score",
            ParseErrorKind::InvalidRound => "invalid round",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: '{text}'")]
pub struct ParseError {
    pub line: usize,
    pub text: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, text: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            line,
            text: text.into(),
            kind,
        }
    }
}

/// A bad value in a stored table record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a non-negative integer, got '{value}'")]
    Goals { field: &'static str, value: String },
    #[error("home_goals and away_goals must both be set or both be empty (got '{home}' / '{away}')")]
    PartialScore { home: String, away: String },
    #[error("round must be a positive integer, got '{value}'")]
    Round { value: String },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("match_id '{match_id}' appears more than once")]
    DuplicateMatchId { match_id: String },
}

/// A prediction that does not point at a known fixture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("line {line}: no fixture {home} - {away}{} for {user}", round_suffix(.round))]
    UnknownFixture {
        line: usize,
        user: String,
        home: String,
        away: String,
        round: Option<u32>,
    },
    #[error("line {line}: {home} - {away} matches fixtures in rounds {rounds:?}; add a round marker")]
    AmbiguousFixture {
        line: usize,
        home: String,
        away: String,
        rounds: Vec<u32>,
    },
    #[error("prediction by {user} references unknown match_id '{match_id}'")]
    UnknownMatchId { user: String, match_id: String },
}

fn round_suffix(round: &Option<u32>) -> String {
    round.map(|r| format!(" in round {}", r)).unwrap_or_default()
}

/// Fatal problems that abort an import without writing anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error(
        "round {round}: fixture {home} - {away} appears twice (lines {first_line} and {second_line})"
    )]
    DuplicateFixture {
        round: u32,
        home: String,
        away: String,
        first_line: usize,
        second_line: usize,
    },
    #[error("line {line}: no round for '{text}'; pass --round or add a 'Round N' header")]
    MissingRound { line: usize, text: String },
    #[error("malformed scores:\n{}", join_lines(.0))]
    MalformedScores(Vec<ParseError>),
    #[error("strict mode: {0}")]
    Strict(ParseError),
    #[error("no fixtures found in the provided text")]
    NoFixtures,
    #[error("results table is empty; import results before predictions")]
    EmptyResults,
}

fn join_lines(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A recoverable problem collected during a run and reported at the end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
