//! Line grammar for plain-text fixture listings.
//!
//! Every line is cleaned and then classified by trying a fixed list of
//! patterns in priority order. Adding a tolerated format means adding one
//! entry to [`fixture_patterns`].

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::INVISIBLE_CHARACTERS;
use crate::error::{ParseError, ParseErrorKind};
use crate::table::Score;

/// One fixture read from a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub round: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    /// `None` for fixtures that have not been played yet.
    pub score: Option<Score>,
}

impl Fixture {
    /// Canonical form: `[Round N: ]Home - Away[ H:A]`.
    pub fn canonical(&self) -> String {
        let mut line = String::new();
        if let Some(round) = self.round {
            line.push_str(&format!("Round {}: ", round));
        }
        line.push_str(&format!("{} - {}", self.home_team, self.away_team));
        if let Some(score) = self.score {
            line.push_str(&format!(" {}:{}", score.home, score.away));
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Comment(String),
    RoundHeader(u32),
    Fixture(Fixture),
    /// Anything else: user names, ids, dates.
    Metadata(String),
}

impl Line {
    pub fn canonical(&self) -> String {
        match self {
            Line::Blank => String::new(),
            Line::Comment(text) | Line::Metadata(text) => text.clone(),
            Line::RoundHeader(round) => format!("Round {}", round),
            Line::Fixture(fixture) => fixture.canonical(),
        }
    }
}

struct LinePattern {
    name: &'static str,
    regex: Regex,
    scored: bool,
}

const SCORE: &str = r"(?P<hg>[0-9]+(?:[.,][0-9]+)?)\s*[:：\-–—]\s*(?P<ag>[0-9]+(?:[.,][0-9]+)?)";

fn fixture_patterns() -> &'static [LinePattern] {
    static PATTERNS: OnceLock<Vec<LinePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let specs: [(&str, String, bool); 6] = [
            (
                "score-between",
                format!(r"^(?P<home>.*?[^0-9])\s*{}\s*(?P<away>[^0-9].*)$", SCORE),
                true,
            ),
            (
                "spaced-dash-then-score",
                format!(
                    r"^(?P<home>.+?)\s+[-–—]\s+(?P<away>.*?[^0-9])\s*[:：]?\s*{}$",
                    SCORE
                ),
                true,
            ),
            (
                "versus-then-score",
                format!(
                    r"(?i)^(?P<home>.+?)\s+vs?\.?\s+(?P<away>.*?[^0-9])\s*[:：]?\s*{}$",
                    SCORE
                ),
                true,
            ),
            (
                "tight-dash-then-score",
                format!(
                    r"^(?P<home>.+?)\s*[-–—]\s*(?P<away>.*?[^0-9])\s*[:：]?\s*{}$",
                    SCORE
                ),
                true,
            ),
            (
                "spaced-dash",
                r"^(?P<home>.+?)\s+[-–—]\s+(?P<away>.+)$".to_string(),
                false,
            ),
            (
                "versus",
                r"(?i)^(?P<home>.+?)\s+vs?\.?\s+(?P<away>.+)$".to_string(),
                false,
            ),
        ];
        specs
            .into_iter()
            .map(|(name, pattern, scored)| LinePattern {
                name,
                regex: Regex::new(&pattern).expect("fixture pattern must compile"),
                scored,
            })
            .collect()
    })
}

fn static_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("line pattern must compile"))
}

fn round_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?i)^(?:(?:round|tour|matchday|md|тур)\s*(?P<a>[0-9]+)|(?P<b>[0-9]+)(?:-?[йиі])?\s*(?:тур|round))\s*[:.]?$",
    )
}

fn round_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?i)^(?:round|tour|matchday|md|тур|r)\s*(?P<round>[0-9]+)\s*[:.|)]\s*(?P<rest>.+)$",
    )
}

/// Something a person meant as a fixture: digit-separator-digit, a spaced dash or `v`/`vs`.
fn fixture_hint() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?i)[0-9]\s*[:：\-–—]\s*[0-9]|\s[-–—]\s|\svs?\.?\s",
    )
}

/// A score fragment inside a would-be team name.
fn score_fragment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"[0-9]\s*[:：\-–—]|[:：]")
}

/// A minus sign glued to goal digits, before or after the separator.
fn negative_goals() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(
        &RE,
        r"(?:^|\s)[-–—][0-9]+\s*[:：\-–—]\s*[0-9]|[0-9]\s*[:：]\s*[-–—]\s*[0-9]|[0-9]\s*[-–—]\s*[-–—]\s*[0-9]",
    )
}

/// A separator between two teams; never part of one team name.
fn spaced_dash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"\s[-–—]\s")
}

/// Drop invisible characters, turn NBSP into a space and collapse whitespace.
pub fn clean_line(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !INVISIBLE_CHARACTERS.contains(c))
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify one raw line. `line_no` is 1-based and only used for errors.
pub fn parse_line(line_no: usize, raw: &str) -> Result<Line, ParseError> {
    let line = clean_line(raw);
    let error = |kind| ParseError::new(line_no, line.clone(), kind);

    if line.is_empty() {
        return Ok(Line::Blank);
    }
    if line.starts_with('#') {
        return Ok(Line::Comment(line));
    }

    if let Some(caps) = round_header().captures(&line) {
        let digits = caps.name("a").or_else(|| caps.name("b")).map_or("", |m| m.as_str());
        return parse_round_number(digits)
            .map(Line::RoundHeader)
            .ok_or_else(|| error(ParseErrorKind::InvalidRound));
    }

    if let Some(caps) = round_prefix().captures(&line) {
        let round =
            parse_round_number(&caps["round"]).ok_or_else(|| error(ParseErrorKind::InvalidRound))?;
        return match parse_fixture_body(&caps["rest"]) {
            Ok(Some(mut fixture)) => {
                fixture.round = Some(round);
                Ok(Line::Fixture(fixture))
            }
            Ok(None) => Err(error(ParseErrorKind::Unrecognized)),
            Err(kind) => Err(error(kind)),
        };
    }

    match parse_fixture_body(&line) {
        Ok(Some(fixture)) => Ok(Line::Fixture(fixture)),
        Ok(None) if has_letter(&line) && fixture_hint().is_match(&line) => {
            Err(error(ParseErrorKind::Unrecognized))
        }
        Ok(None) => Ok(Line::Metadata(line)),
        Err(kind) => Err(error(kind)),
    }
}

fn parse_round_number(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|round| *round > 0)
}

fn has_letter(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

fn parse_fixture_body(body: &str) -> Result<Option<Fixture>, ParseErrorKind> {
    if has_letter(body) && negative_goals().is_match(body) {
        return Err(ParseErrorKind::MalformedScore);
    }
    for pattern in fixture_patterns() {
        let Some(caps) = pattern.regex.captures(body) else {
            continue;
        };
        let (Some(home), Some(away)) = (team_name(&caps, "home"), team_name(&caps, "away")) else {
            continue;
        };
        if spaced_dash().is_match(&home) || spaced_dash().is_match(&away) {
            continue;
        }
        let score = if pattern.scored {
            Some(score_from(&caps)?)
        } else {
            if score_fragment().is_match(&home) || score_fragment().is_match(&away) {
                continue;
            }
            None
        };
        log::trace!("'{}' matched pattern {}", body, pattern.name);
        return Ok(Some(Fixture {
            round: None,
            home_team: home,
            away_team: away,
            score,
        }));
    }
    Ok(None)
}

fn team_name(caps: &Captures, group: &str) -> Option<String> {
    let name = caps
        .name(group)?
        .as_str()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '：' | '|'));
    has_letter(name).then(|| name.to_string())
}

fn score_from(caps: &Captures) -> Result<Score, ParseErrorKind> {
    let goals = |group: &str| {
        caps[group]
            .parse::<u32>()
            .map_err(|_| ParseErrorKind::MalformedScore)
    };
    Ok(Score::new(goals("hg")?, goals("ag")?))
}
