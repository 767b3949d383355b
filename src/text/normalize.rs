use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::Path;

use super::grammar::{clean_line, parse_line, Line};
use super::source_lines;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub text: String,
    /// Lines recognised as fixtures.
    pub fixtures: usize,
    /// Lines whose text differs from the input.
    pub changed: usize,
    /// Lines that looked like fixtures but could not be read; kept verbatim.
    pub diagnostics: Vec<ParseError>,
}

/// Rewrite a template so every fixture sits on one canonical line.
///
/// In strict mode the first unreadable line is returned as an error.
/// Otherwise such lines are kept (cleaned of stray whitespace) and reported.
/// Running the result through again yields identical text.
pub fn normalize_text(input: &str, strict: bool) -> Result<NormalizeOutcome, ParseError> {
    let mut lines = Vec::new();
    let mut fixtures = 0;
    let mut changed = 0;
    let mut diagnostics = Vec::new();

    for (index, raw) in source_lines(input).iter().enumerate() {
        let normalized = match parse_line(index + 1, raw) {
            Ok(line) => {
                if matches!(line, Line::Fixture(_)) {
                    fixtures += 1;
                }
                line.canonical()
            }
            Err(err) if strict => return Err(err),
            Err(err) => {
                diagnostics.push(err);
                clean_line(raw)
            }
        };
        if normalized != *raw {
            changed += 1;
        }
        lines.push(normalized);
    }

    let mut text = lines.join("\n");
    if !lines.is_empty() {
        text.push('\n');
    }

    Ok(NormalizeOutcome {
        text,
        fixtures,
        changed,
        diagnostics,
    })
}

/// Normalize a template file in place, or into `output` when given.
///
/// Nothing is written when strict mode rejects a line.
pub fn normalize_file(path: &Path, output: Option<&Path>, strict: bool) -> Result<NormalizeOutcome> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file at {}", path.display()))?;
    let outcome = normalize_text(&input, strict)
        .with_context(|| format!("Refusing to rewrite {}", path.display()))?;

    let target = output.unwrap_or(path);
    if target == path && outcome.text == input {
        log::debug!("{} is already normalized", path.display());
        return Ok(outcome);
    }

    crate::table::storage::ensure_parent_dir(target)?;
    let mut file = AtomicWriteFile::open(target)
        .with_context(|| format!("Failed to open atomic write file at {}", target.display()))?;
    file.write_all(outcome.text.as_bytes())
        .context("Failed to write normalized text")?;
    file.commit()
        .with_context(|| format!("Failed to save normalized text to {}", target.display()))?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    const RAW: &str = "\u{feff}Round 3\r\n\
                       Arsenal   2 : 1   Chelsea\r\n\
                       Liverpool v Everton\r\n\
                       \r\n\
                       # late kick-off\r\n\
                       Brentford – Fulham: 0–0\r\n\
                       Burnley - Leeds 1:x\r\n";

    #[test]
    fn test_normalize_rewrites_fixtures() {
        let outcome = normalize_text(RAW, false).unwrap();
        assert_eq!(
            outcome.text,
            "Round 3\n\
             Arsenal - Chelsea 2:1\n\
             Liverpool - Everton\n\
             \n\
             # late kick-off\n\
             Brentford - Fulham 0:0\n\
             Burnley - Leeds 1:x\n"
        );
        assert_eq!(outcome.fixtures, 3);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].line, 7);
        assert_eq!(outcome.diagnostics[0].kind, ParseErrorKind::Unrecognized);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text(RAW, false).unwrap();
        let twice = normalize_text(&once.text, false).unwrap();
        assert_eq!(once.text, twice.text);
        assert_eq!(twice.changed, 0);
    }

    #[test]
    fn test_dash_inside_score_between_line_is_left_alone() {
        let raw = "Brighton - Hove 2:1 Wolves\n";
        let once = normalize_text(raw, false).unwrap();
        assert_eq!(once.text, raw);
        assert_eq!(once.fixtures, 0);
        assert_eq!(once.diagnostics[0].kind, ParseErrorKind::Unrecognized);
        let twice = normalize_text(&once.text, false).unwrap();
        assert_eq!(twice.text, once.text);
    }

    #[test]
    fn test_strict_mode_stops_at_first_bad_line() {
        let err = normalize_text(RAW, true).unwrap_err();
        assert_eq!(err.line, 7);
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let outcome = normalize_text("", false).unwrap();
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.fixtures, 0);
    }

    #[test]
    fn test_normalize_file_in_place_and_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("round.txt");
        fs::write(&source, "Arsenal 2:1 Chelsea").unwrap();

        let copy = dir.path().join("out").join("round.txt");
        normalize_file(&source, Some(&copy), false).unwrap();
        assert_eq!(fs::read_to_string(&source).unwrap(), "Arsenal 2:1 Chelsea");
        assert_eq!(fs::read_to_string(&copy).unwrap(), "Arsenal - Chelsea 2:1\n");

        normalize_file(&source, None, false).unwrap();
        assert_eq!(fs::read_to_string(&source).unwrap(), "Arsenal - Chelsea 2:1\n");
    }

    #[test]
    fn test_strict_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("round.txt");
        fs::write(&source, "Arsenal 2:1 Chelsea\nBurnley - Leeds 1:x\n").unwrap();
        assert!(normalize_file(&source, None, true).is_err());
        assert_eq!(
            fs::read_to_string(&source).unwrap(),
            "Arsenal 2:1 Chelsea\nBurnley - Leeds 1:x\n"
        );
    }
}
