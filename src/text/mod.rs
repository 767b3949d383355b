pub mod aliases;
pub mod grammar;
pub mod normalize;

pub use aliases::TeamNames;
pub use grammar::{clean_line, parse_line, Fixture, Line};
pub use normalize::{normalize_file, normalize_text, NormalizeOutcome};

/// Zero-width characters that sneak in from chat apps and web copies.
pub const INVISIBLE_CHARACTERS: &[char] = &['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

/// Source lines of a template; `\r\n` and lone `\r` both end a line.
pub fn source_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Parse every line of a template, pairing results with 1-based line numbers.
pub fn parse_text(text: &str) -> Vec<(usize, Result<Line, crate::error::ParseError>)> {
    source_lines(text)
        .iter()
        .enumerate()
        .map(|(index, raw)| (index + 1, parse_line(index + 1, raw)))
        .collect()
}
