use super::spreadsheet::read_first_sheet;
use super::types::{MatchResult, Prediction, Score};
use super::{PredictionsTable, ResultsTable};
use crate::error::ValidationError;
use anyhow::{bail, Context, Result};
use atomic_write_file::AtomicWriteFile;
use rust_xlsxwriter::Workbook;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub const RESULT_COLUMNS: [&str; 6] = [
    "match_id",
    "round",
    "home_team",
    "away_team",
    "home_goals",
    "away_goals",
];

pub const PREDICTION_COLUMNS: [&str; 8] = [
    "match_id",
    "round",
    "user_id",
    "user",
    "home_team",
    "away_team",
    "predicted_home_goals",
    "predicted_away_goals",
];

/// On-disk table format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Xlsx,
    /// Legacy workbook; readable only.
    Xls,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" | "txt" => Ok(TableFormat::Tsv),
            "xlsx" => Ok(TableFormat::Xlsx),
            "xls" => Ok(TableFormat::Xls),
            _ => bail!("Unsupported table type '{}' for {}", ext, path.display()),
        }
    }

    fn delimiter(self) -> u8 {
        match self {
            TableFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// A table row as stored: every column as text, in column order.
trait TableRecord: DeserializeOwned {
    fn cells(&self) -> Vec<String>;
}

#[derive(Debug, Deserialize)]
struct ResultRecord {
    match_id: String,
    round: String,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    #[serde(default)]
    home_goals: String,
    #[serde(default)]
    away_goals: String,
}

#[derive(Debug, Deserialize)]
struct PredictionRecord {
    match_id: String,
    round: String,
    #[serde(default)]
    user_id: String,
    user: String,
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    predicted_home_goals: String,
    predicted_away_goals: String,
}

impl ResultRecord {
    fn into_result(self) -> Result<MatchResult, ValidationError> {
        let match_id = non_empty("match_id", self.match_id)?;
        let round = parse_round(&self.round)?;
        let home = parse_goals("home_goals", &self.home_goals)?;
        let away = parse_goals("away_goals", &self.away_goals)?;
        let score = match (home, away) {
            (Some(h), Some(a)) => Some(Score::new(h, a)),
            (None, None) => None,
            _ => {
                return Err(ValidationError::PartialScore {
                    home: self.home_goals,
                    away: self.away_goals,
                })
            }
        };
        Ok(MatchResult {
            match_id,
            round,
            // Blank names are filled from prediction rows when needed.
            home_team: self.home_team.trim().to_string(),
            away_team: self.away_team.trim().to_string(),
            score,
        })
    }

    fn from_result(row: &MatchResult) -> Self {
        Self {
            match_id: row.match_id.clone(),
            round: row.round.to_string(),
            home_team: row.home_team.clone(),
            away_team: row.away_team.clone(),
            home_goals: row.score.map(|s| s.home.to_string()).unwrap_or_default(),
            away_goals: row.score.map(|s| s.away.to_string()).unwrap_or_default(),
        }
    }
}

impl TableRecord for ResultRecord {
    fn cells(&self) -> Vec<String> {
        vec![
            self.match_id.clone(),
            self.round.clone(),
            self.home_team.clone(),
            self.away_team.clone(),
            self.home_goals.clone(),
            self.away_goals.clone(),
        ]
    }
}

impl TableRecord for PredictionRecord {
    fn cells(&self) -> Vec<String> {
        vec![
            self.match_id.clone(),
            self.round.clone(),
            self.user_id.clone(),
            self.user.clone(),
            self.home_team.clone(),
            self.away_team.clone(),
            self.predicted_home_goals.clone(),
            self.predicted_away_goals.clone(),
        ]
    }
}

impl PredictionRecord {
    fn into_prediction(self) -> Result<Prediction, ValidationError> {
        let home = parse_goals("predicted_home_goals", &self.predicted_home_goals)?
            .ok_or(ValidationError::Empty {
                field: "predicted_home_goals",
            })?;
        let away = parse_goals("predicted_away_goals", &self.predicted_away_goals)?
            .ok_or(ValidationError::Empty {
                field: "predicted_away_goals",
            })?;
        Ok(Prediction {
            match_id: non_empty("match_id", self.match_id)?,
            round: parse_round(&self.round)?,
            user_id: optional(self.user_id),
            user: non_empty("user", self.user)?,
            home_team: optional(self.home_team),
            away_team: optional(self.away_team),
            score: Score::new(home, away),
        })
    }

    fn from_prediction(row: &Prediction) -> Self {
        Self {
            match_id: row.match_id.clone(),
            round: row.round.to_string(),
            user_id: row.user_id.clone().unwrap_or_default(),
            user: row.user.clone(),
            home_team: row.home_team.clone().unwrap_or_default(),
            away_team: row.away_team.clone().unwrap_or_default(),
            predicted_home_goals: row.score.home.to_string(),
            predicted_away_goals: row.score.away.to_string(),
        }
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Integer cell value; spreadsheet exports sometimes write `2.0` for 2.
fn parse_integer(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = match value.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.chars().all(|c| c == '0') => {
            whole
        }
        Some(_) => return None,
        None => value,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub(crate) fn parse_goals(
    field: &'static str,
    value: &str,
) -> Result<Option<u32>, ValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_integer(value)
        .map(Some)
        .ok_or_else(|| ValidationError::Goals {
            field,
            value: value.to_string(),
        })
}

pub(crate) fn parse_round(value: &str) -> Result<u32, ValidationError> {
    match parse_integer(value) {
        Some(round) if round > 0 => Ok(round),
        _ => Err(ValidationError::Round {
            value: value.to_string(),
        }),
    }
}

fn read_records<T: TableRecord>(path: &Path) -> Result<Vec<(usize, T)>> {
    match TableFormat::from_path(path)? {
        format @ (TableFormat::Csv | TableFormat::Tsv) => read_delimited(path, format),
        TableFormat::Xlsx | TableFormat::Xls => read_workbook(path),
    }
}

fn read_delimited<T: TableRecord>(path: &Path, format: TableFormat) -> Result<Vec<(usize, T)>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open table at {}", path.display()))?;

    let mut records = Vec::new();
    for (index, record) in reader.deserialize().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record: T = record
            .with_context(|| format!("Failed to read row {} of {}", line, path.display()))?;
        records.push((line, record));
    }
    Ok(records)
}

/// First worksheet, header in its first non-empty row; blank rows are skipped.
fn read_workbook<T: TableRecord>(path: &Path) -> Result<Vec<(usize, T)>> {
    let mut rows = read_first_sheet(path)?
        .into_iter()
        .filter(|(_, cells)| cells.iter().any(|cell| !cell.is_empty()));
    let Some((_, header)) = rows.next() else {
        return Ok(Vec::new());
    };
    let header = csv::StringRecord::from(header);

    let mut records = Vec::new();
    for (line, cells) in rows {
        let record: T = csv::StringRecord::from(cells)
            .deserialize(Some(&header))
            .with_context(|| format!("Failed to read row {} of {}", line, path.display()))?;
        records.push((line, record));
    }
    Ok(records)
}

/// Load the results table. A missing file is an empty table.
pub fn load_results(path: &Path) -> Result<ResultsTable> {
    if !path.exists() {
        return Ok(ResultsTable::default());
    }
    let mut rows = Vec::new();
    for (line, record) in read_records::<ResultRecord>(path)? {
        let row = record
            .into_result()
            .with_context(|| format!("Invalid result on row {} of {}", line, path.display()))?;
        rows.push(row);
    }
    ResultsTable::new(rows).with_context(|| format!("Invalid results table {}", path.display()))
}

/// Load the predictions table. A missing file is an empty table.
pub fn load_predictions(path: &Path) -> Result<PredictionsTable> {
    if !path.exists() {
        return Ok(PredictionsTable::default());
    }
    let mut rows = Vec::new();
    for (line, record) in read_records::<PredictionRecord>(path)? {
        let row = record.into_prediction().with_context(|| {
            format!("Invalid prediction on row {} of {}", line, path.display())
        })?;
        rows.push(row);
    }
    Ok(PredictionsTable::new(rows))
}

fn write_records<T: TableRecord>(path: &Path, columns: &[&str], records: &[T]) -> Result<()> {
    let bytes = match TableFormat::from_path(path)? {
        format @ (TableFormat::Csv | TableFormat::Tsv) => {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .from_writer(Vec::new());
            writer
                .write_record(columns)
                .context("Failed to write table header")?;
            for record in records {
                writer
                    .write_record(record.cells())
                    .context("Failed to write table row")?;
            }
            writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("Failed to flush table: {}", e))?
        }
        TableFormat::Xlsx => workbook_table_bytes(columns, records)?,
        TableFormat::Xls => bail!(
            "Cannot write legacy .xls table {}; use .xlsx, .csv or .tsv",
            path.display()
        ),
    };
    write_atomically(path, &bytes)
}

fn workbook_table_bytes<T: TableRecord>(columns: &[&str], records: &[T]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        for (col_idx, title) in columns.iter().enumerate() {
            worksheet
                .write_string(0, col_idx as u16, *title)
                .with_context(|| format!("write header cell {col_idx}"))?;
        }
        for (row_idx, record) in records.iter().enumerate() {
            let row = row_idx as u32 + 1;
            for (col_idx, value) in record.cells().iter().enumerate() {
                let col = col_idx as u16;
                let written = match value.parse::<u32>() {
                    // Text such as "007" stays text.
                    Ok(number) if number.to_string() == *value => {
                        worksheet.write_number(row, col, number)
                    }
                    _ if value.is_empty() => continue,
                    _ => worksheet.write_string(row, col, value),
                };
                written.with_context(|| format!("write cell ({row},{col_idx})"))?;
            }
        }
    }
    workbook
        .save_to_buffer()
        .context("Failed to build table workbook")
}

/// Replace `path` with `bytes` in one step, creating parent directories.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;
    Ok(())
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Persist the results table atomically.
pub fn save_results(path: &Path, table: &ResultsTable) -> Result<()> {
    let records: Vec<_> = table.rows().iter().map(ResultRecord::from_result).collect();
    write_records(path, &RESULT_COLUMNS, &records)
}

/// Persist the predictions table atomically.
pub fn save_predictions(path: &Path, table: &PredictionsTable) -> Result<()> {
    let records: Vec<_> = table
        .rows()
        .iter()
        .map(PredictionRecord::from_prediction)
        .collect();
    write_records(path, &PREDICTION_COLUMNS, &records)
}
