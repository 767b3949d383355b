use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::scoring::ScoringConfig;

pub const DEFAULT_MATCH_PREFIX: &str = "M";
pub const DEFAULT_RESULTS_PATH: &str = "data/results.csv";
pub const DEFAULT_PREDICTIONS_PATH: &str = "data/predictions.csv";
pub const DEFAULT_REPORT_PATH: &str = "output/standings.xlsx";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Prefix for generated match ids (default: "M")
    #[serde(default)]
    pub match_prefix: Option<String>,

    /// Worksheet name of the xlsx report (default: "Standings")
    #[serde(default)]
    pub sheet: Option<String>,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Extra team spellings, alias -> canonical name
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

/// Default table and report locations, relative to the working directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(default)]
    pub results: Option<PathBuf>,
    #[serde(default)]
    pub predictions: Option<PathBuf>,
    #[serde(default)]
    pub report: Option<PathBuf>,
}

impl Config {
    pub fn match_prefix(&self) -> &str {
        self.match_prefix.as_deref().unwrap_or(DEFAULT_MATCH_PREFIX)
    }

    pub fn sheet(&self) -> &str {
        self.sheet
            .as_deref()
            .unwrap_or(crate::output::DEFAULT_SHEET)
    }

    pub fn results_path(&self) -> PathBuf {
        self.paths
            .results
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_PATH))
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.paths
            .predictions
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREDICTIONS_PATH))
    }

    pub fn report_path(&self) -> PathBuf {
        self.paths
            .report
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH))
    }
}
