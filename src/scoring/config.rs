use serde::{Deserialize, Serialize};

pub const DEFAULT_EXACT_POINTS: u32 = 4;
pub const DEFAULT_DIFFERENCE_POINTS: u32 = 2;
pub const DEFAULT_OUTCOME_POINTS: u32 = 1;

/// Points awarded per tier.
///
/// Every key is optional; a missing key keeps the default.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   exact: 5
///   difference: 3
///   outcome: 1
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Exact score (default: 4)
    #[serde(default)]
    pub exact: Option<u32>,

    /// Right outcome and goal difference, not a draw (default: 2)
    #[serde(default)]
    pub difference: Option<u32>,

    /// Right outcome only (default: 1)
    #[serde(default)]
    pub outcome: Option<u32>,
}

impl ScoringConfig {
    pub fn points(&self) -> Points {
        Points {
            exact: self.exact.unwrap_or(DEFAULT_EXACT_POINTS),
            difference: self.difference.unwrap_or(DEFAULT_DIFFERENCE_POINTS),
            outcome: self.outcome.unwrap_or(DEFAULT_OUTCOME_POINTS),
        }
    }
}

/// Resolved tier points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Points {
    pub exact: u32,
    pub difference: u32,
    pub outcome: u32,
}

impl Default for Points {
    fn default() -> Self {
        ScoringConfig::default().points()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points() {
        let points = Points::default();
        assert_eq!(points.exact, 4);
        assert_eq!(points.difference, 2);
        assert_eq!(points.outcome, 1);
    }

    #[test]
    fn test_partial_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("exact: 5\n").unwrap();
        assert_eq!(config.exact, Some(5));
        assert!(config.difference.is_none());
        assert_eq!(
            config.points(),
            Points {
                exact: 5,
                difference: 2,
                outcome: 1
            }
        );
    }

    #[test]
    fn test_empty_scoring_config_parse() {
        let config: ScoringConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<ScoringConfig, _> = serde_saphyr::from_str("bonus: 3\n");
        assert!(result.is_err());
    }
}
