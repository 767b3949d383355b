use super::config::ScoringConfig;

/// Upper bound for any single tier.
pub const MAX_TIER_POINTS: u32 = 1000;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let points = config.points();

    if points.exact == 0 {
        errors.push("scoring.exact: must be greater than zero".to_string());
    }
    for (key, value) in [
        ("exact", points.exact),
        ("difference", points.difference),
        ("outcome", points.outcome),
    ] {
        if value > MAX_TIER_POINTS {
            errors.push(format!(
                "scoring.{}: {} exceeds the limit of {}",
                key, value, MAX_TIER_POINTS
            ));
        }
    }
    if points.difference > points.exact {
        errors.push(format!(
            "scoring.difference: {} exceeds scoring.exact ({})",
            points.difference, points.exact
        ));
    }
    if points.outcome > points.difference {
        errors.push(format!(
            "scoring.outcome: {} exceeds scoring.difference ({})",
            points.outcome, points.difference
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
