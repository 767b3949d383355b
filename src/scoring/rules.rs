use super::config::Points;
use crate::table::{Outcome, Score};

/// How close a prediction came to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Exact,
    /// Right outcome and goal difference; never a draw.
    Difference,
    Outcome,
    Miss,
}

impl Tier {
    pub fn points(self, points: &Points) -> u32 {
        match self {
            Tier::Exact => points.exact,
            Tier::Difference => points.difference,
            Tier::Outcome => points.outcome,
            Tier::Miss => 0,
        }
    }
}

/// Classify a prediction against the actual score. First matching tier wins.
pub fn classify(predicted: Score, actual: Score) -> Tier {
    if predicted == actual {
        Tier::Exact
    } else if predicted.outcome() != actual.outcome() {
        Tier::Miss
    } else if actual.outcome() != Outcome::Draw && predicted.difference() == actual.difference() {
        Tier::Difference
    } else {
        Tier::Outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(predicted: (u32, u32), actual: (u32, u32)) -> Tier {
        classify(
            Score::new(predicted.0, predicted.1),
            Score::new(actual.0, actual.1),
        )
    }

    #[test]
    fn test_tiers() {
        assert_eq!(tier((2, 1), (2, 1)), Tier::Exact);
        assert_eq!(tier((3, 1), (2, 0)), Tier::Difference);
        assert_eq!(tier((1, 0), (3, 0)), Tier::Outcome);
        assert_eq!(tier((1, 0), (0, 1)), Tier::Miss);
        assert_eq!(tier((0, 0), (0, 0)), Tier::Exact);
        assert_eq!(tier((1, 2), (0, 1)), Tier::Difference);
        assert_eq!(tier((0, 0), (1, 0)), Tier::Miss);
    }

    #[test]
    fn test_draws_never_score_difference_tier() {
        assert_eq!(tier((1, 1), (2, 2)), Tier::Outcome);
        assert_eq!(tier((0, 0), (3, 3)), Tier::Outcome);
    }

    #[test]
    fn test_default_points_per_tier() {
        let points = Points::default();
        assert_eq!(Tier::Exact.points(&points), 4);
        assert_eq!(Tier::Difference.points(&points), 2);
        assert_eq!(Tier::Outcome.points(&points), 1);
        assert_eq!(Tier::Miss.points(&points), 0);
    }

    #[test]
    fn test_symmetric_under_home_away_swap() {
        for ph in 0..5 {
            for pa in 0..5 {
                for ah in 0..5 {
                    for aa in 0..5 {
                        let predicted = Score::new(ph, pa);
                        let actual = Score::new(ah, aa);
                        assert_eq!(
                            classify(predicted, actual),
                            classify(predicted.swapped(), actual.swapped()),
                            "{:?} vs {:?}",
                            predicted,
                            actual
                        );
                    }
                }
            }
        }
    }
}
