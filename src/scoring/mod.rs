pub mod config;
pub mod engine;
pub mod rules;
pub mod validation;

pub use config::{Points, ScoringConfig};
pub use engine::{compute_standings, RoundTally, Standings, StandingsRow};
pub use rules::{classify, Tier};
pub use validation::validate_scoring;
