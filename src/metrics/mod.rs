// Team-season efficiency metrics: aggregation and year-over-year stability.

pub mod aggregate;
pub mod stability;

pub use aggregate::{aggregate_team_seasons, Role, TeamSeasonMetric};
pub use stability::{analyze_stability, lag_metrics, EpaMetric, LaggedMetric, StabilityReport};
