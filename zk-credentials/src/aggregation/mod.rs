//! Portfolio-level aggregation circuits.
//!
//! These combine per-repository outputs across a user's whole portfolio.
//! The repository aggregator discloses bounded sums and derived scores; the
//! statistics aggregator discloses differentially-private robust statistics.

pub mod repositories;
pub mod statistics;

pub use repositories::RepositoryAggregatorCircuit;
pub use statistics::StatsAggregatorCircuit;
