//! Metric-extraction analyzers.
//!
//! Pure, deterministic functions over immutable input records. Analyzer
//! execution over a user's repository set is parallel per repository; the
//! aggregation stage joins after all per-repository analysis completes.

pub mod classify;
pub mod collaboration;
pub mod diversity;
pub mod language;
pub mod repository;
pub mod temporal;
