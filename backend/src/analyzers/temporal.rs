//! Temporal activity analysis.
//!
//! Consistency from the coefficient of variation of inter-commit intervals,
//! streaks of consecutive active days, a weighted burnout-risk score, and a
//! seasonality index from monthly commit variance. Everything is computed
//! relative to the last commit timestamp, so the analysis stays a pure
//! function of its input records.

use crate::errors::PipelineError;
use crate::models::{RawCommit, TemporalReport};
use chrono::{DateTime, Datelike, Timelike};
use std::collections::BTreeMap;

/// Minimum commits before interval statistics mean anything.
pub const MIN_COMMITS: usize = 3;

/// Burnout blend weights, percent; sum to 100.
const WEIGHT_INTENSITY: u64 = 40;
const WEIGHT_LATE_NIGHT: u64 = 25;
const WEIGHT_WEEKEND: u64 = 15;
const WEIGHT_DECLINE: u64 = 20;

/// Consistency score 0–100 from interval regularity: 100 * e^(-cv).
///
/// Perfectly regular commits score 100; bursty histories decay toward 0.
pub fn consistency_score(intervals: &[f64]) -> u64 {
    if intervals.is_empty() {
        return 0;
    }
    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mean <= 0.0 {
        return 0;
    }
    let variance =
        intervals.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / intervals.len() as f64;
    let cv = variance.sqrt() / mean;
    (100.0 * (-cv).exp()).round() as u64
}

/// Longest run of consecutive active days.
pub fn longest_streak(day_indices: &[i64]) -> u64 {
    let mut days = day_indices.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut best = 0u64;
    let mut run = 0u64;
    let mut prev: Option<i64> = None;
    for day in days {
        run = match prev {
            Some(p) if day == p + 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

/// Seasonality: coefficient of variation of monthly commit counts, milli.
pub fn seasonality_milli(monthly_counts: &[u64]) -> u64 {
    if monthly_counts.len() < 2 {
        return 0;
    }
    let mean = monthly_counts.iter().sum::<u64>() as f64 / monthly_counts.len() as f64;
    if mean <= 0.0 {
        return 0;
    }
    let variance = monthly_counts
        .iter()
        .map(|c| (*c as f64 - mean).powi(2))
        .sum::<f64>()
        / monthly_counts.len() as f64;
    (variance.sqrt() / mean * 1000.0).round() as u64
}

/// Analyze the temporal shape of a commit history.
pub fn analyze_temporal(commits: &[RawCommit]) -> Result<TemporalReport, PipelineError> {
    if commits.len() < MIN_COMMITS {
        return Err(PipelineError::InsufficientData {
            needed: MIN_COMMITS,
            got: commits.len(),
        });
    }

    let mut timestamps: Vec<i64> = commits.iter().map(|c| c.timestamp).collect();
    timestamps.sort_unstable();
    let first = timestamps[0];
    let last = *timestamps.last().expect("non-empty");
    let span_days = ((last - first).max(0) as u64) / 86_400;

    let intervals: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]) as f64)
        .collect();

    let day_indices: Vec<i64> = timestamps.iter().map(|t| t / 86_400).collect();
    let mut unique_days = day_indices.clone();
    unique_days.sort_unstable();
    unique_days.dedup();

    // Monthly buckets keyed by (year, month).
    let mut monthly: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    let mut late_night = 0u64;
    let mut weekend = 0u64;
    for ts in &timestamps {
        let Some(dt) = DateTime::from_timestamp(*ts, 0) else {
            continue;
        };
        *monthly.entry((dt.year(), dt.month())).or_insert(0) += 1;
        let hour = dt.hour();
        if hour >= 22 || hour < 6 {
            late_night += 1;
        }
        if dt.weekday().number_from_monday() >= 6 {
            weekend += 1;
        }
    }
    let monthly_counts: Vec<u64> = monthly.values().copied().collect();

    let total = timestamps.len() as u64;
    let late_night_pct = late_night * 100 / total;
    let weekend_pct = weekend * 100 / total;

    // Recent intensity relative to the per-30-day average; more than twice
    // the average saturates.
    let recent_cutoff = last - 30 * 86_400;
    let recent = timestamps.iter().filter(|t| **t > recent_cutoff).count() as u64;
    let avg_30d = if span_days == 0 {
        total
    } else {
        (total * 30).div_ceil(span_days)
    };
    let intensity = (recent * 100 / (2 * avg_30d).max(1)).min(100);

    // Consecutive month-over-month declines, 25 points each.
    let mut declines = 0u64;
    for w in monthly_counts.windows(2).rev().take(6) {
        if w[1] < w[0] {
            declines += 1;
        } else {
            break;
        }
    }
    let decline_score = (declines * 25).min(100);

    let burnout_risk = (WEIGHT_INTENSITY * intensity
        + WEIGHT_LATE_NIGHT * late_night_pct
        + WEIGHT_WEEKEND * weekend_pct
        + WEIGHT_DECLINE * decline_score)
        / 100;

    Ok(TemporalReport {
        consistency_score: consistency_score(&intervals),
        longest_streak_days: longest_streak(&day_indices),
        active_days: unique_days.len() as u64,
        burnout_risk,
        seasonality_milli: seasonality_milli(&monthly_counts),
        span_days,
    })
}
