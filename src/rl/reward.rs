//! Gini coefficient and reward assembly for the evacuation environment.
//!

/// Weight of each newly evacuated agent.
const EVACUATION_REWARD: f64 = 10.0;
/// Weight of the hazard exposure penalty.
const HAZARD_PENALTY_WEIGHT: f64 = 2.0;
/// Gini threshold under which the fairness bonus pays out.
const FAIRNESS_THRESHOLD: f64 = 0.1;
/// Scale of the fairness bonus.
const FAIRNESS_SCALE: f64 = 5.0;

/// Gini coefficient of a non-negative share distribution.
///
/// Returns a value in `[0, 1]`: 0 for perfectly equal shares, approaching 1
/// for a fully concentrated distribution. An all-zero input yields 0.
///
/// # Examples
/// ```
/// # use evacuation_lib::rl::reward::gini;
/// assert_eq!(gini(&[0.25, 0.25, 0.25, 0.25]), 0.0);
/// assert!(gini(&[1.0, 0.0, 0.0, 0.0]) > 0.7);
/// assert_eq!(gini(&[0.0, 0.0]), 0.0);
/// ```
pub fn gini(shares: &[f64]) -> f64 {
    let total: f64 = shares.iter().sum();
    if shares.is_empty() || total <= 0.0 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = shares.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (2.0 * (i + 1) as f64 - n - 1.0) * x)
        .sum();
    weighted / (n * total)
}

/// Fairness bonus from raw per-exit usage counts.
///
/// Shares are normalized to sum one; the bonus pays `max(0, 0.1 − G) · 5`.
/// No bonus accrues before the first evacuation, since usage carries no
/// information yet.
pub fn fairness_bonus(exit_usage: &[usize]) -> f64 {
    let total: usize = exit_usage.iter().sum();
    if exit_usage.is_empty() || total == 0 {
        return 0.0;
    }
    let shares: Vec<f64> = exit_usage
        .iter()
        .map(|&u| u as f64 / total as f64)
        .collect();
    (FAIRNESS_THRESHOLD - gini(&shares)).max(0.0) * FAIRNESS_SCALE
}

/// Scalar step reward.
pub fn step_reward(newly_evacuated: usize, hazard_penalty: f64, fairness: f64) -> f64 {
    newly_evacuated as f64 * EVACUATION_REWARD - hazard_penalty * HAZARD_PENALTY_WEIGHT + fairness
}
