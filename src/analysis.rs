//! # Analysis Module - Post-Run Metrics
//!
//! Summary statistics over solver envelopes and environment episodes:
//! evacuation times, success rates, and exit-usage fairness. Used by the
//! CLI's rollout command and by evaluation workflows that compare policies
//! across scenarios.

use crate::envelope::SimulationOutcome;
use crate::error::SimError;
use crate::rl::reward::gini;
use crate::rl::{EnvConfig, EvacuationEnv, NUM_ACTIONS, Observation};
use crate::scenario::Scenario;
use log::info;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Metrics of a single environment episode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    /// Steps until termination.
    pub steps: usize,
    /// Agents evacuated at the end.
    pub evacuated: usize,
    /// Evacuated fraction of the head count.
    pub success_rate: f64,
    /// Total reward accumulated.
    pub total_reward: f64,
    /// Gini coefficient of the final exit usage.
    pub exit_gini: f64,
}

/// Aggregate over a batch of episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub episodes: Vec<EpisodeMetrics>,
    pub avg_evacuation_time: f64,
    pub avg_success_rate: f64,
    pub avg_exit_gini: f64,
}

impl EvaluationReport {
    fn from_episodes(episodes: Vec<EpisodeMetrics>) -> Self {
        let count = episodes.len().max(1) as f64;
        EvaluationReport {
            avg_evacuation_time: episodes.iter().map(|e| e.steps as f64).sum::<f64>() / count,
            avg_success_rate: episodes.iter().map(|e| e.success_rate).sum::<f64>() / count,
            avg_exit_gini: episodes.iter().map(|e| e.exit_gini).sum::<f64>() / count,
            episodes,
        }
    }
}

/// Runs one episode under a caller-provided policy.
///
/// The policy sees the current observation and returns an action index.
pub fn run_episode<P>(
    env: &mut EvacuationEnv,
    seed: u64,
    mut policy: P,
) -> Result<EpisodeMetrics, SimError>
where
    P: FnMut(&Observation) -> usize,
{
    let mut observation = env.reset(seed)?;
    let mut total_reward = 0.0;
    let num_agents = env.agent_status().len();

    loop {
        let action = policy(&observation);
        let result = env.step(action)?;
        total_reward += result.reward;
        observation = result.observation;
        if result.done {
            break;
        }
    }

    let usage: Vec<f64> = env.exit_usage().iter().map(|&u| u as f64).collect();
    let evacuated = env.evacuated();
    Ok(EpisodeMetrics {
        steps: env.step_count(),
        evacuated,
        success_rate: evacuated as f64 / num_agents.max(1) as f64,
        total_reward,
        exit_gini: gini(&normalized(&usage)),
    })
}

/// Evaluates a stationary uniform random policy over a batch of episodes,
/// seeding episode `i` with `base_seed + i`.
pub fn evaluate_random_policy(
    scenario: &Scenario,
    config: EnvConfig,
    episodes: usize,
    base_seed: u64,
) -> Result<EvaluationReport, SimError> {
    if episodes == 0 {
        return Err(SimError::InvalidParameters("episodes must be positive".into()));
    }
    let mut env = EvacuationEnv::new(scenario, config)?;
    let mut results = Vec::with_capacity(episodes);
    for i in 0..episodes {
        let seed = base_seed + i as u64;
        let mut policy_rng = StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
        let metrics = run_episode(&mut env, seed, |_| policy_rng.random_range(0..NUM_ACTIONS))?;
        results.push(metrics);
    }
    info!(
        "random-policy evaluation over {} episodes: success {:.2}, gini {:.3}",
        episodes,
        results.iter().map(|e| e.success_rate).sum::<f64>() / episodes as f64,
        results.iter().map(|e| e.exit_gini).sum::<f64>() / episodes as f64,
    );
    Ok(EvaluationReport::from_episodes(results))
}

/// First step at which the cumulative evacuation reaches 99% of its final
/// value, for envelopes that carry an evacuation series.
pub fn evacuation_time(outcome: &SimulationOutcome) -> Option<usize> {
    if let Some(safe) = &outcome.safe_agents {
        let last = *safe.last()?;
        if last == 0 {
            return None;
        }
        let target = (last as f64 * 0.99).ceil() as usize;
        return safe.iter().position(|&v| v >= target);
    }
    if let Some(evacuated) = &outcome.evacuated_count {
        let total: f64 = evacuated.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let target = total * 0.99;
        let mut cumulative = 0.0;
        for (t, &v) in evacuated.iter().enumerate() {
            cumulative += v;
            if cumulative >= target {
                return Some(t);
            }
        }
    }
    None
}

fn normalized(shares: &[f64]) -> Vec<f64> {
    let total: f64 = shares.iter().sum();
    if total <= 0.0 {
        return shares.to_vec();
    }
    shares.iter().map(|&s| s / total).collect()
}
