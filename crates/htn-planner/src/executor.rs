// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stochastic plan execution driven by each action's outcome weights.
//!
//! The executor never touches planner state. It replays a plan against a
//! private copy of the world, drawing one outcome per action: outcome `0`
//! applies the effect, any other outcome is a failure that ends the trace.
//! A fixed seed reproduces the same trace.
use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::ExecutorConfig;
use crate::domain::Domain;
use crate::engine_impl::PlanError;
use crate::payload::Call;
use crate::state::State;

/// One entry of an execution trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// The action attempted; `None` for the leading initial-state entry.
    pub action: Option<Call>,
    /// Resulting state; `None` when the action failed.
    pub state: Option<State>,
}

impl ExecutionStep {
    /// Returns `true` when this step ended the run with a failure.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.state.is_none()
    }
}

/// Seeded Monte Carlo executor.
pub struct MonteCarloExecutor {
    domain: Arc<Domain>,
    rng: ChaCha8Rng,
}

impl MonteCarloExecutor {
    /// Creates an executor seeded from `config`.
    pub fn new(domain: Arc<Domain>, config: &ExecutorConfig) -> Self {
        Self {
            domain,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Runs `plan` from `state` and returns the trace.
    ///
    /// The trace starts with the initial state. It stops early at the first
    /// failed step, whose `state` is `None`.
    ///
    /// # Errors
    /// [`PlanError::UnknownAction`] for an undeclared action and
    /// [`PlanError::InvalidModel`] for weights that cannot be sampled.
    #[instrument(skip_all, fields(steps = plan.len()))]
    pub fn execute(&mut self, state: &State, plan: &[Call]) -> Result<Vec<ExecutionStep>, PlanError> {
        let mut trace = vec![ExecutionStep {
            action: None,
            state: Some(state.clone()),
        }];
        let mut current = state.clone();
        for call in plan {
            let action = self
                .domain
                .action(&call.name)
                .ok_or_else(|| PlanError::UnknownAction(call.name.clone()))?;
            let model = self
                .domain
                .action_model(&call.name)
                .ok_or_else(|| PlanError::UnknownAction(call.name.clone()))?;
            let outcomes = WeightedIndex::new(&model.outcome_weights)
                .map_err(|_| PlanError::InvalidModel(call.name.clone()))?;
            let outcome = outcomes.sample(&mut self.rng);

            let next = if outcome == 0 {
                (action.func)(current.clone(), &call.args)
            } else {
                None
            };
            debug!(%call, outcome, applied = next.is_some(), "executed");
            trace.push(ExecutionStep {
                action: Some(call.clone()),
                state: next.clone(),
            });
            match next {
                Some(next) => current = next,
                None => {
                    info!(%call, "execution failed");
                    return Ok(trace);
                }
            }
        }
        info!("execution succeeded");
        Ok(trace)
    }
}
