//! Bounded loop of randomized swap attempts.

use crate::chain::ChainClient;
use crate::config::RunSettings;
use crate::errors::{AppError, Result};
use crate::models::{RunState, SwapAttempt};
use crate::swap::{SwapExecutor, pick_pair};
use crate::tokens::TokenRegistry;
use rand::Rng;
use std::time::Duration;
use tracing::{error, info};

/// Drives `max_swaps` attempts, one in flight at a time, with a random pause
/// between consecutive attempts. Individual failures never stop the loop.
pub struct RunLoop<C: ?Sized, R> {
    executor: SwapExecutor<C>,
    registry: TokenRegistry,
    settings: RunSettings,
    rng: R,
    state: RunState,
    history: Vec<SwapAttempt>,
}

impl<C: ChainClient + ?Sized, R: Rng> RunLoop<C, R> {
    pub fn new(
        executor: SwapExecutor<C>,
        registry: TokenRegistry,
        settings: RunSettings,
        rng: R,
    ) -> Result<Self> {
        if registry.list_tokens().len() < 2 {
            return Err(AppError::Config(
                "run loop needs at least two tokens".into(),
            ));
        }
        Ok(Self {
            executor,
            registry,
            settings,
            rng,
            state: RunState::default(),
            history: Vec::new(),
        })
    }

    /// Counters so far. Equal to what [`RunLoop::run`] returns once it ends.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Attempts made so far, in order.
    pub fn history(&self) -> &[SwapAttempt] {
        &self.history
    }

    /// Run until `max_swaps` attempts have completed and return the counters.
    pub async fn run(&mut self) -> RunState {
        info!(
            target_swaps = self.settings.max_swaps,
            delay_min_ms = self.settings.delay_min_ms,
            delay_max_ms = self.settings.delay_max_ms,
            "[RUN] starting auto swap with random pairs"
        );

        while self.state.attempts_completed < self.settings.max_swaps {
            let attempt = match self.next_attempt().await {
                Ok(attempt) => attempt,
                Err(e) => {
                    error!(error = %e, "[RUN] cannot pick a pair, stopping");
                    break;
                }
            };
            self.state.record(&attempt.outcome);
            self.history.push(attempt);

            info!(
                completed = self.state.attempts_completed,
                max = self.settings.max_swaps,
                success = self.state.success_count,
                failed = self.state.failure_count,
                "[RUN] progress"
            );

            if self.state.attempts_completed < self.settings.max_swaps {
                let delay = self.draw_delay();
                info!(delay_ms = delay.as_millis() as u64, "[RUN] waiting");
                tokio::time::sleep(delay).await;
            }
        }

        info!("[RUN] completed");
        self.state
    }

    async fn next_attempt(&mut self) -> Result<SwapAttempt> {
        let sequence = self.state.attempts_completed + 1;
        let (from, to) = pick_pair(self.registry.list_tokens(), &mut self.rng)?;
        Ok(self
            .executor
            .execute_swap(sequence, from, to, &mut self.rng)
            .await)
    }

    fn draw_delay(&mut self) -> Duration {
        let ms = self
            .rng
            .random_range(self.settings.delay_min_ms..=self.settings.delay_max_ms);
        Duration::from_millis(ms)
    }
}
