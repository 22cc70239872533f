use super::quote::QuoteService;
use crate::chain::{ChainClient, Confirmation, SwapCall};
use crate::config::SwapSettings;
use crate::errors::{AppError, Result};
use crate::models::{SwapAttempt, SwapOutcome, TokenDescriptor};
use crate::tokens::{round_amount_in_range, to_base_units};
use crate::utils::unix_deadline;
use ethers::types::{Address, TxHash, U256};
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// Fields filled in as a swap progresses, so a failure still reports how far
/// it got.
#[derive(Default)]
struct Progress {
    base_amount_in: Option<U256>,
    amount_out_min: Option<U256>,
    tx_hash: Option<TxHash>,
}

/// Quotes, submits and confirms one swap at a time.
pub struct SwapExecutor<C: ?Sized> {
    chain: Arc<C>,
    router: Address,
    quotes: QuoteService<C>,
    settings: SwapSettings,
}

impl<C: ChainClient + ?Sized> SwapExecutor<C> {
    pub fn new(chain: Arc<C>, router: Address, settings: SwapSettings) -> Self {
        let quotes = QuoteService::new(chain.clone(), router, settings.slippage_bps);
        Self {
            chain,
            router,
            quotes,
            settings,
        }
    }

    /// Draw a human amount from `[amount_min, amount_max]`, rounded to what
    /// `token` can represent without leaving the range.
    pub fn draw_amount<R: Rng + ?Sized>(
        &self,
        token: &TokenDescriptor,
        rng: &mut R,
    ) -> Result<String> {
        let (min, max) = (self.settings.amount_min, self.settings.amount_max);
        let amount = rng.random_range(min..=max);
        round_amount_in_range(amount, min, max, token.decimals).ok_or_else(|| {
            AppError::UnitConversion(format!(
                "no positive {} amount with {} decimals in [{min}, {max}]",
                token.symbol, token.decimals
            ))
        })
    }

    /// Run one swap end to end. Never retries; every error becomes a
    /// [`SwapOutcome::Failure`] on the returned attempt.
    pub async fn execute_swap<R: Rng + ?Sized>(
        &self,
        sequence: u32,
        from: &TokenDescriptor,
        to: &TokenDescriptor,
        rng: &mut R,
    ) -> SwapAttempt {
        let mut progress = Progress::default();
        let (human_amount_in, result) = match self.draw_amount(from, rng) {
            Ok(human) => {
                info!(
                    seq = sequence,
                    from = %from.symbol,
                    to = %to.symbol,
                    amount = %human,
                    "[SWAP] starting"
                );
                let result = self.swap_once(from, to, &human, &mut progress).await;
                (human, result)
            }
            Err(e) => (String::new(), Err(e)),
        };

        let (outcome, confirmed_block) = match result {
            Ok(confirmation) => {
                info!(
                    seq = sequence,
                    tx = ?confirmation.tx_hash,
                    block = confirmation.block_number,
                    "[SWAP] confirmed"
                );
                (SwapOutcome::Success, Some(confirmation.block_number))
            }
            Err(e) => {
                warn!(seq = sequence, tx = ?progress.tx_hash, error = %e, "[SWAP] failed");
                (SwapOutcome::Failure(e.to_string()), None)
            }
        };

        SwapAttempt {
            sequence,
            from: from.clone(),
            to: to.clone(),
            human_amount_in,
            base_amount_in: progress.base_amount_in,
            amount_out_min: progress.amount_out_min,
            tx_hash: progress.tx_hash,
            confirmed_block,
            outcome,
        }
    }

    async fn swap_once(
        &self,
        from: &TokenDescriptor,
        to: &TokenDescriptor,
        human_amount_in: &str,
        progress: &mut Progress,
    ) -> Result<Confirmation> {
        let amount_in = to_base_units(human_amount_in, from.decimals)?;
        progress.base_amount_in = Some(amount_in);

        let path = vec![from.contract_address, to.contract_address];
        let quote = self.quotes.quote(amount_in, &path).await?;
        progress.amount_out_min = Some(quote.amount_out_min);

        let call = SwapCall {
            amount_in,
            amount_out_min: quote.amount_out_min,
            path,
            recipient: self.chain.wallet_address(),
            deadline: U256::from(unix_deadline(self.settings.deadline_secs)?),
            gas_limit: U256::from(self.settings.gas_limit),
        };
        let tx_hash = self.chain.submit_swap(self.router, &call).await?;
        progress.tx_hash = Some(tx_hash);
        info!(tx = ?tx_hash, min_out = %quote.amount_out_min, "[SWAP] submitted");

        self.chain
            .await_confirmation(tx_hash, self.settings.confirmations)
            .await
    }
}
