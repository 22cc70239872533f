//! One-time router allowances for every catalog token.

use crate::chain::{ChainClient, Confirmation};
use crate::config::ApprovalMode;
use crate::errors::Result;
use crate::models::TokenDescriptor;
use crate::tokens::{round_human_amount, to_base_units};
use ethers::types::{Address, U256};
use tracing::{info, warn};

/// What happened to each token during setup, by symbol.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApprovalReport {
    pub approved: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Grants `spender` an unlimited allowance on each token in order.
pub struct ApprovalManager<'a, C: ?Sized> {
    chain: &'a C,
    mode: ApprovalMode,
    confirmations: usize,
}

impl<'a, C: ChainClient + ?Sized> ApprovalManager<'a, C> {
    pub fn new(chain: &'a C, mode: ApprovalMode, confirmations: usize) -> Self {
        Self {
            chain,
            mode,
            confirmations,
        }
    }

    /// Approve every token, one confirmed transaction at a time.
    ///
    /// A failure on one token is logged and recorded, never returned: later
    /// swaps from that token simply fail on their own.
    pub async fn ensure_approvals(
        &self,
        tokens: &[TokenDescriptor],
        spender: Address,
        max_human_amount: f64,
    ) -> ApprovalReport {
        info!(count = tokens.len(), mode = ?self.mode, "[APPROVE] approving tokens");
        let mut report = ApprovalReport::default();

        for token in tokens {
            if self.mode == ApprovalMode::IfNeeded
                && self.already_covered(token, spender, max_human_amount).await
            {
                info!(token = %token.symbol, "[APPROVE] allowance sufficient, skipping");
                report.skipped.push(token.symbol.clone());
                continue;
            }

            match self.approve(token, spender).await {
                Ok(confirmation) => {
                    info!(
                        token = %token.symbol,
                        tx = ?confirmation.tx_hash,
                        block = confirmation.block_number,
                        "[APPROVE] approved"
                    );
                    report.approved.push(token.symbol.clone());
                }
                Err(e) => {
                    warn!(token = %token.symbol, error = %e, "[APPROVE] failed to approve");
                    report.failed.push((token.symbol.clone(), e.to_string()));
                }
            }
        }
        report
    }

    async fn approve(&self, token: &TokenDescriptor, spender: Address) -> Result<Confirmation> {
        let tx_hash = self
            .chain
            .submit_approve(token.contract_address, spender, U256::MAX)
            .await?;
        info!(token = %token.symbol, tx = ?tx_hash, "[APPROVE] submitted");
        self.chain
            .await_confirmation(tx_hash, self.confirmations)
            .await
    }

    /// True when the current allowance already covers the largest swap.
    /// Any read or conversion failure counts as not covered.
    async fn already_covered(
        &self,
        token: &TokenDescriptor,
        spender: Address,
        max_human_amount: f64,
    ) -> bool {
        let human = round_human_amount(max_human_amount, token.decimals);
        let Ok(required) = to_base_units(&human, token.decimals) else {
            return false;
        };
        let owner = self.chain.wallet_address();
        match self
            .chain
            .allowance(token.contract_address, owner, spender)
            .await
        {
            Ok(current) => current >= required,
            Err(e) => {
                warn!(token = %token.symbol, error = %e, "[APPROVE] allowance read failed");
                false
            }
        }
    }
}
