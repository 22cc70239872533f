//! Shared data structures used throughout the application.

use ethers::types::{Address, TxHash, U256};
use serde::Deserialize;

/// A tradeable ERC-20 token from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenDescriptor {
    #[serde(rename = "address")]
    pub contract_address: Address,
    pub symbol: String,
    /// Fixed-point scale between human amounts and base units.
    pub decimals: u8,
}

impl TokenDescriptor {
    pub fn new(contract_address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            contract_address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// The signing identity, shared read-only by every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Address,
}

impl WalletSession {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Block explorer page for this wallet.
    pub fn explorer_link(&self, explorer_url: &str) -> String {
        format!("{}/address/{:?}", explorer_url.trim_end_matches('/'), self.address)
    }
}

/// Terminal result of a single swap attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    Success,
    Failure(String),
}

impl SwapOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SwapOutcome::Success)
    }
}

/// Record of one iteration of the run loop. Built once, never mutated after.
#[derive(Debug, Clone)]
pub struct SwapAttempt {
    pub sequence: u32,
    pub from: TokenDescriptor,
    pub to: TokenDescriptor,
    /// Human amount after rounding, as submitted for unit conversion.
    pub human_amount_in: String,
    pub base_amount_in: Option<U256>,
    pub amount_out_min: Option<U256>,
    pub tx_hash: Option<TxHash>,
    pub confirmed_block: Option<u64>,
    pub outcome: SwapOutcome,
}

/// Counters owned by the run loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub attempts_completed: u32,
    pub success_count: u32,
    pub failure_count: u32,
}

impl RunState {
    pub fn record(&mut self, outcome: &SwapOutcome) {
        self.attempts_completed += 1;
        if outcome.is_success() {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }

    /// Percentage of successful attempts, `None` before the first attempt.
    pub fn success_rate(&self) -> Option<f64> {
        if self.attempts_completed == 0 {
            return None;
        }
        Some(self.success_count as f64 / self.attempts_completed as f64 * 100.0)
    }
}
