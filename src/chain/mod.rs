//! Chain access for the router and token contracts.
//!
//! Components only see the [`ChainClient`] trait: typed reads, submission of
//! state-changing calls returning the transaction hash, and a separate wait
//! for confirmation. [`EvmChainClient`] is the ethers-backed implementation.

use crate::errors::Result;
use async_trait::async_trait;
use ethers::{
    contract::abigen,
    types::{Address, TxHash, U256},
};

pub mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::EvmChainClient;

abigen!(
    UniswapV2Router,
    r#"[
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts)
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts)
    ]"#,
);

abigen!(
    Erc20,
    r#"[
        function approve(address spender, uint256 amount) external returns (bool)
        function allowance(address owner, address spender) external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function decimals() external view returns (uint8)
    ]"#,
);

/// Arguments of a single-hop `swapExactTokensForTokens` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCall {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub recipient: Address,
    /// Unix timestamp in seconds.
    pub deadline: U256,
    pub gas_limit: U256,
}

/// A mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the signing wallet.
    fn wallet_address(&self) -> Address;

    /// Router `getAmountsOut` view.
    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256>;

    async fn decimals(&self, token: Address) -> Result<u8>;

    /// Send `approve(spender, amount)` and return once the node accepted it.
    async fn submit_approve(&self, token: Address, spender: Address, amount: U256)
    -> Result<TxHash>;

    /// Send the swap with the call's explicit gas limit.
    async fn submit_swap(&self, router: Address, call: &SwapCall) -> Result<TxHash>;

    /// Wait until `tx_hash` has `confirmations` blocks. A reverted receipt is
    /// an error.
    async fn await_confirmation(&self, tx_hash: TxHash, confirmations: usize)
    -> Result<Confirmation>;
}
