use super::{ChainClient, Confirmation, Erc20, SwapCall, UniswapV2Router};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use ethers::{
    contract::ContractError,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, TxHash, U64, U256},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Signing JSON-RPC client bound to one wallet.
#[derive(Clone)]
pub struct EvmChainClient {
    client: Arc<SignerClient>,
    confirmation_timeout: Duration,
}

impl EvmChainClient {
    /// Connect to `rpc_url` and bind `private_key` to the node's chain id.
    ///
    /// The chain id query doubles as the connectivity check, so an
    /// unreachable endpoint fails here rather than on the first swap.
    pub async fn connect(
        rpc_url: &str,
        expected_chain_id: Option<u64>,
        private_key: &str,
        confirmation_timeout: Duration,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        let chain_id = provider.get_chainid().await?.as_u64();
        if let Some(expected) = expected_chain_id {
            if expected != chain_id {
                return Err(AppError::Config(format!(
                    "CHAIN_ID is {expected} but {rpc_url} reports {chain_id}"
                )));
            }
        }

        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let wallet: LocalWallet = key.parse()?;
        let wallet = wallet.with_chain_id(chain_id);
        info!(chain_id, "[INIT] connected to rpc");

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            confirmation_timeout,
        })
    }

    fn router(&self, address: Address) -> UniswapV2Router<SignerClient> {
        UniswapV2Router::new(address, self.client.clone())
    }

    fn erc20(&self, address: Address) -> Erc20<SignerClient> {
        Erc20::new(address, self.client.clone())
    }
}

/// Map an ethers contract error onto the application's error kinds.
fn classify<M: Middleware>(err: ContractError<M>) -> AppError {
    if err.is_revert() {
        return AppError::ContractRevert(err.to_string());
    }
    match &err {
        ContractError::MiddlewareError { .. } | ContractError::ProviderError { .. } => {
            AppError::Connectivity(err.to_string())
        }
        _ => AppError::Other(err.to_string()),
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn wallet_address(&self) -> Address {
        self.client.address()
    }

    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>> {
        self.router(router)
            .get_amounts_out(amount_in, path)
            .call()
            .await
            .map_err(classify)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        self.erc20(token)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(classify)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        self.erc20(token)
            .balance_of(owner)
            .call()
            .await
            .map_err(classify)
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.erc20(token).decimals().call().await.map_err(classify)
    }

    async fn submit_approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash> {
        let erc20 = self.erc20(token);
        let call = erc20.approve(spender, amount);
        let pending = call.send().await.map_err(classify)?;
        Ok(*pending)
    }

    async fn submit_swap(&self, router: Address, swap: &SwapCall) -> Result<TxHash> {
        let router = self.router(router);
        let call = router
            .swap_exact_tokens_for_tokens(
                swap.amount_in,
                swap.amount_out_min,
                swap.path.clone(),
                swap.recipient,
                swap.deadline,
            )
            .gas(swap.gas_limit);
        let pending = call.send().await.map_err(classify)?;
        Ok(*pending)
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<Confirmation> {
        debug!(?tx_hash, confirmations, "[CHAIN] waiting for receipt");
        let pending =
            PendingTransaction::new(tx_hash, self.client.provider()).confirmations(confirmations);
        let receipt = tokio::time::timeout(self.confirmation_timeout, pending)
            .await
            .map_err(|_| AppError::ConfirmationTimeout {
                tx_hash,
                secs: self.confirmation_timeout.as_secs(),
            })??
            .ok_or_else(|| {
                AppError::Connectivity(format!("transaction {tx_hash:?} was dropped"))
            })?;

        let block_number = receipt.block_number.map(|b| b.as_u64()).unwrap_or_default();
        if receipt.status == Some(U64::zero()) {
            return Err(AppError::ContractRevert(format!(
                "transaction {tx_hash:?} reverted in block {block_number}"
            )));
        }
        Ok(Confirmation {
            tx_hash,
            block_number,
        })
    }
}
