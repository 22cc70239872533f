use anyhow::Result;
use auto_swapper::{
    approvals::ApprovalManager,
    chain::{ChainClient, EvmChainClient},
    config::{self, AppConfig},
    models::WalletSession,
    runner::RunLoop,
    summary::Summary,
    swap::SwapExecutor,
    tokens::TokenRegistry,
    utils,
};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    // Configuration
    let config = AppConfig::from_env()?;
    let private_key = config::private_key_from_env()?;
    tracing::info!(network = %config.network_name, rpc = %config.rpc_url, "[INIT] auto-swapper starting");
    tracing::info!("[INIT] press Ctrl+C to stop anytime");

    // Ctrl+C is honoured from the first network call on, not only once swapping starts.
    match utils::until_interrupted(run(config, private_key), utils::shutdown_signal()).await {
        Some(result) => result,
        None => {
            // In-flight transactions are not awaited and may still confirm.
            tracing::info!("[STOP] stopping auto swapper");
            Ok(())
        }
    }
}

async fn run(config: AppConfig, private_key: String) -> Result<()> {
    // Unreachable RPC or a bad key ends the process here, before any swap.
    let chain = Arc::new(
        EvmChainClient::connect(
            &config.rpc_url,
            config.chain_id,
            &private_key,
            config.confirmation_timeout,
        )
        .await?,
    );
    drop(private_key);
    let wallet = WalletSession::new(chain.wallet_address());
    tracing::info!(wallet = ?wallet.address, "[INIT] wallet ready");

    // Setup ---------------------------------------------------------------
    let registry = TokenRegistry::new(config.tokens.clone());
    registry.verify_decimals(chain.as_ref()).await;
    registry.log_balances(chain.as_ref(), wallet.address).await;

    let report = ApprovalManager::new(
        chain.as_ref(),
        config.approval_mode,
        config.swap.confirmations,
    )
    .ensure_approvals(
        registry.list_tokens(),
        config.router_address,
        config.swap.amount_max,
    )
    .await;
    if !report.failed.is_empty() {
        tracing::warn!(failed = ?report.failed, "[INIT] some approvals failed, swaps from those tokens will fail");
    }

    // Run -----------------------------------------------------------------
    let rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let executor = SwapExecutor::new(chain.clone(), config.router_address, config.swap.clone());
    let mut run_loop = RunLoop::new(executor, registry, config.run.clone(), rng)?;

    let state = run_loop.run().await;
    let summary = Summary::new(&state, &wallet, &config.explorer_url);
    tracing::info!("\n{summary}");
    Ok(())
}
