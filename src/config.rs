//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use crate::models::TokenDescriptor;
use crate::tokens;
use ethers::types::Address;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const DEFAULT_RPC_URL: &str = "https://testnet.riselabs.xyz";
const DEFAULT_NETWORK_NAME: &str = "RISE Testnet";
const DEFAULT_EXPLORER_URL: &str = "https://explorer.testnet.riselabs.xyz";
const DEFAULT_ROUTER_ADDRESS: &str = "0x5eC9BEaCe4a0f46F77945D54511e2b454cb8F38E";

/// How setup treats existing router allowances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMode {
    /// Reissue the unlimited approval for every token on every run.
    Always,
    /// Skip tokens whose allowance already covers the largest swap.
    IfNeeded,
}

impl FromStr for ApprovalMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "if-needed" | "if_needed" => Ok(Self::IfNeeded),
            other => Err(AppError::Config(format!(
                "APPROVAL_MODE must be `always` or `if-needed`, got `{other}`"
            ))),
        }
    }
}

/// Parameters of a single swap.
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub amount_min: f64,
    pub amount_max: f64,
    /// Tolerance subtracted from the quote, in basis points.
    pub slippage_bps: u32,
    pub gas_limit: u64,
    pub deadline_secs: u64,
    pub confirmations: usize,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            amount_min: 0.5,
            amount_max: 2.0,
            slippage_bps: 500,
            gas_limit: 200_000,
            deadline_secs: 300,
            confirmations: 1,
        }
    }
}

/// Bounds of the run loop.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub max_swaps: u32,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_swaps: 50,
            delay_min_ms: 15_000,
            delay_max_ms: 30_000,
        }
    }
}

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rpc_url: String,
    pub network_name: String,
    /// Checked against the node when set.
    pub chain_id: Option<u64>,
    pub explorer_url: String,
    pub router_address: Address,
    pub tokens: Vec<TokenDescriptor>,
    pub swap: SwapSettings,
    pub run: RunSettings,
    pub approval_mode: ApprovalMode,
    pub confirmation_timeout: Duration,
    pub rng_seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.into());
        Url::parse(&rpc_url)?;
        let explorer_url = get("EXPLORER_URL").unwrap_or_else(|| DEFAULT_EXPLORER_URL.into());
        Url::parse(&explorer_url)?;

        let router_raw = get("ROUTER_ADDRESS").unwrap_or_else(|| DEFAULT_ROUTER_ADDRESS.into());
        let router_address = parse_value::<Address>("ROUTER_ADDRESS", &router_raw)?;

        let tokens = match get("TOKEN_CATALOG") {
            Some(raw) => serde_json::from_str(&raw)?,
            None => tokens::default_catalog()?,
        };

        let swap_defaults = SwapSettings::default();
        let swap = SwapSettings {
            amount_min: parsed_or(&get, "SWAP_AMOUNT_MIN", swap_defaults.amount_min)?,
            amount_max: parsed_or(&get, "SWAP_AMOUNT_MAX", swap_defaults.amount_max)?,
            slippage_bps: parsed_or(&get, "SLIPPAGE_BPS", swap_defaults.slippage_bps)?,
            gas_limit: parsed_or(&get, "SWAP_GAS_LIMIT", swap_defaults.gas_limit)?,
            deadline_secs: parsed_or(&get, "DEADLINE_SECS", swap_defaults.deadline_secs)?,
            confirmations: parsed_or(&get, "CONFIRMATIONS", swap_defaults.confirmations)?,
        };

        let run_defaults = RunSettings::default();
        let run = RunSettings {
            max_swaps: parsed_or(&get, "MAX_SWAPS", run_defaults.max_swaps)?,
            delay_min_ms: parsed_or(&get, "DELAY_MIN_MS", run_defaults.delay_min_ms)?,
            delay_max_ms: parsed_or(&get, "DELAY_MAX_MS", run_defaults.delay_max_ms)?,
        };

        let config = Self {
            rpc_url,
            network_name: get("NETWORK_NAME").unwrap_or_else(|| DEFAULT_NETWORK_NAME.into()),
            chain_id: get("CHAIN_ID")
                .map(|v| parse_value("CHAIN_ID", &v))
                .transpose()?,
            explorer_url,
            router_address,
            tokens,
            swap,
            run,
            approval_mode: parsed_or(&get, "APPROVAL_MODE", ApprovalMode::Always)?,
            confirmation_timeout: Duration::from_secs(parsed_or(
                &get,
                "CONFIRMATION_TIMEOUT_SECS",
                180u64,
            )?),
            rng_seed: get("RNG_SEED")
                .map(|v| parse_value("RNG_SEED", &v))
                .transpose()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the run loop cannot honour.
    pub fn validate(&self) -> Result<()> {
        let swap = &self.swap;
        if !(swap.amount_min.is_finite() && swap.amount_min > 0.0) {
            return Err(AppError::Config("SWAP_AMOUNT_MIN must be positive".into()));
        }
        if !swap.amount_max.is_finite() || swap.amount_min > swap.amount_max {
            return Err(AppError::Config(
                "SWAP_AMOUNT_MIN must not exceed SWAP_AMOUNT_MAX".into(),
            ));
        }
        if swap.slippage_bps > 10_000 {
            return Err(AppError::Config("SLIPPAGE_BPS must be at most 10000".into()));
        }
        if swap.confirmations == 0 {
            return Err(AppError::Config("CONFIRMATIONS must be at least 1".into()));
        }
        if self.run.delay_min_ms > self.run.delay_max_ms {
            return Err(AppError::Config(
                "DELAY_MIN_MS must not exceed DELAY_MAX_MS".into(),
            ));
        }
        if self.tokens.len() < 2 {
            return Err(AppError::Config(
                "token catalog needs at least two tokens".into(),
            ));
        }
        let mut seen = HashSet::new();
        for token in &self.tokens {
            if !seen.insert(token.contract_address) {
                return Err(AppError::Config(format!(
                    "token {} listed twice ({:?})",
                    token.symbol, token.contract_address
                )));
            }
            if token.decimals > 77 {
                return Err(AppError::Config(format!(
                    "token {} has {} decimals, U256 holds at most 77",
                    token.symbol, token.decimals
                )));
            }
            let smallest = tokens::round_amount_in_range(
                swap.amount_min,
                swap.amount_min,
                swap.amount_max,
                token.decimals,
            );
            if smallest.is_none() {
                return Err(AppError::Config(format!(
                    "no positive {} amount with {} decimals lies in [{}, {}]",
                    token.symbol, token.decimals, swap.amount_min, swap.amount_max
                )));
            }
        }
        Ok(())
    }
}

/// Read the signing key. Kept out of [`AppConfig`] so it never hits a log.
pub fn private_key_from_env() -> Result<String> {
    std::env::var("PRIVATE_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config("Set PRIVATE_KEY env var to the wallet key".into()))
}

fn parsed_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key}={raw}: {e}")))
}
