//! Token catalog and fixed-point amount conversion.

use crate::chain::ChainClient;
use crate::errors::{AppError, Result};
use crate::models::TokenDescriptor;
use ethers::types::{Address, U256};
use ethers::utils::{format_units, parse_units};
use tracing::{info, warn};

/// Human amounts are rounded to at most this many fractional digits before
/// conversion, fewer when the token itself has fewer decimals.
pub const MAX_AMOUNT_PLACES: u8 = 6;

const DEFAULT_CATALOG: [(&str, &str, u8); 4] = [
    ("0x99dBE4AEa58E518C50a1c04aE9b48C9F6354612f", "MOG", 18),
    ("0x4200000000000000000000000000000000000006", "WETH", 18),
    ("0xd6e1afe5cA8D00A2EFC01B89997abE2De47fdfAf", "RISE", 18),
    ("0x40918Ba7f132E0aCba2CE4de4c4baF9BD2D7D849", "USDT", 6),
];

/// Catalog tokens deployed on the RISE testnet.
pub fn default_catalog() -> Result<Vec<TokenDescriptor>> {
    DEFAULT_CATALOG
        .iter()
        .map(|(addr, symbol, decimals)| {
            let address: Address = addr
                .parse()
                .map_err(|e| AppError::Config(format!("bad catalog address {addr}: {e}")))?;
            Ok(TokenDescriptor::new(address, *symbol, *decimals))
        })
        .collect()
}

/// Static, ordered catalog of tradeable tokens.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<TokenDescriptor>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<TokenDescriptor>) -> Self {
        Self { tokens }
    }

    /// Tokens in declaration order.
    pub fn list_tokens(&self) -> &[TokenDescriptor] {
        &self.tokens
    }

    /// Compare catalog decimals with what each contract reports. Warn only.
    pub async fn verify_decimals<C: ChainClient + ?Sized>(&self, chain: &C) {
        for token in &self.tokens {
            match chain.decimals(token.contract_address).await {
                Ok(onchain) if onchain == token.decimals => {}
                Ok(onchain) => warn!(
                    token = %token.symbol,
                    catalog = token.decimals,
                    onchain,
                    "[INIT] decimals mismatch"
                ),
                Err(e) => warn!(token = %token.symbol, error = %e, "[INIT] decimals read failed"),
            }
        }
    }

    /// Log the wallet's balance of every catalog token.
    pub async fn log_balances<C: ChainClient + ?Sized>(&self, chain: &C, owner: Address) {
        info!("[INIT] checking token balances");
        for token in &self.tokens {
            match chain.balance_of(token.contract_address, owner).await {
                Ok(raw) => match from_base_units(raw, token.decimals) {
                    Ok(balance) => info!(token = %token.symbol, %balance, "[INIT] balance"),
                    Err(e) => warn!(token = %token.symbol, error = %e, "[INIT] balance format failed"),
                },
                Err(e) => warn!(token = %token.symbol, error = %e, "[INIT] error reading balance"),
            }
        }
    }
}

/// Round a human amount to the precision that `decimals` can represent,
/// capped at [`MAX_AMOUNT_PLACES`].
pub fn round_human_amount(amount: f64, decimals: u8) -> String {
    let places = usize::from(decimals.min(MAX_AMOUNT_PLACES));
    format!("{amount:.places$}")
}

/// Round `amount` like [`round_human_amount`], then pull it back into
/// `[min, max]` on the token's rounding grid. Never yields zero.
///
/// `None` when no positive amount at that precision lies in the range.
pub fn round_amount_in_range(amount: f64, min: f64, max: f64, decimals: u8) -> Option<String> {
    let places = decimals.min(MAX_AMOUNT_PLACES);
    let scale = 10f64.powi(i32::from(places));
    // tolerate float noise such as 0.1 * 1e6 = 100000.00000000001
    let lowest = ((min * scale) - 1e-6).ceil().max(1.0);
    let highest = ((max * scale) + 1e-6).floor();
    if lowest > highest {
        return None;
    }
    let units = (amount * scale).round().clamp(lowest, highest);
    let places = usize::from(places);
    Some(format!("{:.places$}", units / scale))
}

/// Convert a decimal string into integer base units.
pub fn to_base_units(human: &str, decimals: u8) -> Result<U256> {
    let parsed = parse_units(human, u32::from(decimals))?;
    Ok(parsed.into())
}

/// Render base units as a decimal string.
pub fn from_base_units(amount: U256, decimals: u8) -> Result<String> {
    Ok(format_units(amount, u32::from(decimals))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_four_distinct_tokens() {
        let tokens = default_catalog().unwrap();
        let symbols: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MOG", "WETH", "RISE", "USDT"]);
        assert_eq!(tokens[3].decimals, 6);
    }

    #[test]
    fn rounding_respects_token_precision() {
        assert_eq!(round_human_amount(1.23456789, 18), "1.234568");
        assert_eq!(round_human_amount(1.23456789, 6), "1.234568");
        assert_eq!(round_human_amount(1.23456789, 2), "1.23");
        assert_eq!(round_human_amount(1.5, 0), "2");
    }

    #[test]
    fn whole_unit_token_never_rounds_to_zero() {
        assert_eq!(round_amount_in_range(0.5, 0.5, 2.0, 0).as_deref(), Some("1"));
        assert_eq!(round_amount_in_range(0.6, 0.5, 2.0, 0).as_deref(), Some("1"));
        assert_eq!(round_amount_in_range(2.0, 0.5, 2.0, 0).as_deref(), Some("2"));
        assert_eq!(round_amount_in_range(1.5, 0.5, 2.0, 0).as_deref(), Some("2"));
    }

    #[test]
    fn rounding_is_pulled_back_into_range() {
        // 1.996 at 2 places would round to 2.00, above a 1.995 maximum
        assert_eq!(round_amount_in_range(1.996, 0.5, 1.995, 2).as_deref(), Some("1.99"));
        // 0.101 at 1 place would round to 0.1, below a 0.15 minimum
        assert_eq!(round_amount_in_range(0.101, 0.15, 0.5, 1).as_deref(), Some("0.2"));
        assert_eq!(
            round_amount_in_range(1.23456789, 0.5, 2.0, 18).as_deref(),
            Some("1.234568")
        );
        assert_eq!(round_amount_in_range(0.5, 0.5, 2.0, 6).as_deref(), Some("0.500000"));
    }

    #[test]
    fn empty_grid_range_is_none() {
        assert_eq!(round_amount_in_range(0.3, 0.1, 0.4, 0), None);
        assert_eq!(round_amount_in_range(0.0000001, 0.0000001, 0.0000004, 18), None);
    }

    #[test]
    fn converts_to_base_units() {
        assert_eq!(
            to_base_units("0.5", 18).unwrap(),
            U256::from(500_000_000_000_000_000u128)
        );
        assert_eq!(to_base_units("1.234567", 6).unwrap(), U256::from(1_234_567u64));
    }

    #[test]
    fn base_unit_conversion_recovers_amount() {
        for (amount, decimals) in [(0.5f64, 18u8), (1.999999, 6), (2.0, 18), (0.75, 2)] {
            let human = round_human_amount(amount, decimals);
            let base = to_base_units(&human, decimals).unwrap();
            let back: f64 = from_base_units(base, decimals).unwrap().parse().unwrap();
            let tolerance = 10f64.powi(-i32::from(decimals)).max(1e-12);
            assert!(
                (back - human.parse::<f64>().unwrap()).abs() <= tolerance,
                "{human} at {decimals} came back as {back}"
            );
        }
    }

    #[test]
    fn registry_keeps_declaration_order() {
        let tokens = default_catalog().unwrap();
        let registry = TokenRegistry::new(tokens.clone());
        assert_eq!(registry.list_tokens(), tokens.as_slice());
    }
}
