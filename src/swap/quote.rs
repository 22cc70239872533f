use crate::chain::ChainClient;
use crate::errors::{AppError, Result};
use ethers::types::{Address, U256, U512};
use std::sync::Arc;
use tracing::debug;

const BPS_DENOMINATOR: u64 = 10_000;

/// Router quote with the slippage floor applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub expected_out: U256,
    pub amount_out_min: U256,
}

/// `floor(expected_out * (10000 - slippage_bps) / 10000)` in integer math.
///
/// `slippage_bps` above 10000 is treated as 10000.
pub fn min_amount_out(expected_out: U256, slippage_bps: u32) -> U256 {
    let keep = BPS_DENOMINATOR - u64::from(slippage_bps).min(BPS_DENOMINATOR);
    let scaled: U512 = expected_out.full_mul(U256::from(keep)) / U512::from(BPS_DENOMINATOR);
    // scaled <= expected_out, so it always fits.
    U256::try_from(scaled).unwrap_or(expected_out)
}

/// Reads `getAmountsOut` from the router and derives the minimum output.
pub struct QuoteService<C: ?Sized> {
    chain: Arc<C>,
    router: Address,
    slippage_bps: u32,
}

impl<C: ChainClient + ?Sized> QuoteService<C> {
    pub fn new(chain: Arc<C>, router: Address, slippage_bps: u32) -> Self {
        Self {
            chain,
            router,
            slippage_bps,
        }
    }

    /// Quote `amount_in` along a two-token `path`.
    pub async fn quote(&self, amount_in: U256, path: &[Address]) -> Result<Quote> {
        let amounts = self
            .chain
            .amounts_out(self.router, amount_in, path.to_vec())
            .await
            .map_err(|e| AppError::Quote(e.to_string()))?;
        let expected_out = *amounts.get(1).ok_or_else(|| {
            AppError::Quote(format!(
                "router returned {} amounts for a two-token path",
                amounts.len()
            ))
        })?;
        let amount_out_min = min_amount_out(expected_out, self.slippage_bps);
        debug!(%amount_in, %expected_out, %amount_out_min, "[QUOTE] amounts out");
        Ok(Quote {
            expected_out,
            amount_out_min,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{MockChain, RecordedCall};

    #[test]
    fn five_percent_of_thousand() {
        assert_eq!(min_amount_out(U256::from(1_000u64), 500), U256::from(950u64));
    }

    #[test]
    fn floors_fractional_results() {
        // 999 * 9500 / 10000 = 949.05
        assert_eq!(min_amount_out(U256::from(999u64), 500), U256::from(949u64));
        assert_eq!(min_amount_out(U256::from(1u64), 1), U256::zero());
    }

    #[test]
    fn slippage_extremes() {
        let out = U256::from(123_456u64);
        assert_eq!(min_amount_out(out, 0), out);
        assert_eq!(min_amount_out(out, 10_000), U256::zero());
        assert_eq!(min_amount_out(U256::zero(), 500), U256::zero());
    }

    #[test]
    fn no_overflow_near_u256_max() {
        let out = U256::MAX;
        let min = min_amount_out(out, 500);
        assert!(min < out);
        let bps = U256::from(10_000u64);
        let keep = U256::from(9_500u64);
        assert_eq!(min, out / bps * keep + (out % bps) * keep / bps);
    }

    #[test]
    fn matches_formula_across_inputs() {
        for expected in [0u64, 1, 7, 10_000, 123_456_789, u64::MAX] {
            for bps in [0u32, 1, 30, 500, 9_999, 10_000] {
                let got = min_amount_out(U256::from(expected), bps);
                let want = (u128::from(expected) * u128::from(10_000 - bps)) / 10_000;
                assert_eq!(got, U256::from(want), "expected={expected} bps={bps}");
            }
        }
    }

    #[tokio::test]
    async fn quote_uses_second_amount() {
        let chain = Arc::new(MockChain::new(Address::repeat_byte(1)));
        let router = Address::repeat_byte(9);
        let service = QuoteService::new(chain.clone(), router, 500);
        let path = vec![Address::repeat_byte(2), Address::repeat_byte(3)];

        let quote = service.quote(U256::from(5u64), &path).await.unwrap();
        assert_eq!(quote.expected_out, U256::from(1_000u64));
        assert_eq!(quote.amount_out_min, U256::from(950u64));
        assert_eq!(
            chain.calls(),
            vec![RecordedCall::Quote {
                amount_in: U256::from(5u64),
                path
            }]
        );
    }

    #[tokio::test]
    async fn failed_view_is_a_quote_error() {
        let chain = Arc::new(MockChain::new(Address::repeat_byte(1)));
        *chain.expected_out.lock().unwrap() = None;
        let service = QuoteService::new(chain, Address::repeat_byte(9), 500);
        let err = service
            .quote(U256::one(), &[Address::repeat_byte(2), Address::repeat_byte(3)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Quote(_)));
    }
}
