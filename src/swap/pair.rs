use crate::errors::{AppError, Result};
use crate::models::TokenDescriptor;
use rand::Rng;

/// Redraws of `to` before falling back to a direct pick among the others.
const MAX_RESAMPLES: usize = 64;

/// Pick an ordered `(from, to)` pair with distinct endpoints, both drawn
/// uniformly from `tokens`.
pub fn pick_pair<'a, R: Rng + ?Sized>(
    tokens: &'a [TokenDescriptor],
    rng: &mut R,
) -> Result<(&'a TokenDescriptor, &'a TokenDescriptor)> {
    let n = tokens.len();
    if n < 2 {
        return Err(AppError::Config(format!(
            "need at least two tokens to pick a pair, have {n}"
        )));
    }

    let from = rng.random_range(0..n);
    for _ in 0..MAX_RESAMPLES {
        let to = rng.random_range(0..n);
        if tokens[to].contract_address != tokens[from].contract_address {
            return Ok((&tokens[from], &tokens[to]));
        }
    }

    // Offset by 1..n so the result is uniform over the other indices.
    let to = (from + rng.random_range(1..n)) % n;
    Ok((&tokens[from], &tokens[to]))
}
