//! Swap execution: pair selection, quoting and submission.

pub mod executor;
pub mod pair;
pub mod quote;

pub use executor::SwapExecutor;
pub use pair::pick_pair;
pub use quote::{Quote, QuoteService, min_amount_out};
