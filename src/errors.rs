use ethers::types::TxHash;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Contract reverted: {0}")]
    ContractRevert(String),

    #[error("Quote failed: {0}")]
    Quote(String),

    #[error("Unit conversion error: {0}")]
    UnitConversion(String),

    #[error("Confirmation timed out after {secs}s for {tx_hash:?}")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Other: {0}")]
    Other(String),
}

impl From<ethers::providers::ProviderError> for AppError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        AppError::Connectivity(err.to_string())
    }
}

impl From<ethers::utils::ConversionError> for AppError {
    fn from(err: ethers::utils::ConversionError) -> Self {
        AppError::UnitConversion(err.to_string())
    }
}
