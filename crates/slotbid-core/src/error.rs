use crate::store::StoreError;

/// Failures that abort an auction run.
///
/// Only the primary read path (slot and campaign stores) surfaces here;
/// tag and audit failures degrade instead.
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    #[error("primary store read failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("toml parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Invalid(String),
}
