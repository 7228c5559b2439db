use async_trait::async_trait;

use super::Holdings;
use crate::errors::Result;

/// Source of the account's current holdings (broker account, file, ...).
#[async_trait]
pub trait HoldingsSourceTrait: Send + Sync {
    async fn get_holdings(&self) -> Result<Holdings>;
}
