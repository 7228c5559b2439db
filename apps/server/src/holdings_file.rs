//! Holdings read from a JSON file.
//!
//! ```json
//! { "positions": [{ "symbol": "TCS", "quantity": 10, "averageCost": 3500 }], "cashBalance": 25000 }
//! ```

use async_trait::async_trait;
use std::path::PathBuf;

use tradedesk_core::errors::{Error, Result};
use tradedesk_core::portfolio::{Holdings, HoldingsSourceTrait};

pub struct FileHoldingsSource {
    path: PathBuf,
}

impl FileHoldingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HoldingsSourceTrait for FileHoldingsSource {
    async fn get_holdings(&self) -> Result<Holdings> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Repository(format!(
                "Cannot read holdings file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let holdings: Holdings = serde_json::from_str(&raw)?;
        holdings.validate()?;
        Ok(holdings)
    }
}
