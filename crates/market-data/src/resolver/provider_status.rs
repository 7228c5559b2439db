//! Per provider/exchange availability.
//!
//! A pair starts `Available` and moves to `Unavailable` on the first
//! authorization or permission failure. There is no way back within a
//! process lifetime: the table is in-memory and a restart is the reset.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;

/// Availability of one provider for one exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ProviderStatus {
    Available,
    Unavailable {
        reason: String,
        since: DateTime<Utc>,
    },
}

impl ProviderStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Shared, read-mostly availability table keyed by (provider, exchange).
///
/// Reads take a shared lock; the only write is the one-way transition to
/// `Unavailable`, which is rare.
#[derive(Debug, Default)]
pub struct ProviderStatusTable {
    entries: RwLock<HashMap<(String, String), ProviderStatus>>,
}

impl ProviderStatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<(String, String), ProviderStatus>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("Provider status lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<(String, String), ProviderStatus>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Provider status lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Current status for the pair; unknown pairs are `Available`.
    pub fn status(&self, provider: &str, exchange: &str) -> ProviderStatus {
        self.read()
            .get(&(provider.to_string(), exchange.to_string()))
            .cloned()
            .unwrap_or(ProviderStatus::Available)
    }

    pub fn is_available(&self, provider: &str, exchange: &str) -> bool {
        self.status(provider, exchange).is_available()
    }

    /// Mark the pair unavailable.
    ///
    /// Returns `true` only for the call that performed the transition, so
    /// the failure is logged once per process lifetime.
    pub fn mark_unavailable(&self, provider: &str, exchange: &str, reason: impl Into<String>) -> bool {
        let mut entries = self.write();
        let key = (provider.to_string(), exchange.to_string());

        if entries.get(&key).is_some_and(|status| !status.is_available()) {
            return false;
        }

        let reason = reason.into();
        warn!(
            "Marking provider '{}' unavailable for exchange '{}' until restart: {}",
            provider, exchange, reason
        );
        entries.insert(
            key,
            ProviderStatus::Unavailable {
                reason,
                since: Utc::now(),
            },
        );
        true
    }

    /// All pairs currently marked unavailable, for diagnostics.
    pub fn unavailable(&self) -> Vec<(String, String, ProviderStatus)> {
        let mut pairs: Vec<_> = self
            .read()
            .iter()
            .filter(|(_, status)| !status.is_available())
            .map(|((provider, exchange), status)| {
                (provider.clone(), exchange.clone(), status.clone())
            })
            .collect();
        pairs.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        pairs
    }
}
