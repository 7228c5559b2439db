//! Per-symbol tier attempt tracking.

use serde::Serialize;

/// Why a tier was not called for a symbol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// No authenticated session for the tier.
    NotConnected,

    /// The provider was marked unavailable for the symbol's exchange.
    ProviderUnavailable { reason: String },

    /// The overall request budget ran out before this tier.
    BudgetExhausted,

    /// An earlier tier reported the symbol as definitively unknown.
    ShortCircuited,
}

/// Record of a single tier attempt for one symbol.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierAttempt {
    pub tier: String,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

/// Attempt trail for one symbol in one request.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FetchDiagnostics {
    pub attempts: Vec<TierAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, tier: &str, reason: SkipReason) {
        self.attempts.push(TierAttempt {
            tier: tier.to_string(),
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, tier: &str, error: String) {
        self.attempts.push(TierAttempt {
            tier: tier.to_string(),
            skipped: None,
            error: Some(error),
            success: false,
        });
    }

    pub fn record_success(&mut self, tier: &str) {
        self.attempts.push(TierAttempt {
            tier: tier.to_string(),
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                if a.success {
                    format!("{}: SUCCESS", a.tier)
                } else if let Some(skip) = &a.skipped {
                    format!("{}: SKIPPED ({:?})", a.tier, skip)
                } else if let Some(err) = &a.error {
                    format!("{}: ERROR ({})", a.tier, err)
                } else {
                    format!("{}: UNKNOWN", a.tier)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(|a| a.success)
    }

    pub fn skip_reasons(&self) -> Vec<(&str, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| a.skipped.as_ref().map(|s| (a.tier.as_str(), s)))
            .collect()
    }

    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref().map(|e| (a.tier.as_str(), e)))
            .collect()
    }
}
