/// Classification of a tier failure.
///
/// Used by the aggregator to decide what happens after a tier fails for a
/// symbol.
///
/// | Class | Try next live tier? | Mark provider unavailable? |
/// |-------|--------------------|----------------------------|
/// | `SkipToCache` | No, go straight to the cache | No |
/// | `NextTier` | Yes | No |
/// | `NextTierAndDisable` | Yes | Yes, for the provider/exchange pair |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The symbol is definitively unknown; no live tier will do better.
    SkipToCache,

    /// Transient or provider-local failure. The next tier may succeed.
    NextTier,

    /// Authorization failure. The next tier may succeed, and the failing
    /// provider must not be called again for that exchange.
    NextTierAndDisable,
}
