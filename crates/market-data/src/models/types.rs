use std::borrow::Cow;

/// Provider identifier - mostly static constants ("BROKER", "YAHOO")
pub type ProviderId = Cow<'static, str>;

/// Exchange code as used by the broker ("NSE", "BSE")
pub type Exchange = Cow<'static, str>;

/// National Stock Exchange of India
pub const NSE: &str = "NSE";

/// BSE (Bombay Stock Exchange)
pub const BSE: &str = "BSE";
