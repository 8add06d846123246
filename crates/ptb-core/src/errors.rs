/// Core error type for the tender bot.
///
/// Adapter crates map their specific errors into this type so the core can
/// tell an upstream outage apart from an empty result and from a delivery
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Transport failure or request timeout while talking to the registry.
    #[error("network error: {0}")]
    Network(String),

    /// The registry answered, but not with a usable page.
    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True for failures of the tender feed itself (as opposed to config or delivery).
    pub fn is_feed_failure(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Upstream { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
