//! Error types for the Wallet Store SDK.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the wallet store itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `select` was given a name that is not in the registry.
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// `connect` was called before the selected adapter announced readiness.
    #[error("Wallet not ready. Install the wallet or wait for it to load.")]
    WalletNotReady,

    /// A signing or send operation was called while not connected.
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// An operation needs an adapter but none is selected.
    #[error("No wallet selected")]
    NoWalletSelected,

    /// The active adapter does not implement the requested capability.
    #[error("Wallet does not support {0}")]
    UnsupportedOperation(&'static str),

    /// Error surfaced by the adapter, either as an event or a rejected call.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid store configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(format!("{:#}", err))
    }
}

/// Errors reported by wallet adapters.
///
/// Adapters either return these from their async calls or emit them through
/// the `error` event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Wallet connection failed: {0}")]
    Connection(String),

    #[error("Wallet disconnection failed: {0}")]
    Disconnection(String),

    /// The user closed the wallet popup before approving.
    #[error("Wallet window closed")]
    WindowClosed,

    #[error("Wallet public key error: {0}")]
    PublicKey(String),

    #[error("Wallet adapter not connected")]
    NotConnected,

    #[error("Failed to sign transaction: {0}")]
    SignTransaction(String),

    #[error("Failed to send transaction: {0}")]
    SendTransaction(String),

    #[error("Failed to sign message: {0}")]
    SignMessage(String),

    #[error("Wallet error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_error_is_transparent() {
        let err: Error = AdapterError::WindowClosed.into();
        assert_eq!(err.to_string(), "Wallet window closed");
        assert_eq!(err, Error::Adapter(AdapterError::WindowClosed));
    }

    #[test]
    fn test_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("root cause").context("while selecting");
        let err: Error = err.into();
        assert_eq!(err, Error::Other("while selecting: root cause".to_string()));
    }
}
