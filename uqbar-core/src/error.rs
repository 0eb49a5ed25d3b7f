use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// The result of talking to the wallet backend.
pub type ChainResult<T> = Result<T, ChainClientError>;

/// An "Any"-typed error.
pub trait UqbarCustomError: StdError + Send + Sync + Any {}

impl<E: StdError + Send + Sync + Any> UqbarCustomError for E {}

/// Thin wrapper around a boxed UqbarCustomError so it can sit inside a
/// `thiserror` enum.
#[repr(transparent)]
pub struct UqbarCustomErrorWrapper(Box<dyn UqbarCustomError>);

impl Debug for UqbarCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn UqbarCustomError>::as_ref(&self))
    }
}

impl Display for UqbarCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn UqbarCustomError>::as_ref(&self))
    }
}

impl StdError for UqbarCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn UqbarCustomError> for UqbarCustomErrorWrapper {
    fn as_ref(&self) -> &dyn UqbarCustomError {
        self.0.as_ref()
    }
}

impl Deref for UqbarCustomErrorWrapper {
    type Target = Box<dyn UqbarCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Errors returned by a `ChainClient` when scrying, poking, or subscribing.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    /// The node rejected a poke (a "nack")
    #[error("Poke {mark} to {app} was rejected: {reason}")]
    PokeRejected {
        /// Agent the poke was sent to
        app: String,
        /// Mark of the poke
        mark: String,
        /// Reason given by the node
        reason: String,
    },
    /// A scry path does not exist or returned nothing
    #[error("Scry {app}{path} failed: {reason}")]
    ScryFailed {
        /// Agent that was scried
        app: String,
        /// Path that was scried
        path: String,
        /// Reason given by the node
        reason: String,
    },
    /// The node refused to open a subscription
    #[error("Subscription to {app}{path} failed: {reason}")]
    SubscriptionFailed {
        /// Agent subscribed to
        app: String,
        /// Path subscribed to
        path: String,
        /// Reason given by the node
        reason: String,
    },
    /// A payload could not be converted to or from JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A payload was structurally valid JSON but not in the expected shape
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error(transparent)]
    Other(UqbarCustomErrorWrapper),
}

impl ChainClientError {
    /// Create a chain client error from any other existing error
    pub fn from_other<E: UqbarCustomError>(err: E) -> Self {
        Self::Other(UqbarCustomErrorWrapper(Box::new(err)))
    }

    /// Create a chain client error from any other existing boxed error
    pub fn from_other_boxed<E: UqbarCustomError>(err: Box<E>) -> Self {
        Self::Other(UqbarCustomErrorWrapper(err))
    }

    /// Creates a chain client error of the other variant from a string
    pub fn from_other_str(err: &str) -> Self {
        #[derive(Debug)]
        #[repr(transparent)]
        struct StringError(String);
        impl Display for StringError {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
        impl StdError for StringError {}

        Self::from_other(StringError(err.to_owned()))
    }
}

/// Errors from decoding the dot-grouped and hex encodings used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Not a valid dot-grouped unsigned decimal
    #[error("Invalid unsigned decimal: {0:?}")]
    InvalidNumber(String),
    /// Not a valid hex string
    #[error("Invalid hex: {0:?}")]
    InvalidHex(String),
    /// A user-entered amount could not be scaled to base units
    #[error("Invalid amount {amount:?} for a token with {decimals} decimals")]
    InvalidAmount {
        /// The entered amount
        amount: String,
        /// Decimals of the token
        decimals: u8,
    },
    /// A JSON object was missing a required field or had the wrong shape
    #[error("Malformed {what}: {reason}")]
    Malformed {
        /// What was being decoded
        what: &'static str,
        /// Details
        reason: String,
    },
}

impl FormatError {
    /// Shorthand for a `Malformed` error
    pub fn malformed(what: &'static str, reason: impl Display) -> Self {
        Self::Malformed {
            what,
            reason: reason.to_string(),
        }
    }
}
