use std::time::Duration;

use thiserror::Error;

/// IdentityError
///
/// Failures raised by an `IdentityProvider` backend. The guard never lets these
/// escape: every variant is logged and then treated as "no session, no admin role".
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity service could not be reached (DNS, TLS, connection reset...).
    #[error("identity service unreachable: {0}")]
    Transport(String),
    /// The identity service answered with a status that is neither success nor
    /// an explicit "not authenticated".
    #[error("identity service returned status {0}")]
    Upstream(u16),
    /// The response body did not match the expected user payload.
    #[error("malformed identity response: {0}")]
    Decode(String),
    /// The query did not resolve within the guard's deadline.
    #[error("identity query timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IdentityError::Decode(err.to_string())
        } else {
            IdentityError::Transport(err.to_string())
        }
    }
}

/// RouteTableError
///
/// Raised while building the route table. The table is assembled once at startup,
/// so any of these is a fatal configuration bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route name `{0}` is registered more than once")]
    DuplicateName(String),
    #[error("route path `{0}` is invalid: {1}")]
    InvalidPath(String, &'static str),
    #[error("redirect destination `{0}` has no route in the table")]
    MissingRedirectTarget(&'static str),
}
