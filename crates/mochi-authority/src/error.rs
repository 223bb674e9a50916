//! Wire-level failure taxonomy

/// Failures reported by an authority call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    /// Transport failed before a response arrived
    #[error("authority unreachable: {0}")]
    Unreachable(String),

    /// No response within the client timeout
    #[error("authority timed out")]
    Timeout,

    /// The authority answered and refused the change
    #[error("rejected by authority: {reason}")]
    Rejected { reason: String },

    /// Target already exists; the caller should go to `redirect`
    #[error("conflict, redirect to {redirect}")]
    Conflict { redirect: String },

    /// Session is not signed in
    #[error("not authorized")]
    Unauthorized,

    /// The response could not be understood
    #[error("malformed authority response: {0}")]
    Decode(String),
}

impl AuthorityError {
    #[inline]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// No answer was received (network, timeout)
    #[inline]
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for AuthorityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}
