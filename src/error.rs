//! Errors surfaced by the resolvers and the processing stage.

use thiserror::Error;

/// Failure of a resolve or process call, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Password-protected links are not supported yet.")]
    PasswordProtected,

    #[error("This Terabox link has expired or is invalid.")]
    LinkExpired,

    #[error("Link was not found (404). It may be deleted or region-blocked.")]
    LinkNotFound,

    #[error("LOGIN_REQUIRED")]
    LoginRequired,

    /// Exhausted retries, extractor failures and anything unexpected.
    #[error("{0}")]
    ExtractionFailed(String),

    #[error("Processing failed")]
    ProcessingFailed,
}

impl ResolveError {
    /// Message used once every browser attempt has been spent.
    pub const EXHAUSTED: &'static str =
        "Unable to extract file. The link is likely Dead, Blocked, or requires Login/CAPTCHA.";

    pub fn exhausted() -> Self {
        Self::ExtractionFailed(Self::EXHAUSTED.to_string())
    }

    /// Extra human-readable context, when the error code alone is terse.
    pub fn details(&self) -> Option<&'static str> {
        match self {
            Self::LoginRequired => Some("This file can only be accessed by a logged-in user."),
            _ => None,
        }
    }
}
