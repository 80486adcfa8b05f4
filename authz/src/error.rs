//! Error types for the authorization layer.
//!
//! # Security Note
//! A failure to reach a decision is never a decision. Every variant here is
//! surfaced separately from a DENY verdict so that callers can fail closed
//! while still reporting a different status than a policy-based denial.
//! Detailed messages belong in logs, not in client responses.

use thiserror::Error;

/// Errors that can occur while assembling or deciding an authorization query.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// An action descriptor produced an empty action id, action type,
    /// resource type or resource id.
    ///
    /// This is a programming defect in the descriptor, not a runtime condition.
    #[error("Caller contract violation: {0}")]
    ContractViolation(String),

    /// Failed to parse a CEDAR policy set for the local engine.
    #[error("Policy parsing failed: {0}")]
    PolicyParse(String),

    /// The decision engine could not be reached (connection, timeout, TLS).
    #[error("Decision engine transport failure: {0}")]
    Transport(String),

    /// The decision engine answered with a body that could not be decoded.
    #[error("Malformed decision engine response: {0}")]
    MalformedResponse(String),

    /// The decision engine reported a fault while evaluating the query.
    #[error("Decision engine error: {0}")]
    Engine(String),
}

/// A specialized Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
