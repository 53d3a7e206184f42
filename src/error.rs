//! Error taxonomy for the wire codec, the authentication engine, and the
//! connection state machine.
//!
//! Mirrors the layering sibling drivers in this ecosystem build on top of a
//! bare codec: a low-level `ProtocolError` for malformed bytes, a narrow
//! `AuthError` for the SCRAM/MD5 exchange, and a `SqlError` that classifies
//! what the *server* reported, kept separate since an `ErrorResponse` is a
//! valid protocol event, not a codec failure.

use std::fmt;

/// Failures in parsing or constructing wire messages, or in driving the
/// connection state machine.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("unexpected end of message")]
    UnexpectedEof,

    #[error("invalid UTF-8 in message")]
    InvalidUtf8,

    #[error("unsupported authentication method: {0}")]
    UnsupportedAuth(String),

    #[error("illegal state transition: cannot handle {event:?} while {state:?}")]
    IllegalStateTransition { state: String, event: String },
}

/// Failures specific to the SCRAM-SHA-256 / MD5 exchange.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("server nonce does not extend the client nonce")]
    NonceMismatch,

    #[error("server signature does not match the expected value")]
    ServerSignatureMismatch,

    #[error("malformed SCRAM server message: {0}")]
    MalformedServerMessage(String),

    #[error("password required but none was configured")]
    PasswordRequired,

    #[error("server requested unsupported SASL mechanisms: {0:?}")]
    UnsupportedMechanism(Vec<String>),

    #[error("SCRAM message received out of order")]
    OutOfOrder,
}

/// A classification of a server-reported `ErrorResponse`, grouped by
/// SQLSTATE class. Never raised internally: constructing one from an
/// `ErrorResponse` is the caller's choice, not a codec failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    SyntaxError { code: String, message: String },
    UndefinedTable { code: String, message: String },
    UniqueViolation { code: String, message: String },
    ForeignKeyViolation { code: String, message: String },
    NotNullViolation { code: String, message: String },
    ConnectionException { code: String, message: String },
    Generic { code: String, message: String },
}

impl SqlError {
    /// Classify a SQLSTATE code and message into a `SqlError` variant.
    ///
    /// Classes follow Appendix A of the PostgreSQL documentation: class `42`
    /// is syntax/access-rule, `23` is integrity-constraint-violation
    /// (further split by the specific 5-char code), `08` is connection
    /// exception. Anything else falls back to `Generic`.
    pub fn classify(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let code_owned = code.to_string();
        match code {
            "42P01" => SqlError::UndefinedTable { code: code_owned, message },
            "23505" => SqlError::UniqueViolation { code: code_owned, message },
            "23503" => SqlError::ForeignKeyViolation { code: code_owned, message },
            "23502" => SqlError::NotNullViolation { code: code_owned, message },
            _ if code.starts_with("42") => SqlError::SyntaxError { code: code_owned, message },
            _ if code.starts_with("08") => SqlError::ConnectionException { code: code_owned, message },
            _ => SqlError::Generic { code: code_owned, message },
        }
    }

    pub fn code(&self) -> &str {
        match self {
            SqlError::SyntaxError { code, .. }
            | SqlError::UndefinedTable { code, .. }
            | SqlError::UniqueViolation { code, .. }
            | SqlError::ForeignKeyViolation { code, .. }
            | SqlError::NotNullViolation { code, .. }
            | SqlError::ConnectionException { code, .. }
            | SqlError::Generic { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SqlError::SyntaxError { message, .. }
            | SqlError::UndefinedTable { message, .. }
            | SqlError::UniqueViolation { message, .. }
            | SqlError::ForeignKeyViolation { message, .. }
            | SqlError::NotNullViolation { message, .. }
            | SqlError::ConnectionException { message, .. }
            | SqlError::Generic { message, .. } => message,
        }
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.variant_name(), self.code(), self.message())
    }
}

impl SqlError {
    fn variant_name(&self) -> &'static str {
        match self {
            SqlError::SyntaxError { .. } => "syntax_error",
            SqlError::UndefinedTable { .. } => "undefined_table",
            SqlError::UniqueViolation { .. } => "unique_violation",
            SqlError::ForeignKeyViolation { .. } => "foreign_key_violation",
            SqlError::NotNullViolation { .. } => "not_null_violation",
            SqlError::ConnectionException { .. } => "connection_exception",
            SqlError::Generic { .. } => "error",
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_sqlstate_codes() {
        assert!(matches!(
            SqlError::classify("42P01", "relation does not exist"),
            SqlError::UndefinedTable { .. }
        ));
        assert!(matches!(
            SqlError::classify("23505", "duplicate key"),
            SqlError::UniqueViolation { .. }
        ));
        assert!(matches!(
            SqlError::classify("XX000", "oops"),
            SqlError::Generic { .. }
        ));
    }
}
