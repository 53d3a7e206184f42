//! Standalone encoding, decoding, and connection-state tracking for the
//! PostgreSQL frontend/backend wire protocol, version 3.0.
//!
//! <https://www.postgresql.org/docs/current/protocol.html>
//!
//! This crate is a codec and a pure state machine, not a driver: it has no
//! transport of its own. An embedder reads bytes off a socket, hands the
//! delimited `(tag, payload)` pairs to [`BackendMessage::parse`], and writes
//! the bytes produced by [`FrontendMessage::serialize`] back out.

/// Traces a decoded tag or a state transition when the `log` feature is
/// enabled; compiles away to nothing otherwise.
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        log::trace!($($arg)*);
    };
}

pub(crate) use trace_log;

mod authentication;
mod backend;
mod backend_key_data;
mod connection;
mod decode;
mod encode;
mod error;
mod error_fields;
mod frontend;
mod password_message;
mod ready_for_query;
mod scram;
mod startup_message;

pub use self::{
    authentication::AuthenticationRequest,
    backend::{BackendMessage, DataRowColumn, FieldDescription, FormatCode},
    backend_key_data::BackendKeyData,
    connection::{Connection, ConnectionConfig, ConnectionState, SSLMode, ServerParameters},
    decode::{Decode, MessageReader},
    encode::{Encode, MessageWriter},
    error::{AuthError, ProtocolError, SqlError},
    error_fields::{ErrorFields, ErrorFieldType, ErrorFieldsBuilder},
    frontend::{BindParam, FrontendMessage, StatementOrPortal},
    password_message::{hash_md5_password, PasswordMessage},
    ready_for_query::{ReadyForQuery, TransactionStatus},
    scram::ScramClient,
    startup_message::{
        CancelRequest, SSLRequest, StartupMessage, CANCEL_REQUEST_CODE, PROTOCOL_VERSION,
        PROTOCOL_VERSION_MAJOR, PROTOCOL_VERSION_MINOR, SSL_REQUEST_CODE,
    },
};
