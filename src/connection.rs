//! The connection state machine: a pure function of (state, event). No I/O
//! happens here; the embedder owns the transport and calls `send`/`receive`
//! around it.

use crate::backend::BackendMessage;
use crate::error::ProtocolError;
use crate::frontend::FrontendMessage;
use crate::ready_for_query::TransactionStatus;
use std::collections::HashMap;

/// How the connection should negotiate TLS before the startup handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SSLMode {
    Disable,
    Prefer,
    Require,
}

/// Immutable configuration for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub ssl_mode: SSLMode,
    pub application_name: Option<String>,
    pub options: HashMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: None,
            ssl_mode: SSLMode::Prefer,
            application_name: None,
            options: HashMap::new(),
        }
    }
}

/// The observable lifecycle of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticating,
    ReadyForQuery(TransactionStatus),
    Busy,
    CopyIn,
    CopyOut,
    Error(String),
    Terminated,
}

/// Mapping from `ParameterStatus` name to its current value, accumulated
/// over the lifetime of the connection; entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerParameters(HashMap<String, String>);

impl ServerParameters {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn set(&mut self, name: String, value: String) {
        self.0.insert(name, value);
    }
}

/// Drives the wire-protocol lifecycle: `Connecting -> Authenticating ->
/// ReadyForQuery <-> Busy/CopyIn/CopyOut`, terminating in `Terminated` or
/// `Error`. Holds no transport handle; `send`/`receive` only validate and
/// update local state, the embedder is responsible for moving the
/// corresponding bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    config: ConnectionConfig,
    state: ConnectionState,
    parameters: ServerParameters,
    backend_key_data: Option<(i32, i32)>,
}

impl Connection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Connecting,
            parameters: ServerParameters::default(),
            backend_key_data: None,
        }
    }

    pub fn current_state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn server_parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)
    }

    pub fn backend_key_data(&self) -> Option<(i32, i32)> {
        self.backend_key_data
    }

    /// Build the `StartupMessage` from this connection's [`ConnectionConfig`]
    /// and send it, moving the connection from `Connecting` to
    /// `Authenticating`. The documented entry point into the handshake; the
    /// embedder still owns writing the serialized bytes to the socket.
    pub fn startup(&mut self) -> Result<(), ProtocolError> {
        let mut startup = crate::startup_message::StartupMessage::new(self.config.user.clone())
            .param("database", self.config.database.clone());

        if let Some(application_name) = &self.config.application_name {
            startup = startup.param("application_name", application_name.clone());
        }

        for (key, value) in &self.config.options {
            startup = startup.param(key.clone(), value.clone());
        }

        self.send(&FrontendMessage::StartupMessage(startup))
    }

    /// Validate that `msg` is legal to send in the current state, updating
    /// state for the messages that have an observable effect (`StartupMessage`
    /// begins authentication; `Query`/`Parse`/`Bind`/`Execute` start a
    /// request cycle; `Terminate` ends the connection).
    pub fn send(&mut self, msg: &FrontendMessage) -> Result<(), ProtocolError> {
        use ConnectionState::*;
        use FrontendMessage as F;

        match (&self.state, msg) {
            (Connecting, F::StartupMessage(_)) | (Connecting, F::SSLRequest) => {
                crate::trace_log!("connection state Connecting -> Authenticating");
                self.state = Authenticating;
                Ok(())
            }
            (Authenticating, F::PasswordMessage { .. })
            | (Authenticating, F::SASLInitialResponse { .. })
            | (Authenticating, F::SASLResponse { .. }) => Ok(()),
            (ReadyForQuery(_), F::Query { .. })
            | (ReadyForQuery(_), F::Parse { .. })
            | (ReadyForQuery(_), F::Bind { .. })
            | (ReadyForQuery(_), F::Execute { .. })
            | (ReadyForQuery(_), F::Describe { .. })
            | (ReadyForQuery(_), F::Close { .. })
            | (ReadyForQuery(_), F::Sync)
            | (ReadyForQuery(_), F::Flush) => {
                crate::trace_log!("connection state ReadyForQuery -> Busy");
                self.state = Busy;
                Ok(())
            }
            (Busy, F::CopyData { .. }) => Ok(()),
            (CopyIn, F::CopyData { .. }) | (CopyIn, F::CopyDone) | (CopyIn, F::CopyFail { .. }) => Ok(()),
            (_, F::Terminate) => {
                crate::trace_log!("connection state {:?} -> Terminated", self.state);
                self.state = Terminated;
                Ok(())
            }
            (state, event) => Err(ProtocolError::IllegalStateTransition {
                state: format!("{state:?}"),
                event: format!("{event:?}"),
            }),
        }
    }

    /// Advance the state machine in response to a parsed backend message.
    pub fn receive(&mut self, msg: &BackendMessage) -> Result<(), ProtocolError> {
        use BackendMessage as B;
        use ConnectionState::*;

        match (&self.state, msg) {
            (_, B::NotificationResponse { .. }) if !matches!(self.state, Connecting) => Ok(()),

            (Authenticating, B::Authentication(_)) => Ok(()),
            (Authenticating, B::ParameterStatus { name, value }) => {
                self.parameters.set(name.clone(), value.clone());
                Ok(())
            }
            (Authenticating, B::BackendKeyData(data)) => {
                self.backend_key_data = Some((data.process_id, data.secret_key));
                Ok(())
            }
            (_, B::ParameterStatus { name, value })
                if matches!(self.state, ReadyForQuery(_) | Busy) =>
            {
                self.parameters.set(name.clone(), value.clone());
                Ok(())
            }
            (Authenticating, B::ReadyForQuery(rfq)) | (Busy, B::ReadyForQuery(rfq))
            | (CopyIn, B::ReadyForQuery(rfq)) | (CopyOut, B::ReadyForQuery(rfq)) => {
                crate::trace_log!("connection state {:?} -> ReadyForQuery({:?})", self.state, rfq.status);
                self.state = ReadyForQuery(rfq.status);
                Ok(())
            }
            (Busy, B::CopyInResponse { .. }) => {
                crate::trace_log!("connection state Busy -> CopyIn");
                self.state = CopyIn;
                Ok(())
            }
            (Busy, B::CopyOutResponse { .. }) => {
                crate::trace_log!("connection state Busy -> CopyOut");
                self.state = CopyOut;
                Ok(())
            }
            (Busy, B::ErrorResponse { .. }) | (CopyIn, B::ErrorResponse { .. }) | (CopyOut, B::ErrorResponse { .. }) => {
                Ok(())
            }
            (
                Busy,
                B::RowDescription { .. }
                | B::DataRow { .. }
                | B::CommandComplete { .. }
                | B::EmptyQueryResponse
                | B::NoticeResponse { .. }
                | B::NoData
                | B::PortalSuspended
                | B::ParseComplete
                | B::BindComplete
                | B::CloseComplete
                | B::ParameterDescription { .. }
                | B::FunctionCallResponse { .. },
            ) => Ok(()),
            (CopyIn, B::CopyData { .. }) | (CopyOut, B::CopyData { .. }) | (CopyOut, B::CopyDone) => Ok(()),
            (state, event) => {
                let description = format!("{event:?}");
                crate::trace_log!("connection state {:?} -> Error({})", state, description);
                self.state = Error(description.clone());
                Err(ProtocolError::IllegalStateTransition {
                    state: format!("{state:?}"),
                    event: description,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ready_for_query::ReadyForQuery;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "postgres");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.ssl_mode, SSLMode::Prefer);
    }

    #[test]
    fn full_happy_path_reaches_ready_for_query() {
        let mut conn = Connection::new(ConnectionConfig::default());
        conn.startup().unwrap();
        assert_eq!(conn.current_state(), &ConnectionState::Authenticating);

        conn.receive(&BackendMessage::Authentication(
            crate::authentication::AuthenticationRequest::Ok,
        ))
        .unwrap();
        conn.receive(&BackendMessage::ParameterStatus {
            name: "server_version".to_string(),
            value: "16.0".to_string(),
        })
        .unwrap();
        conn.receive(&BackendMessage::BackendKeyData(crate::backend_key_data::BackendKeyData {
            process_id: 1,
            secret_key: 2,
        }))
        .unwrap();
        conn.receive(&BackendMessage::ReadyForQuery(ReadyForQuery {
            status: TransactionStatus::Idle,
        }))
        .unwrap();

        assert_eq!(conn.current_state(), &ConnectionState::ReadyForQuery(TransactionStatus::Idle));
        assert_eq!(conn.server_parameter("server_version"), Some("16.0"));
        assert_eq!(conn.backend_key_data(), Some((1, 2)));
    }

    #[test]
    fn startup_builds_message_from_config() {
        let config = ConnectionConfig {
            user: "alice".to_string(),
            database: "app_db".to_string(),
            application_name: Some("my_app".to_string()),
            ..ConnectionConfig::default()
        };
        let mut conn = Connection::new(config);
        conn.startup().unwrap();
        assert_eq!(conn.current_state(), &ConnectionState::Authenticating);
    }

    #[test]
    fn query_out_of_order_is_illegal() {
        let mut conn = Connection::new(ConnectionConfig::default());
        let err = conn.send(&FrontendMessage::Query { sql: "SELECT 1".to_string() }).unwrap_err();
        assert!(matches!(err, ProtocolError::IllegalStateTransition { .. }));
    }

    #[test]
    fn terminate_always_legal() {
        let mut conn = Connection::new(ConnectionConfig::default());
        conn.send(&FrontendMessage::Terminate).unwrap();
        assert_eq!(conn.current_state(), &ConnectionState::Terminated);
    }
}
