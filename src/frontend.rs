//! Frontend (client-to-server) message encoding.

use crate::encode::{write_frame, Encode, MessageWriter};
use crate::startup_message::{CancelRequest, SSLRequest, StartupMessage};
use crate::FormatCode;

/// `Describe`/`Close` target: a prepared statement or a portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOrPortal {
    Statement,
    Portal,
}

impl StatementOrPortal {
    fn to_char(self) -> u8 {
        match self {
            StatementOrPortal::Statement => b'S',
            StatementOrPortal::Portal => b'P',
        }
    }
}

/// One bound parameter value: `NULL` or a raw byte payload in the format the
/// surrounding `Bind` declares for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindParam {
    Null,
    Value(Vec<u8>),
}

/// A frontend (client-originated) message, ready to be encoded onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendMessage {
    StartupMessage(StartupMessage),
    SSLRequest,
    CancelRequest(CancelRequest),
    PasswordMessage { payload: Vec<u8> },
    SASLInitialResponse { mechanism: String, initial_response: Vec<u8> },
    SASLResponse { payload: Vec<u8> },
    Query { sql: String },
    Parse { name: String, sql: String, param_types: Vec<u32> },
    Bind {
        portal: String,
        statement: String,
        param_formats: Vec<FormatCode>,
        params: Vec<BindParam>,
        result_formats: Vec<FormatCode>,
    },
    Describe { kind: StatementOrPortal, name: String },
    Execute { portal: String, max_rows: i32 },
    Close { kind: StatementOrPortal, name: String },
    Sync,
    Flush,
    CopyData { data: Vec<u8> },
    CopyDone,
    CopyFail { reason: String },
    Terminate,
}

impl FrontendMessage {
    /// `serialize()` per the public surface: a thin alias over `to_bytes`.
    pub fn serialize(&self) -> Vec<u8> {
        self.to_bytes()
    }
}

impl Encode for FrontendMessage {
    fn size_hint(&self) -> usize {
        match self {
            FrontendMessage::StartupMessage(m) => m.size_hint(),
            FrontendMessage::CancelRequest(m) => m.size_hint(),
            FrontendMessage::SSLRequest => 8,
            FrontendMessage::PasswordMessage { payload } => payload.len() + 5,
            FrontendMessage::SASLInitialResponse { mechanism, initial_response } => {
                mechanism.len() + initial_response.len() + 14
            }
            FrontendMessage::SASLResponse { payload } => payload.len() + 5,
            FrontendMessage::Query { sql } => sql.len() + 6,
            FrontendMessage::Parse { name, sql, param_types } => {
                name.len() + sql.len() + param_types.len() * 4 + 13
            }
            FrontendMessage::Bind { portal, statement, param_formats, params, result_formats } => {
                portal.len()
                    + statement.len()
                    + param_formats.len() * 2
                    + params.iter().map(|p| match p {
                        BindParam::Null => 4,
                        BindParam::Value(v) => 4 + v.len(),
                    }).sum::<usize>()
                    + result_formats.len() * 2
                    + 15
            }
            FrontendMessage::Describe { name, .. } | FrontendMessage::Close { name, .. } => {
                name.len() + 6
            }
            FrontendMessage::Execute { portal, .. } => portal.len() + 9,
            FrontendMessage::Sync | FrontendMessage::Flush | FrontendMessage::CopyDone
            | FrontendMessage::Terminate => 5,
            FrontendMessage::CopyData { data } => data.len() + 5,
            FrontendMessage::CopyFail { reason } => reason.len() + 6,
        }
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut w = MessageWriter::with_capacity(self.size_hint());

        match self {
            FrontendMessage::StartupMessage(m) => {
                buf.extend_from_slice(&m.to_bytes());
                return;
            }
            FrontendMessage::SSLRequest => {
                buf.extend_from_slice(&SSLRequest.to_bytes());
                return;
            }
            FrontendMessage::CancelRequest(m) => {
                buf.extend_from_slice(&m.to_bytes());
                return;
            }
            FrontendMessage::PasswordMessage { payload }
            | FrontendMessage::SASLResponse { payload } => {
                write_frame(&mut w, b'p', |w| w.write_bytes(payload));
            }
            FrontendMessage::SASLInitialResponse { mechanism, initial_response } => {
                write_frame(&mut w, b'p', |w| {
                    w.write_cstring(mechanism);
                    w.write_i32(initial_response.len() as i32);
                    w.write_bytes(initial_response);
                });
            }
            FrontendMessage::Query { sql } => {
                write_frame(&mut w, b'Q', |w| w.write_cstring(sql));
            }
            FrontendMessage::Parse { name, sql, param_types } => {
                write_frame(&mut w, b'P', |w| {
                    w.write_cstring(name);
                    w.write_cstring(sql);
                    w.write_i16(param_types.len() as i16);
                    for oid in param_types {
                        w.write_u32(*oid);
                    }
                });
            }
            FrontendMessage::Bind { portal, statement, param_formats, params, result_formats } => {
                write_frame(&mut w, b'B', |w| {
                    w.write_cstring(portal);
                    w.write_cstring(statement);
                    w.write_i16(param_formats.len() as i16);
                    for fmt in param_formats {
                        w.write_i16(fmt.to_int());
                    }
                    w.write_i16(params.len() as i16);
                    for param in params {
                        match param {
                            BindParam::Null => w.write_i32(-1),
                            BindParam::Value(v) => {
                                w.write_i32(v.len() as i32);
                                w.write_bytes(v);
                            }
                        }
                    }
                    w.write_i16(result_formats.len() as i16);
                    for fmt in result_formats {
                        w.write_i16(fmt.to_int());
                    }
                });
            }
            FrontendMessage::Describe { kind, name } => {
                write_frame(&mut w, b'D', |w| {
                    w.write_u8(kind.to_char());
                    w.write_cstring(name);
                });
            }
            FrontendMessage::Execute { portal, max_rows } => {
                write_frame(&mut w, b'E', |w| {
                    w.write_cstring(portal);
                    w.write_i32(*max_rows);
                });
            }
            FrontendMessage::Close { kind, name } => {
                write_frame(&mut w, b'C', |w| {
                    w.write_u8(kind.to_char());
                    w.write_cstring(name);
                });
            }
            FrontendMessage::Sync => write_frame(&mut w, b'S', |_| {}),
            FrontendMessage::Flush => write_frame(&mut w, b'H', |_| {}),
            FrontendMessage::CopyData { data } => {
                write_frame(&mut w, b'd', |w| w.write_bytes(data));
            }
            FrontendMessage::CopyDone => write_frame(&mut w, b'c', |_| {}),
            FrontendMessage::CopyFail { reason } => {
                write_frame(&mut w, b'f', |w| w.write_cstring(reason));
            }
            FrontendMessage::Terminate => write_frame(&mut w, b'X', |_| {}),
        }

        buf.extend_from_slice(&w.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_query() {
        let msg = FrontendMessage::Query { sql: "SELECT 1".to_string() };
        let bytes = msg.to_bytes();
        assert_eq!(bytes[0], b'Q');
        assert_eq!(&bytes[1..5], &0x0000000Du32.to_be_bytes());
        assert_eq!(&bytes[5..], b"SELECT 1\0");
    }

    #[test]
    fn encodes_terminate() {
        let bytes = FrontendMessage::Terminate.to_bytes();
        assert_eq!(&bytes[..], &[0x58, 0, 0, 0, 4]);
    }

    #[test]
    fn encodes_sync() {
        let bytes = FrontendMessage::Sync.to_bytes();
        assert_eq!(&bytes[..], &[b'S', 0, 0, 0, 4]);
    }

    #[test]
    fn encodes_bind_with_null_param() {
        let msg = FrontendMessage::Bind {
            portal: "".to_string(),
            statement: "stmt".to_string(),
            param_formats: vec![FormatCode::Binary],
            params: vec![BindParam::Null, BindParam::Value(vec![1, 2, 3])],
            result_formats: vec![],
        };
        let bytes = msg.to_bytes();
        assert_eq!(bytes[0], b'B');
    }
}
