//! `StartupMessage`, `SSLRequest`, and `CancelRequest`.
//!
//! All three are untagged: the frame carries only a 4-byte self-inclusive
//! length, never a leading tag byte.

use crate::encode::{write_untagged_frame, Encode, MessageWriter};

/// Major/minor protocol version this crate speaks: `3.0`.
pub const PROTOCOL_VERSION_MAJOR: u16 = 3;
pub const PROTOCOL_VERSION_MINOR: u16 = 0;

/// `(major << 16) | minor`, as carried on the wire.
pub const PROTOCOL_VERSION: u32 =
    ((PROTOCOL_VERSION_MAJOR as u32) << 16) | PROTOCOL_VERSION_MINOR as u32;

pub const SSL_REQUEST_CODE: u32 = 80_877_103;
pub const CANCEL_REQUEST_CODE: u32 = 80_877_102;

/// The first message a client sends, carrying the protocol version and a
/// `key=value` parameter list. `user` is required; everything else
/// (`database`, `application_name`, ...) is caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupMessage {
    pub params: Vec<(String, String)>,
}

impl StartupMessage {
    pub fn new(user: impl Into<String>) -> Self {
        Self { params: vec![("user".to_string(), user.into())] }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

impl Encode for StartupMessage {
    fn size_hint(&self) -> usize {
        8 + self
            .params
            .iter()
            .map(|(k, v)| k.len() + v.len() + 2)
            .sum::<usize>()
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut writer = MessageWriter::with_capacity(self.size_hint());
        write_untagged_frame(&mut writer, |w| {
            w.write_u32(PROTOCOL_VERSION);
            for (k, v) in &self.params {
                w.write_cstring(k);
                w.write_cstring(v);
            }
            w.write_u8(0);
        });
        buf.extend_from_slice(&writer.into_vec());
    }
}

/// Requests the server negotiate TLS before the real `StartupMessage` is
/// sent. Fixed 8-byte frame: `length(8) | 80877103`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SSLRequest;

impl Encode for SSLRequest {
    fn size_hint(&self) -> usize {
        8
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut writer = MessageWriter::with_capacity(8);
        write_untagged_frame(&mut writer, |w| {
            w.write_u32(SSL_REQUEST_CODE);
        });
        buf.extend_from_slice(&writer.into_vec());
    }
}

/// Sent over a fresh connection to cancel an in-flight query on another
/// connection, identified by its `BackendKeyData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelRequest {
    pub process_id: i32,
    pub secret_key: i32,
}

impl Encode for CancelRequest {
    fn size_hint(&self) -> usize {
        16
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut writer = MessageWriter::with_capacity(16);
        write_untagged_frame(&mut writer, |w| {
            w.write_u32(CANCEL_REQUEST_CODE);
            w.write_i32(self.process_id);
            w.write_i32(self.secret_key);
        });
        buf.extend_from_slice(&writer.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_startup_message() {
        let msg = StartupMessage::new("u").param("database", "d");
        let bytes = msg.to_bytes();
        assert_eq!(
            &bytes[..],
            &b"\0\0\0\x1b\0\x03\0\0user\0u\0database\0d\0\0"[..]
        );
    }

    #[test]
    fn encodes_ssl_request() {
        let bytes = SSLRequest.to_bytes();
        assert_eq!(&bytes[..], &b"\0\0\0\x08\x04\xd2\x16\x2f"[..]);
    }

    #[test]
    fn encodes_cancel_request() {
        let bytes = CancelRequest { process_id: 1, secret_key: 2 }.to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 16]);
        assert_eq!(&bytes[4..8], &CANCEL_REQUEST_CODE.to_be_bytes());
        assert_eq!(&bytes[8..12], &1i32.to_be_bytes());
        assert_eq!(&bytes[12..16], &2i32.to_be_bytes());
    }
}
