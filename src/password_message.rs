//! `PasswordMessage`, and the MD5 challenge-response hash it carries for the
//! `AuthenticationMD5Password` flow.

use crate::decode::{Decode, MessageReader};
use crate::encode::{write_frame, Encode, MessageWriter};
use crate::error::ProtocolError;
use bytes::Bytes;
use md5::{Digest, Md5};

pub const TAG: u8 = b'p';

/// Response to `AuthenticationCleartextPassword` or `AuthenticationMD5Password`.
/// The payload is opaque at this layer; what goes in it depends on which
/// challenge preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordMessage {
    password: Bytes,
}

impl PasswordMessage {
    /// Send the password verbatim, for `AuthenticationCleartextPassword`.
    /// The wire payload is a CString: the password bytes plus a trailing
    /// `0x00`.
    pub fn cleartext(password: impl AsRef<str>) -> Self {
        let mut bytes = password.as_ref().as_bytes().to_vec();
        bytes.push(0);
        Self { password: Bytes::from(bytes) }
    }

    /// Send the salted MD5 hash, for `AuthenticationMD5Password`. Also a
    /// CString: the `md5...` hash plus a trailing `0x00`.
    pub fn md5(user: impl AsRef<str>, password: impl AsRef<str>, salt: [u8; 4]) -> Self {
        let mut hashed = hash_md5_password(user.as_ref(), password.as_ref(), salt).into_bytes();
        hashed.push(0);
        Self { password: Bytes::from(hashed) }
    }

    /// The raw CString payload this message carries (already hashed and
    /// NUL-terminated, if applicable).
    pub fn password(&self) -> &[u8] {
        &self.password
    }
}

impl Decode for PasswordMessage {
    fn decode(buf: Bytes) -> Result<Self, ProtocolError> {
        let mut reader = MessageReader::new(buf);
        let remaining = reader.remaining();
        let password = reader.read_bytes(remaining)?;
        Ok(Self { password })
    }
}

impl Encode for PasswordMessage {
    fn size_hint(&self) -> usize {
        self.password.len() + 5
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut writer = MessageWriter::with_capacity(self.size_hint());
        write_frame(&mut writer, TAG, |w| {
            w.write_bytes(&self.password);
        });
        buf.extend_from_slice(&writer.into_vec());
    }
}

/// `"md5" || hex(md5( hex(md5(password || user)) || salt ))`.
pub fn hash_md5_password(user: &str, password: &str, salt: [u8; 4]) -> String {
    let mut inner = Md5::new();
    inner.update(password.as_bytes());
    inner.update(user.as_bytes());
    let inner_hex = hex::encode(inner.finalize());

    let mut outer = Md5::new();
    outer.update(inner_hex.as_bytes());
    outer.update(salt);
    let outer_hex = hex::encode(outer.finalize());

    format!("md5{outer_hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_hash_has_expected_shape() {
        let hashed = hash_md5_password("user", "password", [0x01, 0x02, 0x03, 0x04]);
        assert!(hashed.starts_with("md5"));
        assert_eq!(hashed.len(), 35);
    }

    #[test]
    fn md5_hash_is_deterministic() {
        let a = hash_md5_password("user", "password", [1, 2, 3, 4]);
        let b = hash_md5_password("user", "password", [1, 2, 3, 4]);
        assert_eq!(a, b);
    }

    #[test]
    fn cleartext_round_trips() {
        let msg = PasswordMessage::cleartext("hunter2");
        let encoded = msg.to_bytes();
        assert_eq!(encoded[0], TAG);
        let payload = Bytes::copy_from_slice(&encoded[5..]);
        let decoded = PasswordMessage::decode(payload).unwrap();
        assert_eq!(decoded.password(), b"hunter2\0");
    }

    #[test]
    fn md5_message_is_nul_terminated() {
        let msg = PasswordMessage::md5("user", "password", [1, 2, 3, 4]);
        assert_eq!(msg.password().last(), Some(&0u8));
        assert_eq!(
            std::str::from_utf8(&msg.password()[..msg.password().len() - 1]).unwrap(),
            hash_md5_password("user", "password", [1, 2, 3, 4])
        );
    }
}
