//! The `AuthenticationRequest` sub-messages carried inside a backend `R` tag.
//!
//! PostgreSQL multiplexes several distinct authentication steps under one
//! message tag, discriminated by a leading 32-bit sub-kind. This module only
//! decodes that sub-message; driving the actual exchange is
//! [`crate::scram::ScramClient`] and [`crate::password_message::hash_md5_password`].

use crate::decode::MessageReader;
use crate::error::ProtocolError;
use bytes::Bytes;

/// One `AuthenticationRequest` sub-message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationRequest {
    /// Authentication succeeded; proceed to the post-auth startup messages.
    Ok,
    KerberosV5,
    CleartextPassword,
    /// The 4-byte salt the server wants appended before the final MD5 hash.
    MD5Password { salt: [u8; 4] },
    GSS,
    SSPI,
    /// The mechanisms the server supports, in its order of preference.
    SASL { mechanisms: Vec<String> },
    /// `server-first-message` bytes, forwarded verbatim to the SCRAM client.
    SASLContinue { data: Bytes },
    /// `server-final-message` bytes, forwarded verbatim to the SCRAM client.
    SASLFinal { data: Bytes },
}

impl AuthenticationRequest {
    pub const TAG: u8 = b'R';

    pub fn decode(payload: Bytes) -> Result<Self, ProtocolError> {
        let mut reader = MessageReader::new(payload);
        let sub_kind = reader.read_u32()?;

        Ok(match sub_kind {
            0 => {
                reader.finish()?;
                AuthenticationRequest::Ok
            }
            2 => {
                reader.finish()?;
                AuthenticationRequest::KerberosV5
            }
            3 => {
                reader.finish()?;
                AuthenticationRequest::CleartextPassword
            }
            5 => {
                let salt_bytes = reader.read_bytes(4)?;
                reader.finish()?;
                let mut salt = [0u8; 4];
                salt.copy_from_slice(&salt_bytes);
                AuthenticationRequest::MD5Password { salt }
            }
            7 => {
                reader.finish()?;
                AuthenticationRequest::GSS
            }
            9 => {
                reader.finish()?;
                AuthenticationRequest::SSPI
            }
            10 => {
                let mut mechanisms = Vec::new();
                loop {
                    if reader.remaining() == 1 {
                        // final NUL terminator with no preceding mechanism name
                        let marker = reader.read_u8()?;
                        if marker != 0 {
                            return Err(ProtocolError::InvalidMessage(
                                "SASL mechanism list missing terminator".into(),
                            ));
                        }
                        break;
                    }
                    if reader.remaining() == 0 {
                        break;
                    }
                    mechanisms.push(reader.read_cstring()?);
                }
                AuthenticationRequest::SASL { mechanisms }
            }
            11 => {
                let data = reader.read_bytes(reader.remaining())?;
                AuthenticationRequest::SASLContinue { data }
            }
            12 => {
                let data = reader.read_bytes(reader.remaining())?;
                AuthenticationRequest::SASLFinal { data }
            }
            other => {
                return Err(ProtocolError::UnsupportedAuth(format!("sub-kind {other}")));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ok() {
        let msg = AuthenticationRequest::decode(Bytes::from_static(&[0, 0, 0, 0])).unwrap();
        assert_eq!(msg, AuthenticationRequest::Ok);
    }

    #[test]
    fn decodes_md5_salt() {
        let mut payload = vec![0, 0, 0, 5];
        payload.extend_from_slice(&[1, 2, 3, 4]);
        let msg = AuthenticationRequest::decode(Bytes::from(payload)).unwrap();
        assert_eq!(msg, AuthenticationRequest::MD5Password { salt: [1, 2, 3, 4] });
    }

    #[test]
    fn decodes_sasl_mechanism_list() {
        let mut payload = vec![0, 0, 0, 10];
        payload.extend_from_slice(b"SCRAM-SHA-256\0");
        payload.push(0);
        let msg = AuthenticationRequest::decode(Bytes::from(payload)).unwrap();
        assert_eq!(
            msg,
            AuthenticationRequest::SASL { mechanisms: vec!["SCRAM-SHA-256".to_string()] }
        );
    }

    #[test]
    fn unsupported_kerberos_still_decodes_but_rejected_later() {
        let msg = AuthenticationRequest::decode(Bytes::from_static(&[0, 0, 0, 2])).unwrap();
        assert_eq!(msg, AuthenticationRequest::KerberosV5);
    }

    #[test]
    fn unknown_sub_kind_is_unsupported_auth() {
        let err = AuthenticationRequest::decode(Bytes::from_static(&[0, 0, 0, 99])).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedAuth(_)));
    }
}
