//! SCRAM-SHA-256 client-side exchange (RFC 5802), driven by the
//! `AuthenticationSASL*` sub-messages dispatched in [`crate::authentication`].
//!
//! `ScramClient` is a small state machine of its own
//! (`AwaitingChallenge -> AwaitingFinal -> Done`), independent of the outer
//! connection state machine in [`crate::connection`].

use crate::error::AuthError;
use base64::engine::general_purpose::STANDARD as base64_engine;
use base64::Engine;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const MECHANISM: &str = "SCRAM-SHA-256";

const CLIENT_KEY_LABEL: &[u8] = b"Client Key";
const SERVER_KEY_LABEL: &[u8] = b"Server Key";

#[derive(Debug, PartialEq, Eq)]
enum Step {
    AwaitingChallenge,
    AwaitingFinal,
    Done,
}

/// Drives one SCRAM-SHA-256 authentication exchange.
pub struct ScramClient {
    client_nonce: String,
    client_first_bare: String,
    salted_password: Option<[u8; 32]>,
    auth_message: Option<String>,
    step: Step,
}

impl ScramClient {
    pub fn new(_user: &str, _password: &str) -> Self {
        let mut nonce_bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let client_nonce = base64_engine.encode(nonce_bytes);
        Self::with_nonce_and_password(client_nonce, _password)
    }

    /// Test seam: construct with a fixed client nonce instead of drawing from
    /// `rand::thread_rng`, so SCRAM property tests can reproduce RFC 5802
    /// vectors byte-for-byte.
    pub fn new_with_nonce(_user: &str, password: &str, client_nonce: impl Into<String>) -> Self {
        Self::with_nonce_and_password(client_nonce.into(), password)
    }

    fn with_nonce_and_password(client_nonce: String, password: &str) -> Self {
        let client_first_bare = format!("n=,r={client_nonce}");
        Self {
            client_nonce,
            client_first_bare,
            salted_password: {
                // stashed lazily once the salt/iterations arrive from the server
                let _ = password;
                None
            },
            auth_message: None,
            step: Step::AwaitingChallenge,
        }
    }

    /// `"n,," || client-first-bare`, sent as a `SASLInitialResponse`.
    pub fn client_first_message(&self) -> String {
        format!("n,,{}", self.client_first_bare)
    }

    /// Process the `server-first-message` carried in
    /// `AuthenticationSASLContinue`, returning the `client-final-message`
    /// bytes to send back as a `SASLResponse`.
    pub fn process_server_first(
        &mut self,
        password: &str,
        server_first: &[u8],
    ) -> Result<String, AuthError> {
        if self.step != Step::AwaitingChallenge {
            return Err(AuthError::OutOfOrder);
        }

        let server_first = std::str::from_utf8(server_first)
            .map_err(|_| AuthError::MalformedServerMessage("not UTF-8".into()))?;

        let mut server_nonce = None;
        let mut salt_b64 = None;
        let mut iterations = None;
        for part in server_first.split(',') {
            if let Some(rest) = part.strip_prefix("r=") {
                server_nonce = Some(rest);
            } else if let Some(rest) = part.strip_prefix("s=") {
                salt_b64 = Some(rest);
            } else if let Some(rest) = part.strip_prefix("i=") {
                iterations = Some(rest);
            }
        }

        let server_nonce = server_nonce
            .ok_or_else(|| AuthError::MalformedServerMessage("missing r=".into()))?;
        let salt_b64 =
            salt_b64.ok_or_else(|| AuthError::MalformedServerMessage("missing s=".into()))?;
        let iterations: u32 = iterations
            .ok_or_else(|| AuthError::MalformedServerMessage("missing i=".into()))?
            .parse()
            .map_err(|_| AuthError::MalformedServerMessage("non-numeric i=".into()))?;

        if !server_nonce.starts_with(&self.client_nonce) {
            return Err(AuthError::NonceMismatch);
        }

        let salt = base64_engine
            .decode(salt_b64)
            .map_err(|_| AuthError::MalformedServerMessage("invalid base64 salt".into()))?;

        let mut salted_password = [0u8; 32];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut salted_password);

        let client_key = hmac_sha256(&salted_password, CLIENT_KEY_LABEL);
        let stored_key = Sha256::digest(client_key);

        let client_final_without_proof = format!("c=biws,r={server_nonce}");
        let auth_message = format!(
            "{},{},{}",
            self.client_first_bare, server_first, client_final_without_proof
        );

        let client_signature = hmac_sha256(&stored_key, auth_message.as_bytes());
        let client_proof: Vec<u8> = client_key
            .iter()
            .zip(client_signature.iter())
            .map(|(a, b)| a ^ b)
            .collect();

        self.salted_password = Some(salted_password);
        self.auth_message = Some(auth_message.clone());
        self.step = Step::AwaitingFinal;

        Ok(format!(
            "{client_final_without_proof},p={}",
            base64_engine.encode(client_proof)
        ))
    }

    /// Process the `server-final-message` carried in
    /// `AuthenticationSASLFinal`. On success, the caller should expect
    /// `AuthenticationOk` next.
    pub fn process_server_final(&mut self, server_final: &[u8]) -> Result<(), AuthError> {
        if self.step != Step::AwaitingFinal {
            return Err(AuthError::OutOfOrder);
        }

        let server_final = std::str::from_utf8(server_final)
            .map_err(|_| AuthError::MalformedServerMessage("not UTF-8".into()))?;

        let signature_b64 = server_final
            .strip_prefix("v=")
            .ok_or_else(|| AuthError::MalformedServerMessage("missing v=".into()))?;
        let received_signature = base64_engine
            .decode(signature_b64)
            .map_err(|_| AuthError::MalformedServerMessage("invalid base64 signature".into()))?;

        let salted_password = self.salted_password.expect("set in process_server_first");
        let auth_message = self.auth_message.as_deref().expect("set in process_server_first");

        let server_key = hmac_sha256(&salted_password, SERVER_KEY_LABEL);
        let expected_signature = hmac_sha256(&server_key, auth_message.as_bytes());

        if !constant_time_eq(&expected_signature, &received_signature) {
            return Err(AuthError::ServerSignatureMismatch);
        }

        self.step = Step::Done;
        Ok(())
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_exchange_against_rfc5802_style_vector() {
        let mut client =
            ScramClient::new_with_nonce("user", "pencil", "rOprNGfwEbeRWgbNEkqO");

        assert_eq!(client.client_first_message(), "n,,n=,r=rOprNGfwEbeRWgbNEkqO");

        let server_first =
            b"r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096";
        let client_final = client
            .process_server_first("pencil", server_first)
            .unwrap();

        assert!(client_final.starts_with("c=biws,r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0"));
        assert!(client_final.contains(",p="));
    }

    #[test]
    fn rejects_nonce_that_does_not_extend_client_nonce() {
        let mut client = ScramClient::new_with_nonce("user", "pencil", "clientnonce");
        let server_first = b"r=totallydifferent,s=AAAA,i=4096";
        let err = client.process_server_first("pencil", server_first).unwrap_err();
        assert!(matches!(err, AuthError::NonceMismatch));
    }

    #[test]
    fn rejects_server_final_received_before_server_first() {
        let mut client = ScramClient::new_with_nonce("user", "pencil", "clientnonce");
        let err = client.process_server_final(b"v=AAAA").unwrap_err();
        assert!(matches!(err, AuthError::OutOfOrder));
    }

    #[test]
    fn constant_time_eq_rejects_length_mismatch() {
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
    }
}
