use crate::decode::Decode;
use crate::encode::Encode;
use crate::error::ProtocolError;
use bytes::Bytes;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum TransactionStatus {
    /// Not in a transaction block.
    Idle = b'I',

    /// In a transaction block.
    InTransaction = b'T',

    /// In a _failed_ transaction block. Queries will be rejected until the
    /// block is ended with `ROLLBACK`.
    InFailedTransaction = b'E',
}

impl TransactionStatus {
    pub fn from_char(b: u8) -> Result<Self, ProtocolError> {
        Ok(match b {
            b'I' => TransactionStatus::Idle,
            b'T' => TransactionStatus::InTransaction,
            b'E' => TransactionStatus::InFailedTransaction,
            other => {
                return Err(ProtocolError::InvalidMessage(format!(
                    "unknown transaction status byte {:?}",
                    other as char
                )))
            }
        })
    }

    pub fn to_char(self) -> u8 {
        self as u8
    }
}

/// `ReadyForQuery` is sent whenever the backend is ready for a new query cycle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ReadyForQuery {
    pub status: TransactionStatus,
}

impl Encode for ReadyForQuery {
    #[inline]
    fn size_hint(&self) -> usize {
        1
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.status.to_char());
    }
}

impl Decode for ReadyForQuery {
    fn decode(b: Bytes) -> Result<Self, ProtocolError> {
        if b.len() != 1 {
            return Err(ProtocolError::InvalidMessage(
                "ReadyForQuery payload must be exactly one byte".into(),
            ));
        }

        Ok(Self { status: TransactionStatus::from_char(b[0])? })
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadyForQuery, TransactionStatus};
    use crate::backend::BackendMessage;

    #[test]
    fn it_encodes_ready_for_query() {
        let message = BackendMessage::ReadyForQuery(ReadyForQuery {
            status: TransactionStatus::InFailedTransaction,
        });
        let (tag, payload) = message.to_wire();
        assert_eq!(tag, b'Z');
        assert_eq!(&payload[..], b"E");
    }

    #[test]
    fn it_decodes_ready_for_query() {
        let message = BackendMessage::parse(b'Z', &b"E"[..]).unwrap();
        let BackendMessage::ReadyForQuery(body) = message else {
            panic!("expected ReadyForQuery");
        };

        assert_eq!(body.status, TransactionStatus::InFailedTransaction);
    }

    #[test]
    fn decodes_all_three_statuses() {
        assert_eq!(TransactionStatus::from_char(b'I').unwrap(), TransactionStatus::Idle);
        assert_eq!(TransactionStatus::from_char(b'T').unwrap(), TransactionStatus::InTransaction);
        assert_eq!(TransactionStatus::from_char(b'E').unwrap(), TransactionStatus::InFailedTransaction);
        assert!(TransactionStatus::from_char(b'?').is_err());
    }
}
