//! `BackendKeyData` ('K'): the (pid, secret) pair a later connection presents
//! in a `CancelRequest` to cancel this one's in-flight query.

use crate::decode::{Decode, MessageReader};
use crate::encode::{Encode, MessageWriter};
use crate::error::ProtocolError;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendKeyData {
    pub process_id: i32,
    pub secret_key: i32,
}

impl Encode for BackendKeyData {
    fn size_hint(&self) -> usize {
        8
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut writer = MessageWriter::with_capacity(8);
        writer.write_i32(self.process_id);
        writer.write_i32(self.secret_key);
        buf.extend_from_slice(&writer.into_vec());
    }
}

impl Decode for BackendKeyData {
    fn decode(buf: Bytes) -> Result<Self, ProtocolError> {
        let mut reader = MessageReader::new(buf);
        let process_id = reader.read_i32()?;
        let secret_key = reader.read_i32()?;
        reader.finish()?;
        Ok(Self { process_id, secret_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let original = BackendKeyData { process_id: 1234, secret_key: 5678 };
        let decoded = BackendKeyData::decode(Bytes::from(original.to_bytes())).unwrap();
        assert_eq!(decoded, original);
    }
}
