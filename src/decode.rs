//! Primitive reading over a `Bytes` payload.
//!
//! `MessageReader` is positional and never shares mutable state across
//! readers; everything it returns either copies a small fixed-size value or
//! borrows from the underlying `Bytes` (cheap, refcounted clone).

use crate::error::ProtocolError;
use bytes::{Buf, Bytes};
use memchr::memchr;
use std::str;

/// Types that can be parsed out of a backend-message payload.
pub trait Decode: Sized {
    fn decode(buf: Bytes) -> Result<Self, ProtocolError>;
}

/// A cursor over a single message payload.
///
/// Unlike `bytes::Buf`, reads here return `ProtocolError` instead of
/// panicking when the payload is short, since payload lengths come directly
/// off the wire and must never be trusted.
pub struct MessageReader {
    buf: Bytes,
}

impl MessageReader {
    #[inline]
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn require(&self, n: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < n {
            Err(ProtocolError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        self.require(2)?;
        Ok(self.buf.get_i16())
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        self.require(2)?;
        Ok(self.buf.get_u16())
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        self.require(4)?;
        Ok(self.buf.get_i32())
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        self.require(4)?;
        Ok(self.buf.get_u32())
    }

    /// Read exactly `n` raw bytes, as a cheap `Bytes` slice of the payload.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, ProtocolError> {
        self.require(n)?;
        Ok(self.buf.split_to(n))
    }

    /// Read a NUL-terminated string: scans for the first `0x00`, consumes it,
    /// and decodes everything before it as UTF-8.
    pub fn read_cstring(&mut self) -> Result<String, ProtocolError> {
        let end = memchr(0, &self.buf).ok_or(ProtocolError::UnexpectedEof)?;
        let raw = self.buf.split_to(end);
        self.buf.advance(1); // the NUL terminator
        String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// True once every byte of the payload has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.remaining() == 0
    }

    /// Fail unless the payload is fully consumed; used by fixed-shape
    /// messages that do not document any trailing-data reservation.
    pub fn finish(self) -> Result<(), ProtocolError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::InvalidMessage(
                "unexpected trailing bytes after message payload".into(),
            ))
        }
    }
}

/// Scan `b` for the first NUL and decode the bytes before it as UTF-8,
/// without consuming anything. Used by the error/notice field codec, which
/// walks a flat `tag, cstring, tag, cstring, ..., 0x00` list by hand.
#[inline]
pub(crate) fn get_str(b: &[u8]) -> Result<&str, ProtocolError> {
    let end = memchr(0, b).ok_or(ProtocolError::UnexpectedEof)?;
    str::from_utf8(&b[..end]).map_err(|_| ProtocolError::InvalidUtf8)
}
