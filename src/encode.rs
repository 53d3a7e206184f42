//! Growable, length-backpatching byte writer.
//!
//! The writer never knows a message's total length up front: it reserves
//! four zero bytes where the length belongs, keeps writing, then goes back
//! and patches the real value in once the payload is complete.

use byteorder::{BigEndian, ByteOrder};

/// Types that can be serialized into a frontend-message frame.
pub trait Encode {
    /// A best-effort capacity hint; need not be exact.
    fn size_hint(&self) -> usize;

    fn encode(&self, buf: &mut Vec<u8>);

    #[inline]
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_hint());
        self.encode(&mut buf);
        buf
    }
}

/// Growable output buffer with length-backpatching support.
#[derive(Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap) }
    }

    #[inline]
    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    #[inline]
    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    #[inline]
    pub fn write_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    /// Write a UTF-8 string followed by a NUL terminator.
    #[inline]
    pub fn write_cstring(&mut self, v: &str) {
        self.buf.extend_from_slice(v.as_bytes());
        self.buf.push(0);
    }

    /// Current length of the buffer, for remembering a length-field offset.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Reserve 4 bytes for a length field to be patched in later, returning
    /// the offset to pass to [`MessageWriter::patch_len32`].
    #[inline]
    pub fn reserve_len32(&mut self) -> usize {
        let at = self.buf.len();
        self.buf.extend_from_slice(&[0, 0, 0, 0]);
        at
    }

    /// Overwrite the 4 bytes at `at` with the big-endian encoding of
    /// `self.len() - at`, i.e. the length of everything written since the
    /// length field was reserved (the length field counts itself).
    #[inline]
    pub fn patch_len32(&mut self, at: usize) {
        let len = (self.buf.len() - at) as u32;
        BigEndian::write_u32(&mut self.buf[at..at + 4], len);
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Write an ordinary tagged frame: `tag | length(4, self-inclusive) | body`.
///
/// `body` is invoked with the writer positioned right after the
/// length-field placeholder.
pub fn write_frame(buf: &mut MessageWriter, tag: u8, body: impl FnOnce(&mut MessageWriter)) {
    buf.write_u8(tag);
    let len_at = buf.reserve_len32();
    body(buf);
    buf.patch_len32(len_at);
}

/// Write an untagged frame (`StartupMessage`, `SSLRequest`, `CancelRequest`):
/// `length(4, self-inclusive) | body`.
pub fn write_untagged_frame(buf: &mut MessageWriter, body: impl FnOnce(&mut MessageWriter)) {
    let len_at = buf.reserve_len32();
    body(buf);
    buf.patch_len32(len_at);
}
