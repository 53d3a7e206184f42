//! The structured field list shared by `ErrorResponse` ('E') and
//! `NoticeResponse` ('N').
//!
//! Both messages are a flat run of `tag byte, CString value` pairs
//! terminated by a single `0x00`. This module owns that shared codec; the
//! two message types in [`crate::backend`] are thin wrappers keying the
//! outer tag.

use crate::decode::get_str;
use crate::encode::{Encode, MessageWriter};
use crate::error::ProtocolError;
use bytes::Bytes;
use std::borrow::Cow;

/// One field of an `ErrorResponse`/`NoticeResponse`, keyed by its single-byte
/// wire tag. Exhaustive over the fields PostgreSQL documents, with an
/// `Unknown` fallback so a future field added by the server is preserved
/// rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFieldType {
    Severity,
    SeverityNonLocalized,
    Code,
    Message,
    Detail,
    Hint,
    Position,
    InternalPosition,
    InternalQuery,
    Where,
    Schema,
    Table,
    Column,
    DataType,
    Constraint,
    File,
    Line,
    Routine,
    Unknown(u8),
}

impl ErrorFieldType {
    pub fn to_char(self) -> u8 {
        match self {
            ErrorFieldType::Severity => b'S',
            ErrorFieldType::SeverityNonLocalized => b'V',
            ErrorFieldType::Code => b'C',
            ErrorFieldType::Message => b'M',
            ErrorFieldType::Detail => b'D',
            ErrorFieldType::Hint => b'H',
            ErrorFieldType::Position => b'P',
            ErrorFieldType::InternalPosition => b'p',
            ErrorFieldType::InternalQuery => b'q',
            ErrorFieldType::Where => b'W',
            ErrorFieldType::Schema => b's',
            ErrorFieldType::Table => b't',
            ErrorFieldType::Column => b'c',
            ErrorFieldType::DataType => b'd',
            ErrorFieldType::Constraint => b'n',
            ErrorFieldType::File => b'F',
            ErrorFieldType::Line => b'L',
            ErrorFieldType::Routine => b'R',
            ErrorFieldType::Unknown(b) => b,
        }
    }

    pub fn from_char(b: u8) -> Self {
        match b {
            b'S' => ErrorFieldType::Severity,
            b'V' => ErrorFieldType::SeverityNonLocalized,
            b'C' => ErrorFieldType::Code,
            b'M' => ErrorFieldType::Message,
            b'D' => ErrorFieldType::Detail,
            b'H' => ErrorFieldType::Hint,
            b'P' => ErrorFieldType::Position,
            b'p' => ErrorFieldType::InternalPosition,
            b'q' => ErrorFieldType::InternalQuery,
            b'W' => ErrorFieldType::Where,
            b's' => ErrorFieldType::Schema,
            b't' => ErrorFieldType::Table,
            b'c' => ErrorFieldType::Column,
            b'd' => ErrorFieldType::DataType,
            b'n' => ErrorFieldType::Constraint,
            b'F' => ErrorFieldType::File,
            b'L' => ErrorFieldType::Line,
            b'R' => ErrorFieldType::Routine,
            other => ErrorFieldType::Unknown(other),
        }
    }
}

/// The decoded field list of one `ErrorResponse` or `NoticeResponse`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorFields(Vec<(ErrorFieldType, String)>);

impl ErrorFields {
    pub fn iter(&self) -> impl Iterator<Item = &(ErrorFieldType, String)> {
        self.0.iter()
    }

    fn get(&self, ty: ErrorFieldType) -> Option<&str> {
        self.0
            .iter()
            .find(|(field, _)| *field == ty)
            .map(|(_, v)| v.as_str())
    }

    pub fn severity(&self) -> Option<&str> {
        self.get(ErrorFieldType::Severity)
    }

    pub fn code(&self) -> Option<&str> {
        self.get(ErrorFieldType::Code)
    }

    pub fn message(&self) -> Option<&str> {
        self.get(ErrorFieldType::Message)
    }

    pub fn detail(&self) -> Option<&str> {
        self.get(ErrorFieldType::Detail)
    }

    pub fn hint(&self) -> Option<&str> {
        self.get(ErrorFieldType::Hint)
    }

    pub fn file(&self) -> Option<&str> {
        self.get(ErrorFieldType::File)
    }

    pub fn line(&self) -> Option<&str> {
        self.get(ErrorFieldType::Line)
    }

    pub fn routine(&self) -> Option<&str> {
        self.get(ErrorFieldType::Routine)
    }

    /// Decode the `tag, cstring, ...` run, stopping at the `0x00` terminator.
    pub fn decode(buf: Bytes) -> Result<Self, ProtocolError> {
        let mut fields = Vec::new();
        let mut idx = 0usize;

        loop {
            let tag = *buf
                .get(idx)
                .ok_or(ProtocolError::UnexpectedEof)?;
            idx += 1;

            if tag == 0 {
                break;
            }

            let value = get_str(&buf[idx..])?;
            idx += value.len() + 1;
            fields.push((ErrorFieldType::from_char(tag), value.to_string()));
        }

        if idx != buf.len() {
            return Err(ProtocolError::InvalidMessage(
                "trailing bytes after error/notice field list".into(),
            ));
        }

        Ok(Self(fields))
    }

    fn encode_into(&self, buf: &mut MessageWriter) {
        for (field, value) in &self.0 {
            buf.write_u8(field.to_char());
            buf.write_cstring(value);
        }
        buf.write_u8(0);
    }
}

/// Fluent constructor for an [`ErrorFields`] list, used by `ErrorResponse`
/// and `NoticeResponse` builders to assemble a field list for tests or a
/// server-side emitter.
#[derive(Default)]
pub struct ErrorFieldsBuilder<'a> {
    fields: Vec<(ErrorFieldType, Cow<'a, str>)>,
}

impl<'a> ErrorFieldsBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, ty: ErrorFieldType, value: impl Into<Cow<'a, str>>) -> Self {
        self.fields.push((ty, value.into()));
        self
    }

    pub fn severity(self, value: impl Into<Cow<'a, str>>) -> Self {
        let value = value.into();
        self.field(ErrorFieldType::Severity, value.clone())
            .field(ErrorFieldType::SeverityNonLocalized, value)
    }

    pub fn code(self, value: impl Into<Cow<'a, str>>) -> Self {
        self.field(ErrorFieldType::Code, value)
    }

    pub fn message(self, value: impl Into<Cow<'a, str>>) -> Self {
        self.field(ErrorFieldType::Message, value)
    }

    pub fn detail(self, value: impl Into<Cow<'a, str>>) -> Self {
        self.field(ErrorFieldType::Detail, value)
    }

    pub fn hint(self, value: impl Into<Cow<'a, str>>) -> Self {
        self.field(ErrorFieldType::Hint, value)
    }

    pub fn file(self, value: impl Into<Cow<'a, str>>) -> Self {
        self.field(ErrorFieldType::File, value)
    }

    pub fn line(self, value: usize) -> Self {
        let mut buf = itoa::Buffer::new();
        self.field(ErrorFieldType::Line, buf.format(value).to_string())
    }

    pub fn routine(self, value: impl Into<Cow<'a, str>>) -> Self {
        self.field(ErrorFieldType::Routine, value)
    }

    pub fn build(self) -> ErrorFields {
        ErrorFields(
            self.fields
                .into_iter()
                .map(|(ty, v)| (ty, v.into_owned()))
                .collect(),
        )
    }
}

impl Encode for ErrorFields {
    fn size_hint(&self) -> usize {
        self.0.iter().map(|(_, v)| v.len() + 2).sum::<usize>() + 1
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let mut writer = MessageWriter::with_capacity(self.size_hint());
        self.encode_into(&mut writer);
        buf.extend_from_slice(&writer.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTICE_FIELDS: &[u8] =
        b"SNOTICE\0VNOTICE\0C42710\0Mextension \"uuid-ossp\" already exists, \
          skipping\0Fextension.c\0L1656\0RCreateExtension\0\0";

    #[test]
    fn decodes_field_list() {
        let fields = ErrorFields::decode(Bytes::from_static(NOTICE_FIELDS)).unwrap();
        assert_eq!(fields.severity(), Some("NOTICE"));
        assert_eq!(fields.code(), Some("42710"));
        assert_eq!(
            fields.message(),
            Some("extension \"uuid-ossp\" already exists, skipping")
        );
        assert_eq!(fields.file(), Some("extension.c"));
        assert_eq!(fields.line(), Some("1656"));
        assert_eq!(fields.routine(), Some("CreateExtension"));
    }

    #[test]
    fn round_trips_through_builder_and_decode() {
        let built = ErrorFieldsBuilder::new()
            .severity("NOTICE")
            .code("42710")
            .message("extension \"uuid-ossp\" already exists, skipping")
            .file("extension.c")
            .line(1656)
            .routine("CreateExtension")
            .build();

        let encoded = built.to_bytes();
        let decoded = ErrorFields::decode(Bytes::from(encoded)).unwrap();
        assert_eq!(decoded, built);
    }

    #[test]
    fn unknown_tag_is_preserved() {
        assert_eq!(ErrorFieldType::from_char(b'Z'), ErrorFieldType::Unknown(b'Z'));
        assert_eq!(ErrorFieldType::Unknown(b'Z').to_char(), b'Z');
    }
}
