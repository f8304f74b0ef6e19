//! Transport buffer for serialized command instances
//!
//! A [`Buffer`] is an ordered byte queue: writers append at the back, readers
//! consume from the front in FIFO order. Command instances are written as a
//! fixed-size header (every fixed-size field in declaration order) followed by
//! zero or more variable-length fields, each encoded as a 4-byte
//! little-endian length and the raw bytes with no terminator. A length of `-1`
//! marks an absent optional field.
//!
//! Every read checks the remaining byte count first. Running short is a
//! protocol violation ([`WireError`]), never a recoverable per-field error.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Length prefix value marking an absent optional string
const ABSENT: i32 = -1;

/// Size of a variable-length field's length prefix
pub const LENGTH_PREFIX: usize = 4;

/// Malformed serialized payload
///
/// Always fatal for the connection that carried it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("truncated message: need {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("invalid field length: {0}")]
    BadLength(i32),

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Ordered byte queue with primitive append/consume operations
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffer {
    data: BytesMut,
}

impl Buffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding a copy of `bytes`, ready to be consumed
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
        }
    }

    /// Number of unconsumed bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// View the unconsumed bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Take the unconsumed bytes out of the buffer
    pub fn into_vec(self) -> Vec<u8> {
        self.data.to_vec()
    }

    // ==================== Append ====================

    /// Append raw bytes
    pub fn write(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append a single byte
    pub fn write_u8(&mut self, value: u8) {
        self.data.put_u8(value);
    }

    /// Append a boolean flag as one byte
    pub fn write_flag(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Append a little-endian 32-bit signed integer
    pub fn write_i32(&mut self, value: i32) {
        self.data.put_i32_le(value);
    }

    /// Append a length-prefixed string
    pub fn write_string(&mut self, value: &str) {
        debug_assert!(value.len() <= i32::MAX as usize);
        self.write_i32(value.len() as i32);
        self.write(value.as_bytes());
    }

    /// Append an optional string; `None` is written as a length of -1
    pub fn write_opt_string(&mut self, value: Option<&str>) {
        match value {
            Some(value) => self.write_string(value),
            None => self.write_i32(ABSENT),
        }
    }

    // ==================== Consume ====================

    /// Fail unless at least `needed` bytes remain
    pub fn require(&self, needed: usize) -> Result<(), WireError> {
        if self.data.len() < needed {
            return Err(WireError::Truncated {
                needed,
                remaining: self.data.len(),
            });
        }
        Ok(())
    }

    /// Consume exactly `len` bytes
    pub fn read(&mut self, len: usize) -> Result<Bytes, WireError> {
        self.require(len)?;
        Ok(self.data.split_to(len).freeze())
    }

    /// Consume a single byte
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        self.require(1)?;
        Ok(self.data.get_u8())
    }

    /// Consume a boolean flag; any non-zero byte is true
    pub fn read_flag(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    /// Consume a little-endian 32-bit signed integer
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        self.require(4)?;
        Ok(self.data.get_i32_le())
    }

    /// Consume a length-prefixed string
    pub fn read_string(&mut self) -> Result<String, WireError> {
        match self.read_opt_string()? {
            Some(value) => Ok(value),
            None => Err(WireError::BadLength(ABSENT)),
        }
    }

    /// Consume an optional length-prefixed string
    pub fn read_opt_string(&mut self) -> Result<Option<String>, WireError> {
        let len = self.read_i32()?;
        if len == ABSENT {
            return Ok(None);
        }
        let len = usize::try_from(len).map_err(|_| WireError::BadLength(len))?;
        let bytes = self.read(len)?;
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| WireError::InvalidUtf8)
    }

    /// Fail if any bytes are left unconsumed
    pub fn finish(&self) -> Result<(), WireError> {
        if !self.data.is_empty() {
            return Err(WireError::TrailingBytes(self.data.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut buf = Buffer::new();
        buf.write_i32(-1);
        buf.write_i32(7);
        buf.write_flag(true);
        buf.write_string("main");

        assert_eq!(buf.read_i32().unwrap(), -1);
        assert_eq!(buf.read_i32().unwrap(), 7);
        assert!(buf.read_flag().unwrap());
        assert_eq!(buf.read_string().unwrap(), "main");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut buf = Buffer::new();
        buf.write_i32(1);
        assert_eq!(buf.as_slice(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_string_has_no_terminator() {
        let mut buf = Buffer::new();
        buf.write_string("ab");
        assert_eq!(buf.as_slice(), &[2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_absent_string() {
        let mut buf = Buffer::new();
        buf.write_opt_string(None);
        buf.write_opt_string(Some(""));

        assert_eq!(buf.read_opt_string().unwrap(), None);
        assert_eq!(buf.read_opt_string().unwrap(), Some(String::new()));
    }

    #[test]
    fn test_required_string_rejects_absent_marker() {
        let mut buf = Buffer::new();
        buf.write_opt_string(None);
        assert_eq!(buf.read_string(), Err(WireError::BadLength(-1)));
    }

    #[test]
    fn test_truncated_fixed_field() {
        let mut buf = Buffer::from_slice(&[1, 2]);
        assert_eq!(
            buf.read_i32(),
            Err(WireError::Truncated {
                needed: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_declared_length_exceeds_remaining() {
        let mut buf = Buffer::new();
        buf.write_i32(10);
        buf.write(b"abc");

        assert!(matches!(
            buf.read_string(),
            Err(WireError::Truncated { needed: 10, remaining: 3 })
        ));
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut buf = Buffer::new();
        buf.write_i32(-5);
        assert_eq!(buf.read_opt_string(), Err(WireError::BadLength(-5)));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut buf = Buffer::new();
        buf.write_i32(2);
        buf.write(&[0xff, 0xfe]);
        assert_eq!(buf.read_string(), Err(WireError::InvalidUtf8));
    }

    #[test]
    fn test_finish_detects_trailing_bytes() {
        let mut buf = Buffer::new();
        buf.write_u8(0);
        buf.write_u8(0);
        buf.read_u8().unwrap();

        assert_eq!(buf.finish(), Err(WireError::TrailingBytes(1)));
        buf.read_u8().unwrap();
        assert!(buf.finish().is_ok());
    }
}
