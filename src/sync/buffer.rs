//! Append/read byte cursor used for snapshots and input logs
//!
//! Every value is little-endian and untagged: writer and reader agree on
//! the field sequence out of band. Reads never return stale or zeroed data;
//! running past the written extent is a [`SyncError::BufferUnderrun`].

use crate::consts::MAX_ENTITY_PAYLOAD;
use crate::error::SyncError;
use crate::fixed::{Fixed, FixedVec2};

/// Position of a reserved length slot (see [`StateBuffer::begin_frame`])
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMark(usize);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateBuffer {
    bytes: Vec<u8>,
    read_pos: usize,
}

impl StateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Wrap received bytes for reading from the start
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, read_pos: 0 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Where the next write lands
    pub fn write_pos(&self) -> usize {
        self.bytes.len()
    }

    /// Where the next read starts
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Bytes written but not yet read
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.read_pos
    }

    /// Move the read cursor back to the start
    pub fn rewind(&mut self) {
        self.read_pos = 0;
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.read_pos = 0;
    }

    // === Writes ===

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    pub fn write_fixed(&mut self, value: Fixed) {
        self.write_i64(value.raw());
    }

    pub fn write_vec2(&mut self, value: FixedVec2) {
        self.write_fixed(value.x);
        self.write_fixed(value.y);
    }

    /// u32 length or count prefix
    pub fn write_len(&mut self, len: usize) -> Result<(), SyncError> {
        let len = u32::try_from(len).map_err(|_| SyncError::LengthOverflow(len))?;
        self.write_u32(len);
        Ok(())
    }

    /// Length-prefixed byte string
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), SyncError> {
        self.write_len(value.len())?;
        self.bytes.extend_from_slice(value);
        Ok(())
    }

    /// Length-prefixed UTF-8 string
    pub fn write_str(&mut self, value: &str) -> Result<(), SyncError> {
        self.write_bytes(value.as_bytes())
    }

    /// Append bytes verbatim, no length prefix
    pub fn write_raw(&mut self, value: &[u8]) {
        self.bytes.extend_from_slice(value);
    }

    /// Reserve a u32 length slot; everything written until
    /// [`end_frame`](Self::end_frame) is counted into it
    pub fn begin_frame(&mut self) -> FrameMark {
        let mark = FrameMark(self.bytes.len());
        self.write_u32(0);
        mark
    }

    pub fn end_frame(&mut self, mark: FrameMark) -> Result<usize, SyncError> {
        let start = mark.0 + 4;
        let len = self.bytes.len() - start;
        if len > MAX_ENTITY_PAYLOAD {
            return Err(SyncError::PayloadTooLarge(len));
        }
        self.bytes[mark.0..start].copy_from_slice(&(len as u32).to_le_bytes());
        Ok(len)
    }

    // === Reads ===

    fn take(&mut self, wanted: usize) -> Result<&[u8], SyncError> {
        let remaining = self.remaining();
        if wanted > remaining {
            return Err(SyncError::BufferUnderrun { wanted, remaining });
        }
        let start = self.read_pos;
        self.read_pos += wanted;
        Ok(&self.bytes[start..self.read_pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SyncError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, SyncError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, SyncError> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, SyncError> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, SyncError> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, SyncError> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, SyncError> {
        self.take_array().map(i64::from_le_bytes)
    }

    pub fn read_bool(&mut self) -> Result<bool, SyncError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SyncError::InvalidBool(other)),
        }
    }

    pub fn read_fixed(&mut self) -> Result<Fixed, SyncError> {
        self.read_i64().map(Fixed::from_raw)
    }

    pub fn read_vec2(&mut self) -> Result<FixedVec2, SyncError> {
        let x = self.read_fixed()?;
        let y = self.read_fixed()?;
        Ok(FixedVec2::new(x, y))
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, SyncError> {
        let len = self.read_u32()? as usize;
        self.take(len).map(<[u8]>::to_vec)
    }

    pub fn read_str(&mut self) -> Result<String, SyncError> {
        String::from_utf8(self.read_bytes()?).map_err(|_| SyncError::InvalidUtf8)
    }

    /// Read `len` bytes verbatim
    pub fn read_raw(&mut self, len: usize) -> Result<&[u8], SyncError> {
        self.take(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_read_back_in_order() {
        let mut buffer = StateBuffer::new();
        buffer.write_u8(7);
        buffer.write_u16(0xBEEF);
        buffer.write_u32(123_456);
        buffer.write_u64(u64::MAX - 1);
        buffer.write_i32(-42);
        buffer.write_i64(i64::MIN);
        buffer.write_bool(true);
        buffer.write_fixed(Fixed::from_ratio(-5, 4));
        buffer.write_vec2(FixedVec2::from_int(3, -9));
        buffer.write_str("lockstep").unwrap();
        buffer.write_bytes(&[1, 2, 3]).unwrap();

        assert_eq!(buffer.read_u8(), Ok(7));
        assert_eq!(buffer.read_u16(), Ok(0xBEEF));
        assert_eq!(buffer.read_u32(), Ok(123_456));
        assert_eq!(buffer.read_u64(), Ok(u64::MAX - 1));
        assert_eq!(buffer.read_i32(), Ok(-42));
        assert_eq!(buffer.read_i64(), Ok(i64::MIN));
        assert_eq!(buffer.read_bool(), Ok(true));
        assert_eq!(buffer.read_fixed(), Ok(Fixed::from_ratio(-5, 4)));
        assert_eq!(buffer.read_vec2(), Ok(FixedVec2::from_int(3, -9)));
        assert_eq!(buffer.read_str().as_deref(), Ok("lockstep"));
        assert_eq!(buffer.read_bytes(), Ok(vec![1, 2, 3]));
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buffer = StateBuffer::new();
        buffer.write_u32(0x0403_0201);
        buffer.write_fixed(Fixed::ONE);
        assert_eq!(buffer.as_bytes(), &[1, 2, 3, 4, 0, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_read_past_end_is_underrun() {
        let mut buffer = StateBuffer::new();
        buffer.write_u32(9);
        assert_eq!(buffer.read_u32(), Ok(9));
        assert_eq!(
            buffer.read_u8(),
            Err(SyncError::BufferUnderrun {
                wanted: 1,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_partial_read_does_not_consume() {
        let mut buffer = StateBuffer::from_bytes(vec![1, 2]);
        assert!(buffer.read_u32().is_err());
        assert_eq!(buffer.read_pos(), 0);
        assert_eq!(buffer.read_u16(), Ok(0x0201));
    }

    #[test]
    fn test_length_prefix_past_end_is_underrun() {
        let mut buffer = StateBuffer::new();
        buffer.write_u32(100);
        buffer.write_raw(&[0; 10]);
        assert_eq!(
            buffer.read_bytes(),
            Err(SyncError::BufferUnderrun {
                wanted: 100,
                remaining: 10
            })
        );
    }

    #[test]
    fn test_invalid_bool_and_utf8() {
        let mut buffer = StateBuffer::from_bytes(vec![2]);
        assert_eq!(buffer.read_bool(), Err(SyncError::InvalidBool(2)));

        let mut buffer = StateBuffer::new();
        buffer.write_bytes(&[0xFF, 0xFE]).unwrap();
        assert_eq!(buffer.read_str(), Err(SyncError::InvalidUtf8));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_oversized_length_prefix_is_refused() {
        let mut buffer = StateBuffer::new();
        let len = u32::MAX as usize + 1;
        assert_eq!(buffer.write_len(len), Err(SyncError::LengthOverflow(len)));
        assert!(buffer.is_empty());
        assert_eq!(buffer.write_len(u32::MAX as usize), Ok(()));
        assert_eq!(buffer.read_u32(), Ok(u32::MAX));
    }

    #[test]
    fn test_frame_length_is_patched() {
        let mut buffer = StateBuffer::new();
        let mark = buffer.begin_frame();
        buffer.write_u64(1);
        buffer.write_u8(2);
        assert_eq!(buffer.end_frame(mark), Ok(9));
        assert_eq!(buffer.read_u32(), Ok(9));
        assert_eq!(buffer.remaining(), 9);
    }

    #[test]
    fn test_rewind_and_clear() {
        let mut buffer = StateBuffer::new();
        buffer.write_u16(5);
        assert_eq!(buffer.read_u16(), Ok(5));
        buffer.rewind();
        assert_eq!(buffer.read_u16(), Ok(5));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.write_pos(), 0);
    }
}
