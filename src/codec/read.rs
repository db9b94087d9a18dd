use super::*;
use crate::context::{ContextStack, Contextual};

/// Bit cursor over a borrowed byte slice.
///
/// One buffer per parse: the cursor only moves forward (except through
/// [`ReadBuffer::peek_byte`], which never moves it) and the buffer is not meant to be
/// shared between threads or reused across messages.
#[derive(Debug)]
pub struct ReadBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    byte_order: ByteOrder,
    context: ContextStack,
}

impl<'a> ReadBuffer<'a> {
    /// Big-endian buffer over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_byte_order(data, ByteOrder::BigEndian)
    }

    pub fn with_byte_order(data: &'a [u8], byte_order: ByteOrder) -> Self {
        ReadBuffer {
            data,
            pos: 0,
            byte_order,
            context: ContextStack::new(),
        }
    }

    /// Current bit position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn remaining_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    pub fn has_more(&self, bits: usize) -> bool {
        self.remaining_bits() >= bits
    }

    pub fn read_bit(&mut self) -> Result<bool, CodecError> {
        let raw = self.read_raw(1)?;
        self.trace("bit", 1, raw != 0);
        Ok(raw != 0)
    }

    pub fn read_unsigned_byte(&mut self, bits: u8) -> Result<i8, CodecError> {
        let raw = self.read_unsigned(UNSIGNED_BYTE, bits)?;
        Ok(raw as i8)
    }

    pub fn read_unsigned_short(&mut self, bits: u8) -> Result<i16, CodecError> {
        let raw = self.read_unsigned(UNSIGNED_SHORT, bits)?;
        Ok(raw as i16)
    }

    pub fn read_unsigned_int(&mut self, bits: u8) -> Result<i32, CodecError> {
        let raw = self.read_unsigned(UNSIGNED_INT, bits)?;
        Ok(raw as i32)
    }

    pub fn read_unsigned_long(&mut self, bits: u8) -> Result<i64, CodecError> {
        let raw = self.read_unsigned(UNSIGNED_LONG, bits)?;
        Ok(raw as i64)
    }

    pub fn read_byte(&mut self, bits: u8) -> Result<i8, CodecError> {
        let value = self.read_signed(SIGNED_BYTE, bits)?;
        Ok(value as i8)
    }

    pub fn read_short(&mut self, bits: u8) -> Result<i16, CodecError> {
        let value = self.read_signed(SIGNED_SHORT, bits)?;
        Ok(value as i16)
    }

    pub fn read_int(&mut self, bits: u8) -> Result<i32, CodecError> {
        let value = self.read_signed(SIGNED_INT, bits)?;
        Ok(value as i32)
    }

    pub fn read_long(&mut self, bits: u8) -> Result<i64, CodecError> {
        self.read_signed(SIGNED_LONG, bits)
    }

    /// Unsigned values wider than 32 bits.
    pub fn read_unsigned_big_integer(&mut self, _bits: u8) -> Result<u128, CodecError> {
        Err(self.not_implemented("read_unsigned_big_integer"))
    }

    pub fn read_big_integer(&mut self, _bits: u8) -> Result<i128, CodecError> {
        Err(self.not_implemented("read_big_integer"))
    }

    /// Unscaled value and scale.
    pub fn read_big_decimal(&mut self, _bits: u8) -> Result<(i128, i32), CodecError> {
        Err(self.not_implemented("read_big_decimal"))
    }

    pub fn read_float(&mut self, _bits: u8) -> Result<f32, CodecError> {
        Err(self.not_implemented("read_float"))
    }

    pub fn read_double(&mut self, _bits: u8) -> Result<f64, CodecError> {
        Err(self.not_implemented("read_double"))
    }

    /// `count` whole bytes starting at the cursor (which need not be byte aligned).
    pub fn read_byte_array(&mut self, count: usize) -> Result<Vec<u8>, CodecError> {
        self.check_available(self.pos, count.saturating_mul(8))?;
        let bytes = (0..count)
            .map(|i| bits_at(self.data, self.pos + i * 8, 8) as u8)
            .collect();
        self.pos += count * 8;
        Ok(bytes)
    }

    /// UTF-8 string occupying `bits` (a positive multiple of 8). Trailing NUL padding
    /// is stripped. On invalid UTF-8 the cursor is left where it was.
    pub fn read_string(&mut self, bits: u32) -> Result<String, CodecError> {
        let count = string_bytes(bits, || self.context.path())?;
        let start = self.pos;
        let mut bytes = self.read_byte_array(count)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        bytes.truncate(end);
        match String::from_utf8(bytes) {
            Ok(value) => {
                self.trace("string", bits, &value);
                Ok(value)
            }
            Err(e) => {
                self.pos = start;
                Err(CodecError::InvalidUtf8 {
                    pos: start,
                    source: e.utf8_error(),
                    path: self.context.path(),
                })
            }
        }
    }

    /// Byte at `offset` bytes past the cursor. The cursor does not move, whether or not
    /// the peek succeeds.
    pub fn peek_byte(&self, offset: usize) -> Result<u8, CodecError> {
        let at = self.pos.saturating_add(offset.saturating_mul(8));
        self.check_available(at, 8)?;
        Ok(bits_at(self.data, at, 8) as u8)
    }

    fn read_unsigned(&mut self, width: Width, bits: u8) -> Result<u64, CodecError> {
        check_bits(width, bits, || self.context.path())?;
        let raw = reorder(self.read_raw(bits)?, bits, self.byte_order);
        self.trace(width.kind, bits, raw);
        Ok(raw)
    }

    fn read_signed(&mut self, width: Width, bits: u8) -> Result<i64, CodecError> {
        check_bits(width, bits, || self.context.path())?;
        let raw = reorder(self.read_raw(bits)?, bits, self.byte_order);
        let value = sign_extend(raw, bits);
        self.trace(width.kind, bits, value);
        Ok(value)
    }

    fn read_raw(&mut self, bits: u8) -> Result<u64, CodecError> {
        self.check_available(self.pos, usize::from(bits))?;
        let raw = bits_at(self.data, self.pos, bits);
        self.pos += usize::from(bits);
        Ok(raw)
    }

    fn check_available(&self, pos: usize, bits: usize) -> Result<(), CodecError> {
        match pos.checked_add(bits) {
            Some(end) if end <= self.data.len() * 8 => Ok(()),
            _ => Err(CodecError::EndOfBuffer {
                pos,
                bits,
                len: self.data.len(),
                path: self.context.path(),
            }),
        }
    }

    fn not_implemented(&self, operation: &'static str) -> CodecError {
        log::warn!(
            "{}: {} requested but not supported",
            self.context.path(),
            operation
        );
        CodecError::NotImplemented {
            operation,
            path: self.context.path(),
        }
    }

    fn trace(&self, kind: &str, bits: impl std::fmt::Display, value: impl std::fmt::Display) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "{}: read {} ({} bits) = {}",
                self.context.path(),
                kind,
                bits,
                value
            );
        }
    }
}

impl Contextual for ReadBuffer<'_> {
    fn context(&self) -> &ContextStack {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ContextStack {
        &mut self.context
    }
}

#[cfg(feature = "strict_context")]
impl Drop for ReadBuffer<'_> {
    fn drop(&mut self) {
        if !self.context.is_empty() {
            log::error!("read buffer dropped with open context {}", self.context.path());
        }
    }
}
