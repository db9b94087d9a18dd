use super::*;
use crate::context::{ContextStack, Contextual};

/// Fixed-capacity bit accumulator.
///
/// The backing array is zeroed at construction; writes fill it MSB-first from bit 0.
/// A write that would overflow the capacity fails and leaves the cursor untouched.
#[derive(Debug)]
pub struct WriteBuffer {
    data: Vec<u8>,
    pos: usize,
    byte_order: ByteOrder,
    context: ContextStack,
}

impl WriteBuffer {
    /// Big-endian buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_byte_order(capacity, ByteOrder::BigEndian)
    }

    pub fn with_byte_order(capacity: usize, byte_order: ByteOrder) -> Self {
        WriteBuffer {
            data: vec![0u8; capacity],
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

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn remaining_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    /// The whole backing array, including bytes not yet written.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes touched so far (a partially written last byte is included).
    pub fn written(&self) -> &[u8] {
        &self.data[..self.pos.div_ceil(8)]
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub fn write_bit(&mut self, value: bool) -> Result<(), CodecError> {
        self.write_raw(1, u64::from(value))?;
        self.trace("bit", 1, value);
        Ok(())
    }

    pub fn write_unsigned_byte(&mut self, bits: u8, value: i8) -> Result<(), CodecError> {
        self.write_unsigned(UNSIGNED_BYTE, bits, i64::from(value))
    }

    pub fn write_unsigned_short(&mut self, bits: u8, value: i16) -> Result<(), CodecError> {
        self.write_unsigned(UNSIGNED_SHORT, bits, i64::from(value))
    }

    pub fn write_unsigned_int(&mut self, bits: u8, value: i32) -> Result<(), CodecError> {
        self.write_unsigned(UNSIGNED_INT, bits, i64::from(value))
    }

    pub fn write_unsigned_long(&mut self, bits: u8, value: i64) -> Result<(), CodecError> {
        self.write_unsigned(UNSIGNED_LONG, bits, value)
    }

    pub fn write_byte(&mut self, bits: u8, value: i8) -> Result<(), CodecError> {
        self.write_signed(SIGNED_BYTE, bits, i64::from(value))
    }

    pub fn write_short(&mut self, bits: u8, value: i16) -> Result<(), CodecError> {
        self.write_signed(SIGNED_SHORT, bits, i64::from(value))
    }

    pub fn write_int(&mut self, bits: u8, value: i32) -> Result<(), CodecError> {
        self.write_signed(SIGNED_INT, bits, i64::from(value))
    }

    pub fn write_long(&mut self, bits: u8, value: i64) -> Result<(), CodecError> {
        self.write_signed(SIGNED_LONG, bits, value)
    }

    /// Unsigned values wider than 32 bits.
    pub fn write_unsigned_big_integer(
        &mut self,
        _bits: u8,
        _value: u128,
    ) -> Result<(), CodecError> {
        Err(self.not_implemented("write_unsigned_big_integer"))
    }

    pub fn write_big_integer(&mut self, _bits: u8, _value: i128) -> Result<(), CodecError> {
        Err(self.not_implemented("write_big_integer"))
    }

    /// Unscaled value and scale.
    pub fn write_big_decimal(
        &mut self,
        _bits: u8,
        _value: (i128, i32),
    ) -> Result<(), CodecError> {
        Err(self.not_implemented("write_big_decimal"))
    }

    pub fn write_float(&mut self, _bits: u8, _value: f32) -> Result<(), CodecError> {
        Err(self.not_implemented("write_float"))
    }

    pub fn write_double(&mut self, _bits: u8, _value: f64) -> Result<(), CodecError> {
        Err(self.not_implemented("write_double"))
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.check_capacity(bytes.len().saturating_mul(8))?;
        for &b in bytes {
            put_bits(&mut self.data, self.pos, 8, u64::from(b));
            self.pos += 8;
        }
        Ok(())
    }

    /// UTF-8 `value` in exactly `bits` (a positive multiple of 8), NUL padded.
    pub fn write_string(&mut self, bits: u32, value: &str) -> Result<(), CodecError> {
        let count = string_bytes(bits, || self.context.path())?;
        let bytes = value.as_bytes();
        if bytes.len() > count {
            return Err(CodecError::StringTooLong {
                len: bytes.len(),
                bits,
                path: self.context.path(),
            });
        }
        self.check_capacity(count * 8)?;
        let padding = std::iter::repeat(0u8).take(count - bytes.len());
        for b in bytes.iter().copied().chain(padding) {
            put_bits(&mut self.data, self.pos, 8, u64::from(b));
            self.pos += 8;
        }
        self.trace("string", bits, value);
        Ok(())
    }

    fn write_unsigned(&mut self, width: Width, bits: u8, value: i64) -> Result<(), CodecError> {
        check_bits(width, bits, || self.context.path())?;
        if value < 0 || (value as u64) > mask(bits) {
            return Err(self.out_of_range(value, bits));
        }
        let raw = reorder(value as u64, bits, self.byte_order);
        self.write_raw(bits, raw)?;
        self.trace(width.kind, bits, value);
        Ok(())
    }

    fn write_signed(&mut self, width: Width, bits: u8, value: i64) -> Result<(), CodecError> {
        check_bits(width, bits, || self.context.path())?;
        if sign_extend(value as u64 & mask(bits), bits) != value {
            return Err(self.out_of_range(value, bits));
        }
        let raw = reorder(value as u64 & mask(bits), bits, self.byte_order);
        self.write_raw(bits, raw)?;
        self.trace(width.kind, bits, value);
        Ok(())
    }

    fn write_raw(&mut self, bits: u8, raw: u64) -> Result<(), CodecError> {
        self.check_capacity(usize::from(bits))?;
        put_bits(&mut self.data, self.pos, bits, raw);
        self.pos += usize::from(bits);
        Ok(())
    }

    fn check_capacity(&self, bits: usize) -> Result<(), CodecError> {
        match self.pos.checked_add(bits) {
            Some(end) if end <= self.data.len() * 8 => Ok(()),
            _ => Err(CodecError::EndOfBuffer {
                pos: self.pos,
                bits,
                len: self.data.len(),
                path: self.context.path(),
            }),
        }
    }

    fn out_of_range(&self, value: i64, bits: u8) -> CodecError {
        CodecError::ValueOutOfRange {
            value,
            bits,
            path: self.context.path(),
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
                "{}: wrote {} ({} bits) = {}",
                self.context.path(),
                kind,
                bits,
                value
            );
        }
    }
}

impl Contextual for WriteBuffer {
    fn context(&self) -> &ContextStack {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ContextStack {
        &mut self.context
    }
}

#[cfg(feature = "strict_context")]
impl Drop for WriteBuffer {
    fn drop(&mut self) {
        if !self.context.is_empty() {
            log::error!("write buffer dropped with open context {}", self.context.path());
        }
    }
}
