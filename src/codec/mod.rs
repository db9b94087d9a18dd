//! Bit-level binary codec.
//!
//! [`ReadBuffer`] turns a byte slice into declared-bit-width primitive values and
//! [`WriteBuffer`] does the reverse into a fixed-capacity accumulator. Both honour a
//! configured [`ByteOrder`] and track a structural path via
//! [`Contextual`](crate::context::Contextual).
//!
//! ## Bit layout
//!
//! The native bit stream is MSB-first and big-endian: the first bit read is bit 7 of
//! byte 0. Values narrower than a byte pack into the remaining bits of the current
//! byte. When the configured order is [`ByteOrder::LittleEndian`] and a value is a
//! whole number of bytes wider than one byte (16, 24, 32, ... bits), its bytes are
//! reversed relative to the bit stream. Other widths are always native order.
//!
//! ## Width limits
//!
//! | Container | Unsigned bits | Signed bits |
//! |-----------|---------------|-------------|
//! | `i8` (byte) | 1..=4 | 1..=8 |
//! | `i16` (short) | 1..=8 | 1..=16 |
//! | `i32` (int) | 1..=16 | 1..=32 |
//! | `i64` (long) | 1..=32 | 1..=64 |
//!
//! Unsigned values keep to half the container so they stay non-negative. Big integer,
//! big decimal, float and double encodings are not implemented and always fail with
//! [`CodecError::NotImplemented`].
//!
//! Strings are UTF-8 in a whole number of bytes: writes pad with NUL up to the
//! declared width and reads strip the trailing NULs.
//!
//! ## Round-trip law
//!
//! For every supported primitive, writing `x` with `n` bits and order `o` and then
//! reading `n` bits with order `o` yields `x`.

mod read;
mod write;

pub use read::ReadBuffer;
pub use write::WriteBuffer;

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// Byte order for multi-byte primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{path}: {kind} must contain between 1 and {max} bits, got {bits}")]
    BitLength {
        kind: &'static str,
        bits: u8,
        max: u8,
        path: String,
    },
    #[error("{path}: value {value} does not fit in {bits} bits")]
    ValueOutOfRange {
        value: i64,
        bits: u8,
        path: String,
    },
    #[error("{path}: {bits} bits at bit {pos} exceed buffer of {len} bytes")]
    EndOfBuffer {
        pos: usize,
        bits: usize,
        len: usize,
        path: String,
    },
    #[error("{path}: string must occupy a positive multiple of 8 bits, got {bits}")]
    StringLength { bits: u32, path: String },
    #[error("{path}: string of {len} bytes does not fit in {bits} bits")]
    StringTooLong {
        len: usize,
        bits: u32,
        path: String,
    },
    #[error("{path}: invalid UTF-8 in string at bit {pos}")]
    InvalidUtf8 {
        pos: usize,
        source: std::str::Utf8Error,
        path: String,
    },
    #[error("{path}: {operation} is not implemented")]
    NotImplemented {
        operation: &'static str,
        path: String,
    },
    #[error("context mismatch: pop {expected}, innermost is {found:?}")]
    ContextMismatch {
        expected: String,
        found: Option<String>,
    },
}

impl CodecError {
    /// Path active when the error was raised (`None` for context mismatches).
    pub fn path(&self) -> Option<&str> {
        match self {
            CodecError::BitLength { path, .. }
            | CodecError::ValueOutOfRange { path, .. }
            | CodecError::EndOfBuffer { path, .. }
            | CodecError::StringLength { path, .. }
            | CodecError::StringTooLong { path, .. }
            | CodecError::InvalidUtf8 { path, .. }
            | CodecError::NotImplemented { path, .. } => Some(path),
            CodecError::ContextMismatch { .. } => None,
        }
    }
}

/// Primitive family: name used in errors plus the widest legal bit length.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Width {
    pub kind: &'static str,
    pub max: u8,
}

pub(crate) const UNSIGNED_BYTE: Width = Width {
    kind: "unsigned byte",
    max: 4,
};
pub(crate) const UNSIGNED_SHORT: Width = Width {
    kind: "unsigned short",
    max: 8,
};
pub(crate) const UNSIGNED_INT: Width = Width {
    kind: "unsigned int",
    max: 16,
};
pub(crate) const UNSIGNED_LONG: Width = Width {
    kind: "unsigned long",
    max: 32,
};
pub(crate) const SIGNED_BYTE: Width = Width {
    kind: "signed byte",
    max: 8,
};
pub(crate) const SIGNED_SHORT: Width = Width {
    kind: "signed short",
    max: 16,
};
pub(crate) const SIGNED_INT: Width = Width {
    kind: "signed int",
    max: 32,
};
pub(crate) const SIGNED_LONG: Width = Width {
    kind: "signed long",
    max: 64,
};

pub(crate) fn check_bits(
    width: Width,
    bits: u8,
    path: impl FnOnce() -> String,
) -> Result<(), CodecError> {
    if bits == 0 || bits > width.max {
        return Err(CodecError::BitLength {
            kind: width.kind,
            bits,
            max: width.max,
            path: path(),
        });
    }
    Ok(())
}

/// Byte count of a string field `bits` wide.
pub(crate) fn string_bytes(bits: u32, path: impl FnOnce() -> String) -> Result<usize, CodecError> {
    if bits == 0 || bits % 8 != 0 {
        return Err(CodecError::StringLength {
            bits,
            path: path(),
        });
    }
    Ok((bits / 8) as usize)
}

pub(crate) fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Sign-extend the low `bits` of `raw` (1..=64).
pub(crate) fn sign_extend(raw: u64, bits: u8) -> i64 {
    let shift = 64 - u32::from(bits);
    ((raw << shift) as i64) >> shift
}

/// Reorder the bytes of an `bits`-wide value between the bit stream and `order`.
/// The transformation is its own inverse.
pub(crate) fn reorder(raw: u64, bits: u8, order: ByteOrder) -> u64 {
    if order == ByteOrder::BigEndian || bits <= 8 || bits % 8 != 0 {
        return raw;
    }
    let nbytes = usize::from(bits / 8);
    let mut scratch = [0u8; 8];
    BigEndian::write_uint(&mut scratch[..nbytes], raw, nbytes);
    LittleEndian::read_uint(&scratch[..nbytes], nbytes)
}

/// Extract `bits` (0..=64) MSB-first starting at bit `pos`. Caller checks bounds.
pub(crate) fn bits_at(data: &[u8], pos: usize, bits: u8) -> u64 {
    let mut value = 0u64;
    let mut pos = pos;
    let mut remaining = usize::from(bits);
    while remaining > 0 {
        let byte = data[pos / 8];
        let offset = pos % 8;
        let take = (8 - offset).min(remaining);
        let shift = 8 - offset - take;
        let chunk = (u64::from(byte) >> shift) & mask(take as u8);
        value = (value << take) | chunk;
        pos += take;
        remaining -= take;
    }
    value
}

/// Store the low `bits` of `value` MSB-first starting at bit `pos`. Caller checks bounds.
pub(crate) fn put_bits(data: &mut [u8], pos: usize, bits: u8, value: u64) {
    let mut pos = pos;
    let mut remaining = usize::from(bits);
    while remaining > 0 {
        let offset = pos % 8;
        let take = (8 - offset).min(remaining);
        let shift = 8 - offset - take;
        let chunk = ((value >> (remaining - take)) & mask(take as u8)) as u8;
        let field = (mask(take as u8) as u8) << shift;
        let byte = &mut data[pos / 8];
        *byte = (*byte & !field) | (chunk << shift);
        pos += take;
        remaining -= take;
    }
}
