//! ReadBuffer fuzz target: drive reads of arbitrary widths, counts and offsets over
//! arbitrary bytes in either byte order. Reads must never panic; a failed read must not
//! move the cursor.
//! Build with: cargo fuzz run read_buffer_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;
#[cfg(fuzzing)]
use mspec::{ByteOrder, Contextual, ReadBuffer};

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Some((&control, payload)) = data.split_first() else {
        return;
    };
    let order = if control & 1 == 0 {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    };
    let mut rb = ReadBuffer::with_byte_order(payload, order);
    rb.push_context("fuzz");
    // Each payload byte selects an operation (low 3 bits) and a width (high 5 bits).
    // With the top bit set, byte-array counts and peek offsets come from `wide`, which
    // spans up to usize::MAX so cursor arithmetic is exercised at its limits.
    for &op in payload {
        let bits = (op >> 3) + 1;
        let high = op & 0x80 != 0;
        let wide = usize::MAX >> (op >> 3);
        let before = rb.pos();
        let ok = match op & 7 {
            0 => rb.read_bit().is_ok(),
            1 => rb.read_unsigned_byte(bits).is_ok(),
            2 => rb.read_unsigned_short(bits).is_ok(),
            3 => rb.read_unsigned_int(bits).is_ok(),
            4 if high => rb.read_long(bits.saturating_mul(2)).is_ok(),
            4 => rb.read_unsigned_long(bits).is_ok(),
            5 if high => rb.read_string(u32::from(bits) * 8).is_ok(),
            5 => rb.read_int(bits).is_ok(),
            6 if high => rb.read_byte_array(wide).is_ok(),
            6 => rb.read_byte_array(usize::from(bits) / 8).is_ok(),
            _ => {
                let offset = if high { wide } else { usize::from(bits) };
                let _ = rb.peek_byte(offset);
                assert_eq!(rb.pos(), before);
                continue;
            }
        };
        if !ok {
            assert_eq!(rb.pos(), before);
        }
    }
    let _ = rb.pop_context("fuzz");
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run read_buffer_fuzz");
}
