//! Benchmark: encode and decode a synthetic fixed-layout record through WriteBuffer /
//! ReadBuffer, in both byte orders, with and without context tracking.
//! Record layout: bit flag, 3-bit unsigned, 12-bit unsigned, 16-bit signed, 32-bit
//! unsigned, 7-bit signed, 1-bit padding (72 bits = 9 bytes).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mspec::{ByteOrder, CodecError, Contextual, ReadBuffer, WriteBuffer};

const RECORD_BYTES: usize = 9;
const RECORDS: usize = 1024;

fn write_record(wb: &mut WriteBuffer, i: i64) -> Result<(), CodecError> {
    wb.write_bit(i % 2 == 0)?;
    wb.write_unsigned_byte(3, (i % 8) as i8)?;
    wb.write_unsigned_int(12, (i % 4096) as i32)?;
    wb.write_short(16, (i - 512) as i16)?;
    wb.write_unsigned_long(32, i * 31)?;
    wb.write_byte(7, (i % 64) as i8 - 32)?;
    wb.write_bit(false)
}

fn read_record(rb: &mut ReadBuffer<'_>) -> Result<i64, CodecError> {
    let flag = i64::from(rb.read_bit()?);
    let small = i64::from(rb.read_unsigned_byte(3)?);
    let medium = i64::from(rb.read_unsigned_int(12)?);
    let signed = i64::from(rb.read_short(16)?);
    let wide = rb.read_unsigned_long(32)?;
    let tail = i64::from(rb.read_byte(7)?);
    rb.read_bit()?;
    Ok(flag + small + medium + signed + wide + tail)
}

fn encode_records(order: ByteOrder, with_context: bool) -> Result<Vec<u8>, CodecError> {
    let mut wb = WriteBuffer::with_byte_order(RECORD_BYTES * RECORDS, order);
    for i in 0..RECORDS as i64 {
        if with_context {
            wb.with_context("record", |wb| write_record(wb, i))?;
        } else {
            write_record(&mut wb, i)?;
        }
    }
    Ok(wb.into_bytes())
}

fn decode_records(data: &[u8], order: ByteOrder, with_context: bool) -> Result<i64, CodecError> {
    let mut rb = ReadBuffer::with_byte_order(data, order);
    let mut sum = 0i64;
    while rb.has_more(RECORD_BYTES * 8) {
        sum += if with_context {
            rb.with_context("record", read_record)?
        } else {
            read_record(&mut rb)?
        };
    }
    Ok(sum)
}

fn bench_codec(c: &mut Criterion) {
    for (label, order) in [("be", ByteOrder::BigEndian), ("le", ByteOrder::LittleEndian)] {
        let encoded = match encode_records(order, false) {
            Ok(bytes) => bytes,
            Err(e) => panic!("encode failed: {e}"),
        };

        c.bench_function(&format!("encode_{label}"), |b| {
            b.iter(|| encode_records(black_box(order), false).map(|v| v.len()))
        });
        c.bench_function(&format!("decode_{label}"), |b| {
            b.iter(|| decode_records(black_box(&encoded), order, false))
        });
        c.bench_function(&format!("decode_{label}_with_context"), |b| {
            b.iter(|| decode_records(black_box(&encoded), order, true))
        });
        c.bench_function(&format!("roundtrip_{label}_with_context"), |b| {
            b.iter(|| {
                encode_records(black_box(order), true)
                    .and_then(|bytes| decode_records(&bytes, order, true))
            })
        });
    }
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
