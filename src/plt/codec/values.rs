//! Value decoding for Tecplot numeric formats.
//!
//! Tecplot stores each variable in one of six formats, chosen per zone:
//! - Float (1): 32-bit IEEE
//! - Double (2): 64-bit IEEE
//! - LongInt (3): 32-bit signed integer
//! - ShortInt (4): 16-bit signed integer, widened to 32 bits
//! - Byte (5): unsigned 8-bit
//! - Bit (6): one bit per value, most significant bit first

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::plt::format::data::ValueSlot;
use crate::plt::types::error::{PltError, Result};
use crate::plt::types::models::{ValueArray, ValueFormat};

/// Decodes the values of one slot into an array of exactly `slot.count` entries.
///
/// # Errors
/// Returns `TruncatedInput` if the slot reaches past the end of `data`.
pub fn decode_slot(data: &[u8], slot: &ValueSlot, format: ValueFormat) -> Result<ValueArray> {
    let available = data.len().saturating_sub(slot.start);
    let span = slot_span(slot, format).unwrap_or(usize::MAX);
    if slot.start > data.len() || span > available {
        return Err(PltError::TruncatedInput {
            offset: slot.start,
            needed: span,
            available,
        });
    }
    trace!("Decoding {} {:?} values at offset {}", slot.count, format, slot.start);

    let bytes = &data[slot.start..slot.start + span];
    Ok(match format {
        ValueFormat::Float32 => ValueArray::Float32(read_values(bytes, slot, 4, LittleEndian::read_f32)),
        ValueFormat::Float64 => ValueArray::Float64(read_values(bytes, slot, 8, LittleEndian::read_f64)),
        ValueFormat::Int32 => ValueArray::Int(read_values(bytes, slot, 4, LittleEndian::read_i32)),
        ValueFormat::Int16 => {
            ValueArray::Int(read_values(bytes, slot, 2, |b| LittleEndian::read_i16(b) as i32))
        }
        ValueFormat::Byte => ValueArray::Byte(read_values(bytes, slot, 1, |b| b[0])),
        ValueFormat::Bit => ValueArray::Bit(unpack_bits(bytes, slot.count)),
    })
}

/// Bytes covered by a slot, from its first value to the end of its last.
fn slot_span(slot: &ValueSlot, format: ValueFormat) -> Option<usize> {
    match format.byte_width() {
        Some(width) if slot.count > 0 => (slot.count - 1).checked_mul(slot.stride)?.checked_add(width),
        Some(_) => Some(0),
        None => format.payload_len(slot.count),
    }
}

fn read_values<T>(bytes: &[u8], slot: &ValueSlot, width: usize, read: impl Fn(&[u8]) -> T) -> Vec<T> {
    (0..slot.count)
        .map(|i| {
            let at = i * slot.stride;
            read(&bytes[at..at + width])
        })
        .collect()
}

/// Expands packed bits into one 0/1 byte per value.
///
/// Bits are taken most significant first; trailing padding bits of the
/// last byte are ignored.
pub fn unpack_bits(packed: &[u8], count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| (packed[i / 8] >> (7 - (i % 8))) & 1)
        .collect()
}
