//! Varint encoding helpers for lengths, arities, ranks and dimensions.
//!
//! WXF stores every length-like quantity as an unsigned base-128 varint:
//! - Split the value into 7-bit chunks, least-significant first.
//! - Every byte except the last has its MSB set (continuation).
//! - A `u64` needs at most [`MAX_VARINT_LEN`] bytes.

/// Longest possible encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode an unsigned 64-bit integer, handing the bytes to `encoder`.
///
/// Returns the number of bytes produced. Value 0 encodes to a single `0x00`,
/// 300 encodes to `[0xAC, 0x02]`.
pub fn encode_u64<F: FnMut(&[u8])>(mut value: u64, encoder: &mut F) -> u64 {
    let mut scratch = [0u8; MAX_VARINT_LEN];
    let mut size = 0;

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        scratch[size] = byte;
        size += 1;

        if value == 0 {
            break;
        }
    }

    encoder(&scratch[..size]);
    size as u64
}

/// Decode one unsigned 64-bit integer from the front of `buf`.
///
/// Behavior:
/// - Accumulates 7-bit chunks until a byte with MSB = 0 terminates the value.
/// - On success, returns `Some(value)` and advances `buf` past the consumed bytes.
/// - Returns `None` if the slice is exhausted before a terminating byte, or if the
///   encoding does not fit in 64 bits. `buf` is left untouched in that case.
pub fn decode_u64(buf: &mut &[u8]) -> Option<u64> {
    let mut value: u64 = 0;

    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        let chunk = (byte & 0x7F) as u64;
        // The tenth byte only has room for the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && chunk > 1 {
            return None;
        }
        value |= chunk << (7 * i);

        if byte & 0x80 == 0 {
            *buf = &buf[i + 1..];
            return Some(value);
        }
    }

    None
}

/// Encoded size in bytes of `value`.
pub fn encoded_size_u64(value: u64) -> u64 {
    if value == 0 {
        return 1;
    }
    let sig_bits = (64 - value.leading_zeros()) as u64;
    sig_bits.div_ceil(7)
}
