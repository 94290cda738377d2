//! Wire-level building blocks shared by the encoder and the decoder.
//!
//! Users typically interact with [`Encoder`](crate::encoder::Encoder) and
//! [`Decoder`](crate::decoder::Decoder); this module documents the layout.
pub mod element;
pub mod magic;
pub mod varint;

/// Append a length-like quantity as a varint to `buf`.
#[inline]
pub(crate) fn push_len(len: usize, buf: &mut Vec<u8>) {
    varint::encode_u64(len as u64, &mut |b| buf.extend_from_slice(b));
}
