//! Canonical byte encoder for beacon-chain records.
//!
//! Every encodable type implements `Encode`/`Decode` directly (see `encode.rs` and
//! `decode.rs` for the primitives) or derives them with `ssz_derive`, which emits the
//! concatenation logic for a type's fields at compile time rather than walking it by reflection.

mod decode;
mod encode;
mod utils;

pub use utils::{
    decode_offset, decode_variable_sized_items, encode_items_from_parts, encode_offset, ssz_encode,
    Decoder,
};

pub const BYTES_PER_LENGTH_OFFSET: usize = 4;

pub trait Encode {
    fn as_ssz_bytes(&self) -> Vec<u8>;

    fn is_ssz_fixed_len() -> bool;
}

pub trait Decode: Sized {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError>;

    fn is_ssz_fixed_len() -> bool;

    fn ssz_fixed_len() -> usize {
        BYTES_PER_LENGTH_OFFSET
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum DecodeError {
    InvalidByteLength { len: usize, expected: usize },
    InvalidLengthPrefix { len: usize, expected: usize },
    OutOfBoundsByte { i: usize },
    BytesInvalid(String),
}
