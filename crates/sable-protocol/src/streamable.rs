//! Canonical wire-format helpers.
//!
//! The format ("streamable") is big-endian fixed-width integers, u32
//! length-prefixed lists and strings, 0/1 tag bytes for bools and
//! optionals, and fixed-width byte arrays written raw. The codec itself
//! comes from the serde-streamable crate; every wire type in this crate
//! just derives Serialize and Deserialize.

use crate::bytes::Bytes32;
use serde::Serialize;

pub use serde_streamable::{from_bytes, from_bytes_exact, to_bytes, Error, Result};

/// The sha-256 of a value's canonical serialization. This is the identity
/// of every content-addressed object on the wire.
pub fn hash_of<T: Serialize>(v: &T) -> Bytes32 {
    Bytes32::new(serde_streamable::hash(v).expect("canonical serialization"))
}
