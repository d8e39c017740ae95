//! Wire framing for schema-tagged payloads.
//!
//! Encoded form: `[0x00][schema id, 4 bytes big-endian][datum]`. The layout
//! matches the Confluent framing so standard tooling can decode it.

use crate::error::{Result, SchemaError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const WIRE_MAGIC: u8 = 0x00;
const HEADER_LEN: usize = 5;

/// Prefix an encoded datum with the magic byte and its schema id.
pub fn frame(schema_id: i32, datum: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + datum.len());
    buf.put_u8(WIRE_MAGIC);
    buf.put_i32(schema_id);
    buf.put_slice(datum);
    buf.freeze()
}

/// Split a framed payload into its schema id and datum.
pub fn unframe(data: &[u8]) -> Result<(i32, &[u8])> {
    if data.len() < HEADER_LEN {
        return Err(SchemaError::Deserialization(format!(
            "payload of {} bytes is too short for a schema header",
            data.len()
        )));
    }

    if data[0] != WIRE_MAGIC {
        return Err(SchemaError::Deserialization(format!(
            "bad magic byte: expected 0x00, got 0x{:02x}",
            data[0]
        )));
    }

    let mut id_bytes = &data[1..HEADER_LEN];
    let schema_id = id_bytes.get_i32();

    Ok((schema_id, &data[HEADER_LEN..]))
}
