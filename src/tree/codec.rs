//! Binary encoding of node records.
//!
//! Layout: a little-endian CRC-32 of the payload followed by the `bincode`
//! payload of the [`Node`].

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{ClustreeError, Result};
use crate::tree::node::Node;

const CHECKSUM_LEN: usize = 4;

/// Encode a node into a checksummed record.
pub fn encode(node: &Node) -> Result<Vec<u8>> {
    let payload = bincode::serialize(node)?;

    let mut record = Vec::with_capacity(CHECKSUM_LEN + payload.len());
    record.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    record.extend_from_slice(&payload);
    Ok(record)
}

/// Decode a checksummed record back into a node.
pub fn decode(record: &[u8]) -> Result<Node> {
    if record.len() < CHECKSUM_LEN {
        return Err(ClustreeError::serialization(format!(
            "Record truncated: {} bytes",
            record.len()
        )));
    }

    let (header, payload) = record.split_at(CHECKSUM_LEN);
    let expected = LittleEndian::read_u32(header);
    let actual = crc32fast::hash(payload);
    if expected != actual {
        return Err(ClustreeError::serialization(format!(
            "Checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
        )));
    }

    Ok(bincode::deserialize(payload)?)
}
