//! Block hashes, block headers and stored headers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::{Timestamp, TypesError};

/// A 32-byte block hash, kept in internal (wire) byte order.
///
/// `Display` and [`BlockHash::from_hex`] use the reversed order that block
/// explorers print.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Build a hash from a raw 32-byte slice in internal order.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            what: "block hash",
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse a hash written in display (reversed) order.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let mut bytes = hex::decode(s.trim()).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash(")?;
        for b in self.0.iter().rev().take(4) {
            write!(f, "{:02x}", b)?;
        }
        write!(f, "\u{2026})")
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter().rev() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// An 80-byte proof-of-work block header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block: BlockHash,
    pub merkle_root: [u8; 32],
    /// Block time, Unix seconds.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    /// Serialized size on the wire.
    pub const SIZE: usize = 80;

    /// Little-endian wire encoding.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev_block.as_bytes());
        out[36..68].copy_from_slice(&self.merkle_root);
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != Self::SIZE {
            return Err(TypesError::InvalidLength {
                what: "block header",
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }
        let mut merkle_root = [0u8; 32];
        merkle_root.copy_from_slice(&bytes[36..68]);
        Ok(Self {
            version: read_u32_le(&bytes[0..4]),
            prev_block: BlockHash::from_slice(&bytes[4..36])?,
            merkle_root,
            time: read_u32_le(&bytes[68..72]),
            bits: read_u32_le(&bytes[72..76]),
            nonce: read_u32_le(&bytes[76..80]),
        })
    }

    /// Double SHA-256 of the wire encoding.
    pub fn hash(&self) -> BlockHash {
        let first = Sha256::digest(self.to_bytes());
        let second = Sha256::digest(first);
        let mut out = [0u8; 32];
        out.copy_from_slice(&second);
        BlockHash::new(out)
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::new(u64::from(self.time))
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// A header together with its position in the chain: height and cumulative work.
///
/// This is what a header store keeps per block and what a checkpoint carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHeader {
    pub header: BlockHeader,
    pub height: u32,
    /// Total work of the chain up to and including this header.
    pub chain_work: u128,
}

impl StoredHeader {
    /// Size of the compact encoding: 12 bytes work, 4 bytes height, 80 bytes header.
    pub const COMPACT_SIZE: usize = 96;

    /// Largest chain work representable in the 12-byte compact field.
    pub const MAX_COMPACT_WORK: u128 = (1u128 << 96) - 1;

    pub fn new(header: BlockHeader, height: u32, chain_work: u128) -> Self {
        Self {
            header,
            height,
            chain_work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp()
    }

    /// The stored form of `header` built on top of `self`.
    pub fn child(&self, header: BlockHeader, block_work: u128) -> StoredHeader {
        StoredHeader {
            header,
            height: self.height + 1,
            chain_work: self.chain_work.saturating_add(block_work),
        }
    }

    /// Compact encoding used by checkpoint bundles (big-endian work and height).
    pub fn to_compact_bytes(&self) -> Result<[u8; Self::COMPACT_SIZE], TypesError> {
        if self.chain_work > Self::MAX_COMPACT_WORK {
            return Err(TypesError::WorkOverflow(self.chain_work));
        }
        let mut out = [0u8; Self::COMPACT_SIZE];
        out[0..12].copy_from_slice(&self.chain_work.to_be_bytes()[4..]);
        out[12..16].copy_from_slice(&self.height.to_be_bytes());
        out[16..96].copy_from_slice(&self.header.to_bytes());
        Ok(out)
    }

    pub fn from_compact_bytes(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != Self::COMPACT_SIZE {
            return Err(TypesError::InvalidLength {
                what: "compact stored header",
                expected: Self::COMPACT_SIZE,
                actual: bytes.len(),
            });
        }
        let mut work = [0u8; 16];
        work[4..].copy_from_slice(&bytes[0..12]);
        let height = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        let header = BlockHeader::from_bytes(&bytes[16..96])?;
        Ok(Self {
            header,
            height,
            chain_work: u128::from_be_bytes(work),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(nonce: u32) -> BlockHeader {
        BlockHeader {
            version: 2,
            prev_block: BlockHash::new([0x11; 32]),
            merkle_root: [0x22; 32],
            time: 1_400_000_000,
            bits: 0x1d00ffff,
            nonce,
        }
    }

    #[test]
    fn header_wire_layout_is_little_endian() {
        let bytes = sample_header(7).to_bytes();
        assert_eq!(&bytes[0..4], &[2, 0, 0, 0]);
        assert_eq!(&bytes[76..80], &[7, 0, 0, 0]);
        assert_eq!(BlockHeader::from_bytes(&bytes).unwrap(), sample_header(7));
    }

    #[test]
    fn header_rejects_wrong_length() {
        let err = BlockHeader::from_bytes(&[0u8; 79]).unwrap_err();
        assert!(matches!(err, TypesError::InvalidLength { expected: 80, actual: 79, .. }));
    }

    #[test]
    fn hash_depends_on_nonce() {
        assert_ne!(sample_header(1).hash(), sample_header(2).hash());
    }

    #[test]
    fn hex_parsing_uses_display_order() {
        let hash = sample_header(3).hash();
        let parsed = BlockHash::from_hex(&hash.to_string()).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn compact_encoding_keeps_height_and_work() {
        let stored = StoredHeader::new(sample_header(9), 120_000, 0xABCD_0000_1234);
        let bytes = stored.to_compact_bytes().unwrap();
        assert_eq!(&bytes[12..16], &120_000u32.to_be_bytes());
        assert_eq!(StoredHeader::from_compact_bytes(&bytes).unwrap(), stored);
    }

    #[test]
    fn compact_encoding_rejects_oversized_work() {
        let stored = StoredHeader::new(sample_header(0), 1, StoredHeader::MAX_COMPACT_WORK + 1);
        assert!(matches!(stored.to_compact_bytes(), Err(TypesError::WorkOverflow(_))));
    }

    #[test]
    fn child_advances_height_and_work() {
        let parent = StoredHeader::new(sample_header(0), 10, 100);
        let child = parent.child(sample_header(1), 5);
        assert_eq!(child.height, 11);
        assert_eq!(child.chain_work, 105);
    }
}
