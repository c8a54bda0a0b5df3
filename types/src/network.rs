//! Network identifier and per-network chain parameters.

use serde::{Deserialize, Serialize};

use crate::{BlockHash, BlockHeader, StoredHeader};

/// Identifies which chain the wallet follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Main,
    /// The public test network.
    Test,
    /// Local regression-test network.
    Regtest,
}

impl NetworkId {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Regtest => "regtest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "mainnet" => Some(Self::Main),
            "test" | "testnet" => Some(Self::Test),
            "regtest" => Some(Self::Regtest),
            _ => None,
        }
    }
}

/// Merkle root shared by all three genesis headers (internal byte order).
const GENESIS_MERKLE_ROOT: [u8; 32] = [
    0x3b, 0xa3, 0xed, 0xfd, 0x7a, 0x7b, 0x12, 0xb2, 0x7a, 0xc7, 0x2c, 0x3e, 0x67, 0x76, 0x8f, 0x61,
    0x7f, 0xc8, 0x1b, 0xc3, 0x88, 0x8a, 0x51, 0x32, 0x3a, 0x9f, 0xb8, 0xaa, 0x4b, 0x1e, 0x5e, 0x4a,
];

/// Chain parameters the bootstrap pipeline needs from the consensus side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkParams {
    pub id: NetworkId,
    pub genesis: BlockHeader,
    /// Work contributed by the genesis header alone.
    pub genesis_work: u128,
}

impl NetworkParams {
    pub fn for_network(id: NetworkId) -> Self {
        let (time, bits, nonce, genesis_work) = match id {
            NetworkId::Main => (1_231_006_505, 0x1d00ffff, 2_083_236_893, 0x1_0001_0001),
            NetworkId::Test => (1_296_688_602, 0x1d00ffff, 414_098_458, 0x1_0001_0001),
            NetworkId::Regtest => (1_296_688_602, 0x207fffff, 2, 2),
        };
        Self {
            id,
            genesis: BlockHeader {
                version: 1,
                prev_block: BlockHash::ZERO,
                merkle_root: GENESIS_MERKLE_ROOT,
                time,
                bits,
                nonce,
            },
            genesis_work,
        }
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.hash()
    }

    /// The head a freshly created header store starts from.
    pub fn genesis_stored(&self) -> StoredHeader {
        StoredHeader::new(self.genesis, 0, self.genesis_work)
    }
}
