//! Static chain metadata registry.
//!
//! Maps chain ids from the settings document to well-known chain
//! metadata. Peripheral to the selection cascade: consumed read-only by
//! derived cells (explorer availability, display names), never written.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Metadata for a well-known chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainMetadata {
    pub chain_id: u64,
    pub name: &'static str,
    /// Canonical block explorer base URL, when the chain has one.
    pub explorer_url: Option<&'static str>,
}

impl ChainMetadata {
    pub fn has_block_explorer(&self) -> bool {
        self.explorer_url.is_some()
    }
}

static CHAINS: &[ChainMetadata] = &[
    ChainMetadata {
        chain_id: 1,
        name: "Ethereum",
        explorer_url: Some("https://etherscan.io"),
    },
    ChainMetadata {
        chain_id: 10,
        name: "OP Mainnet",
        explorer_url: Some("https://optimistic.etherscan.io"),
    },
    ChainMetadata {
        chain_id: 56,
        name: "BNB Smart Chain",
        explorer_url: Some("https://bscscan.com"),
    },
    ChainMetadata {
        chain_id: 137,
        name: "Polygon",
        explorer_url: Some("https://polygonscan.com"),
    },
    ChainMetadata {
        chain_id: 8453,
        name: "Base",
        explorer_url: Some("https://basescan.org"),
    },
    ChainMetadata {
        chain_id: 42161,
        name: "Arbitrum One",
        explorer_url: Some("https://arbiscan.io"),
    },
    ChainMetadata {
        chain_id: 43114,
        name: "Avalanche",
        explorer_url: Some("https://snowtrace.io"),
    },
    ChainMetadata {
        chain_id: 31337,
        name: "Local Devnet",
        explorer_url: None,
    },
];

static BY_ID: Lazy<HashMap<u64, &'static ChainMetadata>> =
    Lazy::new(|| CHAINS.iter().map(|c| (c.chain_id, c)).collect());

/// Look up metadata for a chain id.
pub fn find_chain(chain_id: u64) -> Option<&'static ChainMetadata> {
    BY_ID.get(&chain_id).copied()
}
