//! The fixed genesis block.

use blocker_core::{Block, Hash, Keypair, Transaction};

/// Seed of the key that owns and signs genesis.
pub const GENESIS_SEED: [u8; 32] = [
    0x54, 0x96, 0x7b, 0xda, 0xf7, 0xda, 0xcb, 0xf0, 0xad, 0xf0, 0x04, 0xad, 0x2d, 0xdb, 0x11, 0x96,
    0x07, 0x32, 0x39, 0xbb, 0x0b, 0x83, 0xbf, 0x58, 0x7c, 0x21, 0xed, 0xf5, 0x03, 0xa3, 0xa9, 0x0e,
];

/// Amount credited by the single genesis output.
pub const GENESIS_SUPPLY: u64 = 1000;

pub fn genesis_keypair() -> Keypair {
    Keypair::from_seed_bytes(&GENESIS_SEED)
}

/// One mint of [`GENESIS_SUPPLY`] to the genesis key's address, signed by
/// the same key. Identical on every node.
pub fn genesis_block() -> Block {
    let keypair = genesis_keypair();
    Block::new(
        Hash::ZERO,
        vec![Transaction::mint(keypair.address(), GENESIS_SUPPLY)],
    )
    .signed(&keypair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_deterministic() {
        assert_eq!(genesis_block(), genesis_block());
        assert_eq!(genesis_block().hash(), genesis_block().hash());
    }

    #[test]
    fn test_genesis_shape() {
        let block = genesis_block();
        assert!(block.header.prev_hash.is_zero());
        assert_eq!(block.transactions.len(), 1);

        let tx = &block.transactions[0];
        assert!(tx.is_mint());
        assert_eq!(tx.outputs[0].amount, GENESIS_SUPPLY);
        assert_eq!(tx.outputs[0].address, genesis_keypair().address());

        assert!(block.verify_root_hash());
        assert!(block.verify_signature().is_ok());
    }
}
