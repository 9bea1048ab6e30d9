//! Seed phrase to keypair derivation
//!
//! The seed is stretched from the phrase exactly as a BIP-39 seed would be,
//! but the phrase itself is not checked against a word list: short demo
//! phrases such as `"Gym Friend"` are accepted as-is.

use crate::config::Network;
use crate::error::WalletError;
use bitcoin::bip32::{ChildNumber, Xpriv};
use bitcoin::hashes::{hash160, Hash};
use pbkdf2::pbkdf2_hmac;
use secp256k1::{Keypair, PublicKey, Secp256k1};
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;

/// PBKDF2 rounds used for seed stretching
pub const SEED_ROUNDS: u32 = 2048;

/// A keypair derived from a seed together with its public key hash
#[derive(Debug, Clone)]
pub struct DerivedKey {
    keypair: Keypair,
    index: u32,
}

impl DerivedKey {
    /// Compressed public key
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// HASH160 of the compressed public key
    #[must_use]
    pub fn public_key_hash(&self) -> hash160::Hash {
        hash160::Hash::hash(&self.public_key().serialize())
    }

    /// Child index this key was derived at
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub const fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

/// Stretch a phrase into a 64-byte seed (PBKDF2-HMAC-SHA512, salt `"mnemonic"`)
///
/// The phrase is NFKD-normalized first, as BIP-39 requires.
///
/// # Examples
///
/// ```
/// use memo_retval::wallet::seed_from_phrase;
///
/// let seed = seed_from_phrase("Gym Friend");
/// assert_eq!(seed, seed_from_phrase("Gym Friend"));
/// assert_ne!(seed, seed_from_phrase("gym friend"));
/// ```
#[must_use]
pub fn seed_from_phrase(phrase: &str) -> [u8; 64] {
    let phrase: String = phrase.nfkd().collect();
    let mut seed = [0u8; 64];
    pbkdf2_hmac::<Sha512>(phrase.as_bytes(), b"mnemonic", SEED_ROUNDS, &mut seed);
    seed
}

/// Derive the non-hardened child `index` of the BIP-32 master key for `seed`
///
/// # Errors
///
/// Returns an error if `index` is a hardened index or the derivation fails.
pub fn derive_key(seed: &[u8], network: Network, index: u32) -> Result<DerivedKey, WalletError> {
    let child =
        ChildNumber::from_normal_idx(index).map_err(|_| WalletError::InvalidChildIndex(index))?;

    let secp = Secp256k1::new();
    let master = Xpriv::new_master(network.bitcoin_network(), seed)?;
    let xpriv = master.derive_priv(&secp, &[child])?;

    Ok(DerivedKey {
        keypair: Keypair::from_secret_key(&secp, &xpriv.private_key),
        index,
    })
}

/// Convenience wrapper: phrase straight to the derived key
///
/// # Errors
///
/// See [`derive_key`].
pub fn derive_from_phrase(
    phrase: &str,
    network: Network,
    index: u32,
) -> Result<DerivedKey, WalletError> {
    derive_key(&seed_from_phrase(phrase), network, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_vector() {
        let seed = seed_from_phrase("Gym Friend");
        assert_eq!(
            hex::encode(seed),
            "50bc0fef4791d695ab7e600846c32181bb2cc9cb20191cd79e2b2d81d75e68ad\
             2073ba683716bbddfe960cdde37ca0574382f435e7e13adf08a745d755e46ae9"
        );
    }

    #[test]
    fn test_seed_phrase_is_nfkd_normalized() {
        // Precomposed and decomposed "é" stretch to the same seed
        let composed = seed_from_phrase("caf\u{e9} menu");
        let decomposed = seed_from_phrase("cafe\u{301} menu");
        assert_eq!(composed, decomposed);
        assert_ne!(composed, seed_from_phrase("cafe menu"));
    }

    #[test]
    fn test_derived_key_vector() {
        let key = derive_from_phrase("Gym Friend", Network::Testnet, 0).unwrap();
        assert_eq!(
            hex::encode(key.public_key().serialize()),
            "039b1de67d35d1f32700d1140bd83aa00cf681ae3c5766650c4e0847cc374213d4"
        );
        assert_eq!(
            key.public_key_hash().to_string(),
            "611f464b004a739cc95f9ae5193a94418e8c6828"
        );
    }

    #[test]
    fn test_derivation_deterministic() {
        let a = derive_from_phrase("Gym Friend", Network::Testnet, 0).unwrap();
        let b = derive_from_phrase("Gym Friend", Network::Testnet, 0).unwrap();
        assert_eq!(a.public_key(), b.public_key());

        // Different index, different key
        let c = derive_from_phrase("Gym Friend", Network::Testnet, 1).unwrap();
        assert_ne!(a.public_key(), c.public_key());
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn test_network_does_not_change_key_material() {
        let test = derive_from_phrase("Gym Friend", Network::Testnet, 0).unwrap();
        let main = derive_from_phrase("Gym Friend", Network::Mainnet, 0).unwrap();
        assert_eq!(test.public_key_hash(), main.public_key_hash());
    }

    #[test]
    fn test_hardened_index_rejected() {
        let err = derive_from_phrase("Gym Friend", Network::Testnet, 0x8000_0000).unwrap_err();
        assert!(matches!(err, WalletError::InvalidChildIndex(0x8000_0000)));
    }
}
