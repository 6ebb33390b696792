//! Raw hash recovery from an RSA signature
//!
//! No verify primitive is involved: the signature is raised to the public
//! exponent and the PKCS#1-v1.5 block type 1 structure is checked by hand, so
//! that the embedded hash itself comes out.
//!
//! ```text
//! 00 01 FF .. FF 00 <hash>
//!       `------'
//!    keylen - 3 - hash size
//! ```
//!
//! Unlike standard PKCS#1-v1.5 signatures, there is no `DigestInfo` around
//! the hash.

use rsa::BigUint;

use crate::error::{PaddingError, Result};
use crate::hash::HashAlgorithm;
use crate::pki::PublicKey;

/// `signature^e mod n`, as big-endian bytes as long as the modulus.
pub fn decrypt_block(signature: &[u8], key: &PublicKey) -> Result<Vec<u8>> {
    let keylen = key.size();
    let s = BigUint::from_bytes_be(signature);
    if &s >= key.modulus() {
        return Err(PaddingError::OutOfRange.into());
    }
    let m = s.modpow(key.exponent(), key.modulus());

    // m < n, so this fits
    let bytes = m.to_bytes_be();
    let mut block = vec![0u8; keylen - bytes.len()];
    block.extend_from_slice(&bytes);
    Ok(block)
}

/// Checks the padding of a decrypted block and returns the hash it carries.
pub fn unpad(block: &[u8], hash_size: usize) -> Result<Vec<u8>> {
    let keylen = block.len();
    if keylen < 2 || block[0] != 0x00 || block[1] != 0x01 {
        return Err(PaddingError::LeadingBytes.into());
    }

    let terminator = block[2..].iter()
        .position(|&byte| byte == 0x00)
        .map(|i| i + 2)
        .ok_or(PaddingError::MissingTerminator)?;

    let padding = &block[2..terminator];
    let expected = keylen.checked_sub(2 + 1 + hash_size).unwrap_or(0);
    if padding.len() != expected || keylen < 3 + hash_size {
        return Err(PaddingError::PaddingLength { expected, actual: padding.len() }.into());
    }
    if let Some(i) = padding.iter().position(|&byte| byte != 0xff) {
        return Err(PaddingError::PaddingByte { offset: 2 + i, value: padding[i] }.into());
    }

    let hash = &block[terminator + 1..];
    if hash.len() != hash_size {
        return Err(PaddingError::HashLength { expected: hash_size, actual: hash.len() }.into());
    }

    Ok(hash.to_vec())
}

/// Recovers the hash embedded in `signature`.
pub fn recover_hash(signature: &[u8], key: &PublicKey, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    let block = decrypt_block(signature, key)?;
    trace!("decrypted block = {}", delog::hex_str!(block.as_slice(), 4));
    unpad(&block, algorithm.size())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use rand::SeedableRng as _;

    lazy_static::lazy_static! {
        static ref KEY: rsa::RsaPrivateKey = {
            let mut rng = rand::rngs::StdRng::seed_from_u64(0x0ab0_07);
            rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap()
        };
    }

    fn public_key() -> PublicKey {
        PublicKey(KEY.to_public_key())
    }

    fn sign(hash: &[u8]) -> Vec<u8> {
        // no hash OID, so no DigestInfo: 00 01 FF.. 00 hash
        let padding = rsa::PaddingScheme::new_pkcs1v15_sign(None);
        KEY.sign(padding, hash).unwrap()
    }

    fn block(keylen: usize, hash: &[u8]) -> Vec<u8> {
        let mut block = vec![0x00, 0x01];
        block.resize(keylen - hash.len() - 1, 0xff);
        block.push(0x00);
        block.extend_from_slice(hash);
        block
    }

    #[test]
    fn round_trip() {
        let key = public_key();
        for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Sha256] {
            let hash = algorithm.digest(b"firmware");
            let signature = sign(&hash);
            assert_eq!(128, signature.len());
            assert_eq!(hash, recover_hash(&signature, &key, algorithm).unwrap());
        }
    }

    #[test]
    fn wrong_algorithm_is_a_padding_error() {
        let key = public_key();
        let signature = sign(&HashAlgorithm::Sha1.digest(b"firmware"));
        assert!(matches!(
            recover_hash(&signature, &key, HashAlgorithm::Sha256),
            Err(Error::InvalidPadding(PaddingError::PaddingLength { expected: 93, actual: 105 }))
        ));
    }

    #[test]
    fn decrypted_block_keeps_leading_zeros() {
        let key = public_key();
        let signature = sign(&[0x42; 20]);
        let block = decrypt_block(&signature, &key).unwrap();
        assert_eq!(128, block.len());
        assert_eq!([0x00, 0x01], block[..2]);
    }

    #[test]
    fn oversized_signature() {
        let key = public_key();
        let signature = vec![0xff; 128];
        assert!(matches!(decrypt_block(&signature, &key), Err(Error::InvalidPadding(PaddingError::OutOfRange))));
    }

    #[test]
    fn unpad_valid() {
        let hash = [0x11; 32];
        assert_eq!(hash.to_vec(), unpad(&block(256, &hash), 32).unwrap());
    }

    #[test]
    fn leading_byte_flips() {
        let hash = [0x11; 20];
        for value in 1..=0xffu8 {
            let mut block = block(128, &hash);
            block[0] = value;
            assert!(matches!(unpad(&block, 20), Err(Error::InvalidPadding(PaddingError::LeadingBytes))));
        }
        let mut block = block(128, &hash);
        block[1] = 0x02;
        assert!(matches!(unpad(&block, 20), Err(Error::InvalidPadding(PaddingError::LeadingBytes))));
        assert!(matches!(unpad(&[0x00], 20), Err(Error::InvalidPadding(PaddingError::LeadingBytes))));
    }

    #[test]
    fn missing_terminator() {
        let mut block = vec![0x00, 0x01];
        block.resize(128, 0xff);
        assert!(matches!(unpad(&block, 20), Err(Error::InvalidPadding(PaddingError::MissingTerminator))));
    }

    #[test]
    fn early_terminator() {
        let hash = [0x11; 20];
        let mut block = block(128, &hash);
        block[50] = 0x00;
        assert!(matches!(
            unpad(&block, 20),
            Err(Error::InvalidPadding(PaddingError::PaddingLength { expected: 105, actual: 48 }))
        ));
    }

    #[test]
    fn padding_must_be_ff() {
        let hash = [0x11; 20];
        let mut block = block(128, &hash);
        block[10] = 0xfe;
        assert!(matches!(
            unpad(&block, 20),
            Err(Error::InvalidPadding(PaddingError::PaddingByte { offset: 10, value: 0xfe }))
        ));
    }

    #[test]
    fn hash_larger_than_key() {
        let block = block(64, &[0x11; 20]);
        assert!(matches!(
            unpad(&block, 70),
            Err(Error::InvalidPadding(PaddingError::PaddingLength { expected: 0, .. }))
        ));
    }
}
