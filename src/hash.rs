//! The vendor's keyed image hash
//!
//! Structurally this is HMAC, with two differences: the pads are only eight
//! bytes wide instead of a hash block, and the "keys" are the HW_ID and SW_ID
//! of the signing certificate rather than a secret.
//!
//! ```ignore
//! h0 = H(data)
//! h1 = H((sw_id ^ ipad) | h0)
//! h  = H((hw_id ^ opad) | h1)
//! ```

use core::fmt;

use serde::Serialize;
use sha2::Digest as _;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Digest length in bytes
    pub fn size(&self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
        })
    }
}

/// Computes the expected image hash from the signed region and the ids.
pub trait KeyedHash {
    fn keyed_digest(&self, algorithm: HashAlgorithm, data: &[u8], hw_id: &[u8], sw_id: &[u8]) -> Result<Vec<u8>>;
}

/// HMAC-like construction with narrow pads, see module docs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VendorHmac {
    pad_width: usize,
}

impl Default for VendorHmac {
    fn default() -> Self {
        Self { pad_width: Self::PAD_WIDTH }
    }
}

impl VendorHmac {
    pub const PAD_WIDTH: usize = 8;
    const IPAD: u8 = 0x36;
    const OPAD: u8 = 0x5c;

    pub fn with_pad_width(pad_width: usize) -> Self {
        Self { pad_width }
    }

    pub fn pad_width(&self) -> usize {
        self.pad_width
    }

    /// `key ^ pad`, as long as the key itself.
    fn xor_pad(&self, key: &[u8], pad: u8) -> Result<Vec<u8>> {
        if key.len() > self.pad_width {
            return Err(Error::KeyLengthExceeded { len: key.len(), max: self.pad_width });
        }
        Ok(key.iter().map(|byte| byte ^ pad).collect())
    }
}

impl KeyedHash for VendorHmac {
    fn keyed_digest(&self, algorithm: HashAlgorithm, data: &[u8], hw_id: &[u8], sw_id: &[u8]) -> Result<Vec<u8>> {
        let sw_id_ipad = self.xor_pad(sw_id, Self::IPAD)?;
        let hw_id_opad = self.xor_pad(hw_id, Self::OPAD)?;

        let h0 = algorithm.digest(data);
        trace!("h0 = {}", delog::hex_str!(h0.as_slice()));

        let mut m1 = sw_id_ipad;
        m1.extend_from_slice(&h0);
        let h1 = algorithm.digest(&m1);
        trace!("h1 = {}", delog::hex_str!(h1.as_slice()));

        let mut m2 = hw_id_opad;
        m2.extend_from_slice(&h1);
        Ok(algorithm.digest(&m2))
    }
}
