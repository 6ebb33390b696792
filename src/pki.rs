//! RSA public keys as found in the certificate chain.

use core::fmt;

use rsa::{BigUint, PublicKeyParts as _, RsaPublicKey};

/// An RSA public key of arbitrary size.
#[derive(Clone, PartialEq)]
pub struct PublicKey(pub RsaPublicKey);

impl PublicKey {
    pub fn new(modulus: BigUint, exponent: BigUint) -> crate::Result<Self> {
        RsaPublicKey::new(modulus, exponent)
            .map(Self)
            .map_err(|err| crate::Error::Der(format!("unusable RSA public key: {}", err)))
    }

    pub fn modulus(&self) -> &BigUint {
        self.0.n()
    }

    pub fn exponent(&self) -> &BigUint {
        self.0.e()
    }

    /// Byte length of the modulus, which is also the length of a signature block.
    pub fn size(&self) -> usize {
        (self.modulus().bits() + 7) / 8
    }

    pub fn bits(&self) -> usize {
        self.modulus().bits()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .field("e", &self.exponent().to_string())
            .finish()
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}
