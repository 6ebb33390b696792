//! DER decoding, kept behind a capability trait
//!
//! The walker and orchestrator only need two things from ASN.1: the subject
//! name plus key bits of a certificate, and the modulus/exponent pair of a
//! PKCS#1 `RSAPublicKey`. Everything else stays with [`X509Decoder`], and
//! tests can plug in a decoder of their own.

use rsa::pkcs1::DecodeRsaPublicKey as _;
use x509_parser::{certificate::X509Certificate, prelude::FromDer};

use crate::error::{Error, Result};
use crate::pki::PublicKey;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeKind {
    OrganizationalUnit,
    /// Any other attribute type, as dotted OID
    Other(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub value: String,
}

impl Attribute {
    pub fn organizational_unit(value: impl Into<String>) -> Self {
        Self { kind: AttributeKind::OrganizationalUnit, value: value.into() }
    }
}

pub type RelativeDistinguishedName = Vec<Attribute>;

/// Subject name as a sequence of RDN sets.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubjectName(pub Vec<RelativeDistinguishedName>);

impl SubjectName {
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter().flatten()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DecodedCertificate {
    pub subject: SubjectName,
    /// Content of the `subjectPublicKey` BIT STRING
    pub public_key_bits: Vec<u8>,
}

pub trait DerDecoder {
    /// Decode exactly one certificate occupying all of `der`.
    fn decode_certificate(&self, der: &[u8]) -> Result<DecodedCertificate>;

    /// Decode a PKCS#1 `RSAPublicKey { modulus, publicExponent }`.
    fn decode_rsa_public_key(&self, bits: &[u8]) -> Result<PublicKey>;
}

impl<D: DerDecoder + ?Sized> DerDecoder for &D {
    fn decode_certificate(&self, der: &[u8]) -> Result<DecodedCertificate> {
        (**self).decode_certificate(der)
    }

    fn decode_rsa_public_key(&self, bits: &[u8]) -> Result<PublicKey> {
        (**self).decode_rsa_public_key(bits)
    }
}

/// The production decoder, backed by `x509-parser` and `rsa`'s PKCS#1 support.
#[derive(Clone, Copy, Debug, Default)]
pub struct X509Decoder;

impl DerDecoder for X509Decoder {
    fn decode_certificate(&self, der: &[u8]) -> Result<DecodedCertificate> {
        let (rest, certificate) = X509Certificate::from_der(der)
            .map_err(|err| Error::Der(err.to_string()))?;
        if !rest.is_empty() {
            return Err(Error::Der(format!("{} spurious bytes after certificate", rest.len())));
        }

        let spki = certificate.public_key();
        trace!("alg: {:?}", spki.algorithm.algorithm);
        if spki.algorithm.algorithm != oid_registry::OID_PKCS1_RSAENCRYPTION {
            return Err(Error::Der(format!(
                "public key is not RSA ({})", spki.algorithm.algorithm.to_id_string())));
        }

        let subject = certificate.subject().iter()
            .map(|rdn| rdn.iter().map(|attribute| {
                let attr_type = attribute.attr_type();
                let kind = if *attr_type == oid_registry::OID_X509_ORGANIZATIONAL_UNIT {
                    AttributeKind::OrganizationalUnit
                } else {
                    AttributeKind::Other(attr_type.to_id_string())
                };
                // non-string values (e.g. BMPString) are of no interest here
                let value = attribute.as_str().unwrap_or_default().to_string();
                Attribute { kind, value }
            }).collect())
            .collect();

        Ok(DecodedCertificate {
            subject: SubjectName(subject),
            public_key_bits: spki.subject_public_key.data.to_vec(),
        })
    }

    fn decode_rsa_public_key(&self, bits: &[u8]) -> Result<PublicKey> {
        rsa::RsaPublicKey::from_pkcs1_der(bits)
            .map(PublicKey)
            .map_err(|err| Error::Der(format!("RSAPublicKey: {}", err)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(X509Decoder.decode_certificate(&[0x30, 0x82, 0x00, 0x01, 0x00]), Err(Error::Der(_))));
        assert!(matches!(X509Decoder.decode_rsa_public_key(&[0x30, 0x00]), Err(Error::Der(_))));
    }

    #[test]
    fn subject_iteration_flattens_rdns() {
        let subject = SubjectName(vec![
            vec![Attribute { kind: AttributeKind::Other("2.5.4.6".into()), value: "US".into() }],
            vec![Attribute::organizational_unit("01 0000000000000002 SW_ID"),
                 Attribute::organizational_unit("02 0000000000000003 HW_ID")],
        ]);
        let values: Vec<_> = subject.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(vec!["US", "01 0000000000000002 SW_ID", "02 0000000000000003 HW_ID"], values);
    }
}
