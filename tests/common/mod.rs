//! Builds signed aboot images with real DER certificates.
#![allow(dead_code)]

use aboot::hash::{HashAlgorithm, KeyedHash as _, VendorHmac};
use aboot::ImageHeader;
use rand::SeedableRng as _;
use rsa::{PublicKeyParts as _, RsaPrivateKey};

lazy_static::lazy_static! {
    pub static ref LEAF_KEY: RsaPrivateKey = key(1);
    pub static ref CA_KEY: RsaPrivateKey = key(2);
}

fn key(seed: u64) -> RsaPrivateKey {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    RsaPrivateKey::new(&mut rng, 1024).unwrap()
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.extend_from_slice(&[0x81, len as u8]);
    } else {
        out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

fn sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &parts.concat())
}

fn integer(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    let mut content = Vec::new();
    if bytes[first] & 0x80 != 0 {
        content.push(0);
    }
    content.extend_from_slice(&bytes[first..]);
    tlv(0x02, &content)
}

const OID_SHA256_WITH_RSA: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];
const OID_RSA_ENCRYPTION: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
const OID_COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];
const OID_ORGANIZATIONAL_UNIT: &[u8] = &[0x55, 0x04, 0x0b];

fn algorithm(oid: &[u8]) -> Vec<u8> {
    sequence(&[tlv(0x06, oid), vec![0x05, 0x00]])
}

/// One RDN set per attribute, values as UTF8String.
fn name(attributes: &[(&[u8], &str)]) -> Vec<u8> {
    let rdns: Vec<_> = attributes.iter()
        .map(|(oid, value)| tlv(0x31, &sequence(&[tlv(0x06, oid), tlv(0x0c, value.as_bytes())])))
        .collect();
    sequence(&rdns)
}

fn bit_string(bytes: &[u8]) -> Vec<u8> {
    let mut content = vec![0];
    content.extend_from_slice(bytes);
    tlv(0x03, &content)
}

pub fn rsa_public_key_der(key: &RsaPrivateKey) -> Vec<u8> {
    sequence(&[integer(&key.n().to_bytes_be()), integer(&key.e().to_bytes_be())])
}

/// An X.509 v3 certificate for `key` whose subject carries `units` as OUs.
///
/// The certificate signature is filler, nothing checks it.
pub fn certificate(key: &RsaPrivateKey, units: &[&str]) -> Vec<u8> {
    let mut subject: Vec<(&[u8], &str)> = vec![(OID_COMMON_NAME, "Test Attestation CA")];
    subject.extend(units.iter().map(|unit| (OID_ORGANIZATIONAL_UNIT, *unit)));

    let tbs = sequence(&[
        tlv(0xa0, &integer(&[2])),
        integer(&[0x01, 0x23, 0x45]),
        algorithm(OID_SHA256_WITH_RSA),
        name(&[(OID_COMMON_NAME, "Test Root CA")]),
        sequence(&[tlv(0x17, b"200101000000Z"), tlv(0x17, b"400101000000Z")]),
        name(&subject),
        sequence(&[algorithm(OID_RSA_ENCRYPTION), bit_string(&rsa_public_key_der(key))]),
    ]);
    let der = sequence(&[tbs, algorithm(OID_SHA256_WITH_RSA), bit_string(&[0x5a; 128])]);
    assert_eq!([0x30, 0x82], der[..2]);
    der
}

pub fn leaf_units(hw_id: &str, sw_id: &str, algorithm: HashAlgorithm) -> Vec<String> {
    let mut units = vec![
        format!("01 {} SW_ID", sw_id),
        format!("02 {} HW_ID", hw_id),
        "03 0000000000000002 DEBUG".to_string(),
        "04 0000 OEM_ID".to_string(),
        "06 0000 MODEL_ID".to_string(),
    ];
    if algorithm == HashAlgorithm::Sha256 {
        units.push("07 0001 SHA256".to_string());
    }
    units
}

pub struct ImageBuilder {
    pub code: Vec<u8>,
    pub hw_id: Vec<u8>,
    pub sw_id: Vec<u8>,
    pub algorithm: HashAlgorithm,
    pub signing_key: &'static RsaPrivateKey,
    pub certificates: Vec<Vec<u8>>,
    pub trailer: Vec<u8>,
}

impl ImageBuilder {
    /// One leaf certificate with HW_ID 01, SW_ID 02, signed with SHA-1.
    pub fn new() -> Self {
        Self::with_algorithm(HashAlgorithm::Sha1)
    }

    pub fn with_algorithm(algorithm: HashAlgorithm) -> Self {
        let units = leaf_units("01", "02", algorithm);
        let units: Vec<&str> = units.iter().map(String::as_str).collect();
        Self {
            code: (0..1000u32).map(|i| (i * 7) as u8).collect(),
            hw_id: vec![0x01],
            sw_id: vec![0x02],
            algorithm,
            signing_key: &*LEAF_KEY,
            certificates: vec![certificate(&LEAF_KEY, &units)],
            trailer: vec![],
        }
    }

    pub fn header(&self) -> ImageHeader {
        ImageHeader {
            magic: ImageHeader::MAGIC,
            version: ImageHeader::VERSION,
            image_base: 0x8f60_0000,
            image_size: (self.code.len() + 128 + self.certificates.concat().len()) as u32,
            code_size: self.code.len() as u32,
            image_base_plus_code_size: 0x8f60_0000 + self.code.len() as u32,
            signature_size: 128,
            code_signature_offset: 0x8f60_0000 + self.code.len() as u32,
            certificate_chain_size: (self.certificates.concat().len() + self.trailer.len()) as u32,
            ..Default::default()
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = self.header().to_bytes().to_vec();
        image.extend_from_slice(&self.code);

        let hash = VendorHmac::default()
            .keyed_digest(self.algorithm, &image, &self.hw_id, &self.sw_id)
            .unwrap();
        let signature = self.signing_key
            .sign(rsa::PaddingScheme::new_pkcs1v15_sign(None), &hash)
            .unwrap();
        assert_eq!(128, signature.len());

        image.extend_from_slice(&signature);
        for certificate in self.certificates.iter() {
            image.extend_from_slice(certificate);
        }
        image.extend_from_slice(&self.trailer);
        image
    }
}

pub fn elf_wrapped(image: &[u8]) -> Vec<u8> {
    let mut wrapped = b"\x7fELF\x01\x01\x01".to_vec();
    wrapped.resize(aboot::image::ELF_HEADER_SIZE, 0);
    wrapped.extend_from_slice(image);
    wrapped
}
