//! Walking the concatenated certificate chain
//!
//! The header only gives the byte size of the chain, not a count, so the
//! chain is scanned: each certificate must start with `30 82 LL LL` (DER
//! SEQUENCE, two byte length). The first thing that does not look like, or
//! does not decode as, such a certificate ends the chain.

use nom::{bytes::complete::tag, number::complete::be_u16};
use serde::Serialize;

use crate::control::ControlFields;
use crate::der::DerDecoder;
use crate::error::Result;
use crate::pki::PublicKey;

/// `30 82`: constructed SEQUENCE, long form length in two bytes
const SEQUENCE_LONG_2: [u8; 2] = [0x30, 0x82];

/// Length of the whole record, tag and length bytes included.
fn record_header(i: &[u8]) -> nom::IResult<&[u8], usize, ()> {
    let (i, _) = tag(SEQUENCE_LONG_2.as_slice())(i)?;
    let (i, len) = be_u16(i)?;
    Ok((i, len as usize + 4))
}

#[derive(Clone, Debug)]
pub struct CertificateRecord {
    pub control_fields: ControlFields,
    pub public_key: PublicKey,
    /// Encoded length including tag and length bytes
    pub len: usize,
    /// Offset in the image this certificate was found at
    pub offset: usize,
    der: Vec<u8>,
}

impl CertificateRecord {
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Decodes one certificate, `der` must be exactly its encoding.
    pub fn try_from_der(der: &[u8], offset: usize, decoder: &impl DerDecoder) -> Result<Self> {
        let certificate = decoder.decode_certificate(der)?;
        let public_key = decoder.decode_rsa_public_key(&certificate.public_key_bits)?;
        Ok(Self {
            control_fields: ControlFields::from_subject(&certificate.subject),
            public_key,
            len: der.len(),
            offset,
            der: der.to_vec(),
        })
    }

    pub fn summary(&self) -> CertificateSummary {
        CertificateSummary {
            offset: self.offset,
            len: self.len,
            key_bits: self.public_key.bits(),
            control_fields: self.control_fields.clone(),
        }
    }
}

/// What gets reported about a certificate.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CertificateSummary {
    pub offset: usize,
    pub len: usize,
    pub key_bits: usize,
    pub control_fields: ControlFields,
}

/// Iterator over the certificates starting at some offset of the image.
///
/// Finite: every step either advances by at least four bytes or ends the walk.
pub struct CertificateChain<'a, D> {
    image: &'a [u8],
    offset: usize,
    index: usize,
    done: bool,
    decoder: D,
}

impl<'a, D: DerDecoder> CertificateChain<'a, D> {
    pub fn new(image: &'a [u8], offset: usize, decoder: D) -> Self {
        Self { image, offset, index: 0, done: false, decoder }
    }

    /// Where the next certificate would start.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the record at the current offset, if it looks like one.
    fn next_record_len(&self) -> Option<usize> {
        let rest = self.image.get(self.offset..)?;
        let len = match record_header(rest) {
            Ok((_, len)) => len,
            Err(_) => {
                debug!("no certificate marker at 0x{:x}: {}", self.offset,
                    delog::hex_str!(&rest[..rest.len().min(4)]));
                return None;
            }
        };
        if len > rest.len() {
            debug!("certificate at 0x{:x} claims {} bytes, only {} left",
                self.offset, len, self.image.len() - self.offset);
            return None;
        }
        Some(len)
    }
}

impl<D: DerDecoder> Iterator for CertificateChain<'_, D> {
    type Item = CertificateRecord;

    fn next(&mut self) -> Option<CertificateRecord> {
        if self.done || self.offset >= self.image.len() {
            self.done = true;
            return None;
        }

        let record = self.next_record_len().and_then(|len| {
            let der = &self.image[self.offset..][..len];
            CertificateRecord::try_from_der(der, self.offset, &self.decoder)
                .map_err(|err| debug!("certificate at 0x{:x} does not decode: {}", self.offset, err))
                .ok()
        });

        match record {
            Some(record) => {
                self.index += 1;
                debug!("cert {}: offset 0x{:x}, size: {:4}", self.index, self.offset, record.len);
                self.offset += record.len;
                Some(record)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl<D: DerDecoder> core::iter::FusedIterator for CertificateChain<'_, D> {}
