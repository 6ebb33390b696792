//! Verification of a complete image
//!
//! Strictly linear:
//!
//! ```text
//! raw bytes -> header -> signature -> certificate chain -> leaf key
//!           -> expected hash (from signature) -> computed hash -> compare
//! ```
//!
//! By convention the first certificate signs the image. The chain itself is
//! not validated.

use serde::Serialize;

use crate::certificate::{CertificateRecord, CertificateSummary};
use crate::config::Config;
use crate::der::{DerDecoder, X509Decoder};
use crate::error::{Error, Result};
use crate::hash::{HashAlgorithm, KeyedHash, VendorHmac};
use crate::header::ImageHeader;
use crate::image::{Filetype, Image, ELF_HEADER_SIZE};
use crate::recovery::recover_hash;
use crate::util::hex_serialize;

/// Outcome of comparing the two hashes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Verification {
    pub algorithm: HashAlgorithm,
    /// Recovered from the signature
    #[serde(serialize_with = "hex_serialize")]
    pub expected: Vec<u8>,
    /// Recomputed over the signed region
    #[serde(serialize_with = "hex_serialize")]
    pub computed: Vec<u8>,
}

impl Verification {
    pub fn matches(&self) -> bool {
        self.expected == self.computed
    }
}

/// Everything found in an image, short of verifying it.
#[derive(Clone, Debug)]
pub struct Inspection {
    pub filetype: Filetype,
    pub header: ImageHeader,
    pub signature: Vec<u8>,
    pub certificates: Vec<CertificateRecord>,
}

impl Inspection {
    pub fn signature_offset(&self) -> usize {
        self.header.signature_offset()
    }

    /// The signing certificate
    pub fn leaf(&self) -> Option<&CertificateRecord> {
        self.certificates.first()
    }

    pub fn certificates_size(&self) -> usize {
        self.certificates.iter().map(|certificate| certificate.len).sum()
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Report {
    pub elf: bool,
    pub header: ImageHeader,
    pub signature_offset: usize,
    pub certificates: Vec<CertificateSummary>,
    pub verification: Verification,
    #[serde(rename = "match")]
    pub matches: bool,
}

impl Report {
    fn new(inspection: &Inspection, verification: Verification) -> Self {
        Self {
            elf: inspection.filetype == Filetype::Elf,
            header: inspection.header,
            signature_offset: inspection.signature_offset(),
            certificates: inspection.certificates.iter().map(CertificateRecord::summary).collect(),
            matches: verification.matches(),
            verification,
        }
    }
}

pub struct Verifier<D = X509Decoder, K = VendorHmac> {
    decoder: D,
    hasher: K,
    elf_header_size: usize,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::with(X509Decoder, VendorHmac::default())
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with(X509Decoder, VendorHmac::with_pad_width(config.pad_width))
            .elf_header_size(config.elf_header_size)
    }
}

impl<D: DerDecoder, K: KeyedHash> Verifier<D, K> {
    pub fn with(decoder: D, hasher: K) -> Self {
        Self { decoder, hasher, elf_header_size: ELF_HEADER_SIZE }
    }

    pub fn elf_header_size(mut self, elf_header_size: usize) -> Self {
        self.elf_header_size = elf_header_size;
        self
    }

    /// Parses header, signature and certificate chain.
    ///
    /// Checks magic and version, and that there is at least one certificate.
    pub fn inspect(&self, file: &[u8]) -> Result<Inspection> {
        let image = Image::parse(file, self.elf_header_size)?;
        self.inspect_image(&image)
    }

    /// Recovers the expected hash and recomputes it over the signed region.
    ///
    /// A mismatch is reported through [`Verification::matches`], errors mean
    /// the image could not be checked at all.
    pub fn verify(&self, file: &[u8]) -> Result<Report> {
        let image = Image::parse(file, self.elf_header_size)?;
        let inspection = self.inspect_image(&image)?;
        let verification = self.compare(&image, &inspection)?;
        Ok(Report::new(&inspection, verification))
    }

    fn inspect_image(&self, image: &Image<'_>) -> Result<Inspection> {
        let header = *image.header();
        debug!("header: {:?}", &header);

        if header.magic != ImageHeader::MAGIC {
            if image.filetype() == Filetype::Elf {
                warn!("unrecognized magic 0x{:04x} inside ELF envelope, continuing", header.magic);
            } else {
                return Err(Error::UnsupportedFormat { field: "magic", value: header.magic });
            }
        }
        if header.version != ImageHeader::VERSION {
            return Err(Error::UnsupportedFormat { field: "version", value: header.version });
        }

        let signature = image.signature()?;
        trace!("signature = {}", delog::hex_str!(signature.as_slice(), 4));

        if header.certificate_chain_size == 0 {
            return Err(Error::MissingCertificates);
        }
        let certificates: Vec<_> = image.certificates(&self.decoder).collect();
        if certificates.is_empty() {
            return Err(Error::MissingCertificates);
        }
        info!("{} certificates, {} bytes", certificates.len(),
            certificates.iter().map(|certificate| certificate.len).sum::<usize>());

        Ok(Inspection { filetype: image.filetype(), header, signature, certificates })
    }

    fn compare(&self, image: &Image<'_>, inspection: &Inspection) -> Result<Verification> {
        let leaf = inspection.leaf().ok_or(Error::MissingCertificates)?;
        let fields = &leaf.control_fields;
        let algorithm = fields.algorithm();
        debug!("leaf key: {:?}, hash: {}", &leaf.public_key, algorithm);

        let expected = recover_hash(&inspection.signature, &leaf.public_key, algorithm)?;

        let (hw_id, sw_id) = match (fields.hw_id(), fields.sw_id()) {
            (Some(hw_id), Some(sw_id)) => (hw_id, sw_id),
            _ => return Err(Error::MissingIdentifiers),
        };
        debug!("HW_ID = {}, SW_ID = {}", delog::hex_str!(hw_id.as_slice()), delog::hex_str!(sw_id.as_slice()));

        // header and code are both signed
        let computed = self.hasher.keyed_digest(algorithm, image.signed_region()?, &hw_id, &sw_id)?;

        let verification = Verification { algorithm, expected, computed };
        info!("expected: {} ({})", hex::encode(&verification.expected), verification.expected.len());
        info!("computed: {} ({})", hex::encode(&verification.computed), verification.computed.len());
        Ok(verification)
    }
}
