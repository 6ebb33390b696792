//! Locating the regions of an aboot image
//!
//! Images may come wrapped in an ELF file, in which case the actual image
//! starts after a fixed-size ELF header region.

use crate::certificate::CertificateChain;
use crate::der::DerDecoder;
use crate::error::{Error, Result};
use crate::header::ImageHeader;

/// Where the aboot image starts inside an ELF envelope
pub const ELF_HEADER_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Filetype {
    Elf,
    Raw,
}

pub fn sniff(file: &[u8]) -> Filetype {
    match file.get(..4) {
        Some(b"\x7fELF") => Filetype::Elf,
        _ => Filetype::Raw,
    }
}

/// A borrowed image with decoded header.
#[derive(Clone, Copy, Debug)]
pub struct Image<'a> {
    bytes: &'a [u8],
    header: ImageHeader,
    filetype: Filetype,
}

impl<'a> Image<'a> {
    /// Unwraps a possible ELF envelope and decodes the header.
    pub fn parse(file: &'a [u8], elf_header_size: usize) -> Result<Self> {
        let filetype = sniff(file);
        let bytes = match filetype {
            Filetype::Elf => {
                info!("ELF file format found");
                file.get(elf_header_size..).ok_or_else(|| Error::MalformedHeader(format!(
                    "ELF file of {} bytes is shorter than its {} byte header",
                    file.len(), elf_header_size)))?
            }
            Filetype::Raw => file,
        };
        let header = ImageHeader::from_bytes(bytes)?;
        Ok(Self { bytes, header, filetype })
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn filetype(&self) -> Filetype {
        self.filetype
    }

    /// The image proper, without envelope.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    fn region(&self, name: &str, offset: usize, len: usize) -> Result<&'a [u8]> {
        self.bytes.get(offset..)
            .and_then(|rest| rest.get(..len))
            .ok_or_else(|| Error::MalformedHeader(format!(
                "{} at 0x{:x} of {} bytes exceeds image of {} bytes",
                name, offset, len, self.bytes.len())))
    }

    /// Header and code, which is what the signature covers.
    pub fn signed_region(&self) -> Result<&'a [u8]> {
        self.region("signed region", 0, self.header.signed_len())
    }

    /// An owned copy of the signature block.
    pub fn signature(&self) -> Result<Vec<u8>> {
        let offset = self.header.signature_offset();
        debug!("signature offset: 0x{:08x}", offset);
        self.region("signature", offset, self.header.signature_size as usize)
            .map(|signature| signature.to_vec())
    }

    pub fn certificates<D: DerDecoder>(&self, decoder: D) -> CertificateChain<'a, D> {
        CertificateChain::new(self.bytes, self.header.certificate_offset(), decoder)
    }
}
