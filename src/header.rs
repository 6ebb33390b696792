//! The fixed aboot image header
//!
//! Ten little-endian `u32` words:
//!
//! | offset | field                       |
//! |--------|-----------------------------|
//! | 0x00   | magic                       |
//! | 0x04   | version                     |
//! | 0x08   | reserved (zero)             |
//! | 0x0c   | image base address          |
//! | 0x10   | image size                  |
//! | 0x14   | code size                   |
//! | 0x18   | image base + code size      |
//! | 0x1c   | signature size              |
//! | 0x20   | code signature offset       |
//! | 0x24   | certificate chain size      |
//!
//! The image is laid out as header, code, signature, certificate chain.
//! Header and code together are the signed region.

use core::fmt;

use nom::number::complete::le_u32;
use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageHeader {
    pub magic: u32,
    pub version: u32,
    pub reserved: u32,
    pub image_base: u32,
    pub image_size: u32,
    pub code_size: u32,
    pub image_base_plus_code_size: u32,
    pub signature_size: u32,
    /// Informational only, see [`ImageHeader::signature_offset`].
    pub code_signature_offset: u32,
    pub certificate_chain_size: u32,
}

impl ImageHeader {
    /// 40 bytes
    pub const LEN: usize = 40;
    pub const MAGIC: u32 = 0x0000_0005;
    pub const VERSION: u32 = 0x0000_0003;

    /// Decodes the header at the start of `bytes`; whatever follows is ignored.
    ///
    /// Only the structure is checked, magic and version are left to the caller.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LEN {
            return Err(Error::MalformedHeader(format!(
                "need {} bytes, have {}", Self::LEN, bytes.len())));
        }
        Self::inner_from_bytes(bytes)
            .map(|(_rest, header)| header)
            .map_err(|_| Error::MalformedHeader("could not decode header words".into()))
    }

    fn inner_from_bytes(i: &[u8]) -> nom::IResult<&[u8], Self, ()> {
        let (i, magic) = le_u32(i)?;
        let (i, version) = le_u32(i)?;
        let (i, reserved) = le_u32(i)?;
        let (i, image_base) = le_u32(i)?;
        let (i, image_size) = le_u32(i)?;
        let (i, code_size) = le_u32(i)?;
        let (i, image_base_plus_code_size) = le_u32(i)?;
        let (i, signature_size) = le_u32(i)?;
        let (i, code_signature_offset) = le_u32(i)?;
        let (i, certificate_chain_size) = le_u32(i)?;

        Ok((
            i,
            Self {
                magic,
                version,
                reserved,
                image_base,
                image_size,
                code_size,
                image_base_plus_code_size,
                signature_size,
                code_signature_offset,
                certificate_chain_size,
            },
        ))
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let words = [
            self.magic,
            self.version,
            self.reserved,
            self.image_base,
            self.image_size,
            self.code_size,
            self.image_base_plus_code_size,
            self.signature_size,
            self.code_signature_offset,
            self.certificate_chain_size,
        ];
        let mut bytes = [0u8; Self::LEN];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Where the signature starts: right after header and code.
    ///
    /// Always derived, `code_signature_offset` is not trusted.
    ///
    /// Saturates where `usize` is too narrow, so region checks against the
    /// actual buffer fail instead.
    pub fn signature_offset(&self) -> usize {
        Self::LEN.saturating_add(self.code_size as usize)
    }

    pub fn certificate_offset(&self) -> usize {
        self.signature_offset().saturating_add(self.signature_size as usize)
    }

    /// Length of header plus code, i.e. the signed region.
    pub fn signed_len(&self) -> usize {
        self.signature_offset()
    }
}

impl fmt::Display for ImageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "aboot header:")?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "magic:             0x{:08x}", self.magic)?;
        writeln!(f, "version:           0x{:08x}", self.version)?;
        writeln!(f, "NULL:              0x{:08x}", self.reserved)?;
        writeln!(f, "ImgBase:           0x{:08x}", self.image_base)?;
        writeln!(f, "ImgSize:           0x{:08x} ({})", self.image_size, self.image_size)?;
        writeln!(f, "CodeSize:          0x{:08x} ({})", self.code_size, self.code_size)?;
        writeln!(f, "ImgBaseCodeSize:   0x{:08x}", self.image_base_plus_code_size)?;
        writeln!(f, "SigSize:           0x{:08x} ({})", self.signature_size, self.signature_size)?;
        writeln!(f, "CodeSigOffset:     0x{:08x}", self.code_signature_offset)?;
        write!(f, "Certs size:        0x{:08x} ({})", self.certificate_chain_size, self.certificate_chain_size)
    }
}
