//! Error taxonomy of an image verification run.
//!
//! Every variant is terminal for the current run. A hash mismatch is *not* an
//! error, see [`Verification::matches`](crate::verify::Verification::matches).

/// Which structural check of the recovered signature block failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PaddingError {
    #[error("signature is not smaller than the public modulus")]
    OutOfRange,
    #[error("block does not start with 00 01")]
    LeadingBytes,
    #[error("no 00 terminator after the padding")]
    MissingTerminator,
    #[error("padding is {actual} bytes, expected {expected}")]
    PaddingLength { expected: usize, actual: usize },
    #[error("padding byte at offset {offset} is {value:#04x}, expected 0xff")]
    PaddingByte { offset: usize, value: u8 },
    #[error("recovered hash is {actual} bytes, expected {expected}")]
    HashLength { expected: usize, actual: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("unsupported format, {field}={value:#06x}")]
    UnsupportedFormat { field: &'static str, value: u32 },
    #[error("no embedded certificates found or unknown format")]
    MissingCertificates,
    #[error("could not find HW_ID or SW_ID on the signing certificate")]
    MissingIdentifiers,
    #[error("invalid signature format: {0}")]
    InvalidPadding(#[from] PaddingError),
    #[error("key of {len} bytes exceeds the {max} byte pad")]
    KeyLengthExceeded { len: usize, max: usize },
    #[error("DER decoding failed: {0}")]
    Der(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if the input is not a valid or supported image at all,
    /// as opposed to a failure while checking its signature.
    pub fn is_format_error(&self) -> bool {
        use Error::*;
        matches!(self, MalformedHeader(_) | UnsupportedFormat { .. } | MissingCertificates)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
