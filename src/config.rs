//! Optional configuration file
//!
//! ```toml
//! elf-header-size = 4096
//! pad-width = 8
//!
//! [output]
//! signature-filename = "signature.bin"
//! certificate-prefix = "cert"
//! ```
//!
//! Every key is optional.

use std::convert::TryFrom;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::VendorHmac;
use crate::image::ELF_HEADER_SIZE;
use crate::util::is_default;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct Config {
    /// Bytes to skip when the image is wrapped in an ELF envelope
    pub elf_header_size: usize,
    /// Width of the keyed hash pads, longer HW_ID/SW_ID values are refused
    pub pad_width: usize,
    #[serde(skip_serializing_if = "is_default")]
    pub output: Output,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elf_header_size: ELF_HEADER_SIZE,
            pad_width: VendorHmac::PAD_WIDTH,
            output: Output::default(),
        }
    }
}

/// File names used when extracting signature and certificates.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct Output {
    pub signature_filename: String,
    /// Certificates are written to `<prefix>-<n>.cer`, counting from 1
    pub certificate_prefix: String,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            signature_filename: "signature.bin".to_string(),
            certificate_prefix: "cert".to_string(),
        }
    }
}

impl Output {
    pub fn certificate_filename(&self, number: usize) -> String {
        format!("{}-{}.cer", self.certificate_prefix, number)
    }
}

impl Config {
    pub fn from_toml(config: &str) -> Result<Self> {
        let config: Config = toml::from_str(config)?;
        if config.pad_width == 0 {
            return Err(Error::Config("pad-width must be positive".to_string()));
        }
        trace!("{:#?}", &config);
        Ok(config)
    }
}

impl TryFrom<&'_ str> for Config {
    type Error = anyhow::Error;
    fn try_from(config_filename: &str) -> anyhow::Result<Self> {
        use anyhow::Context as _;
        let config = fs::read_to_string(config_filename)
            .with_context(|| format!("Failed to read config from {}", config_filename))?;
        Ok(Config::from_toml(&config)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(Config::default(), config);
        assert_eq!(4096, config.elf_header_size);
        assert_eq!(8, config.pad_width);
        assert_eq!("cert-2.cer", config.output.certificate_filename(2));
    }

    #[test]
    fn overrides() {
        let config = Config::from_toml(r#"
elf-header-size = 0x2000
pad-width = 16

[output]
certificate-prefix = "aboot-cert"
"#).unwrap();
        assert_eq!(0x2000, config.elf_header_size);
        assert_eq!(16, config.pad_width);
        assert_eq!("signature.bin", config.output.signature_filename);
        assert_eq!("aboot-cert-1.cer", config.output.certificate_filename(1));
    }

    #[test]
    fn rejects_unknown_and_invalid() {
        assert!(matches!(Config::from_toml("magic = 5"), Err(Error::Config(_))));
        assert!(matches!(Config::from_toml("pad-width = 0"), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file() {
        assert!(Config::try_from("/nonexistent/aboot.toml").is_err());
    }
}
