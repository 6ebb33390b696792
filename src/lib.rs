//! Parse and verify aboot secure-boot images
//!
//! An aboot image is a 40 byte header, code, an RSA signature and a chain of
//! DER certificates. The signature does not cover the code directly but a
//! vendor-specific keyed hash of header and code, keyed by the HW_ID and SW_ID
//! found in the signing certificate's subject.
//!
//! ```no_run
//! let image = std::fs::read("aboot.img").unwrap();
//! let report = aboot::Verifier::new().verify(&image).unwrap();
//! println!("hashes match: {}", report.matches);
//! ```

#[macro_use]
extern crate log;

pub mod certificate;
pub mod config;
pub mod control;
pub mod der;
pub mod error;
pub mod hash;
pub mod header;
pub mod image;
pub mod pki;
pub mod recovery;
pub mod util;
pub mod verify;

pub use error::{Error, PaddingError, Result};
pub use header::ImageHeader;
pub use verify::{Inspection, Report, Verification, Verifier};
