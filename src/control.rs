//! Control fields: vendor attributes carried as subject OUs
//!
//! Each OU of the signing certificate's subject encodes one field as
//! `"<index> <hex value> <tag>"`, for instance:
//!
//! ```text
//! OU=07 0001 SHA256
//! OU=06 00XX MODEL_ID
//! OU=05 0000XXXX SW_SIZE
//! OU=04 00XX OEM_ID
//! OU=03 0000000000000002 DEBUG
//! OU=02 00XXXXXXXXXXXXXX HW_ID
//! OU=01 000000000000000X SW_ID
//! ```
//!
//! Older images omit some of these.

use core::fmt;

use serde::Serialize;

use crate::der::{AttributeKind, SubjectName};
use crate::hash::HashAlgorithm;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ControlTag {
    SwId,
    HwId,
    Debug,
    OemId,
    SwSize,
    ModelId,
    Sha256,
}

impl ControlTag {
    pub const ALL: [ControlTag; 7] = [
        ControlTag::SwId,
        ControlTag::HwId,
        ControlTag::Debug,
        ControlTag::OemId,
        ControlTag::SwSize,
        ControlTag::ModelId,
        ControlTag::Sha256,
    ];

    pub fn name(&self) -> &'static str {
        use ControlTag::*;
        match self {
            SwId => "SW_ID",
            HwId => "HW_ID",
            Debug => "DEBUG",
            OemId => "OEM_ID",
            SwSize => "SW_SIZE",
            ModelId => "MODEL_ID",
            Sha256 => "SHA256",
        }
    }

    /// Leading index of the OU string
    pub fn index(&self) -> u8 {
        *self as u8 + 1
    }
}

impl fmt::Display for ControlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collects every organizational-unit value of `subject`, trimmed, in order.
pub fn organizational_units(subject: &SubjectName) -> Vec<String> {
    subject.iter()
        .filter(|attribute| attribute.kind == AttributeKind::OrganizationalUnit)
        .map(|attribute| attribute.value.trim().to_string())
        .collect()
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ControlFields(Vec<String>);

impl ControlFields {
    pub fn from_units(units: Vec<String>) -> Self {
        Self(units)
    }

    pub fn from_subject(subject: &SubjectName) -> Self {
        Self(organizational_units(subject))
    }

    /// The raw OU strings
    pub fn units(&self) -> &[String] {
        &self.0
    }

    /// Value of the first OU mentioning `tag`, decoded from its second token.
    ///
    /// A matching OU without a decodable value counts as absent.
    pub fn get(&self, tag: ControlTag) -> Option<Vec<u8>> {
        let unit = self.0.iter().find(|unit| unit.contains(tag.name()))?;
        let value = unit.split_whitespace().nth(1)?;
        match hex::decode(value) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!("control field {} has undecodable value {:?}: {}", tag, value, err);
                None
            }
        }
    }

    pub fn sw_id(&self) -> Option<Vec<u8>> {
        self.get(ControlTag::SwId)
    }

    pub fn hw_id(&self) -> Option<Vec<u8>> {
        self.get(ControlTag::HwId)
    }

    /// Only the exact value `0x0001` selects SHA-256.
    pub fn is_sha256(&self) -> bool {
        self.get(ControlTag::Sha256).as_deref() == Some(&[0x00, 0x01][..])
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        if self.is_sha256() {
            HashAlgorithm::Sha256
        } else {
            HashAlgorithm::Sha1
        }
    }

    /// All recognized tags that carry a value.
    pub fn iter(&self) -> impl Iterator<Item = (ControlTag, Vec<u8>)> + '_ {
        ControlTag::ALL.iter()
            .filter_map(move |&tag| self.get(tag).map(|value| (tag, value)))
    }
}
