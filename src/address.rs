use serde::Serialize;
use std::fmt;

use crate::error::RelayError;

pub const DOMAIN_SEPARATOR: char = '@';
pub const INDIVIDUAL_SUFFIX: &str = "@c.us";
pub const GROUP_SUFFIX: &str = "@g.us";

/// A chat target that always carries its domain suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Turn a transport id or a bare phone/group number into an address.
    ///
    /// Anything already containing `@` is returned as-is, even when
    /// `is_group` disagrees with its suffix. Bare numbers get `@g.us` or
    /// `@c.us` appended; no other reformatting happens.
    pub fn canonicalize(raw: &str, is_group: bool) -> Result<Self, RelayError> {
        if raw.trim().is_empty() {
            return Err(RelayError::InvalidAddress(
                "target identifier is empty".to_string(),
            ));
        }

        if raw.contains(DOMAIN_SEPARATOR) {
            return Ok(Self(raw.to_string()));
        }

        let suffix = if is_group {
            GROUP_SUFFIX
        } else {
            INDIVIDUAL_SUFFIX
        };
        Ok(Self(format!("{raw}{suffix}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
