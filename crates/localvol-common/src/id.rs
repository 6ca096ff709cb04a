//! Unique volume id encoding.
//!
//! When a driver opts into unique volume ids, every volume name handed to it
//! is an encoded `<prefix>_<suffix>` pair. The prefix names the shared backing
//! storage; the suffix distinguishes the individual consumer. Underscores
//! inside either part are escaped as `=`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnrecoverableError;

/// Separator between prefix and suffix in an encoded id.
const SEPARATOR: char = '_';

/// Replacement for a literal separator inside a part.
const ESCAPE: char = '=';

/// A decoded unique volume id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueVolumeId {
    /// Shared part; names the storage directory.
    pub prefix: String,
    /// Per-consumer part.
    pub suffix: String,
}

impl UniqueVolumeId {
    /// Create an id from its decoded parts.
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Encode the id into a volume name.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}",
            escape(&self.prefix),
            escape(&self.suffix)
        )
    }

    /// Decode a volume name.
    ///
    /// # Errors
    ///
    /// Returns [`UnrecoverableError::InvalidVolumeId`] unless the name splits
    /// into exactly two parts.
    pub fn decode(encoded: &str) -> Result<Self, UnrecoverableError> {
        let mut parts = encoded.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => Ok(Self::new(unescape(prefix), unescape(suffix))),
            _ => Err(UnrecoverableError::InvalidVolumeId {
                id: encoded.to_string(),
            }),
        }
    }
}

fn escape(part: &str) -> String {
    part.replace(SEPARATOR, &ESCAPE.to_string())
}

fn unescape(part: &str) -> String {
    part.replace(ESCAPE, &SEPARATOR.to_string())
}

impl fmt::Display for UniqueVolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for UniqueVolumeId {
    type Err = UnrecoverableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_plain() {
        let id: UniqueVolumeId = "shared_owner".parse().unwrap();
        assert_eq!(id.prefix, "shared");
        assert_eq!(id.suffix, "owner");
    }

    #[test]
    fn escaped_underscores() {
        let id = UniqueVolumeId::new("some_volume", "some_container");
        assert_eq!(id.encode(), "some=volume_some=container");

        let decoded = UniqueVolumeId::decode("some=volume_some=container").unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn invalid_ids() {
        assert!(UniqueVolumeId::decode("no-separator").is_err());
        assert!(UniqueVolumeId::decode("too_many_parts").is_err());
    }

    #[test]
    fn empty_parts_are_kept() {
        let id = UniqueVolumeId::decode("_suffix").unwrap();
        assert_eq!(id.prefix, "");
        assert_eq!(id.suffix, "suffix");
    }

    proptest! {
        #[test]
        fn names_without_separator_are_rejected(name in "[a-zA-Z0-9=.-]{0,32}") {
            prop_assert!(UniqueVolumeId::decode(&name).is_err());
        }
    }
}
