//! Stream identifiers.
//!
//! A stream is addressed as `{shard}-{id}`. Shard names carry their own
//! dashes (`-80`, `80-`, `40-80`), so the id is always the trailing run of
//! digits after the *last* dash.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamKey {
    pub shard: String,
    pub id: i64,
}

impl StreamKey {
    pub fn new(shard: impl Into<String>, id: i64) -> Self {
        Self {
            shard: shard.into(),
            id,
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.shard, self.id)
    }
}

impl FromStr for StreamKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidStreamKey(s.to_string());

        let (shard, id) = s.rsplit_once('-').ok_or_else(invalid)?;
        if shard.is_empty() || shard.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let id = id.parse::<i64>().map_err(|_| invalid())?;
        Ok(Self::new(shard, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_key() {
        let key: StreamKey = "0-1".parse().unwrap();
        assert_eq!(key, StreamKey::new("0", 1));
    }

    #[test]
    fn test_parse_keeps_shard_dashes() {
        assert_eq!(
            "-80-3".parse::<StreamKey>().unwrap(),
            StreamKey::new("-80", 3)
        );
        assert_eq!(
            "80--12".parse::<StreamKey>().unwrap(),
            StreamKey::new("80-", 12)
        );
        assert_eq!(
            "40-80-7".parse::<StreamKey>().unwrap(),
            StreamKey::new("40-80", 7)
        );
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for bad in ["", "80", "-1", "80-", "80-x", "80-1a", "a b-1"] {
            assert_eq!(
                bad.parse::<StreamKey>(),
                Err(Error::InvalidStreamKey(bad.to_string())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let key = StreamKey::new("-80", 42);
        assert_eq!(key.to_string(), "-80-42");
        assert_eq!(key.to_string().parse::<StreamKey>().unwrap(), key);
    }
}
