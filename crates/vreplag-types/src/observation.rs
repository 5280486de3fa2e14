//! Raw lag samples.

use crate::workflow::Stream;
use serde::{Deserialize, Serialize};

/// One raw sample for a single replication stream at a point in polling time.
///
/// Both timestamps are server-side wall-clock seconds and independently
/// optional. A lag can only be derived when both are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Second at which the stream last applied an update (`time_updated`).
    pub updated_at_seconds: Option<i64>,
    /// Second of the last replicated transaction (`transaction_timestamp`).
    pub transaction_at_seconds: Option<i64>,
}

impl Observation {
    pub fn new(updated_at_seconds: Option<i64>, transaction_at_seconds: Option<i64>) -> Self {
        Self {
            updated_at_seconds,
            transaction_at_seconds,
        }
    }

    /// Both timestamps present.
    pub fn complete(updated_at_seconds: i64, transaction_at_seconds: i64) -> Self {
        Self::new(Some(updated_at_seconds), Some(transaction_at_seconds))
    }

    /// `updated - transaction`, or `None` when either side is missing or the
    /// difference does not fit in an `i64`.
    ///
    /// Clock skew between the two sources can make this negative; the value
    /// is returned as-is.
    pub fn lag_seconds(&self) -> Option<i64> {
        match (self.updated_at_seconds, self.transaction_at_seconds) {
            (Some(updated), Some(txn)) => updated.checked_sub(txn),
            _ => None,
        }
    }

    pub fn is_computable(&self) -> bool {
        self.lag_seconds().is_some()
    }
}

impl From<&Stream> for Observation {
    fn from(stream: &Stream) -> Self {
        Self {
            updated_at_seconds: stream.time_updated.as_ref().and_then(|t| t.seconds),
            transaction_at_seconds: stream.transaction_timestamp.as_ref().and_then(|t| t.seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_from_both_timestamps() {
        assert_eq!(Observation::complete(100, 97).lag_seconds(), Some(3));
    }

    #[test]
    fn test_lag_missing_either_side() {
        assert_eq!(Observation::new(Some(100), None).lag_seconds(), None);
        assert_eq!(Observation::new(None, Some(97)).lag_seconds(), None);
        assert!(!Observation::default().is_computable());
    }

    #[test]
    fn test_negative_lag_is_not_clamped() {
        assert_eq!(Observation::complete(95, 97).lag_seconds(), Some(-2));
    }

    #[test]
    fn test_overflowing_lag_is_not_computable() {
        assert_eq!(Observation::complete(i64::MAX, -1).lag_seconds(), None);
        assert_eq!(Observation::complete(i64::MIN, 1).lag_seconds(), None);
        assert!(!Observation::complete(i64::MAX, -1).is_computable());
    }

    #[test]
    fn test_overflowing_lag_from_wire() {
        let stream: Stream = serde_json::from_str(
            r#"{
                "id": 1,
                "shard": "-80",
                "time_updated": { "seconds": "9223372036854775807" },
                "transaction_timestamp": { "seconds": "-1" }
            }"#,
        )
        .unwrap();

        let observation = Observation::from(&stream);
        assert_eq!(observation.updated_at_seconds, Some(i64::MAX));
        assert_eq!(observation.lag_seconds(), None);
    }
}
