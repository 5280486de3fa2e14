//! vtadmin workflow payloads.
//!
//! Only the fields read by vreplag are modelled. Everything is optional
//! because the API returns protobuf JSON, which omits default values.
//! int64 fields (`seconds`, stream `id`) may arrive either as JSON numbers or
//! as numeric strings; any other shape is treated as absent.

use crate::error::Error;
use crate::observation::Observation;
use crate::stream_key::StreamKey;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Accepts `123`, `"123"`, `null` or a missing field.
fn deserialize_int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(
        default,
        deserialize_with = "deserialize_int64",
        skip_serializing_if = "Option::is_none"
    )]
    pub seconds: Option<i64>,
}

impl Timestamp {
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            seconds: Some(seconds),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabletAlias {
    #[serde(default)]
    pub cell: String,
    #[serde(default)]
    pub uid: u32,
}

impl TabletAlias {
    /// `{cell}-{uid}`, or `None` for an unset alias (uid 0).
    pub fn format(&self) -> Option<String> {
        (self.uid != 0).then(|| format!("{}-{}", self.cell, self.uid))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogSource {
    #[serde(default)]
    pub keyspace: String,
    #[serde(default)]
    pub shard: String,
}

/// A single VReplication stream on a target shard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    #[serde(
        default,
        deserialize_with = "deserialize_int64",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default)]
    pub shard: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablet: Option<TabletAlias>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binlog_source: Option<BinlogSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_updated: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_timestamp: Option<Timestamp>,
}

impl Stream {
    pub fn key(&self) -> Option<StreamKey> {
        self.id.map(|id| StreamKey::new(self.shard.clone(), id))
    }

    pub fn observation(&self) -> Observation {
        Observation::from(self)
    }

    pub fn lag_seconds(&self) -> Option<i64> {
        self.observation().lag_seconds()
    }

    pub fn updated_at_seconds(&self) -> Option<i64> {
        self.time_updated.as_ref().and_then(|t| t.seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardStream {
    #[serde(default)]
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDetail {
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_int64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_v_replication_lag: Option<i64>,
    #[serde(default)]
    pub shard_streams: BTreeMap<String, ShardStream>,
}

/// Response body of `GET /api/workflow/{cluster}/{keyspace}/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Cluster>,
    #[serde(default)]
    pub keyspace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowDetail>,
}

impl Workflow {
    fn shard_streams(&self) -> impl Iterator<Item = (&String, &ShardStream)> {
        self.workflow
            .iter()
            .flat_map(|detail| detail.shard_streams.iter())
    }

    /// Every stream across every shard, flattened.
    pub fn streams(&self) -> Vec<&Stream> {
        self.shard_streams()
            .flat_map(|(_, shard_stream)| shard_stream.streams.iter())
            .collect()
    }

    /// Looks up a stream by its shard-stream key and numeric id.
    pub fn find_stream(&self, key: &StreamKey) -> Option<&Stream> {
        self.workflow
            .as_ref()?
            .shard_streams
            .get(&key.shard)?
            .streams
            .iter()
            .find(|s| s.id == Some(key.id))
    }

    /// Like [`Workflow::find_stream`], parsing the key first.
    pub fn find_stream_str(&self, key: &str) -> Result<&Stream, Error> {
        let parsed: StreamKey = key.parse()?;
        self.find_stream(&parsed)
            .ok_or_else(|| Error::StreamNotFound(key.to_string()))
    }

    /// Distinct tablet aliases that host at least one stream.
    pub fn stream_tablets(&self) -> Vec<String> {
        self.streams()
            .into_iter()
            .filter_map(|s| s.tablet.as_ref().and_then(TabletAlias::format))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `time_updated` of the most recently updated stream.
    pub fn time_updated(&self) -> Option<i64> {
        self.streams()
            .into_iter()
            .filter_map(Stream::updated_at_seconds)
            .max()
    }

    pub fn cluster_id(&self) -> Option<&str> {
        self.cluster.as_ref().map(|c| c.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Workflow {
        serde_json::from_value(json!({
            "cluster": { "id": "local", "name": "local" },
            "keyspace": "customer",
            "workflow": {
                "name": "commerce2customer",
                "max_v_replication_lag": "4",
                "shard_streams": {
                    "-80": {
                        "streams": [
                            {
                                "id": 1,
                                "shard": "-80",
                                "tablet": { "cell": "zone1", "uid": 200 },
                                "state": "Running",
                                "binlog_source": { "keyspace": "commerce", "shard": "0" },
                                "time_updated": { "seconds": "100" },
                                "transaction_timestamp": { "seconds": 97 }
                            }
                        ]
                    },
                    "80-": {
                        "streams": [
                            {
                                "id": "2",
                                "shard": "80-",
                                "tablet": { "cell": "zone1", "uid": 300 },
                                "state": "Error",
                                "message": "boom",
                                "time_updated": { "seconds": 120 },
                                "transaction_timestamp": { "seconds": "not-a-number" }
                            }
                        ]
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_int64_fields_accept_numbers_and_strings() {
        let wf = sample();
        let detail = wf.workflow.as_ref().unwrap();
        assert_eq!(detail.max_v_replication_lag, Some(4));

        let stream = wf.find_stream(&StreamKey::new("-80", 1)).unwrap();
        assert_eq!(stream.observation(), Observation::complete(100, 97));
        assert_eq!(stream.lag_seconds(), Some(3));
    }

    #[test]
    fn test_non_numeric_seconds_are_absent() {
        let wf = sample();
        let stream = wf.find_stream(&StreamKey::new("80-", 2)).unwrap();
        assert_eq!(stream.observation(), Observation::new(Some(120), None));
        assert_eq!(stream.lag_seconds(), None);
    }

    #[test]
    fn test_streams_flattens_all_shards() {
        let wf = sample();
        let keys: Vec<String> = wf
            .streams()
            .iter()
            .filter_map(|s| s.key())
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["-80-1", "80--2"]);
    }

    #[test]
    fn test_find_stream_str() {
        let wf = sample();
        assert_eq!(wf.find_stream_str("80--2").unwrap().state, "Error");
        assert_eq!(
            wf.find_stream_str("80--9"),
            Err(Error::StreamNotFound("80--9".to_string()))
        );
        assert!(matches!(
            wf.find_stream_str("nope"),
            Err(Error::InvalidStreamKey(_))
        ));
    }

    #[test]
    fn test_stream_tablets_and_time_updated() {
        let wf = sample();
        assert_eq!(wf.stream_tablets(), vec!["zone1-200", "zone1-300"]);
        assert_eq!(wf.time_updated(), Some(120));
        assert_eq!(wf.cluster_id(), Some("local"));
    }

    #[test]
    fn test_empty_workflow() {
        let wf: Workflow = serde_json::from_value(json!({})).unwrap();
        assert!(wf.streams().is_empty());
        assert_eq!(wf.time_updated(), None);
        assert!(wf.find_stream(&StreamKey::new("0", 1)).is_none());
    }
}
