//! Best-effort typing of the tablet `/debug/vars` endpoint.
//!
//! Only fields read by vreplag are defined, and none of them is guaranteed
//! to be present in every deployment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Rates stats counter: series name -> samples, oldest first.
pub type RatesMap = BTreeMap<String, Vec<f64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabletDebugVars {
    #[serde(rename = "BuildGitBranch", default, skip_serializing_if = "Option::is_none")]
    pub build_git_branch: Option<String>,
    #[serde(rename = "BuildGitRev", default, skip_serializing_if = "Option::is_none")]
    pub build_git_rev: Option<String>,
    #[serde(rename = "QPS", default, skip_serializing_if = "Option::is_none")]
    pub qps: Option<RatesMap>,
    #[serde(rename = "VReplicationQPS", default, skip_serializing_if = "Option::is_none")]
    pub vreplication_qps: Option<RatesMap>,
}
