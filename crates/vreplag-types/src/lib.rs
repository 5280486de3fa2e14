//! # vreplag-types
//!
//! Domain types shared by every vreplag crate:
//! - vtadmin workflow and stream payloads (as returned by `/api/workflow/...`)
//! - tablet `/debug/vars` payloads
//! - [`Observation`], the raw per-poll sample the lag cache consumes
//! - [`StreamKey`], the `{shard}-{id}` identifier of a stream
//!
//! ## Design Philosophy
//!
//! This crate only depends on serde so that the core cache, the HTTP client
//! and test fixtures can all share the same payload definitions.

pub mod debug_vars;
pub mod error;
pub mod observation;
pub mod stream_key;
pub mod workflow;

pub use debug_vars::{RatesMap, TabletDebugVars};
pub use error::Error;
pub use observation::Observation;
pub use stream_key::StreamKey;
pub use workflow::{
    BinlogSource, Cluster, ShardStream, Stream, TabletAlias, Timestamp, Workflow, WorkflowDetail,
};
