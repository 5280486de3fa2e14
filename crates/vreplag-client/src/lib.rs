//! # vreplag-client
//!
//! Client for the vtadmin HTTP API plus the poll loop that feeds a
//! [`LagHistory`](vreplag_core::LagHistory).
//!
//! ## Example
//!
//! ```rust,ignore
//! use vreplag_client::{ClientConfig, PollerConfig, StreamWatcher, VtAdminClient, WorkflowStreamSource};
//!
//! let client = VtAdminClient::new(ClientConfig::new("http://127.0.0.1:14200"))?;
//! let source = WorkflowStreamSource::new(client, "local", "customer", "commerce2customer", "-80-1".parse()?);
//! let mut watcher = StreamWatcher::new(source, PollerConfig::default());
//!
//! watcher.poll_once().await?;
//! println!("{:?}", watcher.history().latest_lag());
//! ```

mod client;
pub mod poller;

pub use client::{parse_envelope, ClientConfig, ClientError, VtAdminClient};
pub use poller::{ObservationSource, PollEvent, PollerConfig, StreamWatcher, WorkflowStreamSource};
