//! Data feed clients for the Prop Edge engine
//!
//! This crate provides the collaborator seam ([`DataFeed`]) plus:
//! - `HttpFeed`: client for the stats/odds REST API
//! - `StaticFeed`: fixed snapshot feed for offline runs and tests
//!
//! Raw payloads are normalized into edge-core records here; the engine never
//! sees partial records or status text.

pub mod client;
pub mod feed;
pub mod status;
pub mod types;

pub use client::HttpFeed;
pub use feed::{DataFeed, StaticFeed};
pub use status::parse_status;
