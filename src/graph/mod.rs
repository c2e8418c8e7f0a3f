//! Graph data model
//!
//! This module holds the identifiers and records the crawler passes around:
//! - `AccountId` / `AccountRef`: numeric account ids and id-or-handle references
//! - `AccountProfile`: the ranking attributes of a single account
//! - `NetworkGraph`: the sampled adjacency produced by a crawl

mod account;
mod network;

pub use account::{AccountId, AccountProfile, AccountRef};
pub use network::NetworkGraph;
