//! Crawler module for reciprocal-friend network sampling
//!
//! This module contains the core crawling logic, including:
//! - Remote calls with retry, backoff and rate-limit waits
//! - Cursor-based paging of relationship lists
//! - Batched profile lookups and top-K ranking
//! - Breadth-first frontier expansion and checkpointing

mod backoff;
mod cancel;
mod coordinator;
mod frontier;
mod paging;
mod profiles;
mod ranking;
mod requester;

pub use backoff::{BackoffState, RetryPolicy};
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use coordinator::{
    crawl, finish_run, open_run, run_crawl, CrawlParams, ExpansionSink, NetworkCrawler,
};
pub use frontier::Frontier;
pub use paging::{fetch_ids, fetch_relationships, RelationshipSet, FIRST_CURSOR};
pub use profiles::lookup_profiles;
pub use ranking::{rank_order, reciprocal, select_top_k, ReciprocalSet};
pub use requester::{Outcome, RequestStep, Requester};
