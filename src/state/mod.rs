//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the lifecycle of a single crawl (seeding, expanding, done, failed)

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
