//! Output module for crawl results
//!
//! This module handles:
//! - Writing and reading the graph JSON hand-off file
//! - Computing and reporting network statistics

mod json;
pub mod stats;

pub use json::{format_graph, read_graph, write_graph};
pub use stats::{
    compute_statistics, format_statistics, print_statistics, write_statistics_report,
    NetworkStatistics,
};
