//! Remote social-graph API
//!
//! This module defines the seam between the crawler and the remote service:
//! - `SocialApi`: the three calls the crawler needs
//! - `ApiError` / `ErrorClass`: the error surface and its retry classification
//! - `HttpApi`: the reqwest-backed implementation
//! - `InMemoryApi`: a deterministic in-process implementation for tests and demos

mod http;
mod memory;
mod types;

pub use http::{build_http_client, HttpApi};
pub use memory::{Call, CallKind, InMemoryApi};
pub use types::{classify, ApiError, ApiResult, Direction, ErrorClass, IdPage};

use crate::graph::{AccountId, AccountProfile, AccountRef};
use async_trait::async_trait;

/// Maximum ids per page of a relationship listing
pub const MAX_PAGE_SIZE: u32 = 5000;

/// Maximum ids per profile lookup call
pub const MAX_LOOKUP_BATCH: usize = 100;

/// Operations the crawler consumes from the remote API
///
/// Every method performs exactly one remote call. Retrying is the caller's job.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Resolves a handle to its numeric account id
    async fn resolve_handle(&self, handle: &str) -> ApiResult<AccountId>;

    /// Looks up profiles for at most `MAX_LOOKUP_BATCH` ids
    ///
    /// Unknown ids are silently absent from the result.
    async fn lookup_profiles(&self, ids: &[AccountId]) -> ApiResult<Vec<AccountProfile>>;

    /// Fetches one page of a relationship listing
    ///
    /// `cursor` is `-1` for the first page; the returned page carries the next
    /// cursor, `0` once exhausted.
    async fn list_relationship(
        &self,
        account: &AccountRef,
        direction: Direction,
        cursor: i64,
        count: u32,
    ) -> ApiResult<IdPage>;
}
