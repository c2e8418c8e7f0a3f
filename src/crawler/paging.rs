//! Cursor-driven relationship paging

use crate::api::{Direction, SocialApi, MAX_PAGE_SIZE};
use crate::crawler::ranking::{reciprocal, ReciprocalSet};
use crate::crawler::requester::{Outcome, Requester};
use crate::graph::{AccountId, AccountRef};
use crate::MutualsError;

/// Cursor value requesting the first page
pub const FIRST_CURSOR: i64 = -1;

/// Friend and follower id lists of one account, each capped at a limit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSet {
    pub outgoing: Vec<AccountId>,
    pub incoming: Vec<AccountId>,
}

impl RelationshipSet {
    /// Accounts on both sides
    pub fn reciprocal(&self) -> ReciprocalSet {
        reciprocal(&self.outgoing, &self.incoming)
    }
}

/// Accumulates one relationship listing page by page
///
/// Stops on cursor `0`, once `limit` ids are collected, or when a page comes
/// back with no data; whatever was collected so far is returned. The result
/// can overshoot `limit` by up to one page.
pub async fn fetch_ids<A: SocialApi + ?Sized>(
    api: &A,
    requester: &Requester,
    account: &AccountRef,
    direction: Direction,
    limit: usize,
) -> Result<Vec<AccountId>, MutualsError> {
    let mut ids = Vec::new();
    if limit == 0 {
        return Ok(ids);
    }

    let mut cursor = FIRST_CURSOR;
    loop {
        let outcome = requester
            .execute(direction.into(), || {
                api.list_relationship(account, direction, cursor, MAX_PAGE_SIZE)
            })
            .await?;

        let page = match outcome {
            Outcome::Data(page) => page,
            Outcome::NoData { .. } => break,
        };

        ids.extend(page.ids);
        cursor = page.next_cursor;

        tracing::debug!(
            "Fetched {} total {} ids for {}",
            ids.len(),
            direction,
            account
        );

        if cursor == 0 || ids.len() >= limit {
            break;
        }
    }

    Ok(ids)
}

/// Fetches both relationship lists of `account`, each truncated to `limit`
pub async fn fetch_relationships<A: SocialApi + ?Sized>(
    api: &A,
    requester: &Requester,
    account: &AccountRef,
    limit: usize,
) -> Result<RelationshipSet, MutualsError> {
    let mut outgoing = fetch_ids(api, requester, account, Direction::Outgoing, limit).await?;
    let mut incoming = fetch_ids(api, requester, account, Direction::Incoming, limit).await?;
    outgoing.truncate(limit);
    incoming.truncate(limit);
    Ok(RelationshipSet { outgoing, incoming })
}
