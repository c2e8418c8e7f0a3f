//! Chunked profile lookups

use crate::api::{SocialApi, MAX_LOOKUP_BATCH};
use crate::crawler::requester::{Outcome, RequestStep, Requester};
use crate::graph::{AccountId, AccountProfile};
use crate::MutualsError;
use std::collections::{HashMap, HashSet};

/// Looks up profiles for `ids`, one call per chunk of at most 100 ids
///
/// Duplicate ids are looked up once. A chunk that comes back with no data
/// contributes nothing; its ids are simply absent from the result.
pub async fn lookup_profiles<A: SocialApi + ?Sized>(
    api: &A,
    requester: &Requester,
    ids: &[AccountId],
) -> Result<HashMap<AccountId, AccountProfile>, MutualsError> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<AccountId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    let mut profiles = HashMap::with_capacity(unique.len());
    for chunk in unique.chunks(MAX_LOOKUP_BATCH) {
        let outcome = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(chunk))
            .await?;

        match outcome {
            Outcome::Data(batch) => {
                tracing::debug!("Looked up {} of {} profiles", batch.len(), chunk.len());
                for profile in batch {
                    profiles.insert(profile.id, profile);
                }
            }
            Outcome::NoData { class } => {
                tracing::debug!("Profile chunk of {} ids returned {}", chunk.len(), class);
            }
        }
    }

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, CallKind, InMemoryApi};

    fn api_with_accounts(count: u64) -> InMemoryApi {
        let mut api = InMemoryApi::new();
        for id in 0..count {
            api.add_account(id, id * 10);
        }
        api
    }

    #[tokio::test]
    async fn test_chunks_never_exceed_batch_limit() {
        let api = api_with_accounts(250);
        let requester = Requester::default();
        let ids: Vec<AccountId> = (0..250).map(AccountId).collect();

        let profiles = lookup_profiles(&api, &requester, &ids).await.unwrap();

        let batches = api.lookup_batches();
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() <= MAX_LOOKUP_BATCH));
        assert_eq!(profiles.len(), 250);
    }

    #[tokio::test]
    async fn test_keys_equal_deduplicated_input() {
        let api = api_with_accounts(150);
        let requester = Requester::default();
        let mut ids: Vec<AccountId> = (0..150).map(AccountId).collect();
        ids.extend((0..150).rev().map(AccountId));

        let profiles = lookup_profiles(&api, &requester, &ids).await.unwrap();

        let expected: HashSet<AccountId> = ids.iter().copied().collect();
        let keys: HashSet<AccountId> = profiles.keys().copied().collect();
        assert_eq!(keys, expected);
        assert_eq!(api.lookup_batches().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let api = api_with_accounts(1);
        let requester = Requester::default();

        let profiles = lookup_profiles(&api, &requester, &[]).await.unwrap();

        assert!(profiles.is_empty());
        assert_eq!(api.call_count(CallKind::Lookup), 0);
    }

    #[tokio::test]
    async fn test_no_data_chunk_is_skipped() {
        let api = api_with_accounts(120);
        api.fail_next(CallKind::Lookup, [ApiError::status(404)]);
        let requester = Requester::default();
        let ids: Vec<AccountId> = (0..120).map(AccountId).collect();

        let profiles = lookup_profiles(&api, &requester, &ids).await.unwrap();

        assert_eq!(profiles.len(), 20);
        assert!(profiles.contains_key(&AccountId(119)));
        assert!(!profiles.contains_key(&AccountId(0)));
    }
}
