//! Reciprocal set computation and popularity ranking

use crate::api::SocialApi;
use crate::crawler::profiles::lookup_profiles;
use crate::crawler::requester::Requester;
use crate::graph::{AccountId, AccountProfile};
use crate::MutualsError;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Accounts present on both sides of a relationship set
pub type ReciprocalSet = BTreeSet<AccountId>;

/// Set intersection of two id sequences
pub fn reciprocal(a: &[AccountId], b: &[AccountId]) -> ReciprocalSet {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let lookup: HashSet<&AccountId> = small.iter().collect();
    large
        .iter()
        .filter(|id| lookup.contains(id))
        .copied()
        .collect()
}

/// Ranking order: popularity descending, then id ascending
pub fn rank_order(a: &AccountProfile, b: &AccountProfile) -> Ordering {
    b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id))
}

/// Returns the `k` most popular of `ids`
///
/// Ids whose profile lookup returned nothing are left out, so the result holds
/// `min(k, |ids|)` entries only when every lookup succeeds.
pub async fn select_top_k<A: SocialApi + ?Sized>(
    api: &A,
    requester: &Requester,
    ids: &[AccountId],
    k: usize,
) -> Result<Vec<AccountId>, MutualsError> {
    if k == 0 || ids.is_empty() {
        return Ok(Vec::new());
    }

    let profiles = lookup_profiles(api, requester, ids).await?;
    let mut ranked: Vec<AccountProfile> = profiles.into_values().collect();
    ranked.sort_by(rank_order);

    Ok(ranked.into_iter().take(k).map(|p| p.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryApi;

    fn ids(raw: &[u64]) -> Vec<AccountId> {
        raw.iter().copied().map(AccountId).collect()
    }

    #[test]
    fn test_intersection_is_commutative() {
        let a = ids(&[5, 1, 9, 3, 3, 12]);
        let b = ids(&[3, 4, 5, 6]);
        assert_eq!(reciprocal(&a, &b), reciprocal(&b, &a));
        assert_eq!(
            reciprocal(&a, &b),
            ids(&[3, 5]).into_iter().collect::<ReciprocalSet>()
        );
    }

    #[test]
    fn test_intersection_edge_cases() {
        assert!(reciprocal(&[], &ids(&[1, 2])).is_empty());
        assert!(reciprocal(&ids(&[1]), &ids(&[2])).is_empty());
        let same = ids(&[7, 8]);
        assert_eq!(reciprocal(&same, &same).len(), 2);
    }

    #[test]
    fn test_intersection_does_not_touch_inputs() {
        let a = ids(&[3, 2, 1]);
        let b = ids(&[1, 3]);
        let _ = reciprocal(&a, &b);
        assert_eq!(a, ids(&[3, 2, 1]));
        assert_eq!(b, ids(&[1, 3]));
    }

    #[test]
    fn test_rank_order_breaks_ties_by_id() {
        let mut profiles = vec![
            AccountProfile::new(9, 50),
            AccountProfile::new(2, 50),
            AccountProfile::new(4, 70),
        ];
        profiles.sort_by(rank_order);
        let order: Vec<u64> = profiles.iter().map(|p| p.id.0).collect();
        assert_eq!(order, vec![4, 2, 9]);
    }

    #[tokio::test]
    async fn test_select_top_k_returns_most_popular() {
        let mut api = InMemoryApi::new();
        for (id, followers) in [(1, 10), (2, 500), (3, 40), (4, 500), (5, 1)] {
            api.add_account(id, followers);
        }
        let requester = Requester::default();
        let all = ids(&[1, 2, 3, 4, 5]);

        let top = select_top_k(&api, &requester, &all, 3).await.unwrap();
        assert_eq!(top, ids(&[2, 4, 3]));

        // Every returned id is at least as popular as every id left out
        let popularity = |id: &AccountId| match id.0 {
            1 => 10,
            2 | 4 => 500,
            3 => 40,
            _ => 1,
        };
        for x in &top {
            for y in all.iter().filter(|y| !top.contains(y)) {
                assert!(popularity(x) >= popularity(y));
            }
        }
    }

    #[tokio::test]
    async fn test_select_top_k_with_fewer_ids_than_k() {
        let mut api = InMemoryApi::new();
        api.add_account(1, 10).add_account(2, 20);
        let requester = Requester::default();

        let top = select_top_k(&api, &requester, &ids(&[1, 2]), 5).await.unwrap();
        assert_eq!(top, ids(&[2, 1]));

        let none = select_top_k(&api, &requester, &[], 5).await.unwrap();
        assert!(none.is_empty());
    }
}
