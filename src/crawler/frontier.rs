//! Frontier queue and visited bookkeeping for the crawl
//!
//! This module tracks:
//! - The FIFO queue of accounts pending expansion, in the order they were added
//! - Every account seen so far, as a key or a neighbor (the termination count)
//! - Which accounts have already been expanded, so none is expanded twice

use crate::graph::AccountId;
use std::collections::{HashSet, VecDeque};

/// Frontier of a breadth-first crawl
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    /// Accounts queued for the next pass (may hold duplicates until drained)
    queue: VecDeque<AccountId>,

    /// Every account encountered so far
    visited: HashSet<AccountId>,

    /// Accounts whose neighbors have been computed
    expanded: HashSet<AccountId>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `account` as seen; returns true if it was new
    pub fn visit(&mut self, account: AccountId) -> bool {
        self.visited.insert(account)
    }

    /// Records every id in `accounts` as seen; returns how many were new
    pub fn visit_all<'a>(&mut self, accounts: impl IntoIterator<Item = &'a AccountId>) -> usize {
        accounts
            .into_iter()
            .filter(|id| self.visited.insert(**id))
            .count()
    }

    /// Queues accounts for the next pass, skipping ones already expanded
    pub fn enqueue<'a>(&mut self, accounts: impl IntoIterator<Item = &'a AccountId>) {
        for id in accounts {
            if !self.expanded.contains(id) {
                self.queue.push_back(*id);
            }
        }
    }

    /// Marks `account` expanded; returns false if it already was
    pub fn mark_expanded(&mut self, account: AccountId) -> bool {
        self.expanded.insert(account)
    }

    /// Drains the queue into the list of accounts to expand this pass
    ///
    /// Keeps first-seen order and drops duplicates and already expanded accounts.
    pub fn take_pass(&mut self) -> Vec<AccountId> {
        let mut seen = HashSet::new();
        let expanded = &self.expanded;
        self.queue
            .drain(..)
            .filter(|id| !expanded.contains(id) && seen.insert(*id))
            .collect()
    }

    /// Returns true if no queued account is left to expand
    pub fn is_exhausted(&self) -> bool {
        self.queue.iter().all(|id| self.expanded.contains(id))
    }

    /// Number of distinct accounts seen so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<AccountId> {
        raw.iter().copied().map(AccountId).collect()
    }

    #[test]
    fn test_new_frontier() {
        let frontier = Frontier::new();
        assert_eq!(frontier.visited_count(), 0);
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_visit_deduplicates() {
        let mut frontier = Frontier::new();
        assert!(frontier.visit(AccountId(1)));
        assert!(!frontier.visit(AccountId(1)));
        assert_eq!(frontier.visit_all(&ids(&[1, 2, 3, 2])), 2);
        assert_eq!(frontier.visited_count(), 3);
    }

    #[test]
    fn test_take_pass_keeps_order_and_drops_repeats() {
        let mut frontier = Frontier::new();
        frontier.mark_expanded(AccountId(4));
        frontier.enqueue(&ids(&[3, 1, 4, 3, 2, 1]));

        assert_eq!(frontier.take_pass(), ids(&[3, 1, 2]));
        assert!(frontier.take_pass().is_empty());
    }

    #[test]
    fn test_exhausted_when_only_expanded_remain() {
        let mut frontier = Frontier::new();
        frontier.enqueue(&ids(&[7, 8]));
        assert!(!frontier.is_exhausted());

        frontier.mark_expanded(AccountId(7));
        frontier.mark_expanded(AccountId(8));
        assert!(frontier.is_exhausted());
        assert!(frontier.take_pass().is_empty());
    }

    #[test]
    fn test_mark_expanded_once() {
        let mut frontier = Frontier::new();
        assert!(frontier.mark_expanded(AccountId(1)));
        assert!(!frontier.mark_expanded(AccountId(1)));
        assert_eq!(frontier.expanded_count(), 1);
    }
}
