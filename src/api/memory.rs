//! In-process social API
//!
//! `InMemoryApi` serves a fixed account graph from memory. It paginates
//! relationship listings with integer cursors, can be told to fail upcoming
//! calls with scripted errors, and logs every call it receives so tests can
//! assert on the exact request sequence.

use crate::api::{ApiError, ApiResult, Direction, IdPage, SocialApi, MAX_LOOKUP_BATCH};
use crate::graph::{AccountId, AccountProfile, AccountRef};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Kinds of remote call, used for failure injection and the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Resolve,
    Lookup,
    Friends,
    Followers,
}

impl From<Direction> for CallKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Outgoing => CallKind::Friends,
            Direction::Incoming => CallKind::Followers,
        }
    }
}

/// A logged call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Resolve(String),
    Lookup(Vec<AccountId>),
    Page {
        account: AccountRef,
        direction: Direction,
        cursor: i64,
    },
}

#[derive(Debug, Default)]
struct Account {
    handle: Option<String>,
    popularity: u64,
    friends: Vec<AccountId>,
    followers: Vec<AccountId>,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<Call>,
    failures: HashMap<CallKind, VecDeque<ApiError>>,
}

/// Deterministic in-memory `SocialApi`
#[derive(Debug)]
pub struct InMemoryApi {
    accounts: HashMap<AccountId, Account>,
    page_size: usize,
    inner: Mutex<Inner>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            page_size: 5000,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Caps every relationship page at `page_size` ids
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Registers an account with its popularity metric
    pub fn add_account(&mut self, id: u64, popularity: u64) -> &mut Self {
        self.accounts.entry(AccountId(id)).or_default().popularity = popularity;
        self
    }

    /// Gives an account a resolvable handle
    pub fn set_handle(&mut self, id: u64, handle: &str) -> &mut Self {
        self.accounts.entry(AccountId(id)).or_default().handle = Some(handle.to_string());
        self
    }

    /// Sets the accounts `id` follows
    pub fn set_friends(&mut self, id: u64, friends: &[u64]) -> &mut Self {
        self.accounts.entry(AccountId(id)).or_default().friends =
            friends.iter().copied().map(AccountId).collect();
        self
    }

    /// Sets the accounts following `id`
    pub fn set_followers(&mut self, id: u64, followers: &[u64]) -> &mut Self {
        self.accounts.entry(AccountId(id)).or_default().followers =
            followers.iter().copied().map(AccountId).collect();
        self
    }

    /// Makes `a` and `b` follow each other
    pub fn add_mutual(&mut self, a: u64, b: u64) -> &mut Self {
        for (from, to) in [(a, b), (b, a)] {
            let account = self.accounts.entry(AccountId(from)).or_default();
            account.friends.push(AccountId(to));
            account.followers.push(AccountId(to));
        }
        self
    }

    /// Queues errors returned by the next calls of `kind`, in order
    pub fn fail_next(&self, kind: CallKind, errors: impl IntoIterator<Item = ApiError>) {
        let mut inner = self.lock();
        inner.failures.entry(kind).or_default().extend(errors);
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of calls of `kind` received so far
    pub fn call_count(&self, kind: CallKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| match call {
                Call::Resolve(_) => kind == CallKind::Resolve,
                Call::Lookup(_) => kind == CallKind::Lookup,
                Call::Page { direction, .. } => CallKind::from(*direction) == kind,
            })
            .count()
    }

    /// Id sets passed to each profile lookup call
    pub fn lookup_batches(&self) -> Vec<Vec<AccountId>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Lookup(ids) => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panicked test thread must not hide the log from the others
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, kind: CallKind, call: Call) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match inner.failures.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn find(&self, account: &AccountRef) -> Option<(&AccountId, &Account)> {
        match account {
            AccountRef::Id(id) => self.accounts.get_key_value(id),
            AccountRef::Handle(handle) => self
                .accounts
                .iter()
                .find(|(_, a)| a.handle.as_deref() == Some(handle.as_str())),
        }
    }
}

#[async_trait]
impl SocialApi for InMemoryApi {
    async fn resolve_handle(&self, handle: &str) -> ApiResult<AccountId> {
        self.record(CallKind::Resolve, Call::Resolve(handle.to_string()))?;
        self.find(&AccountRef::Handle(handle.to_string()))
            .map(|(id, _)| *id)
            .ok_or_else(|| ApiError::status(404))
    }

    async fn lookup_profiles(&self, ids: &[AccountId]) -> ApiResult<Vec<AccountProfile>> {
        self.record(CallKind::Lookup, Call::Lookup(ids.to_vec()))?;
        if ids.len() > MAX_LOOKUP_BATCH {
            return Err(ApiError::Status {
                status: 400,
                message: format!("Too many ids in lookup: {}", ids.len()),
            });
        }

        Ok(ids
            .iter()
            .filter_map(|id| {
                self.accounts.get(id).map(|account| AccountProfile {
                    id: *id,
                    handle: account.handle.clone(),
                    popularity: account.popularity,
                })
            })
            .collect())
    }

    async fn list_relationship(
        &self,
        account: &AccountRef,
        direction: Direction,
        cursor: i64,
        count: u32,
    ) -> ApiResult<IdPage> {
        self.record(
            direction.into(),
            Call::Page {
                account: account.clone(),
                direction,
                cursor,
            },
        )?;

        let (_, found) = self.find(account).ok_or_else(|| ApiError::status(404))?;
        let ids = match direction {
            Direction::Outgoing => &found.friends,
            Direction::Incoming => &found.followers,
        };

        // Cursors are list offsets; -1 is the first page
        let start = if cursor < 0 { 0 } else { cursor as usize };
        let size = self.page_size.min(count as usize).max(1);
        let end = (start + size).min(ids.len());
        let page = ids.get(start..end).unwrap_or_default().to_vec();
        let next_cursor = if end >= ids.len() { 0 } else { end as i64 };

        Ok(IdPage {
            ids: page,
            next_cursor,
        })
    }
}
