use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque numeric identifier of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(AccountId)
    }
}

impl From<u64> for AccountId {
    fn from(value: u64) -> Self {
        AccountId(value)
    }
}

/// Reference to an account, either by numeric id or by human-readable handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRef {
    Id(AccountId),
    Handle(String),
}

impl AccountRef {
    /// Parses a seed string
    ///
    /// An all-digit string is taken as an id. Anything else is a handle, with a
    /// leading `@` stripped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse::<AccountId>() {
                return AccountRef::Id(id);
            }
        }
        AccountRef::Handle(raw.trim_start_matches('@').to_string())
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        AccountRef::Id(id)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Id(id) => write!(f, "{}", id),
            AccountRef::Handle(handle) => write!(f, "@{}", handle),
        }
    }
}

/// Ranking attributes of one account, as returned by a profile lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: AccountId,

    #[serde(rename = "screen_name", default)]
    pub handle: Option<String>,

    /// Popularity metric used for ranking (follower count)
    #[serde(rename = "followers_count", default)]
    pub popularity: u64,
}

impl AccountProfile {
    pub fn new(id: u64, popularity: u64) -> Self {
        Self {
            id: AccountId(id),
            handle: None,
            popularity,
        }
    }
}
