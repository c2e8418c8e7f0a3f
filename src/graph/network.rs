use crate::graph::AccountId;
use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Sampled adjacency produced by a crawl
///
/// Maps every expanded account to its ranked neighbor list. Keys keep the order
/// in which they were expanded and each key is written exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkGraph {
    order: Vec<AccountId>,
    adjacency: HashMap<AccountId, Vec<AccountId>>,
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the neighbor list of `account`
    ///
    /// Returns `false` and leaves the graph untouched if `account` is already a key.
    pub fn insert(&mut self, account: AccountId, neighbors: Vec<AccountId>) -> bool {
        if self.adjacency.contains_key(&account) {
            return false;
        }
        self.order.push(account);
        self.adjacency.insert(account, neighbors);
        true
    }

    pub fn get(&self, account: &AccountId) -> Option<&[AccountId]> {
        self.adjacency.get(account).map(Vec::as_slice)
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.adjacency.contains_key(account)
    }

    /// Number of expanded accounts (keys)
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Expanded accounts in expansion order
    pub fn keys(&self) -> impl Iterator<Item = &AccountId> {
        self.order.iter()
    }

    /// `(account, neighbors)` pairs in expansion order
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &[AccountId])> {
        self.order
            .iter()
            .filter_map(|id| self.adjacency.get(id).map(|n| (id, n.as_slice())))
    }

    /// Every account appearing as a key or a neighbor, de-duplicated
    pub fn distinct_nodes(&self) -> HashSet<AccountId> {
        let mut nodes = HashSet::new();
        for (id, neighbors) in self.iter() {
            nodes.insert(*id);
            nodes.extend(neighbors.iter().copied());
        }
        nodes
    }

    /// String-keyed form handed to persistence layers
    pub fn to_string_map(&self) -> BTreeMap<String, Vec<String>> {
        self.iter()
            .map(|(id, neighbors)| {
                (
                    id.to_string(),
                    neighbors.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect()
    }
}

impl Serialize for NetworkGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (id, neighbors) in self.iter() {
            let values: Vec<String> = neighbors.iter().map(|n| n.to_string()).collect();
            map.serialize_entry(&id.to_string(), &values)?;
        }
        map.end()
    }
}

/// Neighbor ids may be written as JSON strings or numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_id<E: serde::de::Error>(self) -> Result<AccountId, E> {
        match self {
            RawId::Number(n) => Ok(AccountId(n)),
            RawId::Text(s) => s
                .parse()
                .map_err(|_| E::custom(format!("invalid account id '{}'", s))),
        }
    }
}

struct GraphVisitor;

impl<'de> Visitor<'de> for GraphVisitor {
    type Value = NetworkGraph;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from account id to a list of account ids")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut graph = NetworkGraph::new();
        while let Some((key, values)) = access.next_entry::<String, Vec<RawId>>()? {
            let id: AccountId = key
                .parse()
                .map_err(|_| M::Error::custom(format!("invalid account id '{}'", key)))?;
            let neighbors = values
                .into_iter()
                .map(RawId::into_id)
                .collect::<Result<Vec<_>, M::Error>>()?;
            graph.insert(id, neighbors);
        }
        Ok(graph)
    }
}

impl<'de> Deserialize<'de> for NetworkGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Entries arrive in file order, which is the expansion order
        deserializer.deserialize_map(GraphVisitor)
    }
}
