//! Network statistics for a crawled graph
//!
//! The graph is treated as undirected and simple: every listed neighbor is an
//! edge, duplicates and self-loops are dropped. Distances are measured on the
//! largest connected component.

use crate::graph::{AccountId, NetworkGraph};
use crate::MutualsError;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Network statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStatistics {
    /// Distinct accounts, expanded or not
    pub nodes: usize,

    /// Undirected edges
    pub edges: usize,

    /// Number of connected components
    pub components: usize,

    /// Nodes in the largest connected component
    pub largest_component: usize,

    /// Longest shortest path within the largest component
    pub diameter: usize,

    /// Mean shortest-path length over ordered node pairs of the largest component
    pub average_distance: f64,
}

impl NetworkStatistics {
    pub fn is_connected(&self) -> bool {
        self.components == 1
    }
}

type Adjacency = BTreeMap<AccountId, BTreeSet<AccountId>>;

fn undirected(graph: &NetworkGraph) -> Adjacency {
    let mut adjacency = Adjacency::new();
    for (account, neighbors) in graph.iter() {
        adjacency.entry(*account).or_default();
        for neighbor in neighbors {
            if neighbor == account {
                continue;
            }
            adjacency.entry(*account).or_default().insert(*neighbor);
            adjacency.entry(*neighbor).or_default().insert(*account);
        }
    }
    adjacency
}

/// Hop counts from `start` to every node it reaches
fn distances_from(adjacency: &Adjacency, start: AccountId) -> HashMap<AccountId, usize> {
    let mut distances = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let next = distances[&current] + 1;
        for neighbor in adjacency.get(&current).into_iter().flatten() {
            if !distances.contains_key(neighbor) {
                distances.insert(*neighbor, next);
                queue.push_back(*neighbor);
            }
        }
    }
    distances
}

fn components(adjacency: &Adjacency) -> Vec<Vec<AccountId>> {
    let mut seen = BTreeSet::new();
    let mut found = Vec::new();
    for node in adjacency.keys() {
        if seen.contains(node) {
            continue;
        }
        let mut members: Vec<AccountId> = distances_from(adjacency, *node).into_keys().collect();
        members.sort();
        seen.extend(members.iter().copied());
        found.push(members);
    }
    found
}

/// Computes node and edge counts, connectedness and distance statistics
pub fn compute_statistics(graph: &NetworkGraph) -> NetworkStatistics {
    let adjacency = undirected(graph);
    let edges = adjacency.values().map(BTreeSet::len).sum::<usize>() / 2;
    let parts = components(&adjacency);

    // Ties go to the component found first, i.e. the one with the smallest id
    let largest = parts
        .iter()
        .fold(None::<&Vec<AccountId>>, |best, part| match best {
            Some(b) if b.len() >= part.len() => Some(b),
            _ => Some(part),
        })
        .cloned()
        .unwrap_or_default();

    let mut diameter = 0;
    let mut total = 0usize;
    for node in &largest {
        for distance in distances_from(&adjacency, *node).into_values() {
            diameter = diameter.max(distance);
            total += distance;
        }
    }

    let n = largest.len();
    let average_distance = if n > 1 {
        total as f64 / (n * (n - 1)) as f64
    } else {
        0.0
    };

    NetworkStatistics {
        nodes: adjacency.len(),
        edges,
        components: parts.len(),
        largest_component: n,
        diameter,
        average_distance,
    }
}

/// Formats the `---Network Information---` report
pub fn format_statistics(stats: &NetworkStatistics) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "---Network Information---");
    let _ = writeln!(report, "Number of nodes: {}", stats.nodes);
    let _ = writeln!(report, "Number of edges: {}", stats.edges);
    if !stats.is_connected() {
        let _ = writeln!(
            report,
            "Components: {} (largest has {} nodes)",
            stats.components, stats.largest_component
        );
    }
    let _ = writeln!(report, "Diameter: {}", stats.diameter);
    let _ = writeln!(report, "Average Distance: {}", stats.average_distance);
    report
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &NetworkStatistics) {
    print!("{}", format_statistics(stats));
}

/// Writes the report to `path`
pub fn write_statistics_report(stats: &NetworkStatistics, path: &Path) -> Result<(), MutualsError> {
    fs::write(path, format_statistics(stats))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(entries: &[(u64, &[u64])]) -> NetworkGraph {
        let mut graph = NetworkGraph::new();
        for (account, neighbors) in entries {
            graph.insert(
                AccountId(*account),
                neighbors.iter().copied().map(AccountId).collect(),
            );
        }
        graph
    }

    #[test]
    fn test_path_graph() {
        // 1 - 2 - 3 - 4
        let stats = compute_statistics(&graph(&[(1, &[2]), (2, &[3]), (3, &[4])]));

        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.edges, 3);
        assert!(stats.is_connected());
        assert_eq!(stats.diameter, 3);
        // Pair distances 1,2,3,1,2,1 over 6 unordered pairs
        assert!((stats.average_distance - 10.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_reciprocal_listing_is_one_edge() {
        let stats = compute_statistics(&graph(&[(1, &[2, 2, 1]), (2, &[1])]));
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.diameter, 1);
        assert!((stats.average_distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disconnected_uses_largest_component() {
        // Triangle {1,2,3} and pair {10,11}
        let stats = compute_statistics(&graph(&[(1, &[2, 3]), (2, &[3]), (10, &[11])]));

        assert_eq!(stats.nodes, 5);
        assert_eq!(stats.edges, 4);
        assert_eq!(stats.components, 2);
        assert_eq!(stats.largest_component, 3);
        assert_eq!(stats.diameter, 1);
    }

    #[test]
    fn test_empty_graph() {
        let stats = compute_statistics(&NetworkGraph::new());
        assert_eq!(stats.nodes, 0);
        assert_eq!(stats.components, 0);
        assert_eq!(stats.diameter, 0);
        assert_eq!(stats.average_distance, 0.0);
    }

    #[test]
    fn test_report_format() {
        let stats = compute_statistics(&graph(&[(1, &[2])]));
        let report = format_statistics(&stats);

        assert_eq!(
            report,
            "---Network Information---\nNumber of nodes: 2\nNumber of edges: 1\nDiameter: 1\nAverage Distance: 1\n"
        );
    }

    #[test]
    fn test_report_mentions_components_when_disconnected() {
        let stats = compute_statistics(&graph(&[(1, &[2]), (3, &[])]));
        assert!(format_statistics(&stats).contains("Components: 2 (largest has 2 nodes)"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("network_info.txt");
        let stats = compute_statistics(&graph(&[(1, &[2])]));

        write_statistics_report(&stats, &path).unwrap();
        assert!(fs::read_to_string(&path)
            .unwrap()
            .starts_with("---Network Information---\n"));
    }
}
