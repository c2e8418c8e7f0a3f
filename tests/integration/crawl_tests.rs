//! Integration tests for the crawler
//!
//! These tests drive full crawls end-to-end, over the in-memory API and over
//! HTTP against a wiremock server with a real checkpoint database.

use mutuals::api::{CallKind, InMemoryApi};
use mutuals::config::{parse_config, Config};
use mutuals::crawler::{crawl, run_crawl, CancelSignal, CrawlParams, Requester};
use mutuals::output::{compute_statistics, read_graph};
use mutuals::storage::{RunStatus, SqliteStorage, Storage};
use mutuals::{AccountId, AccountRef, CrawlPhase, MutualsError, NetworkCrawler};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Five-way tree where node `k` is mutual with `5k-3 ..= 5k+1`
///
/// Popularity equals the id, so each node's children outrank its parent.
fn tree_api(nodes: u64) -> InMemoryApi {
    let mut api = InMemoryApi::new();
    for id in 1..=nodes {
        api.add_account(id, id);
    }
    for parent in 1..=nodes {
        for child in (5 * parent - 3)..=(5 * parent + 1) {
            if child <= nodes {
                api.add_mutual(parent, child);
            }
        }
    }
    api
}

fn ids(raw: &[u64]) -> Vec<AccountId> {
    raw.iter().copied().map(AccountId).collect()
}

#[tokio::test]
async fn test_crawl_reaches_threshold_through_disjoint_subtrees() {
    let mut api = tree_api(156);
    api.set_handle(1, "seed");

    let params = CrawlParams {
        per_node_limit: 500,
        target_threshold: 100,
        top_k: 5,
        max_passes: None,
    };
    let graph = crawl(&api, Requester::default(), &AccountRef::parse("@seed"), params)
        .await
        .unwrap();

    assert_eq!(graph.get(&AccountId(1)), Some(&ids(&[6, 5, 4, 3, 2])[..]));
    // Seed, its five neighbors, then their 25 children
    assert_eq!(graph.len(), 31);
    assert!(graph.distinct_nodes().len() >= 100);
    assert_eq!(graph.distinct_nodes().len(), 156);

    // Every account was expanded once: two list calls each
    assert_eq!(api.call_count(CallKind::Friends), 31);
    assert_eq!(api.call_count(CallKind::Followers), 31);
    assert_eq!(api.call_count(CallKind::Resolve), 1);
    assert!(api.lookup_batches().iter().all(|batch| batch.len() <= 100));
}

#[tokio::test]
async fn test_statistics_of_crawled_tree() {
    let api = tree_api(31);
    let mut crawler = NetworkCrawler::new(
        &api,
        Requester::default(),
        CrawlParams {
            per_node_limit: 500,
            target_threshold: 31,
            top_k: 5,
            max_passes: None,
        },
    );

    let graph = crawler.run(&AccountRef::Id(AccountId(1))).await.unwrap();
    assert_eq!(crawler.phase(), CrawlPhase::Done);

    let stats = compute_statistics(&graph);
    assert_eq!(stats.nodes, 31);
    assert_eq!(stats.edges, 30);
    assert!(stats.is_connected());
    // Leaf to leaf through the seed
    assert_eq!(stats.diameter, 4);
}

#[tokio::test]
async fn test_wide_reciprocal_set_is_looked_up_in_batches() {
    let mut api = InMemoryApi::new();
    api.add_account(1, 0);
    for id in 2..=251 {
        api.add_account(id, id);
        api.add_mutual(1, id);
    }

    let graph = crawl(
        &api,
        Requester::default(),
        &AccountRef::Id(AccountId(1)),
        CrawlParams {
            per_node_limit: 500,
            target_threshold: 3,
            top_k: 2,
            max_passes: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(graph.get(&AccountId(1)), Some(&ids(&[251, 250])[..]));
    let sizes: Vec<usize> = api.lookup_batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
}

fn write_config(
    dir: &TempDir,
    server: &MockServer,
    seed: &str,
    threshold: usize,
) -> (Config, String) {
    let db = dir.path().join("crawl.db");
    let graph = dir.path().join("out").join("graph.json");
    let text = format!(
        r#"
[api]
base-url = "{}/1.1"
bearer-token = "test-token"
timeout-secs = 5

[user-agent]
client-name = "MutualsTest"
client-version = "1.0"
contact-url = "https://example.com/about"

[retry]
initial-wait-secs = 0.01
max-server-wait-secs = 1.0

[crawl]
seed = "{}"
target-threshold = {}

[output]
database-path = "{}"
graph-path = "{}"
"#,
        server.uri(),
        seed,
        threshold,
        db.display(),
        graph.display()
    );
    let hash = format!("hash-{}", text.len());
    (parse_config(&text).unwrap(), hash)
}

async fn mount_seed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "root"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": 1}"#))
        .mount(server)
        .await;
}

async fn mount_relationships(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/1.1/friends/ids.json"))
        .and(query_param("user_id", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"ids": [2, 3, 5], "next_cursor": 0}"#),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/1.1/followers/ids.json"))
        .and(query_param("user_id", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"ids": [2, 3, 4], "next_cursor": 0}"#),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/1.1/users/lookup.json"))
        .and(query_param("user_id", "2,3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id": 2, "screen_name": "two", "followers_count": 10},
                {"id": 3, "screen_name": "three", "followers_count": 30}]"#,
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_crawl_writes_graph_and_checkpoint() {
    let server = MockServer::start().await;
    mount_seed(&server).await;
    mount_relationships(&server).await;

    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, "@root", 3);

    let graph = run_crawl(&config, &hash, false, CancelSignal::never())
        .await
        .unwrap();
    assert_eq!(graph.get(&AccountId(1)), Some(&ids(&[3, 2])[..]));

    let written = read_graph(Path::new(&config.output.graph_path)).unwrap();
    assert_eq!(written.get(&AccountId(1)), Some(&ids(&[3, 2])[..]));

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.seed, "@root");
    assert_eq!(storage.count_expansions(run.id).unwrap(), 1);
}

#[tokio::test]
async fn test_http_crawl_retries_server_errors() {
    let server = MockServer::start().await;
    mount_seed(&server).await;
    Mock::given(method("GET"))
        .and(path("/1.1/friends/ids.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_relationships(&server).await;

    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, "root", 3);

    let graph = run_crawl(&config, &hash, false, CancelSignal::never())
        .await
        .unwrap();
    assert_eq!(graph.get(&AccountId(1)), Some(&ids(&[3, 2])[..]));
}

#[tokio::test]
async fn test_http_crawl_resumes_from_checkpoint() {
    let server = MockServer::start().await;
    mount_seed(&server).await;
    Mock::given(method("GET"))
        .and(path("/1.1/friends/ids.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, "@root", 3);

    let run_id = {
        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
        let run_id = storage.create_run("@root", &hash).unwrap();
        storage
            .record_expansion(run_id, AccountId(1), &ids(&[9, 8]))
            .unwrap();
        storage
            .update_run_status(run_id, RunStatus::Interrupted)
            .unwrap();
        run_id
    };

    let graph = run_crawl(&config, &hash, false, CancelSignal::never())
        .await
        .unwrap();
    assert_eq!(graph.get(&AccountId(1)), Some(&ids(&[9, 8])[..]));

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, run_id);
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_http_crawl_unknown_seed_marks_run_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, "ghost", 3);

    let err = run_crawl(&config, &hash, true, CancelSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, MutualsError::SeedNotFound { .. }));
    assert!(!Path::new(&config.output.graph_path).exists());

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}
