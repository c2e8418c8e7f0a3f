//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the frontier-expansion loop that turns a seed account
//! into a sampled `NetworkGraph`:
//! - Resolving the seed and expanding it first
//! - Expanding the frontier pass by pass until enough accounts are known
//! - Checkpointing each expansion and replaying checkpoints on resume
//! - Wiring configuration, HTTP client, storage and output together

use crate::api::{HttpApi, SocialApi};
use crate::config::{Config, CrawlConfig};
use crate::crawler::backoff::RetryPolicy;
use crate::crawler::cancel::CancelSignal;
use crate::crawler::frontier::Frontier;
use crate::crawler::paging::fetch_relationships;
use crate::crawler::ranking::select_top_k;
use crate::crawler::requester::{Outcome, RequestStep, Requester};
use crate::graph::{AccountId, AccountRef, NetworkGraph};
use crate::output::write_graph;
use crate::state::CrawlPhase;
use crate::storage::{open_storage, RunCheckpoint, RunStatus, Storage};
use crate::MutualsError;
use std::collections::HashMap;
use std::path::Path;

/// Scope of one crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlParams {
    /// Cap on each of the friend and follower lists fetched per account
    pub per_node_limit: usize,

    /// Crawl stops once this many distinct accounts have been seen
    pub target_threshold: usize,

    /// Neighbors kept per expanded account
    pub top_k: usize,

    /// Optional hard cap on expansion passes
    pub max_passes: Option<u32>,
}

impl Default for CrawlParams {
    fn default() -> Self {
        Self {
            per_node_limit: 500,
            target_threshold: 100,
            top_k: 5,
            max_passes: None,
        }
    }
}

impl From<&CrawlConfig> for CrawlParams {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            per_node_limit: config.per_node_limit,
            target_threshold: config.target_threshold,
            top_k: config.top_k,
            max_passes: config.max_passes,
        }
    }
}

/// Receives every expansion as soon as it is computed
pub trait ExpansionSink {
    fn record_expansion(
        &mut self,
        account: AccountId,
        neighbors: &[AccountId],
    ) -> Result<(), MutualsError>;
}

/// Breadth-first reciprocal-friend crawler
///
/// Exactly one remote call is in flight at a time; accounts are expanded in
/// the order they entered the frontier and never more than once.
pub struct NetworkCrawler<'a, A: SocialApi + ?Sized> {
    api: &'a A,
    requester: Requester,
    params: CrawlParams,
    phase: CrawlPhase,
    graph: NetworkGraph,
    frontier: Frontier,
    replay: HashMap<AccountId, Vec<AccountId>>,
    checkpoint: Option<Box<dyn ExpansionSink + 'a>>,
    passes: u32,
}

impl<'a, A: SocialApi + ?Sized> NetworkCrawler<'a, A> {
    pub fn new(api: &'a A, requester: Requester, params: CrawlParams) -> Self {
        Self {
            api,
            requester,
            params,
            phase: CrawlPhase::Seeding,
            graph: NetworkGraph::new(),
            frontier: Frontier::new(),
            replay: HashMap::new(),
            checkpoint: None,
            passes: 0,
        }
    }

    /// Reuses previously checkpointed expansions instead of querying them again
    pub fn with_replay(mut self, prior: NetworkGraph) -> Self {
        self.replay = prior
            .iter()
            .map(|(id, neighbors)| (*id, neighbors.to_vec()))
            .collect();
        self
    }

    /// Hands every fresh expansion to `sink`
    pub fn with_checkpoint(mut self, sink: Box<dyn ExpansionSink + 'a>) -> Self {
        self.checkpoint = Some(sink);
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// The graph accumulated so far
    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn visited_count(&self) -> usize {
        self.frontier.visited_count()
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(NetworkGraph)` - The threshold was reached
    /// * `Err(MutualsError)` - A fatal request error, a stall, or cancellation;
    ///   the partial graph stays available through `graph()`
    pub async fn run(&mut self, seed: &AccountRef) -> Result<NetworkGraph, MutualsError> {
        match self.run_phases(seed).await {
            Ok(()) => Ok(self.graph.clone()),
            Err(e) => {
                if !self.phase.is_terminal() {
                    self.phase.transition(CrawlPhase::Failed)?;
                }
                tracing::error!("Crawl failed after {} passes: {}", self.passes, e);
                Err(e)
            }
        }
    }

    async fn run_phases(&mut self, seed: &AccountRef) -> Result<(), MutualsError> {
        if self.phase != CrawlPhase::Seeding {
            return Err(MutualsError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Seeding,
            });
        }

        // ===== Seeding =====
        let seed_id = self.resolve_seed(seed).await?;
        tracing::info!("Seed {} resolved to {}", seed, seed_id);

        self.frontier.visit(seed_id);
        let top = self.expand(seed_id).await?;
        self.frontier.visit_all(&top);
        self.frontier.enqueue(&top);
        self.phase.transition(CrawlPhase::Expanding)?;

        // ===== Expanding =====
        let target = self.params.target_threshold;
        while self.frontier.visited_count() < target {
            if let Some(max) = self.params.max_passes {
                if self.passes >= max {
                    tracing::warn!("Reached the limit of {} expansion passes", max);
                    return Err(self.stalled());
                }
            }

            if self.frontier.is_exhausted() {
                tracing::warn!("Frontier exhausted before reaching {} accounts", target);
                return Err(self.stalled());
            }
            let pass = self.frontier.take_pass();

            self.passes += 1;
            tracing::debug!("Pass {}: expanding {} accounts", self.passes, pass.len());

            let mut next = Vec::new();
            for account in pass {
                let top = self.expand(account).await?;
                next.extend(top);
            }

            let added = self.frontier.visit_all(&next);
            self.frontier.enqueue(&next);
            tracing::info!(
                "Crawled {} nodes (+{} in pass {}, {} expanded)",
                self.frontier.visited_count(),
                added,
                self.passes,
                self.frontier.expanded_count()
            );
        }

        // ===== Done =====
        self.phase.transition(CrawlPhase::Done)?;
        tracing::info!(
            "Crawl complete: {} accounts, {} expanded, {} passes",
            self.frontier.visited_count(),
            self.graph.len(),
            self.passes
        );
        Ok(())
    }

    fn stalled(&self) -> MutualsError {
        MutualsError::Stalled {
            passes: self.passes,
            visited: self.frontier.visited_count(),
            target: self.params.target_threshold,
        }
    }

    /// Resolves a handle to an id; ids pass through without a call
    async fn resolve_seed(&self, seed: &AccountRef) -> Result<AccountId, MutualsError> {
        let handle = match seed {
            AccountRef::Id(id) => return Ok(*id),
            AccountRef::Handle(handle) => handle,
        };

        let outcome = self
            .requester
            .execute(RequestStep::ResolveSeed, || self.api.resolve_handle(handle))
            .await?;

        match outcome {
            Outcome::Data(id) => Ok(id),
            Outcome::NoData { .. } => Err(MutualsError::SeedNotFound {
                seed: seed.to_string(),
            }),
        }
    }

    /// Computes, records and returns the top-K reciprocal friends of `account`
    async fn expand(&mut self, account: AccountId) -> Result<Vec<AccountId>, MutualsError> {
        self.frontier.mark_expanded(account);

        let top = match self.replay.remove(&account) {
            Some(mut cached) => {
                tracing::debug!("Replaying checkpointed expansion of {}", account);
                cached.truncate(self.params.top_k);
                cached
            }
            None => {
                let relationships = fetch_relationships(
                    self.api,
                    &self.requester,
                    &AccountRef::Id(account),
                    self.params.per_node_limit,
                )
                .await?;
                let reciprocal: Vec<AccountId> = relationships.reciprocal().into_iter().collect();
                tracing::debug!(
                    "{} has {} reciprocal friends ({} friends, {} followers)",
                    account,
                    reciprocal.len(),
                    relationships.outgoing.len(),
                    relationships.incoming.len()
                );

                let top =
                    select_top_k(self.api, &self.requester, &reciprocal, self.params.top_k).await?;
                if let Some(sink) = self.checkpoint.as_mut() {
                    sink.record_expansion(account, &top)?;
                }
                top
            }
        };

        self.graph.insert(account, top.clone());
        Ok(top)
    }
}

/// Crawls the reciprocal-friend network around `seed`
///
/// # Arguments
///
/// * `api` - The remote API
/// * `requester` - Retry layer all calls go through
/// * `seed` - Seed account, by id or handle
/// * `params` - Per-node limit, target threshold and top-K
///
/// # Example
///
/// ```no_run
/// use mutuals::api::InMemoryApi;
/// use mutuals::crawler::{crawl, CrawlParams, Requester};
/// use mutuals::AccountRef;
///
/// # async fn example() -> Result<(), mutuals::MutualsError> {
/// let api = InMemoryApi::new();
/// let seed = AccountRef::parse("42");
/// let graph = crawl(&api, Requester::default(), &seed, CrawlParams::default()).await?;
/// println!("{} accounts expanded", graph.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl<A: SocialApi + ?Sized>(
    api: &A,
    requester: Requester,
    seed: &AccountRef,
    params: CrawlParams,
) -> Result<NetworkGraph, MutualsError> {
    NetworkCrawler::new(api, requester, params).run(seed).await
}

/// Opens the checkpoint run to write into, resuming an unfinished one unless `fresh`
///
/// Returns the run id and the expansions already recorded for it.
pub fn open_run<S: Storage + ?Sized>(
    storage: &mut S,
    seed: &str,
    config_hash: &str,
    fresh: bool,
) -> Result<(i64, NetworkGraph), MutualsError> {
    if !fresh {
        if let Some(latest) = storage.get_latest_run()? {
            let resumable = latest.status.is_resumable();
            if resumable && latest.seed == seed && latest.config_hash != config_hash {
                tracing::warn!(
                    "Configuration changed since run {} started, starting a new run",
                    latest.id
                );
                storage.update_run_status(latest.id, RunStatus::Failed)?;
            } else if resumable && latest.seed == seed {
                let prior = storage.load_expansions(latest.id)?;
                tracing::info!(
                    "Resuming run {} with {} checkpointed expansions",
                    latest.id,
                    prior.len()
                );
                storage.update_run_status(latest.id, RunStatus::Running)?;
                return Ok((latest.id, prior));
            }
        }
    }

    let run_id = storage.create_run(seed, config_hash)?;
    tracing::info!("Starting new run {}", run_id);
    Ok((run_id, NetworkGraph::new()))
}

/// Records how a crawl ended and hands back its result
///
/// A storage failure never masks the crawl's own error; it is logged instead.
pub fn finish_run<S: Storage + ?Sized>(
    storage: &mut S,
    run_id: i64,
    result: Result<NetworkGraph, MutualsError>,
) -> Result<NetworkGraph, MutualsError> {
    let finished = match &result {
        Ok(_) => storage.complete_run(run_id),
        Err(MutualsError::Cancelled { .. }) => {
            storage.update_run_status(run_id, RunStatus::Interrupted)
        }
        Err(_) => storage.update_run_status(run_id, RunStatus::Failed),
    };

    match (result, finished) {
        (Ok(graph), finished) => {
            finished?;
            Ok(graph)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(storage_error)) => {
            tracing::error!("Could not record the end of run {}: {}", run_id, storage_error);
            Err(e)
        }
    }
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire crawl process:
///
/// 1. Build the HTTP API client and the retry layer
/// 2. Open the checkpoint database and resume or create a run
/// 3. Crawl, checkpointing every expansion
/// 4. Mark the run completed, interrupted or failed
/// 5. Write the graph JSON file
///
/// # Example
///
/// ```no_run
/// use mutuals::config::load_config_with_hash;
/// use mutuals::crawler::{run_crawl, CancelSignal};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("mutuals.toml"))?;
/// run_crawl(&config, &hash, false, CancelSignal::never()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    config_hash: &str,
    fresh: bool,
    cancel: CancelSignal,
) -> Result<NetworkGraph, MutualsError> {
    let api = HttpApi::new(&config.api, &config.user_agent)?;
    let requester = Requester::new(RetryPolicy::from(&config.retry)).with_cancel(cancel);
    let mut storage = open_storage(&config.output)?;

    let (run_id, prior) = open_run(&mut storage, &config.crawl.seed, config_hash, fresh)?;
    let seed = AccountRef::parse(&config.crawl.seed);

    let result = {
        let checkpoint = RunCheckpoint::new(&mut storage, run_id);
        let mut crawler = NetworkCrawler::new(&api, requester, CrawlParams::from(&config.crawl))
            .with_replay(prior)
            .with_checkpoint(Box::new(checkpoint));
        crawler.run(&seed).await
    };

    let graph = finish_run(&mut storage, run_id, result)?;
    write_graph(&graph, Path::new(&config.output.graph_path))?;
    tracing::info!(
        "Wrote {} expansions to {}",
        graph.len(),
        config.output.graph_path
    );
    Ok(graph)
}
