//! Retrying request layer
//!
//! Every remote call the crawler makes goes through `Requester::execute`, which
//! applies the retry policy below until the call succeeds, ends with "no data",
//! or fails for good.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 401 / 404 | Stop, return `Outcome::NoData` |
//! | HTTP 429 | Sleep the rate-limit window, reset the wait, retry indefinitely |
//! | HTTP 500/502/503/504 | Sleep `wait`, grow it, retry; fatal once `wait` exceeds the ceiling |
//! | Transient fault | Count it, sleep `wait`, grow it, retry; fatal past the failure ceiling |
//! | Anything else | Fatal immediately |

use crate::api::{classify, ApiResult, Direction, ErrorClass};
use crate::crawler::backoff::{BackoffState, RetryPolicy};
use crate::crawler::cancel::CancelSignal;
use crate::MutualsError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// The crawl step a request belongs to, reported on fatal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStep {
    ResolveSeed,
    FriendIds,
    FollowerIds,
    ProfileLookup,
}

impl RequestStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveSeed => "seed resolution",
            Self::FriendIds => "friend id paging",
            Self::FollowerIds => "follower id paging",
            Self::ProfileLookup => "profile batch lookup",
        }
    }
}

impl From<Direction> for RequestStep {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Outgoing => Self::FriendIds,
            Direction::Incoming => Self::FollowerIds,
        }
    }
}

impl fmt::Display for RequestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Non-fatal result of an executed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The call succeeded
    Data(T),

    /// The remote side has nothing to give for this call (401 / 404)
    NoData { class: ErrorClass },
}

impl<T> Outcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            Self::NoData { .. } => None,
        }
    }
}

/// Executes remote calls under a `RetryPolicy`
#[derive(Debug, Clone)]
pub struct Requester {
    policy: RetryPolicy,
    cancel: CancelSignal,
}

impl Requester {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: CancelSignal::never(),
        }
    }

    /// Interrupts backoff sleeps when `cancel` fires
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `call` until it succeeds, ends with no data, or fails fatally
    ///
    /// `call` is invoked once per attempt and must issue a fresh request each time.
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome::Data(_))` - The call succeeded
    /// * `Ok(Outcome::NoData { .. })` - 401 or 404; the caller proceeds without data
    /// * `Err(MutualsError::Request { .. })` - Unclassified error, not retried
    /// * `Err(MutualsError::RetriesExhausted { .. })` - Backoff ceiling passed
    /// * `Err(MutualsError::Cancelled { .. })` - The cancel signal fired
    pub async fn execute<T, F, Fut>(
        &self,
        step: RequestStep,
        mut call: F,
    ) -> Result<Outcome<T>, MutualsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut backoff = BackoffState::new(&self.policy);
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(MutualsError::Cancelled { step });
            }

            attempts += 1;
            let error = match call().await {
                Ok(value) => return Ok(Outcome::Data(value)),
                Err(e) => e,
            };

            let class = classify(&error);
            match class {
                ErrorClass::Unauthorized | ErrorClass::NotFound => {
                    tracing::warn!(%step, %class, "No data available, skipping");
                    return Ok(Outcome::NoData { class });
                }

                ErrorClass::RateLimited => {
                    backoff.reset_failures();
                    let wait = self.policy.rate_limit_window;
                    tracing::warn!(
                        %step,
                        %class,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limit exceeded, sleeping"
                    );
                    self.sleep(step, wait).await?;
                    backoff.reset_wait(self.policy.initial_wait);
                    tracing::info!(%step, "Awake after rate limit, retrying");
                }

                ErrorClass::Server(_) => {
                    backoff.reset_failures();
                    if backoff.wait() > self.policy.max_server_wait {
                        tracing::error!(%step, %class, attempts, "Too many retries, giving up");
                        return Err(MutualsError::RetriesExhausted {
                            step,
                            attempts,
                            source: error,
                        });
                    }
                    let wait = backoff.next_wait(self.policy.multiplier);
                    tracing::warn!(
                        %step,
                        %class,
                        wait_secs = wait.as_secs_f64(),
                        "Server error, retrying"
                    );
                    self.sleep(step, wait).await?;
                }

                ErrorClass::Transient => {
                    let failures = backoff.record_failure();
                    if failures > self.policy.max_transient_errors {
                        tracing::error!(
                            %step,
                            %class,
                            attempts,
                            "Too many consecutive errors, giving up"
                        );
                        return Err(MutualsError::RetriesExhausted {
                            step,
                            attempts,
                            source: error,
                        });
                    }
                    let wait = backoff.next_wait(self.policy.multiplier);
                    tracing::warn!(
                        %step,
                        %class,
                        failures,
                        wait_secs = wait.as_secs_f64(),
                        "Transient fault, retrying"
                    );
                    self.sleep(step, wait).await?;
                }

                ErrorClass::Fatal => {
                    tracing::error!(%step, %class, error = %error, "Unrecoverable request error");
                    return Err(MutualsError::Request {
                        step,
                        source: error,
                    });
                }
            }
        }
    }

    /// Sleeps for `wait` unless the cancel signal fires first
    async fn sleep(&self, step: RequestStep, wait: Duration) -> Result<(), MutualsError> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            _ = tokio::time::sleep(wait) => Ok(()),
            _ = cancel.cancelled() => {
                tracing::warn!(%step, "Cancelled during backoff");
                Err(MutualsError::Cancelled { step })
            }
        }
    }
}

impl Default for Requester {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, CallKind, InMemoryApi, SocialApi};
    use crate::crawler::cancel::cancel_pair;
    use crate::graph::AccountId;
    use tokio::time::Instant;

    fn statuses(codes: &[u16]) -> Vec<ApiError> {
        codes.iter().map(|c| ApiError::status(*c)).collect()
    }

    fn api() -> InMemoryApi {
        let mut api = InMemoryApi::new();
        api.add_account(1, 100);
        api
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "expected ~{:?}, got {:?}",
            expected,
            elapsed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success() {
        let api = api();
        api.fail_next(CallKind::Lookup, statuses(&[429]));
        let requester = Requester::default();
        let ids = [AccountId(1)];

        let start = Instant::now();
        let outcome = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
            .await
            .unwrap();

        assert_eq!(outcome.into_data().map(|p| p.len()), Some(1));
        assert_eq!(api.call_count(CallKind::Lookup), 2);
        assert_elapsed(start, Duration::from_secs(905));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_ceiling_is_fatal_on_eleventh_attempt() {
        let api = api();
        api.fail_next(
            CallKind::Lookup,
            (0..20).map(|_| ApiError::Transient("connection reset".to_string())),
        );
        let requester = Requester::default();
        let ids = [AccountId(1)];

        let err = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
            .await
            .unwrap_err();

        match err {
            MutualsError::RetriesExhausted { step, attempts, .. } => {
                assert_eq!(step, RequestStep::ProfileLookup);
                assert_eq!(attempts, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(api.call_count(CallKind::Lookup), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_back_off_geometrically() {
        let api = api();
        api.fail_next(CallKind::Lookup, statuses(&[503, 500]));
        let requester = Requester::default();
        let ids = [AccountId(1)];

        let start = Instant::now();
        let outcome = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
            .await
            .unwrap();

        assert!(!outcome.is_no_data());
        // 2s then 3s
        assert_elapsed(start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_ceiling_is_fatal() {
        let api = api();
        api.fail_next(CallKind::Lookup, statuses(&[502; 40]));
        let policy = RetryPolicy {
            max_server_wait: Duration::from_secs(10),
            ..RetryPolicy::default()
        };
        let requester = Requester::new(policy);
        let ids = [AccountId(1)];

        let err = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
            .await
            .unwrap_err();

        // Waits 2, 3, 4.5, 6.75; the fifth 502 sees 10.125 > 10
        assert!(matches!(
            err,
            MutualsError::RetriesExhausted { attempts: 5, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_and_not_found_are_no_data() {
        let requester = Requester::default();
        let ids = [AccountId(1)];

        for code in [401, 404] {
            let api = api();
            api.fail_next(CallKind::Lookup, statuses(&[code]));
            let start = Instant::now();
            let outcome = requester
                .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
                .await
                .unwrap();
            assert!(outcome.is_no_data());
            assert_eq!(api.call_count(CallKind::Lookup), 1);
            assert_eq!(start.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclassified_error_is_fatal_without_retry() {
        let api = api();
        api.fail_next(CallKind::Lookup, statuses(&[403]));
        let requester = Requester::default();
        let ids = [AccountId(1)];

        let err = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MutualsError::Request {
                step: RequestStep::ProfileLookup,
                ..
            }
        ));
        assert_eq!(api.call_count(CallKind::Lookup), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_clears_transient_count() {
        let api = api();
        let mut script: Vec<ApiError> = (0..10)
            .map(|_| ApiError::Transient("reset".to_string()))
            .collect();
        script.push(ApiError::status(503));
        script.extend((0..10).map(|_| ApiError::Transient("reset".to_string())));
        api.fail_next(CallKind::Lookup, script);

        let policy = RetryPolicy {
            initial_wait: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let requester = Requester::new(policy);
        let ids = [AccountId(1)];

        let outcome = requester
            .execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids))
            .await
            .unwrap();
        assert!(!outcome.is_no_data());
        assert_eq!(api.call_count(CallKind::Lookup), 22);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_rate_limit_sleep() {
        let api = api();
        api.fail_next(CallKind::Lookup, statuses(&[429]));
        let (handle, signal) = cancel_pair();
        let requester = Requester::default().with_cancel(signal);
        let ids = [AccountId(1)];

        let call = requester.execute(RequestStep::ProfileLookup, || api.lookup_profiles(&ids));
        let cancel = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            handle.cancel();
        };
        let (result, ()) = tokio::join!(call, cancel);

        assert!(matches!(
            result,
            Err(MutualsError::Cancelled {
                step: RequestStep::ProfileLookup
            })
        ));
        assert_eq!(api.call_count(CallKind::Lookup), 1);
    }
}
