//! HTTP implementation of the social API
//!
//! Speaks the cursor-paginated REST dialect of the v1.1 social graph endpoints:
//! - `users/show.json` to resolve a handle
//! - `users/lookup.json` for batched profile lookups
//! - `friends/ids.json` and `followers/ids.json` for relationship pages
//!
//! Every method performs exactly one request and maps failures onto `ApiError`
//! so the requester can classify them.

use crate::api::{ApiError, ApiResult, Direction, IdPage, SocialApi};
use crate::config::{ApiConfig, UserAgentConfig};
use crate::graph::{AccountId, AccountProfile, AccountRef};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The client identification configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: ClientName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        user_agent.client_name, user_agent.client_version, user_agent.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Minimal shape of a `users/show.json` response
#[derive(Debug, Deserialize)]
struct ShowUser {
    id: AccountId,
}

/// Social API client over HTTP
pub struct HttpApi {
    client: Client,
    base_url: Url,
    bearer_token: String,
}

impl HttpApi {
    /// Creates a client from the API and user agent configuration
    pub fn new(api: &ApiConfig, user_agent: &UserAgentConfig) -> Result<Self, crate::MutualsError> {
        let client = build_http_client(user_agent, Duration::from_secs(api.timeout_secs))?;
        Self::with_client(client, &api.base_url, &api.bearer_token)
    }

    /// Creates an API over an existing client
    pub fn with_client(
        client: Client,
        base_url: &str,
        bearer_token: &str,
    ) -> Result<Self, crate::MutualsError> {
        let mut base_url = Url::parse(base_url)?;
        // Url::join drops the last path segment unless it ends in a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            bearer_token: bearer_token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Other(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        tracing::trace!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Transient(format!("Malformed response: {}", e)))
    }
}

/// Maps a transport-level failure onto the error surface
fn map_send_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        ApiError::Transient(error.to_string())
    } else {
        ApiError::Other(error.to_string())
    }
}

/// Turns a non-success status into `ApiError::Status`
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

fn account_param(account: &AccountRef) -> (&'static str, String) {
    match account {
        AccountRef::Id(id) => ("user_id", id.to_string()),
        AccountRef::Handle(handle) => ("screen_name", handle.clone()),
    }
}

#[async_trait]
impl SocialApi for HttpApi {
    async fn resolve_handle(&self, handle: &str) -> ApiResult<AccountId> {
        let mut url = self.endpoint("users/show.json")?;
        url.query_pairs_mut().append_pair("screen_name", handle);
        let user: ShowUser = self.get_json(url).await?;
        Ok(user.id)
    }

    async fn lookup_profiles(&self, ids: &[AccountId]) -> ApiResult<Vec<AccountProfile>> {
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = self.endpoint("users/lookup.json")?;
        url.query_pairs_mut().append_pair("user_id", &joined);
        self.get_json(url).await
    }

    async fn list_relationship(
        &self,
        account: &AccountRef,
        direction: Direction,
        cursor: i64,
        count: u32,
    ) -> ApiResult<IdPage> {
        let path = match direction {
            Direction::Outgoing => "friends/ids.json",
            Direction::Incoming => "followers/ids.json",
        };

        let (key, value) = account_param(account);
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair(key, &value)
            .append_pair("cursor", &cursor.to_string())
            .append_pair("count", &count.to_string());
        self.get_json(url).await
    }
}
