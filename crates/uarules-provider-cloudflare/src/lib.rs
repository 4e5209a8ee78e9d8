// # Cloudflare User Agent Blocking Rules Client
//
// This crate provides the Cloudflare implementation of `UserAgentRuleApi`.
//
// ## Behaviour
//
// - ✅ One HTTP request per trait call
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Status codes mapped onto `uarules_core::Error` (401/403, 404, 429, 5xx)
// - ✅ Cloudflare envelope errors surfaced with their codes
// - ❌ NO retry or backoff (failures go straight back to the caller)
// - ❌ NO caching (local state is owned by the host's StateStore)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Client MUST fail fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Create: POST `/zones/:zone_id/firewall/ua_rules`
// - Get: GET `/zones/:zone_id/firewall/ua_rules/:id`
// - Update: PUT `/zones/:zone_id/firewall/ua_rules/:id`
// - Delete: DELETE `/zones/:zone_id/firewall/ua_rules/:id`
// - List: GET `/zones/:zone_id/firewall/ua_rules?page=N&per_page=M`

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use uarules_core::config::ProviderConfig;
use uarules_core::rule::RemoteRule;
use uarules_core::traits::{RuleApiFactory, RulePage, UserAgentRuleApi};
use uarules_core::{ApiRegistry, Error, Result};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Rules requested per list page
const LIST_PER_PAGE: u32 = 50;

const PROVIDER: &str = "cloudflare";

/// Response envelope shared by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: Option<u32>,
}

/// Join envelope errors as `message (code N); ...`
fn describe_errors(errors: &[ApiMessage]) -> String {
    errors
        .iter()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Map a non-success HTTP status onto an error
///
/// `body` is the raw response body; when it is a Cloudflare envelope its
/// error messages are used instead.
fn status_error(status: StatusCode, what: &str, body: &str) -> Error {
    let detail = match serde_json::from_str::<Envelope<serde_json::Value>>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => describe_errors(&envelope.errors),
        _ => body.to_string(),
    };

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {} - {}",
            status, detail
        )),
        404 => Error::not_found(format!("{}: {}", what, detail)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, detail),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", what, status, detail)),
    }
}

/// Check a decoded envelope and take its result
fn into_result<T>(envelope: Envelope<T>, what: &str) -> Result<(T, Option<ResultInfo>)> {
    if !envelope.success {
        return Err(Error::provider(
            PROVIDER,
            format!("{} failed: {}", what, describe_errors(&envelope.errors)),
        ));
    }
    match envelope.result {
        Some(result) => Ok((result, envelope.result_info)),
        None => Err(Error::provider(
            PROVIDER,
            format!("Invalid response format: {} returned no result", what),
        )),
    }
}

/// Cloudflare User Agent Blocking Rules client
///
/// Stateless apart from the HTTP connection pool.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareRuleApi {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRuleApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRuleApi")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareRuleApi {
    /// Create a new Cloudflare client
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Firewall Services:Edit permission
    /// - `base_url`: Optional API base URL override (defaults to [`CLOUDFLARE_API_BASE`])
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the token is empty or the HTTP client cannot
    /// be built.
    pub fn new(api_token: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    fn rules_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/firewall/ua_rules", self.base_url, zone_id)
    }

    fn rule_url(&self, zone_id: &str, rule_id: &str) -> String {
        format!("{}/{}", self.rules_url(zone_id), rule_id)
    }

    /// Send a request and decode the envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<(T, Option<ResultInfo>)> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, what, &body));
        }

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;
        into_result(envelope, what)
    }
}

#[async_trait]
impl UserAgentRuleApi for CloudflareRuleApi {
    async fn create_rule(&self, zone_id: &str, rule: &RemoteRule) -> Result<RemoteRule> {
        tracing::debug!("Creating User Agent Blocking Rule in zone {}", zone_id);
        let request = self.client.post(self.rules_url(zone_id)).json(rule);
        let (created, _) = self.send(request, "create rule").await?;
        Ok(created)
    }

    async fn get_rule(&self, zone_id: &str, rule_id: &str) -> Result<RemoteRule> {
        tracing::debug!("Fetching User Agent Blocking Rule {} in zone {}", rule_id, zone_id);
        let request = self.client.get(self.rule_url(zone_id, rule_id));
        let (rule, _) = self.send(request, "get rule").await?;
        Ok(rule)
    }

    async fn update_rule(
        &self,
        zone_id: &str,
        rule_id: &str,
        rule: &RemoteRule,
    ) -> Result<RemoteRule> {
        tracing::debug!("Updating User Agent Blocking Rule {} in zone {}", rule_id, zone_id);
        let request = self.client.put(self.rule_url(zone_id, rule_id)).json(rule);
        let (updated, _) = self.send(request, "update rule").await?;
        Ok(updated)
    }

    async fn delete_rule(&self, zone_id: &str, rule_id: &str) -> Result<()> {
        tracing::debug!("Deleting User Agent Blocking Rule {} in zone {}", rule_id, zone_id);
        let request = self.client.delete(self.rule_url(zone_id, rule_id));
        let _: (serde_json::Value, _) = self.send(request, "delete rule").await?;
        Ok(())
    }

    async fn list_rules(&self, zone_id: &str, page: u32) -> Result<RulePage> {
        if page == 0 {
            return Err(Error::invalid_input("page numbers start at 1"));
        }

        let request = self
            .client
            .get(self.rules_url(zone_id))
            .query(&[("page", page), ("per_page", LIST_PER_PAGE)]);
        let (rules, info): (Vec<RemoteRule>, _) = self.send(request, "list rules").await?;

        Ok(RulePage {
            rules,
            page,
            total_pages: info.and_then(|i| i.total_pages),
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare clients
pub struct CloudflareFactory;

impl RuleApiFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn UserAgentRuleApi>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                base_url,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }
                Ok(Box::new(CloudflareRuleApi::new(
                    api_token.clone(),
                    base_url.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare rule API")),
        }
    }
}

/// Register the Cloudflare client with a registry
///
/// # Example
///
/// ```rust
/// use uarules_core::ApiRegistry;
///
/// let registry = ApiRegistry::new();
/// uarules_provider_cloudflare::register(&registry);
/// assert!(registry.has("cloudflare"));
/// ```
pub fn register(registry: &ApiRegistry) {
    registry.register(PROVIDER, Box::new(CloudflareFactory));
}
