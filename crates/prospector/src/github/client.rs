//! Authenticated API client: conditional GETs, quota governance, and
//! Link-header pagination.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backon::Retryable;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::config::CrawlConfig;
use crate::etag::EtagCache;
use crate::retry::default_backoff;

use super::error::{GitHubError, body_excerpt};
use super::rate::{QuotaSnapshot, RateGovernor};
use super::transport::{HttpResponse, ReqwestTransport, Transport};
use super::types::RateLimitResponse;

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = "prospector";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extract the `rel="next"` URL from a `Link` header.
///
/// The header is a comma-separated list of `<url>; rel="name"` entries, each
/// possibly carrying extra parameters. Absence of a `next` entry means the
/// page sequence is exhausted.
#[must_use]
pub fn next_url(link_header: &str) -> Option<String> {
    for entry in link_header.split(',') {
        let mut url = None;
        let mut is_next = false;

        for segment in entry.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                is_next = rel.trim_matches('"') == "next";
            }
        }

        if is_next {
            return url.map(String::from);
        }
    }

    None
}

/// Client for the source-hosting API.
///
/// Cheap to clone; all clones share the transport, the quota snapshot, and
/// the ETag cache.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    token: String,
    per_page: u32,
    governor: RateGovernor,
    etags: Option<EtagCache>,
    last_quota: Arc<Mutex<Option<QuotaSnapshot>>>,
}

impl GitHubClient {
    /// Build a client backed by a real HTTP transport.
    pub fn new(config: &CrawlConfig) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| GitHubError::Internal(e.to_string()))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over an arbitrary transport. This is the seam tests
    /// use to script responses.
    pub fn with_transport(config: &CrawlConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            per_page: config.per_page,
            governor: RateGovernor::new(config.throttle, config.requests_per_second),
            etags: config.etag_cache.then(EtagCache::new),
            last_quota: Arc::new(Mutex::new(None)),
        }
    }

    // ---------- URL builders ----------

    #[must_use]
    pub fn repos_url(&self, org: &str) -> String {
        format!(
            "{}/orgs/{}/repos?per_page={}",
            self.base_url, org, self.per_page
        )
    }

    #[must_use]
    pub fn commits_url(
        &self,
        org: &str,
        repo: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/commits?per_page={}",
            self.base_url, org, repo, self.per_page
        );
        if let Some(since) = since {
            url.push_str("&since=");
            url.push_str(&since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(until) = until {
            url.push_str("&until=");
            url.push_str(&until.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        url
    }

    #[must_use]
    pub fn commit_url(&self, org: &str, repo: &str, sha: &str) -> String {
        format!("{}/repos/{}/{}/commits/{}", self.base_url, org, repo, sha)
    }

    #[must_use]
    pub fn pulls_url(&self, org: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/pulls?state=all&per_page={}",
            self.base_url, org, repo, self.per_page
        )
    }

    #[must_use]
    pub fn pull_url(&self, org: &str, repo: &str, number: i64) -> String {
        format!("{}/repos/{}/{}/pulls/{}", self.base_url, org, repo, number)
    }

    #[must_use]
    fn rate_limit_url(&self) -> String {
        format!("{}/rate_limit", self.base_url)
    }

    // ---------- Quota governance ----------

    fn quota_snapshot(&self) -> Option<QuotaSnapshot> {
        self.last_quota.lock().ok().and_then(|guard| *guard)
    }

    fn store_quota(&self, quota: QuotaSnapshot) {
        if let Ok(mut guard) = self.last_quota.lock() {
            *guard = Some(quota);
        }
    }

    /// Fetch the current core quota from `/rate_limit` (does not itself
    /// consume quota).
    pub async fn fetch_quota(&self) -> Result<QuotaSnapshot, GitHubError> {
        let url = self.rate_limit_url();
        let resp = self.send(&url, None).await?;
        if !resp.is_success() {
            return Err(GitHubError::Status {
                url,
                status: resp.status,
                body: body_excerpt(&resp.body),
            });
        }
        let parsed: RateLimitResponse = serde_json::from_slice(&resp.body)
            .map_err(|source| GitHubError::Decode { url, source })?;
        let quota = QuotaSnapshot::from_window(&parsed.resources.core);
        self.store_quota(quota);
        Ok(quota)
    }

    /// Pre-flight quota check: block until the quota has headroom.
    ///
    /// The first call seeds the snapshot from `/rate_limit`; afterwards the
    /// snapshot observed off response headers is consulted, falling back to
    /// `/rate_limit` again after each throttle sleep.
    async fn ensure_quota(&self) -> Result<(), GitHubError> {
        let mut quota = match self.quota_snapshot() {
            Some(quota) => quota,
            None => self.fetch_quota().await?,
        };

        while let Some(delay) = self.governor.throttle_delay(&quota, Utc::now()) {
            tracing::info!(delay_secs = delay.as_secs(), "api quota exhausted, throttling");
            tokio::time::sleep(delay).await;
            quota = self.fetch_quota().await?;
        }

        Ok(())
    }

    // ---------- Request plumbing ----------

    fn request_headers(&self, etag: Option<&str>) -> Vec<(String, String)> {
        let mut headers = vec![
            ("accept".to_string(), ACCEPT.to_string()),
            ("user-agent".to_string(), USER_AGENT.to_string()),
        ];
        if !self.token.is_empty() {
            headers.push(("authorization".to_string(), format!("Bearer {}", self.token)));
        }
        if let Some(etag) = etag {
            headers.push(("if-none-match".to_string(), etag.to_string()));
        }
        headers
    }

    /// Issue one GET, retrying transport failures with backoff.
    async fn send(&self, url: &str, etag: Option<&str>) -> Result<HttpResponse, GitHubError> {
        let headers = self.request_headers(etag);

        let attempt = || async { self.transport.get(url, &headers).await };
        let resp = attempt
            .retry(default_backoff())
            .notify(|err, dur| {
                tracing::debug!(url, error = %err, retry_in = ?dur, "transport error, retrying");
            })
            .await
            .map_err(|e| GitHubError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let observed = QuotaSnapshot::from_headers(&resp.headers);
        if observed.is_known() {
            self.store_quota(observed);
        }

        Ok(resp)
    }

    /// Governed conditional GET: pre-flight quota check, proactive pacing,
    /// and a post-response quota double-check that retries the same URL
    /// after a throttle sleep instead of surfacing the rejection.
    async fn get_governed(&self, url: &str, etag: Option<&str>) -> Result<HttpResponse, GitHubError> {
        loop {
            self.ensure_quota().await?;
            self.governor.pace().await;

            let resp = self.send(url, etag).await?;

            let quota = QuotaSnapshot::from_headers(&resp.headers);
            if matches!(resp.status, 403 | 429) && quota.exhausted() {
                if let Some(delay) = self.governor.throttle_delay(&quota, Utc::now()) {
                    tracing::warn!(
                        url,
                        status = resp.status,
                        delay_secs = delay.as_secs(),
                        "request rejected by quota, retrying after cool-down"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }

            return Ok(resp);
        }
    }

    /// Fetch a single resource and decode it.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        let resp = self.get_governed(url, None).await?;
        if !resp.is_success() {
            return Err(GitHubError::Status {
                url: url.to_string(),
                status: resp.status,
                body: body_excerpt(&resp.body),
            });
        }
        serde_json::from_slice(&resp.body).map_err(|source| GitHubError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Start a page sequence at `url`.
    pub fn paginate<T: DeserializeOwned>(&self, url: String) -> Paginator<'_, T> {
        Paginator {
            client: self,
            next: Some(url),
            _marker: PhantomData,
        }
    }
}

/// Lazy sequence of pages linked by `rel="next"`.
///
/// Not restartable: once exhausted (or cut short by a non-success status) a
/// new sequence starts again from page one.
pub struct Paginator<'a, T> {
    client: &'a GitHubClient,
    next: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Paginator<'_, T> {
    /// Fetch the next page, or `None` when the sequence is exhausted.
    ///
    /// A 304 yields an empty page and still advances through the response's
    /// Link header. A page that fails to decode is logged and yielded empty.
    /// Any other non-success status logs the body and ends the sequence.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, GitHubError> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        let etag = self
            .client
            .etags
            .as_ref()
            .and_then(|cache| cache.get(&url));

        let resp = self.client.get_governed(&url, etag.as_deref()).await?;
        self.next = resp.header("link").and_then(next_url);

        if resp.status == 304 {
            tracing::debug!(url, "page unchanged");
            return Ok(Some(Vec::new()));
        }

        if !resp.is_success() {
            tracing::warn!(
                url,
                status = resp.status,
                body = %body_excerpt(&resp.body),
                "unexpected status, ending page sequence"
            );
            self.next = None;
            return Ok(None);
        }

        if let (Some(cache), Some(tag)) = (self.client.etags.as_ref(), resp.header("etag")) {
            cache.put(&url, tag);
        }

        match serde_json::from_slice::<Vec<T>>(&resp.body) {
            Ok(items) => Ok(Some(items)),
            Err(source) => {
                tracing::warn!(url, error = %source, "failed to decode page, skipping");
                Ok(Some(Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::transport::mock::{MockTransport, json_response};
    use crate::github::types::RepoSummary;

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            org: "acme".to_string(),
            token: "t0ken".to_string(),
            base_url: "https://api.example.test".to_string(),
            ..CrawlConfig::default()
        }
    }

    fn scripted_client(config: &CrawlConfig) -> (GitHubClient, MockTransport) {
        let transport = MockTransport::new();
        let client = GitHubClient::with_transport(config, Arc::new(transport.clone()));
        (client, transport)
    }

    fn rate_limit_body(remaining: u64) -> String {
        format!(
            r#"{{"resources": {{"core": {{"limit": 5000, "remaining": {remaining}, "reset": 1735689600}}}}}}"#
        )
    }

    #[test]
    fn test_next_url_extracts_rel_next() {
        let header = "<https://api.example.test/orgs/acme/repos?per_page=2&page=2>; rel=\"next\", <https://api.example.test/orgs/acme/repos?per_page=2&page=9>; rel=\"last\"";
        assert_eq!(
            next_url(header),
            Some("https://api.example.test/orgs/acme/repos?per_page=2&page=2".to_string())
        );
    }

    #[test]
    fn test_next_url_absent_rel_next() {
        let header = "<https://api.example.test/orgs/acme/repos?page=1>; rel=\"first\", <https://api.example.test/orgs/acme/repos?page=9>; rel=\"last\"";
        assert_eq!(next_url(header), None);
        assert_eq!(next_url(""), None);
    }

    #[test]
    fn test_next_url_tolerates_extra_parameters() {
        let header = "<https://api.example.test/x?page=2>; rel=\"next\"; type=\"application/json\"";
        assert_eq!(
            next_url(header),
            Some("https://api.example.test/x?page=2".to_string())
        );
    }

    #[test]
    fn test_url_builders() {
        let config = test_config();
        let (client, _) = scripted_client(&config);

        assert_eq!(
            client.repos_url("acme"),
            "https://api.example.test/orgs/acme/repos?per_page=100"
        );
        assert_eq!(
            client.commit_url("acme", "widgets", "abc123"),
            "https://api.example.test/repos/acme/widgets/commits/abc123"
        );
        assert_eq!(
            client.pulls_url("acme", "widgets"),
            "https://api.example.test/repos/acme/widgets/pulls?state=all&per_page=100"
        );
        assert_eq!(
            client.pull_url("acme", "widgets", 42),
            "https://api.example.test/repos/acme/widgets/pulls/42"
        );
    }

    #[test]
    fn test_commits_url_with_bounds() {
        let config = test_config();
        let (client, _) = scripted_client(&config);

        let since = "2026-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let until = "2026-02-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            client.commits_url("acme", "widgets", Some(since), Some(until)),
            "https://api.example.test/repos/acme/widgets/commits?per_page=100&since=2026-01-01T00:00:00Z&until=2026-02-01T00:00:00Z"
        );
        assert_eq!(
            client.commits_url("acme", "widgets", None, None),
            "https://api.example.test/repos/acme/widgets/commits?per_page=100"
        );
    }

    #[tokio::test]
    async fn test_paginator_walks_three_linked_pages() {
        let config = test_config();
        let (client, transport) = scripted_client(&config);

        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );

        let p1 = client.repos_url("acme");
        let p2 = "https://api.example.test/orgs/acme/repos?per_page=100&page=2";
        let p3 = "https://api.example.test/orgs/acme/repos?per_page=100&page=3";

        transport.push_response(
            &p1,
            json_response(
                r#"[{"name": "a"}, {"name": "b"}]"#,
                None,
                Some(&format!("<{p2}>; rel=\"next\"")),
            ),
        );
        transport.push_response(
            p2,
            json_response(
                r#"[{"name": "c"}]"#,
                None,
                Some(&format!("<{p3}>; rel=\"next\"")),
            ),
        );
        transport.push_response(p3, json_response(r#"[{"name": "d"}]"#, None, None));

        let mut pages = client.paginate::<RepoSummary>(p1);
        let mut names = Vec::new();
        let mut page_count = 0;
        while let Some(items) = pages.next_page().await.unwrap() {
            page_count += 1;
            names.extend(items.into_iter().map(|r| r.name));
        }

        assert_eq!(page_count, 3);
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_paginator_sends_auth_and_caches_etag() {
        let config = test_config();
        let (client, transport) = scripted_client(&config);

        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );
        let url = client.repos_url("acme");
        transport.push_response(&url, json_response("[]", Some("W/\"tag1\""), None));
        // Second sequence gets a 304 back.
        transport.push_response(
            &url,
            HttpResponse {
                status: 304,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let mut pages = client.paginate::<RepoSummary>(url.clone());
        assert_eq!(pages.next_page().await.unwrap().map(|p| p.len()), Some(0));
        assert!(pages.next_page().await.unwrap().is_none());

        let mut again = client.paginate::<RepoSummary>(url.clone());
        let page = again.next_page().await.unwrap();
        assert_eq!(page.map(|items| items.len()), Some(0));

        let requests = transport.requests();
        let first_page_req = requests.iter().find(|(u, _)| *u == url).unwrap();
        assert!(
            first_page_req
                .1
                .iter()
                .any(|(k, v)| k == "authorization" && v == "Bearer t0ken")
        );
        let conditional = requests.iter().rev().find(|(u, _)| *u == url).unwrap();
        assert!(
            conditional
                .1
                .iter()
                .any(|(k, v)| k == "if-none-match" && v == "W/\"tag1\"")
        );
    }

    #[tokio::test]
    async fn test_paginator_ends_on_server_error() {
        let config = test_config();
        let (client, transport) = scripted_client(&config);

        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );
        let url = client.repos_url("acme");
        transport.push_response(
            &url,
            HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: b"boom".to_vec(),
            },
        );

        let mut pages = client.paginate::<RepoSummary>(url);
        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_paginator_skips_undecodable_page_but_advances() {
        let config = test_config();
        let (client, transport) = scripted_client(&config);

        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );
        let p1 = client.repos_url("acme");
        let p2 = "https://api.example.test/orgs/acme/repos?per_page=100&page=2";
        transport.push_response(
            &p1,
            json_response("not json", None, Some(&format!("<{p2}>; rel=\"next\""))),
        );
        transport.push_response(p2, json_response(r#"[{"name": "z"}]"#, None, None));

        let mut pages = client.paginate::<RepoSummary>(p1);
        assert_eq!(pages.next_page().await.unwrap().map(|p| p.len()), Some(0));
        let second = pages.next_page().await.unwrap().unwrap();
        assert_eq!(second[0].name, "z");
        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_quota_delays_request_until_cooldown_elapses() {
        let mut config = test_config();
        config.throttle = crate::config::ThrottlePolicy::Cooldown(Duration::from_secs(5));
        let (client, transport) = scripted_client(&config);

        // First pre-flight sees an empty window; the re-check after the
        // cool-down sees a fresh one.
        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(0), None, None),
        );
        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );
        let url = client.repos_url("acme");
        transport.push_response(&url, json_response(r#"[{"name": "a"}]"#, None, None));

        let started = tokio::time::Instant::now();
        let mut pages = client.paginate::<RepoSummary>(url.clone());
        let page = pages.next_page().await.unwrap().unwrap();

        assert_eq!(page.len(), 1);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(transport.requests_for("https://api.example.test/rate_limit"), 2);
        assert_eq!(transport.requests_for(&url), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_rejection_retries_same_url() {
        let mut config = test_config();
        config.throttle = crate::config::ThrottlePolicy::Cooldown(Duration::from_secs(2));
        let (client, transport) = scripted_client(&config);

        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );
        let url = client.repos_url("acme");
        // Rejected once with exhausted quota headers, then served.
        transport.push_response(
            &url,
            HttpResponse {
                status: 403,
                headers: vec![
                    ("x-ratelimit-remaining".to_string(), "0".to_string()),
                    ("x-ratelimit-reset".to_string(), "1735689600".to_string()),
                ],
                body: b"rate limited".to_vec(),
            },
        );
        transport.push_response(&url, json_response(r#"[{"name": "a"}]"#, None, None));

        let mut pages = client.paginate::<RepoSummary>(url.clone());
        let page = pages.next_page().await.unwrap().unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(transport.requests_for(&url), 2);
        // The re-check after the rejection consults /rate_limit again.
        assert!(transport.requests_for("https://api.example.test/rate_limit") >= 1);
    }

    #[tokio::test]
    async fn test_get_json_surfaces_status_errors() {
        let config = test_config();
        let (client, transport) = scripted_client(&config);

        transport.push_response(
            "https://api.example.test/rate_limit",
            json_response(&rate_limit_body(5000), None, None),
        );
        let url = client.commit_url("acme", "widgets", "missing");
        transport.push_response(
            &url,
            HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: b"not found".to_vec(),
            },
        );

        let err = client
            .get_json::<crate::github::types::CommitDetail>(&url)
            .await
            .expect_err("404 should error");
        match err {
            GitHubError::Status { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
