use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::domain::Locator;
use crate::resolver::{LocatorResolver, ResolveError};

pub const DEFAULT_BASE_URL: &str = "https://duckduckgo.com";
pub const DEFAULT_REGION: &str = "wt-wt";

const MAX_PAGES: usize = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    #[default]
    Off,
    Moderate,
    On,
}

impl SafeSearch {
    fn as_param(self) -> &'static str {
        match self {
            SafeSearch::Off => "-1",
            SafeSearch::Moderate | SafeSearch::On => "1",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagePage {
    #[serde(default)]
    results: Vec<ImageResult>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    image: Option<String>,
}

/// DuckDuckGo image search.
///
/// A search first fetches a `vqd` token for the query from the landing
/// page, then pages through the `i.js` JSON endpoint.
pub struct DuckDuckGoResolver {
    client: Client,
    base_url: String,
    region: String,
    safesearch: SafeSearch,
}

impl DuckDuckGoResolver {
    pub fn new(user_agent: &str) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            region: DEFAULT_REGION.to_string(),
            safesearch: SafeSearch::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_safesearch(mut self, safesearch: SafeSearch) -> Self {
        self.safesearch = safesearch;
        self
    }

    async fn fetch_token(&self, query: &str) -> Result<String, ResolveError> {
        let url = Url::parse_with_params(&format!("{}/", self.base_url), &[("q", query)])?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let body = response.text().await?;
        extract_vqd(&body).ok_or(ResolveError::MissingToken)
    }

    async fn fetch_page(
        &self,
        query: &str,
        vqd: &str,
        offset: Option<&str>,
    ) -> Result<ImagePage, ResolveError> {
        let mut params = vec![
            ("l", self.region.as_str()),
            ("o", "json"),
            ("q", query),
            ("vqd", vqd),
            ("f", ",,,,"),
            ("p", self.safesearch.as_param()),
        ];
        if let Some(offset) = offset {
            params.push(("s", offset));
        }

        let url = Url::parse_with_params(&format!("{}/i.js", self.base_url), &params)?;
        let response = self
            .client
            .get(url)
            .header(REFERER, format!("{}/", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl LocatorResolver for DuckDuckGoResolver {
    async fn resolve(&self, query: &str, limit: usize) -> Result<Vec<Locator>, ResolveError> {
        let vqd = self.fetch_token(query).await?;

        let mut seen = HashSet::new();
        let mut locators = Vec::new();
        let mut offset: Option<String> = None;

        for page_number in 0..MAX_PAGES {
            let page = match self.fetch_page(query, &vqd, offset.as_deref()).await {
                Ok(page) => page,
                Err(e) if page_number == 0 => return Err(e),
                Err(e) => {
                    warn!("Stopping image search for '{}' early: {}", query, e);
                    break;
                }
            };

            for image in page.results.into_iter().filter_map(|r| r.image) {
                if locators.len() >= limit {
                    break;
                }
                if seen.insert(image.clone()) {
                    locators.push(image);
                }
            }

            if locators.len() >= limit {
                break;
            }

            match page.next.as_deref().and_then(next_offset) {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!("Resolved {} locators for '{}'", locators.len(), query);
        Ok(locators)
    }
}

/// Pull the `vqd` token out of the search landing page.
fn extract_vqd(body: &str) -> Option<String> {
    for (open, close) in [("vqd=\"", '"'), ("vqd='", '\''), ("vqd=", '&')] {
        if let Some(start) = body.find(open) {
            let rest = &body[start + open.len()..];
            if let Some(end) = rest.find(close) {
                let token = &rest[..end];
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

/// Read the `s` offset from the relative `next` link of a results page.
fn next_offset(next: &str) -> Option<String> {
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let url = base.join(next).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "s")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn resolver(server: &MockServer) -> DuckDuckGoResolver {
        DuckDuckGoResolver::new("magpie-test")
            .unwrap()
            .with_base_url(server.uri())
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<script>vqd=\"4-12345\";</script>"),
            )
            .mount(server)
            .await;
    }

    fn page(urls: &[&str], next: Option<&str>) -> serde_json::Value {
        let results: Vec<_> = urls
            .iter()
            .map(|u| serde_json::json!({ "image": u, "title": "t" }))
            .collect();
        match next {
            Some(next) => serde_json::json!({ "results": results, "next": next }),
            None => serde_json::json!({ "results": results }),
        }
    }

    #[test]
    fn test_extract_vqd_variants() {
        assert_eq!(extract_vqd("x vqd=\"4-111\" y"), Some("4-111".into()));
        assert_eq!(extract_vqd("x vqd='4-222' y"), Some("4-222".into()));
        assert_eq!(extract_vqd("/d.js?q=a&vqd=4-333&p=1"), Some("4-333".into()));
        assert_eq!(extract_vqd("no token here"), None);
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(
            next_offset("i.js?q=cats&o=json&p=-1&s=100&u=bing&f=,,,&l=wt-wt"),
            Some("100".into())
        );
        assert_eq!(next_offset("i.js?q=cats&vqd=4-1"), None);
    }

    #[test]
    fn test_safesearch_params() {
        assert_eq!(SafeSearch::Off.as_param(), "-1");
        assert_eq!(SafeSearch::Moderate.as_param(), "1");
        assert_eq!(SafeSearch::On.as_param(), "1");
    }

    #[tokio::test]
    async fn test_resolve_pages_until_limit() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("s", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                &["https://img/c.jpg", "https://img/d.jpg", "https://img/e.jpg"],
                None,
            )))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("vqd", "4-12345"))
            .and(query_param("p", "-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                &["https://img/a.jpg", "https://img/b.jpg"],
                Some("i.js?q=cats&o=json&s=2"),
            )))
            .mount(&server)
            .await;

        let locators = resolver(&server).resolve("cats", 4).await.unwrap();
        assert_eq!(
            locators,
            vec![
                "https://img/a.jpg",
                "https://img/b.jpg",
                "https://img/c.jpg",
                "https://img/d.jpg"
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_skips_repeated_results() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                &["https://img/a.jpg", "https://img/a.jpg", "https://img/b.jpg"],
                None,
            )))
            .mount(&server)
            .await;

        let locators = resolver(&server).resolve("cats", 10).await.unwrap();
        assert_eq!(locators, vec!["https://img/a.jpg", "https://img/b.jpg"]);
    }

    #[tokio::test]
    async fn test_resolve_no_results_is_empty_not_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(&[], None)))
            .mount(&server)
            .await;

        let locators = resolver(&server).resolve("zzqxv", 10).await.unwrap();
        assert!(locators.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = resolver(&server).resolve("cats", 10).await.unwrap_err();
        assert!(matches!(err, ResolveError::MissingToken));
    }

    #[tokio::test]
    async fn test_upstream_outage_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = resolver(&server).resolve("cats", 10).await.unwrap_err();
        assert!(matches!(err, ResolveError::Status(_)));
    }

    #[tokio::test]
    async fn test_malformed_first_page_is_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/i.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = resolver(&server).resolve("cats", 10).await.unwrap_err();
        assert!(matches!(err, ResolveError::Decode(_)));
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_collected_results() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .and(query_param("s", "1"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(
                &["https://img/a.jpg"],
                Some("i.js?q=cats&s=1"),
            )))
            .mount(&server)
            .await;

        let locators = resolver(&server).resolve("cats", 10).await.unwrap();
        assert_eq!(locators, vec!["https://img/a.jpg"]);
    }

    /// Serves one fresh image per page and always advertises another page.
    struct EndlessPages {
        served: AtomicUsize,
    }

    impl Respond for EndlessPages {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let n = self.served.fetch_add(1, Ordering::SeqCst);
            let image = format!("https://img/{}.jpg", n);
            let next = format!("i.js?q=cats&s={}", n + 1);
            ResponseTemplate::new(200).set_body_json(page(&[image.as_str()], Some(next.as_str())))
        }
    }

    #[tokio::test]
    async fn test_endless_paging_stops_at_page_cap() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path("/i.js"))
            .respond_with(EndlessPages {
                served: AtomicUsize::new(0),
            })
            .mount(&server)
            .await;

        let locators = resolver(&server).resolve("cats", 200).await.unwrap();

        let page_requests = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/i.js")
            .count();
        assert_eq!(page_requests, MAX_PAGES);
        assert_eq!(locators.len(), MAX_PAGES);
        assert_eq!(locators[0], "https://img/0.jpg");
    }
}
