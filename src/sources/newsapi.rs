//! NewsAPI `top-headlines` client.
//!
//! One GET per run, bounded by a 10 second timeout. NewsAPI reports failures
//! in the JSON body (`"status": "error"`), often alongside a 4xx status, so the
//! body is parsed regardless of the HTTP status code.
//!
//! The API key travels in the `X-Api-Key` header. Request URLs end up in
//! transport error messages, so they never carry it.

use crate::config::Config;
use crate::error::{DigestError, Result};
use crate::models::{Article, NewsApiResponse};
use crate::utils::truncate_for_log;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Timeout applied to the headline request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "X-Api-Key";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client for the top-headlines endpoint, borrowing the run configuration.
#[derive(Debug)]
pub struct NewsApiClient<'a> {
    http: Client,
    config: &'a Config,
}

impl<'a> NewsApiClient<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Endpoint URL with its query parameters. Holds no secret, safe to log.
    pub fn endpoint(&self) -> Result<Url> {
        let mut url = self
            .config
            .news_api_base
            .join("v2/top-headlines")
            .map_err(|e| DigestError::InvalidConfig {
                name: "--news-api-base",
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("country", &self.config.country)
            .append_pair("category", &self.config.category)
            .append_pair("pageSize", &self.config.max_articles.to_string());
        Ok(url)
    }

    /// Fetch at most `config.max_articles` headlines.
    ///
    /// The bound is applied locally too, so a server that ignores `pageSize`
    /// still yields no more than the requested number of articles.
    ///
    /// # Errors
    ///
    /// Transport failures and timeouts ([`DigestError::Http`]), unparseable
    /// bodies ([`DigestError::Json`]) and any status other than `"ok"`
    /// ([`DigestError::NewsApiStatus`]).
    #[instrument(level = "info", skip_all, fields(country = %self.config.country, category = %self.config.category))]
    pub async fn fetch_top_headlines(&self) -> Result<Vec<Article>> {
        let url = self.endpoint()?;
        debug!(url = %url, "Requesting top headlines");

        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.newsapi_key)
            .send()
            .await?;
        let http_status = resp.status();
        let body = resp.text().await?;

        let parsed: NewsApiResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                %http_status,
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "NewsAPI body is not valid JSON"
            );
            e
        })?;

        if !parsed.is_ok() {
            return Err(DigestError::NewsApiStatus {
                status: parsed.status,
                message: parsed
                    .message
                    .or(parsed.code)
                    .unwrap_or_else(|| format!("HTTP {http_status}")),
            });
        }

        let mut articles = parsed.articles;
        let received = articles.len();
        articles.truncate(self.config.max_articles);

        info!(
            received,
            kept = articles.len(),
            total_results = ?parsed.total_results,
            "Fetched top headlines"
        );
        Ok(articles)
    }
}
