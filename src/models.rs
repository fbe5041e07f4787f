//! Data models for fetched articles and their Japanese summaries.
//!
//! - [`NewsApiResponse`] / [`Article`]: the top-headlines payload as received
//! - [`SummaryResult`]: the Japanese (title, body) pair for one article
//! - [`SummaryOutcome`]: explicit success/failure of the summarize step
//! - [`DigestEntry`]: what the renderer needs for one article

use serde::{Deserialize, Serialize};

/// Title used when generation fails for an article.
pub const GENERATION_ERROR_TITLE: &str = "Gemini API エラー";

/// Top-level body of a NewsAPI `top-headlines` response.
///
/// Errors are reported in-band: `status` is `"error"` and `code`/`message`
/// describe the problem, with no `articles` array.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "totalResults")]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl NewsApiResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// One news item. Every text field may be absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Japanese title and body produced for one article. Neither field is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub title_ja: String,
    pub body_ja: String,
}

/// Result of summarizing a single article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Summarized(SummaryResult),
    /// The generative call failed; `diagnostic` is the error text.
    Failed { diagnostic: String },
}

impl SummaryOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SummaryOutcome::Failed { .. })
    }

    /// Collapse into the pair that ends up in the document. Failures become
    /// the fixed error title with the diagnostic as body.
    pub fn into_result(self) -> SummaryResult {
        match self {
            SummaryOutcome::Summarized(result) => result,
            SummaryOutcome::Failed { diagnostic } => SummaryResult {
                title_ja: GENERATION_ERROR_TITLE.to_string(),
                body_ja: diagnostic,
            },
        }
    }
}

/// One block of the rendered digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
    pub summary: SummaryResult,
    /// Source link; empty when the article had none.
    pub url: String,
}
