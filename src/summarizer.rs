//! Article-to-summary pipeline.
//!
//! For each [`Article`]:
//! 1. [`ArticleInput::from_article`] fills absent or blank fields with fixed
//!    placeholders, so the prompt never contains an empty slot.
//! 2. [`build_prompt`] embeds the three fields in the instruction block.
//! 3. One [`AskAsync::ask`] call is made. Failures are captured in
//!    [`SummaryOutcome::Failed`] instead of aborting the run.
//! 4. [`parse_response`] turns the free-text answer into a [`SummaryResult`].
//!
//! Articles are processed strictly one after another and share no state.

use crate::api::AskAsync;
use crate::models::{Article, DigestEntry, SummaryOutcome, SummaryResult};
use crate::utils::truncate_for_log;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

pub const TITLE_PLACEHOLDER: &str = "タイトルなし";
pub const DESCRIPTION_PLACEHOLDER: &str = "概要なし";
pub const CONTENT_PLACEHOLDER: &str = "本文なし";

/// Title used when the model returned nothing usable.
pub const TITLE_PARSE_ERROR: &str = "翻訳エラー";
/// Body used when the model returned no line after the title.
pub const BODY_PARSE_ERROR: &str = "要約エラー";

// A label at the very start of the text, Japanese or English, followed by an
// ASCII or full-width colon.
static TITLE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?i:タイトル|title)\s*[:：]").unwrap());
static BODY_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?i:記事|article)\s*[:：]").unwrap());

/// Prompt inputs for one article, with placeholders already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleInput {
    pub title: String,
    pub description: String,
    pub content: String,
}

impl ArticleInput {
    pub fn new(title: Option<&str>, description: Option<&str>, content: Option<&str>) -> Self {
        Self {
            title: or_placeholder(title, TITLE_PLACEHOLDER),
            description: or_placeholder(description, DESCRIPTION_PLACEHOLDER),
            content: or_placeholder(content, CONTENT_PLACEHOLDER),
        }
    }

    pub fn from_article(article: &Article) -> Self {
        Self::new(
            article.title.as_deref(),
            article.description.as_deref(),
            article.content.as_deref(),
        )
    }
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

/// Build the translation/summary instruction for one article.
pub fn build_prompt(input: &ArticleInput) -> String {
    format!(
        "以下の英語のニュースタイトルと概要と本文を基に、記事内容を要約してわかりやすく教えて

**条件**
1. タイトルを **自然な日本語に翻訳** する
2. 概要と本文を基に **日本語の詳細なニュース要約** を作成する
3. **シンプルで分かりやすい文章** にする
4. **元の英語のテキストは含めない**

**入力**
- タイトル: {title}
- 概要: {description}
- 本文: {content}

**出力フォーマット**
タイトル: (ここに日本語タイトル)
記事: (ここに日本語ニュース要約)
",
        title = input.title,
        description = input.description,
        content = input.content,
    )
}

/// Split a model answer into a Japanese title and body.
///
/// The first line is always the title and everything after it the body; a
/// leading `タイトル:` / `記事:` label (or `Title:` / `Article:`) is removed
/// when present. The format is not validated, so an answer without labels
/// passes through unchanged.
pub fn parse_response(text: &str) -> SummaryResult {
    let lines: Vec<&str> = text.trim().lines().collect();

    let title_ja = match lines.first() {
        Some(first) => TITLE_LABEL.replace(first, "").trim().to_string(),
        None => TITLE_PARSE_ERROR.to_string(),
    };

    let body_ja = if lines.len() > 1 {
        let rest = lines[1..].iter().join("\n");
        BODY_LABEL.replace(&rest, "").trim().to_string()
    } else {
        BODY_PARSE_ERROR.to_string()
    };

    SummaryResult { title_ja, body_ja }
}

/// Summarize one article with exactly one model call.
///
/// # Arguments
///
/// * `asker` - Model client the prompt is sent to
/// * `article` - Article as received from the news API; absent fields get placeholders
/// * `index` - Position in the run, used for log correlation only
///
/// # Returns
///
/// [`SummaryOutcome::Summarized`] with the parsed answer, or
/// [`SummaryOutcome::Failed`] carrying the error text when the call failed.
/// Never returns an error itself.
#[instrument(level = "info", skip_all, fields(index = index))]
pub async fn summarize_article<A>(asker: &A, article: &Article, index: usize) -> SummaryOutcome
where
    A: AskAsync<Response = String>,
{
    let input = ArticleInput::from_article(article);
    let prompt = build_prompt(&input);
    debug!(index, title = %input.title, prompt_bytes = prompt.len(), "Built prompt");

    match asker.ask(&prompt).await {
        Ok(answer) => {
            let result = parse_response(&answer);
            debug!(
                index,
                response_preview = %truncate_for_log(&answer, 300),
                "Parsed model response"
            );
            SummaryOutcome::Summarized(result)
        }
        Err(e) => {
            warn!(index, error = %e, "Generation failed; using error marker for this article");
            SummaryOutcome::Failed {
                diagnostic: e.to_string(),
            }
        }
    }
}

/// Summarize every article in order, one at a time.
///
/// # Arguments
///
/// * `asker` - Model client shared by all calls
/// * `articles` - Articles to summarize, already bounded by the fetcher
///
/// # Returns
///
/// Exactly one [`DigestEntry`] per input article, in input order. Articles
/// whose call failed carry the error marker title and the diagnostic as body.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_all<A>(asker: &A, articles: &[Article]) -> Vec<DigestEntry>
where
    A: AskAsync<Response = String>,
{
    let mut entries = Vec::with_capacity(articles.len());
    let mut failed = 0usize;

    for (i, article) in articles.iter().enumerate() {
        let outcome = summarize_article(asker, article, i).await;
        if outcome.is_failed() {
            failed += 1;
        } else {
            info!(index = i, "Summarized article");
        }
        entries.push(DigestEntry {
            summary: outcome.into_result(),
            url: article.url.clone().unwrap_or_default(),
        });
    }

    info!(
        total = articles.len(),
        successful = articles.len() - failed,
        failed,
        "Completed article summarization"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GENERATION_ERROR_TITLE;
    use std::cell::RefCell;
    use std::error::Error;

    /// Replays scripted answers; `None` simulates a failed call.
    struct ScriptedAsk {
        answers: RefCell<Vec<Option<String>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedAsk {
        fn new(answers: Vec<Option<&str>>) -> Self {
            Self {
                answers: RefCell::new(answers.into_iter().rev().map(|a| a.map(String::from)).collect()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl AskAsync for ScriptedAsk {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            self.prompts.borrow_mut().push(text.to_string());
            match self.answers.borrow_mut().pop().flatten() {
                Some(answer) => Ok(answer),
                None => Err("upstream unavailable".into()),
            }
        }
    }

    fn article(title: &str, url: Option<&str>) -> Article {
        Article {
            title: Some(title.to_string()),
            description: Some(format!("{title} description")),
            content: Some(format!("{title} content")),
            url: url.map(String::from),
        }
    }

    #[test]
    fn absent_fields_get_placeholders() {
        let input = ArticleInput::from_article(&Article::default());

        assert_eq!(input.title, TITLE_PLACEHOLDER);
        assert_eq!(input.description, DESCRIPTION_PLACEHOLDER);
        assert_eq!(input.content, CONTENT_PLACEHOLDER);

        let prompt = build_prompt(&input);
        assert!(prompt.contains("- タイトル: タイトルなし"));
        assert!(prompt.contains("- 概要: 概要なし"));
        assert!(prompt.contains("- 本文: 本文なし"));
    }

    #[test]
    fn whitespace_only_fields_get_placeholders() {
        let input = ArticleInput::new(Some("  "), Some("\n\t"), Some(""));
        assert_eq!(input, ArticleInput::new(None, None, None));
    }

    #[test]
    fn present_fields_are_kept() {
        let input = ArticleInput::new(Some("Fed holds rates"), Some("Summary"), None);
        assert_eq!(input.title, "Fed holds rates");
        assert_eq!(input.description, "Summary");
        assert_eq!(input.content, CONTENT_PLACEHOLDER);
        assert!(build_prompt(&input).contains("- タイトル: Fed holds rates"));
    }

    #[test]
    fn parses_labelled_english_response() {
        let result = parse_response("Title: X\nArticle: Y");
        assert_eq!(result.title_ja, "X");
        assert_eq!(result.body_ja, "Y");
    }

    #[test]
    fn parses_labelled_japanese_response() {
        let result = parse_response("タイトル: 株価が上昇\n記事: 市場は好調だった。\n投資家は楽観的。\n");
        assert_eq!(result.title_ja, "株価が上昇");
        assert_eq!(result.body_ja, "市場は好調だった。\n投資家は楽観的。");
    }

    #[test]
    fn full_width_colon_is_recognised() {
        let result = parse_response("タイトル：株価\n記事：上昇");
        assert_eq!(result.title_ja, "株価");
        assert_eq!(result.body_ja, "上昇");
    }

    #[test]
    fn empty_response_uses_both_placeholders() {
        let result = parse_response("");
        assert_eq!(result.title_ja, TITLE_PARSE_ERROR);
        assert_eq!(result.body_ja, BODY_PARSE_ERROR);

        let result = parse_response("  \n \n");
        assert_eq!(result.title_ja, TITLE_PARSE_ERROR);
        assert_eq!(result.body_ja, BODY_PARSE_ERROR);
    }

    #[test]
    fn single_line_response_has_body_placeholder() {
        let result = parse_response("Hello");
        assert_eq!(result.title_ja, "Hello");
        assert_eq!(result.body_ja, BODY_PARSE_ERROR);
    }

    #[test]
    fn unlabelled_response_passes_through() {
        let result = parse_response("株価が上昇\n市場は好調だった。");
        assert_eq!(result.title_ja, "株価が上昇");
        assert_eq!(result.body_ja, "市場は好調だった。");
    }

    #[test]
    fn label_is_only_stripped_at_start() {
        let result = parse_response("速報 タイトル: 続報\n本文の途中に 記事: がある");
        assert_eq!(result.title_ja, "速報 タイトル: 続報");
        assert_eq!(result.body_ja, "本文の途中に 記事: がある");
    }

    #[tokio::test]
    async fn one_call_per_article_with_placeholders_in_prompt() {
        let asker = ScriptedAsk::new(vec![Some("タイトル: 見出し\n記事: 要約")]);
        let outcome = summarize_article(&asker, &Article::default(), 0).await;

        assert_eq!(
            outcome,
            SummaryOutcome::Summarized(SummaryResult {
                title_ja: "見出し".to_string(),
                body_ja: "要約".to_string(),
            })
        );
        let prompts = asker.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(TITLE_PLACEHOLDER));
        assert!(prompts[0].contains(DESCRIPTION_PLACEHOLDER));
        assert!(prompts[0].contains(CONTENT_PLACEHOLDER));
    }

    #[tokio::test]
    async fn failure_is_isolated_to_one_article() {
        let asker = ScriptedAsk::new(vec![
            Some("タイトル: 一\n記事: 一の要約"),
            None,
            Some("タイトル: 三\n記事: 三の要約"),
        ]);
        let articles = vec![
            article("One", Some("https://example.com/1")),
            article("Two", Some("https://example.com/2")),
            article("Three", None),
        ];

        let entries = summarize_all(&asker, &articles).await;

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].summary.title_ja, "一");
        assert_eq!(entries[1].summary.title_ja, GENERATION_ERROR_TITLE);
        assert_eq!(entries[1].summary.body_ja, "upstream unavailable");
        assert_eq!(entries[2].summary.title_ja, "三");
        assert_eq!(entries[2].url, "");
        assert_eq!(asker.prompts.borrow().len(), 3);
    }
}
