//! Run orchestration.
//!
//! A run moves through fixed states and never re-enters an earlier one:
//!
//! ```text
//! Init → Fetching → Summarizing → Rendering → Mailing → Done
//!           └──────→ NoArticles
//! (any state) ─────→ Aborted
//! ```
//!
//! A fetch that fails or returns nothing ends the run quietly as
//! [`RunOutcome::NoArticles`]. Generation failures only degrade their own
//! article. Rendering, file and mail failures abort the run and are returned
//! as errors; a PDF that was already written stays on disk.

use crate::api::AskAsync;
use crate::config::Config;
use crate::error::Result;
use crate::mailer::{MailTransport, OutboundMessage};
use crate::models::Article;
use crate::outputs::html::render_document;
use crate::outputs::pdf::{PdfRenderer, write_pdf};
use crate::sources::newsapi::NewsApiClient;
use crate::summarizer::summarize_all;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Fetching,
    Summarizing,
    Rendering,
    Mailing,
    Done,
    NoArticles,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::Fetching => "fetching",
            RunState::Summarizing => "summarizing",
            RunState::Rendering => "rendering",
            RunState::Mailing => "mailing",
            RunState::Done => "done",
            RunState::NoArticles => "no_articles",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// How a run that did not abort ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Done { articles: usize, pdf_path: PathBuf },
    NoArticles { reason: String },
}

/// The collaborators a run needs besides the news API, which is reached
/// through the configured base URL.
pub struct Pipeline<'a, A, R, M> {
    pub config: &'a Config,
    pub asker: &'a A,
    pub renderer: &'a R,
    pub mailer: &'a M,
}

impl<'a, A, R, M> Pipeline<'a, A, R, M>
where
    A: AskAsync<Response = String>,
    R: PdfRenderer,
    M: MailTransport,
{
    /// Execute one run end to end.
    ///
    /// # Returns
    ///
    /// * [`RunOutcome::Done`] once the PDF has been written and mailed
    /// * [`RunOutcome::NoArticles`] when the fetch failed or came back empty;
    ///   nothing is rendered or sent in that case
    ///
    /// # Errors
    ///
    /// Rendering, file and mail failures abort the run. A PDF that was
    /// already written stays on disk.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Result<RunOutcome> {
        let t0 = Instant::now();
        let mut state = RunState::Init;

        let res = self.run_stages(&mut state).await;
        let elapsed_ms = t0.elapsed().as_millis();
        match &res {
            Ok(RunOutcome::Done { articles, pdf_path }) => info!(
                state = %RunState::Done,
                articles,
                pdf = %pdf_path.display(),
                elapsed_ms,
                "Run complete"
            ),
            Ok(RunOutcome::NoArticles { reason }) => warn!(
                state = %RunState::NoArticles,
                %reason,
                elapsed_ms,
                "No articles fetched; nothing to send"
            ),
            Err(e) => error!(
                state = %RunState::Aborted,
                failed_in = %state,
                error = %e,
                elapsed_ms,
                "Run aborted"
            ),
        }
        res
    }

    async fn run_stages(&self, state: &mut RunState) -> Result<RunOutcome> {
        advance(state, RunState::Fetching);
        let articles = match self.fetch().await {
            Ok(articles) if articles.is_empty() => {
                return Ok(RunOutcome::NoArticles {
                    reason: "news API returned no articles".to_string(),
                });
            }
            Ok(articles) => articles,
            Err(e) => {
                return Ok(RunOutcome::NoArticles {
                    reason: e.to_string(),
                });
            }
        };

        advance(state, RunState::Summarizing);
        let entries = summarize_all(self.asker, &articles).await;

        advance(state, RunState::Rendering);
        let html = render_document(&entries, self.renderer.font_family());
        let pdf = self.renderer.render(&html)?;
        let pdf_path = self.config.output_path.clone();
        write_pdf(&pdf_path, &pdf).await?;

        advance(state, RunState::Mailing);
        let message = OutboundMessage::with_pdf(self.config, &pdf_path).await?;
        self.mailer.deliver(message).await?;

        advance(state, RunState::Done);
        Ok(RunOutcome::Done {
            articles: entries.len(),
            pdf_path,
        })
    }

    async fn fetch(&self) -> Result<Vec<Article>> {
        let client = NewsApiClient::new(self.config)?;
        client.fetch_top_headlines().await
    }
}

fn advance(state: &mut RunState, next: RunState) {
    info!(from = %state, to = %next, "Run state change");
    *state = next;
}
