//! # News Digest Mailer
//!
//! Fetches the day's top headlines from NewsAPI, has Gemini translate and
//! summarize each one into Japanese, renders the result as a PDF and mails it.
//! Meant to be run once per invocation, e.g. from cron.
//!
//! ## Usage
//!
//! ```sh
//! # Secrets come from the environment or ./.env:
//! #   NEWSAPI_KEY, GEMINI_API_KEY, GMAIL_USER, GMAIL_PASS, GMAIL_RECEIVER
//! news_digest_mailer --category technology --font ./NotoSansJP-Regular.ttf
//! ```
//!
//! ## Architecture
//!
//! The run is a straight pipeline:
//! 1. **Fetching**: One request to the top-headlines endpoint
//! 2. **Summarizing**: One Gemini call per article, in order
//! 3. **Rendering**: HTML document, converted to a PDF file
//! 4. **Mailing**: The PDF is attached and sent over SMTP with implicit TLS

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod mailer;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod summarizer;
mod utils;

use api::GeminiClient;
use cli::Cli;
use config::{Config, load_env_file};
use mailer::SmtpMailer;
use outputs::pdf::PrintPdfRenderer;
use pipeline::{Pipeline, RunOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "news_digest_mailer starting up");

    // Parse once to find the env file, then again so flags that default from
    // the environment see the values it provided.
    let args = Cli::parse();
    if let Err(e) = load_env_file(args.env_file.as_deref()) {
        error!(error = %e, "Configuration error");
        return Err(e.into());
    }
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Nothing touches the network before the configuration is complete.
    let config = match Config::from_env(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            return Err(e.into());
        }
    };
    debug!(?config, "Loaded configuration");

    let asker = GeminiClient::new(&config)?;
    let renderer = PrintPdfRenderer::with_font(config.font_path.as_deref()).await?;
    let mailer = SmtpMailer::new(&config);

    let pipeline = Pipeline {
        config: &config,
        asker: &asker,
        renderer: &renderer,
        mailer: &mailer,
    };

    match pipeline.run().await? {
        RunOutcome::Done { articles, pdf_path } => {
            info!(articles, pdf = %pdf_path.display(), "Digest delivered");
        }
        RunOutcome::NoArticles { reason } => {
            info!(%reason, "No digest sent");
        }
    }

    Ok(())
}
