//! Command-line interface definitions for the news digest mailer.
//!
//! Every tunable can be given as a flag or through the environment. Secrets
//! (API keys, mail credentials) are never flags; they are read from
//! the environment, optionally seeded from a `.env` file by
//! [`crate::config::load_env_file`], and validated by
//! [`crate::config::Config::from_env`].

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a single digest run.
///
/// # Examples
///
/// ```sh
/// # Defaults: 5 US business headlines, written to ./news_summary.pdf
/// news_digest_mailer
///
/// # Technology headlines, timestamped output, CJK font for the PDF
/// news_digest_mailer --category technology --unique-filename --font ./NotoSansJP-Regular.ttf
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a .env file (defaults to ./.env when present)
    #[arg(short, long)]
    pub env_file: Option<PathBuf>,

    /// Country code passed to the top-headlines endpoint
    #[arg(long, env = "NEWS_COUNTRY", default_value = "us")]
    pub country: String,

    /// Headline category passed to the top-headlines endpoint
    #[arg(long, env = "NEWS_CATEGORY", default_value = "business")]
    pub category: String,

    /// Maximum number of articles to summarize
    #[arg(
        short = 'n',
        long,
        env = "NEWS_MAX_ARTICLES",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub max_articles: u32,

    /// Gemini model used for translation and summarization
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub model: String,

    /// Upper bound on tokens generated per article
    #[arg(long, env = "GEMINI_MAX_OUTPUT_TOKENS", default_value_t = 500)]
    pub max_output_tokens: u32,

    /// Path of the generated PDF
    #[arg(short, long, env = "DIGEST_OUTPUT", default_value = "news_summary.pdf")]
    pub output: PathBuf,

    /// Append a local timestamp to the PDF filename so runs never overwrite each other
    #[arg(long)]
    pub unique_filename: bool,

    /// TrueType/OpenType font embedded in the PDF (needed for Japanese glyphs)
    #[arg(long, env = "DIGEST_PDF_FONT")]
    pub font: Option<PathBuf>,

    /// SMTP host, reached over implicit TLS
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP port
    #[arg(long, env = "SMTP_PORT", default_value_t = 465)]
    pub smtp_port: u16,

    /// Base URL of the news API
    #[arg(long, env = "NEWSAPI_BASE_URL", default_value = "https://newsapi.org")]
    pub news_api_base: String,

    /// Base URL of the Gemini API
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_api_base: String,
}
