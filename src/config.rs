//! Run configuration.
//!
//! A [`Config`] is built once in `main`, validated, and then only ever borrowed
//! by the pipeline stages. Secrets come from the process environment, optionally
//! seeded from a `.env` file.

use crate::cli::Cli;
use crate::error::{DigestError, Result};
use crate::utils::timestamped_path;
use chrono::Local;
use lettre::message::Mailbox;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

pub const NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GMAIL_USER: &str = "GMAIL_USER";
pub const GMAIL_PASS: &str = "GMAIL_PASS";
pub const GMAIL_RECEIVER: &str = "GMAIL_RECEIVER";

/// Validated, read-only settings for one run.
#[derive(Clone)]
pub struct Config {
    pub newsapi_key: String,
    pub gemini_api_key: String,
    pub mail_user: String,
    pub mail_password: String,
    pub mail_receiver: String,

    pub news_api_base: Url,
    pub country: String,
    pub category: String,
    pub max_articles: usize,

    pub gemini_api_base: Url,
    pub model: String,
    pub max_output_tokens: u32,

    /// Final PDF path, already timestamped when `--unique-filename` was given.
    pub output_path: PathBuf,
    pub font_path: Option<PathBuf>,

    pub smtp_host: String,
    pub smtp_port: u16,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("newsapi_key", &"<redacted>")
            .field("gemini_api_key", &"<redacted>")
            .field("mail_user", &self.mail_user)
            .field("mail_password", &"<redacted>")
            .field("mail_receiver", &self.mail_receiver)
            .field("news_api_base", &self.news_api_base.as_str())
            .field("country", &self.country)
            .field("category", &self.category)
            .field("max_articles", &self.max_articles)
            .field("gemini_api_base", &self.gemini_api_base.as_str())
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("output_path", &self.output_path)
            .field("font_path", &self.font_path)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

impl Config {
    /// Build the configuration from the parsed CLI and the process environment.
    ///
    /// Call [`load_env_file`] first so `.env` values are visible.
    pub fn from_env(cli: &Cli) -> Result<Self> {
        Self::from_lookup(cli, |key| std::env::var(key).ok())
    }

    /// Build the configuration, resolving secrets through `lookup`.
    ///
    /// Blank values count as missing. Every missing secret is reported at once.
    pub fn from_lookup<F>(cli: &Cli, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |key: &'static str| match lookup(key).filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => {
                missing.push(key);
                String::new()
            }
        };
        let newsapi_key = require(NEWSAPI_KEY);
        let gemini_api_key = require(GEMINI_API_KEY);
        let mail_user = require(GMAIL_USER);
        let mail_password = require(GMAIL_PASS);
        let mail_receiver = require(GMAIL_RECEIVER);
        if !missing.is_empty() {
            return Err(DigestError::MissingConfig(missing));
        }

        check_mailbox(GMAIL_USER, &mail_user)?;
        check_mailbox(GMAIL_RECEIVER, &mail_receiver)?;

        let output_path = if cli.unique_filename {
            timestamped_path(&cli.output, Local::now().naive_local())
        } else {
            cli.output.clone()
        };

        Ok(Self {
            newsapi_key,
            gemini_api_key,
            mail_user,
            mail_password,
            mail_receiver,
            news_api_base: parse_base_url("--news-api-base", &cli.news_api_base)?,
            country: cli.country.clone(),
            category: cli.category.clone(),
            max_articles: cli.max_articles as usize,
            gemini_api_base: parse_base_url("--gemini-api-base", &cli.gemini_api_base)?,
            model: cli.model.clone(),
            max_output_tokens: cli.max_output_tokens,
            output_path,
            font_path: cli.font.clone(),
            smtp_host: cli.smtp_host.clone(),
            smtp_port: cli.smtp_port,
        })
    }
}

/// Load `path`, or `./.env` when no path is given, into the process environment.
///
/// An explicitly named file must exist; a missing default `.env` is fine.
/// Variables already set in the environment win over the file.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| DigestError::InvalidConfig {
                name: "--env-file",
                reason: format!("{}: {e}", path.display()),
            })?;
            info!(path = %path.display(), "Loaded env file");
        }
        None => match dotenvy::dotenv() {
            Ok(path) => info!(path = %path.display(), "Loaded .env"),
            Err(e) if e.not_found() => debug!("No .env file found; using process environment"),
            Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
        },
    }
    Ok(())
}

fn check_mailbox(name: &'static str, value: &str) -> Result<()> {
    value
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|e| DigestError::InvalidConfig {
            name,
            reason: e.to_string(),
        })
}

fn parse_base_url(name: &'static str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| DigestError::InvalidConfig {
        name,
        reason: format!("{value}: {e}"),
    })
}


#[cfg(test)]
pub(crate) fn test_config(news_api_base: &str, gemini_api_base: &str) -> Config {
    use clap::Parser;

    let cli = Cli::parse_from([
        "news_digest_mailer",
        "--news-api-base",
        news_api_base,
        "--gemini-api-base",
        gemini_api_base,
    ]);
    Config::from_lookup(&cli, |key| {
        let value = match key {
            NEWSAPI_KEY => "news-key",
            GEMINI_API_KEY => "gemini-key",
            GMAIL_USER => "sender@example.com",
            GMAIL_PASS => "app-password",
            GMAIL_RECEIVER => "reader@example.com",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test configuration is valid")
}
