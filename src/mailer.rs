//! Mail delivery of the rendered digest.
//!
//! The PDF is read back from disk after it has been fully written, wrapped in
//! an [`OutboundMessage`] and sent through a [`MailTransport`]. The production
//! transport is [`SmtpMailer`]: SMTP with implicit TLS (port 465 by default)
//! and username/password authentication.

use crate::config::Config;
use crate::error::Result;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const SUBJECT: &str = "📩 今日のニュース要約";
pub const BODY_TEXT: &str = "今日のニュースを要約しました。添付PDFをご確認ください。";
const PDF_MIME: &str = "application/pdf";

/// A digest email: plain-text note plus one PDF attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

impl OutboundMessage {
    /// Read the PDF at `pdf_path` and address it from the mail account to the
    /// configured recipient.
    #[instrument(level = "info", skip_all, fields(path = %pdf_path.display()))]
    pub async fn with_pdf(config: &Config, pdf_path: &Path) -> Result<Self> {
        let attachment = fs::read(pdf_path).await?;
        let attachment_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "news_summary.pdf".to_string());

        Ok(Self {
            subject: SUBJECT.to_string(),
            from: config.mail_user.clone(),
            to: config.mail_receiver.clone(),
            body: BODY_TEXT.to_string(),
            attachment_name,
            attachment,
        })
    }

    /// Build the MIME message: `multipart/mixed` with a text part and the PDF.
    pub fn to_message(&self) -> Result<Message> {
        let from: Mailbox = self.from.parse()?;
        let to: Mailbox = self.to.parse()?;
        let pdf = Attachment::new(self.attachment_name.clone())
            .body(self.attachment.clone(), ContentType::parse(PDF_MIME)?);

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.as_str())
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(self.body.clone()),
                    )
                    .singlepart(pdf),
            )?;
        Ok(message)
    }
}

/// Something that can deliver an [`OutboundMessage`].
pub trait MailTransport {
    async fn deliver(&self, message: OutboundMessage) -> Result<()>;
}

/// SMTP-over-TLS transport using the configured account.
#[derive(Debug)]
pub struct SmtpMailer<'a> {
    config: &'a Config,
}

impl<'a> SmtpMailer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }
}

impl<'a> MailTransport for SmtpMailer<'a> {
    #[instrument(level = "info", skip_all, fields(host = %self.config.smtp_host, port = self.config.smtp_port))]
    async fn deliver(&self, message: OutboundMessage) -> Result<()> {
        let email = message.to_message()?;

        let creds = Credentials::new(
            self.config.mail_user.clone(),
            self.config.mail_password.clone(),
        );
        let transport: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build();

        transport.send(email).await?;

        info!(
            to = %message.to,
            attachment = %message.attachment_name,
            attachment_bytes = message.attachment.len(),
            "Email sent successfully"
        );
        Ok(())
    }
}
