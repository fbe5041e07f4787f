//! HTML-to-PDF conversion and file output.
//!
//! Rendering sits behind [`PdfRenderer`] so the pipeline does not care which
//! engine produces the bytes. [`PrintPdfRenderer`] uses printpdf's HTML
//! layout. The built-in PDF fonts have no Japanese glyphs, so a TrueType or
//! OpenType font can be embedded. printpdf registers each supplied font under
//! the part of its map key before the first `.`, and that name is what a CSS
//! `font-family` has to ask for, hence [`FONT_FAMILY`] carries no extension.

use crate::error::{DigestError, Result};
use crate::utils::ensure_parent_dir;
use printpdf::{Base64OrRaw, GeneratePdfOptions, PdfDocument, PdfSaveOptions};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Family name under which a configured font is registered.
pub const FONT_FAMILY: &str = "DigestFont";

/// Converts a complete HTML document into PDF bytes.
pub trait PdfRenderer {
    fn render(&self, html: &str) -> Result<Vec<u8>>;

    /// Font family the HTML should request, when the renderer embeds one.
    fn font_family(&self) -> Option<&str> {
        None
    }
}

/// printpdf-backed renderer.
#[derive(Default)]
pub struct PrintPdfRenderer {
    fonts: BTreeMap<String, Base64OrRaw>,
}

impl PrintPdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with `font` embedded under [`FONT_FAMILY`], or the built-in
    /// fonts when no path is given.
    #[instrument(level = "info", skip_all)]
    pub async fn with_font(font: Option<&Path>) -> Result<Self> {
        let Some(path) = font else {
            warn!("No PDF font configured; Japanese text may not render");
            return Ok(Self::new());
        };
        let bytes = fs::read(path).await.map_err(|e| {
            DigestError::Render(format!("cannot read font {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "Loaded PDF font");

        let mut fonts = BTreeMap::new();
        fonts.insert(FONT_FAMILY.to_string(), Base64OrRaw::Raw(bytes));
        Ok(Self { fonts })
    }
}

impl PdfRenderer for PrintPdfRenderer {
    #[instrument(level = "info", skip_all, fields(html_bytes = html.len()))]
    fn render(&self, html: &str) -> Result<Vec<u8>> {
        let mut warnings = Vec::new();
        let doc = PdfDocument::from_html(
            html,
            &BTreeMap::new(),
            &self.fonts,
            &GeneratePdfOptions::default(),
            &mut warnings,
        )
        .map_err(DigestError::Render)?;

        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), warnings = ?warnings, "PDF generation warnings");
        }
        if bytes.is_empty() {
            return Err(DigestError::Render("renderer produced an empty document".to_string()));
        }

        info!(pdf_bytes = bytes.len(), "Rendered PDF");
        Ok(bytes)
    }

    fn font_family(&self) -> Option<&str> {
        if self.fonts.is_empty() {
            None
        } else {
            Some(FONT_FAMILY)
        }
    }
}

/// Write the whole PDF in one go, creating the parent directory if needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path).await?;
    fs::write(path, bytes).await?;
    info!(bytes = bytes.len(), "Wrote PDF");
    Ok(())
}
