//! Output generation: the HTML digest and its PDF rendering.
//!
//! # Submodules
//!
//! - [`html`]: Folds the summarized entries into one HTML document
//! - [`pdf`]: Converts that document into PDF bytes and writes the file

pub mod html;
pub mod pdf;
