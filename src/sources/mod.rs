//! Article sources.
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | NewsAPI top headlines | [`newsapi`] | JSON over HTTPS, API key in the query |

pub mod newsapi;
