//! Small helpers for logging and output paths.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (never inside a UTF-8
/// character) with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Insert a `_YYYYMMDD_HHMMSS` suffix before the extension of `path`.
///
/// `news_summary.pdf` run at 2025-05-06 07:30:00 becomes
/// `news_summary_20250506_073000.pdf`. The parent directory is kept.
pub fn timestamped_path(path: &Path, at: NaiveDateTime) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "news_summary".to_string());
    let stamp = at.format("%Y%m%d_%H%M%S");
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    path.with_file_name(name)
}

/// Create the directory that will hold `file` if it does not exist yet.
#[instrument(level = "debug", skip_all, fields(path = %file.display()))]
pub async fn ensure_parent_dir(file: &Path) -> std::io::Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // Each of these characters is three bytes long.
        let s = "日本語のニュース";
        let result = truncate_for_log(s, 4);
        assert!(result.starts_with("日…"));
        assert!(result.ends_with("(+21 bytes)"));
    }

    #[test]
    fn test_timestamped_path() {
        let p = timestamped_path(Path::new("out/news_summary.pdf"), at());
        assert_eq!(p, PathBuf::from("out/news_summary_20250506_073000.pdf"));
    }

    #[test]
    fn test_timestamped_path_without_extension() {
        let p = timestamped_path(Path::new("digest"), at());
        assert_eq!(p, PathBuf::from("digest_20250506_073000"));
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_nested_dirs() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a/b/news_summary.pdf");

        ensure_parent_dir(&file).await.unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("news_summary.pdf")).await.unwrap();
    }
}
