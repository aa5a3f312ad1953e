// src/crawler/error.rs

/// クローラーモジュール専用のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parsing error: {0}")]
    Parse(String),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("All {0} schedule snippets failed to load")]
    ScheduleUnavailable(usize),
    #[error("No parser found for URL: {0}")]
    NoParserFound(String),
}

