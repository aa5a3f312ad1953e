// src/config.rs
use std::path::{Path, PathBuf};

use crate::events::EventConfig;

/// 環境変数から読み込むアプリ全体の設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub user_agent: String,
    pub chrome_path: Option<PathBuf>,
}

impl AppConfig {
    /// `.env` は main で読み込み済みの前提
    pub fn from_env() -> Self {
        let output_dir = std::env::var("PAPERS_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string());
        let user_agent = std::env::var("PAPERS_USER_AGENT")
            .unwrap_or_else(|_| concat!("papers-digest/", env!("CARGO_PKG_VERSION")).to_string());
        let chrome_path = std::env::var("CHROME_PATH").ok().map(PathBuf::from);
        tracing::debug!("Output root: {}", output_dir);

        AppConfig {
            output_dir: PathBuf::from(output_dir),
            user_agent,
            chrome_path,
        }
    }

    pub fn event_paths(&self, event: &EventConfig) -> EventPaths {
        EventPaths::new(&self.output_dir, event.key)
    }
}

/// 1 イベント分の出力先 (`<root>/<event>/...`)
#[derive(Debug, Clone)]
pub struct EventPaths {
    pub dir: PathBuf,
}

impl EventPaths {
    pub fn new(root: &Path, key: &str) -> Self {
        EventPaths {
            dir: root.join(key),
        }
    }

    pub fn papers_json(&self) -> PathBuf {
        self.dir.join("papers.json")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.dir.join("images")
    }

    pub fn index_html(&self) -> PathBuf {
        self.dir.join("index.html")
    }

    pub fn slides_html(&self) -> PathBuf {
        self.dir.join("slides.html")
    }

    pub fn slides_css(&self) -> PathBuf {
        self.dir.join("slides.css")
    }

    pub fn slides_pdf(&self) -> PathBuf {
        self.dir.join("slides.pdf")
    }
}
