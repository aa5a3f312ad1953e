// models.rs
use serde::{Deserialize, Serialize};

// 1. PaperRecord 構造体 (papers.json の 1 要素)
// 画像フィールドは null でも必ずキーを出力する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub session: String,
    pub session_id: String,
    pub paper_id: String,
    pub schedule: String,
    pub presentation_url: String,
    pub image_url: Option<String>,
    pub image_file: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub affiliations: Vec<Vec<String>>,
}

// 2. SessionGroup (描画時にのみ構築、保存はしない)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionGroup {
    pub name: String,
    pub papers: Vec<PaperRecord>,
}

impl PaperRecord {
    /// 画像取得結果を反映したレコードを返す
    pub fn with_image_file(self, image_file: Option<String>) -> Self {
        PaperRecord { image_file, ..self }
    }
}

#[cfg(test)]
pub(crate) fn sample_paper(title: &str, session: &str, paper_id: &str) -> PaperRecord {
    PaperRecord {
        title: title.to_string(),
        authors: vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()],
        session: session.to_string(),
        session_id: format!("sess-{session}"),
        paper_id: paper_id.to_string(),
        schedule: "Mon, Aug 11 2025, 09:00–10:30 UTC · Room 501".to_string(),
        presentation_url: format!("https://example.org/?post_type=page&p=14&id={paper_id}"),
        image_url: None,
        image_file: None,
        location: "Room 501".to_string(),
        start: "2025-08-11 09:00:00".to_string(),
        end: "2025-08-11 10:30:00".to_string(),
        description: None,
        affiliations: Vec::new(),
    }
}
