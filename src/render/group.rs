// src/render/group.rs
use indexmap::IndexMap;

use crate::models::{PaperRecord, SessionGroup};

pub const UNKNOWN_SESSION: &str = "Unknown Session";

/// セッション名でまとめる (セッションは初出順、論文は入力順のまま)
pub fn group_by_session(papers: Vec<PaperRecord>) -> Vec<SessionGroup> {
    let mut groups: IndexMap<String, Vec<PaperRecord>> = IndexMap::new();

    for paper in papers {
        let name = match paper.session.trim() {
            "" => UNKNOWN_SESSION.to_string(),
            _ => paper.session.clone(),
        };
        groups.entry(name).or_default().push(paper);
    }

    groups
        .into_iter()
        .map(|(name, papers)| SessionGroup { name, papers })
        .collect()
}
