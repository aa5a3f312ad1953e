// src/events.rs
use serde::Serialize;

/// セッション名の除外ルールの照合方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// タイトル全体が一致した場合のみ除外
    Exact,
    /// タイトルにキーワードが含まれていれば除外
    Contains,
}

/// 「Technical Paper」扱いだが論文ではないセッションの除外リスト
#[derive(Debug, Clone, Copy)]
pub struct Denylist {
    pub titles: &'static [&'static str],
    pub mode: MatchMode,
}

impl Denylist {
    pub fn matches(&self, title: &str) -> bool {
        match self.mode {
            MatchMode::Exact => self.titles.iter().any(|t| *t == title),
            MatchMode::Contains => self.titles.iter().any(|t| title.contains(t)),
        }
    }
}

/// 元データの誤りを手動で上書きするための修正 (論文タイトルで照合)
#[derive(Debug, Clone, Copy)]
pub struct AuthorFix {
    pub title: &'static str,
    pub authors: &'static [&'static str],
    pub affiliations: &'static [&'static [&'static str]],
}

/// 対応イベント 1 件分の静的な設定
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EventConfig {
    pub key: &'static str,
    pub page_title: &'static str,
    pub source_url: &'static str,
    pub source_label: &'static str,
    #[serde(skip)]
    pub excluded_sessions: Denylist,
    #[serde(skip)]
    pub excluded_paper_keywords: &'static [&'static str],
    #[serde(skip)]
    pub author_fixes: &'static [AuthorFix],
}

pub static EVENTS: &[EventConfig] = &[
    EventConfig {
        key: "siggraph2025",
        page_title: "SIGGRAPH 2025 Technical Papers",
        source_url: "https://s2025.conference-schedule.org/",
        source_label: "SIGGRAPH 2025 Conference Schedule",
        excluded_sessions: Denylist {
            titles: &[
                "Papers Fast Forward",
                "SIGGRAPH 2025 Technical Papers Town Hall",
                "Technical Papers Town Hall",
                "Technical Papers Closing Session",
            ],
            mode: MatchMode::Exact,
        },
        excluded_paper_keywords: &[],
        author_fixes: &[],
    },
    EventConfig {
        key: "siggraph-asia-2025",
        page_title: "SIGGRAPH Asia 2025 Technical Papers",
        source_url: "https://sa2025.conference-schedule.org/",
        source_label: "SIGGRAPH Asia 2025 Conference Schedule",
        excluded_sessions: Denylist {
            titles: &[
                "Papers Fast Forward",
                "Technical Papers Town Hall",
                "Technical Papers Closing Session",
                "Technical Papers Interactive Discussion",
            ],
            mode: MatchMode::Contains,
        },
        excluded_paper_keywords: &["Interactive Discussion"],
        author_fixes: &[
            AuthorFix {
                title: "Implicit Bonded Discrete Element Method with Manifold Optimization",
                authors: &["Jia-Ming Lu", "Geng-Chen Cao", "Chenfeng Li", "Shi-Min Hu"],
                affiliations: &[
                    &["Tsinghua University"],
                    &["Tsinghua University"],
                    &["Swansea University Bay Campus"],
                    &["Tsinghua University"],
                ],
            },
            AuthorFix {
                title: "Reliable Iterative Dynamics: A Versatile Method for Fast and Robust Simulation",
                authors: &["Jia-Ming Lu", "Shi-Min Hu"],
                affiliations: &[&["Tsinghua University"], &["Tsinghua University"]],
            },
        ],
    },
];

#[derive(Debug, thiserror::Error)]
#[error("Unsupported event '{key}'. Supported events: {}", supported_keys().join(", "))]
pub struct UnknownEvent {
    pub key: String,
}

pub fn supported_keys() -> Vec<&'static str> {
    EVENTS.iter().map(|e| e.key).collect()
}

/// イベントキーから設定を引く
pub fn lookup(key: &str) -> Result<&'static EventConfig, UnknownEvent> {
    EVENTS
        .iter()
        .find(|e| e.key == key)
        .ok_or_else(|| UnknownEvent {
            key: key.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_event() {
        let event = lookup("siggraph2025").unwrap();
        assert_eq!(event.source_url, "https://s2025.conference-schedule.org/");
    }

    #[test]
    fn unknown_event_lists_supported_keys() {
        let err = lookup("chi2025").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("chi2025"));
        for key in supported_keys() {
            assert!(msg.contains(key), "{msg} should mention {key}");
        }
    }

    #[test]
    fn exact_denylist_ignores_partial_titles() {
        let list = Denylist {
            titles: &["Papers Fast Forward"],
            mode: MatchMode::Exact,
        };
        assert!(list.matches("Papers Fast Forward"));
        assert!(!list.matches("Papers Fast Forward (Repeat)"));
    }

    #[test]
    fn contains_denylist_matches_keywords() {
        let list = Denylist {
            titles: &["Technical Papers Town Hall"],
            mode: MatchMode::Contains,
        };
        assert!(list.matches("SIGGRAPH Asia 2025 Technical Papers Town Hall"));
        assert!(!list.matches("Rendering I"));
    }

    #[test]
    fn keys_are_unique() {
        let mut keys = supported_keys();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), EVENTS.len());
    }
}
