// src/crawler/parser_schedule.rs
use super::{CrawlError, ScheduleParser};
use crate::events::{Denylist, EventConfig};
use crate::models::PaperRecord;
use chrono::{DateTime, NaiveDateTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing;
use url::Url;

// --- conference-schedule.org パーサー ---

/// スケジュールページのセレクタを保持する構造体
struct ScheduleSelectors {
    post_load: Selector,
    agenda_row: Selector,
    presentation_type: Selector,
    presentation_title: Selector,
    presentation_location: Selector,
    title_link: Selector,
    person_link: Selector,
    author_text: Selector,
    representative_img: Selector,
    any_img: Selector,
}

/// セレクタとRegexを起動時に一度だけパースする
static SELECTORS: Lazy<ScheduleSelectors> = Lazy::new(|| ScheduleSelectors {
    post_load: Selector::parse("div.post-load[source]")
        .expect("Failed to parse post-load selector"),
    agenda_row: Selector::parse("tr.agenda-item").expect("Failed to parse agenda row selector"),
    presentation_type: Selector::parse("span.presentation-type")
        .expect("Failed to parse presentation type selector"),
    presentation_title: Selector::parse("span.presentation-title")
        .expect("Failed to parse presentation title selector"),
    presentation_location: Selector::parse("span.presentation-location")
        .expect("Failed to parse presentation location selector"),
    title_link: Selector::parse(r#"a[data-link-type*=".presentation"]"#)
        .expect("Failed to parse title link selector"),
    person_link: Selector::parse(r#"a[data-link-type*=".person"]"#)
        .expect("Failed to parse person link selector"),
    author_text: Selector::parse(".presentation-authors")
        .expect("Failed to parse author text selector"),
    representative_img: Selector::parse("img.representative-img")
        .expect("Failed to parse representative image selector"),
    any_img: Selector::parse("img").expect("Failed to parse image selector"),
});

static RE_AUTHOR_SEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*(?:[,;]|\band\b)\s*").expect("Failed to compile author separator regex")
});

/// Fast Forward の発表者ブロック (ここに含まれる人物リンクは著者ではない)
pub(super) const FAST_FORWARD_PRESENTER_CLASS: &str = "technical-papers-fast-forward-presenter";

const PAPER_SESSION_TYPE: &str = "Technical Paper";

/// セッション行から取り出したメタデータ
#[derive(Debug, Clone)]
struct SessionMeta {
    name: String,
    location: String,
}

pub(super) struct ConferenceScheduleParser;

impl ScheduleParser for ConferenceScheduleParser {
    fn snippet_links(&self, html_content: &str, base_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html_content);
        document
            .select(&SELECTORS.post_load)
            .filter_map(|div| div.value().attr("source"))
            .filter(|src| !src.trim().is_empty())
            .filter_map(|src| match base_url.join(src.trim()) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring snippet link {}: {}", src, e);
                    None
                }
            })
            .collect()
    }

    fn parse_and_extract(
        &self,
        html_content: &str,
        event: &EventConfig,
    ) -> Result<Vec<PaperRecord>, CrawlError> {
        let document = parse_schedule_html(html_content);
        let base_url = Url::parse(event.source_url)?;

        let sessions = ConferenceScheduleParser::collect_sessions(&document, &event.excluded_sessions);
        tracing::debug!("Found {} technical paper sessions", sessions.len());

        let mut papers = Vec::new();
        for row in document.select(&SELECTORS.agenda_row) {
            let Some(session_id) = row.value().attr("psid") else {
                continue;
            };
            let paper_id = match row.value().attr("ssid").map(str::trim) {
                Some(id) if !id.is_empty() && id != "none" => id,
                _ => continue,
            };
            let Some(session) = sessions.get(session_id) else {
                continue;
            };

            if let Some(paper) = ConferenceScheduleParser::normalize_paper(
                row, session_id, session, paper_id, &base_url, event,
            ) {
                papers.push(paper);
            }
        }

        if papers.is_empty() {
            tracing::warn!("No technical papers found in schedule document for {}", event.key);
        }

        Ok(papers)
    }
}

impl ConferenceScheduleParser {
    /// 論文セッション (ssid="none" の行) を psid をキーに出現順で集める
    fn collect_sessions(document: &Html, denylist: &Denylist) -> IndexMap<String, SessionMeta> {
        let mut sessions = IndexMap::new();

        for row in document.select(&SELECTORS.agenda_row) {
            if row.value().attr("ssid") != Some("none") {
                continue;
            }
            let is_paper_session = row
                .select(&SELECTORS.presentation_type)
                .next()
                .is_some_and(|el| text_of(el).contains(PAPER_SESSION_TYPE));
            if !is_paper_session {
                continue;
            }

            let Some(session_id) = row.value().attr("psid").filter(|id| !id.trim().is_empty())
            else {
                tracing::debug!("Skipping session row without psid");
                continue;
            };
            let Some(name) = row
                .select(&SELECTORS.presentation_title)
                .next()
                .map(|el| normalize_title(&text_of(el)))
                .filter(|name| !name.is_empty())
            else {
                tracing::debug!("Skipping session {} without a title", session_id);
                continue;
            };
            if denylist.matches(&name) {
                tracing::debug!("Excluding non-paper session: {}", name);
                continue;
            }

            let location = row
                .select(&SELECTORS.presentation_location)
                .next()
                .map(|el| normalize_title(&text_of(el)))
                .unwrap_or_default();

            sessions
                .entry(session_id.to_string())
                .or_insert(SessionMeta { name, location });
        }

        sessions
    }

    /// 論文行 1 つを PaperRecord に変換する (タイトルが無ければ None)
    fn normalize_paper(
        row: ElementRef,
        session_id: &str,
        session: &SessionMeta,
        paper_id: &str,
        base_url: &Url,
        event: &EventConfig,
    ) -> Option<PaperRecord> {
        let title_link = row.select(&SELECTORS.title_link).next()?;
        let title = normalize_title(&text_of(title_link));
        if title.is_empty() {
            return None;
        }
        if event
            .excluded_paper_keywords
            .iter()
            .any(|keyword| title.contains(keyword))
        {
            tracing::debug!("Excluding schedule item: {}", title);
            return None;
        }

        let presentation_url = match title_link.value().attr("href") {
            Some(href) => match base_url.join(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Failed to join URL: {} with base {}: {}", href, base_url, e);
                    None
                }
            },
            None => None,
        };
        if presentation_url.as_ref().is_some_and(is_misc_item) {
            tracing::debug!("Excluding misc schedule item: {}", title);
            return None;
        }

        let authors = ConferenceScheduleParser::extract_authors(row);

        let image_url = row
            .select(&SELECTORS.representative_img)
            .next()
            .or_else(|| row.select(&SELECTORS.any_img).next())
            .and_then(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .and_then(|src| base_url.join(src.trim()).ok())
            .map(String::from);

        let start = row.value().attr("s_utc").unwrap_or_default().trim().to_string();
        let end = row.value().attr("e_utc").unwrap_or_default().trim().to_string();

        Some(PaperRecord {
            title,
            authors,
            session: session.name.clone(),
            session_id: session_id.to_string(),
            paper_id: paper_id.to_string(),
            schedule: format_schedule(&start, &end, &session.location),
            presentation_url: presentation_url.map(String::from).unwrap_or_default(),
            image_url,
            image_file: None,
            location: session.location.clone(),
            start,
            end,
            description: None,
            affiliations: Vec::new(),
        })
    }

    /// 人物リンクを優先し、無ければ区切り文字列から著者を取り出す (掲載順を保持)
    fn extract_authors(row: ElementRef) -> Vec<String> {
        let authors: Vec<String> = row
            .select(&SELECTORS.person_link)
            .filter(|link| !in_fast_forward_presenter(*link))
            .map(|link| normalize_title(&text_of(link)))
            .filter(|name| !name.is_empty())
            .collect();
        if !authors.is_empty() {
            return authors;
        }

        row.select(&SELECTORS.author_text)
            .next()
            .map(|el| split_authors(&text_of(el)))
            .unwrap_or_default()
    }
}

/// 日ごとのスニペットは `<tr>` だけで届くことがあるので table で包んでからパースする
fn parse_schedule_html(html_content: &str) -> Html {
    if html_content.to_ascii_lowercase().contains("<table") {
        Html::parse_document(html_content)
    } else {
        Html::parse_document(&format!("<table>{}</table>", html_content))
    }
}

fn is_misc_item(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, value)| key == "id" && value.starts_with("misc_"))
}

pub(super) fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// NBSP を含む空白の連続を 1 つの空白にまとめる
pub(super) fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(super) fn in_fast_forward_presenter(element: ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().classes().any(|c| c == FAST_FORWARD_PRESENTER_CLASS))
}

pub(super) fn split_authors(raw: &str) -> Vec<String> {
    RE_AUTHOR_SEP
        .split(&normalize_title(raw))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

fn parse_utc(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc())
}

/// 開始/終了時刻 (UTC) と部屋名から人が読むスケジュール表記を作る
pub(super) fn format_schedule(start: &str, end: &str, location: &str) -> String {
    const DAY: &str = "%a, %b %-d %Y";
    const DAY_TIME: &str = "%a, %b %-d %Y, %H:%M";

    let time = match (parse_utc(start), parse_utc(end)) {
        (Some(s), Some(e)) if s.date() == e.date() => format!(
            "{}, {}–{} UTC",
            s.format(DAY),
            s.format("%H:%M"),
            e.format("%H:%M")
        ),
        (Some(s), Some(e)) => format!("{} – {} UTC", s.format(DAY_TIME), e.format(DAY_TIME)),
        (Some(s), None) => format!("{} UTC", s.format(DAY_TIME)),
        _ => [start.trim(), end.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" – "),
    };

    [time.as_str(), location.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" · ")
}
