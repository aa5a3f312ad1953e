// src/crawler/details.rs
use super::parser_schedule::{in_fast_forward_presenter, normalize_title, text_of};
use super::HttpClient;
use crate::models::PaperRecord;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

struct DetailSelectors {
    representative_img: Selector,
    abstract_text: Selector,
    presenter: Selector,
    institution: Selector,
}

static SELECTORS: Lazy<DetailSelectors> = Lazy::new(|| DetailSelectors {
    representative_img: Selector::parse("img.representative-img")
        .expect("Failed to parse representative image selector"),
    abstract_text: Selector::parse("span.abstract").expect("Failed to parse abstract selector"),
    presenter: Selector::parse("div.presenter-details")
        .expect("Failed to parse presenter selector"),
    institution: Selector::parse(r#"a[data-link-type="presentation.person.institution"]"#)
        .expect("Failed to parse institution selector"),
});

/// 発表ページから得られる追加情報
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct PaperDetails {
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub affiliations: Vec<Vec<String>>,
}

pub(super) fn parse_details(html_content: &str, base_url: &Url) -> PaperDetails {
    let document = Html::parse_document(html_content);

    let image_url = document
        .select(&SELECTORS.representative_img)
        .next()
        .and_then(|img| img.value().attr("src"))
        .filter(|src| !src.trim().is_empty())
        .and_then(|src| base_url.join(src.trim()).ok())
        .map(String::from);

    let description = document
        .select(&SELECTORS.abstract_text)
        .next()
        .map(|el| text_of(el).trim().to_string())
        .filter(|s| !s.is_empty());

    let affiliations = document
        .select(&SELECTORS.presenter)
        .filter(|presenter| !in_fast_forward_presenter(*presenter))
        .map(|presenter| {
            presenter
                .select(&SELECTORS.institution)
                .map(|a| normalize_title(&text_of(a)))
                .collect::<Vec<_>>()
        })
        .collect();

    PaperDetails {
        description,
        image_url,
        affiliations,
    }
}

/// 各論文の発表ページを順番に取得して情報を補う
/// 取得に失敗した論文はそのまま残す
pub(super) async fn enrich_papers(
    client: &HttpClient,
    papers: Vec<PaperRecord>,
) -> Vec<PaperRecord> {
    let total = papers.len();
    let mut enriched = Vec::with_capacity(total);

    for (i, paper) in papers.into_iter().enumerate() {
        let base_url = match Url::parse(&paper.presentation_url) {
            Ok(url) => url,
            Err(_) => {
                tracing::debug!("No presentation page for {}", paper.paper_id);
                enriched.push(paper);
                continue;
            }
        };

        tracing::info!("Fetching paper details ({}/{}): {}", i + 1, total, paper.title);
        match client.fetch_html(base_url.as_str()).await {
            Ok(html_content) => {
                let details = parse_details(&html_content, &base_url);
                enriched.push(merge_details(paper, details));
            }
            Err(e) => {
                tracing::warn!("Skipping details for {}: {}", paper.paper_id, e);
                enriched.push(paper);
            }
        }
    }

    enriched
}

/// 行から取れた画像を優先し、発表ページの値で欠けている所を埋める
fn merge_details(paper: PaperRecord, details: PaperDetails) -> PaperRecord {
    let affiliations = if details.affiliations.is_empty() {
        paper.affiliations
    } else {
        details.affiliations
    };
    PaperRecord {
        image_url: paper.image_url.or(details.image_url),
        description: details.description.or(paper.description),
        affiliations,
        ..paper
    }
}
