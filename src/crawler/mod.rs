// src/crawler/mod.rs

mod details;
mod error;
mod images;
mod parser_schedule;
#[cfg(test)]
mod test_server;

pub use error::CrawlError;
pub use images::image_filename;
use parser_schedule::ConferenceScheduleParser;

use std::collections::HashSet;
use std::fmt;

use reqwest::Client;
use tracing;
use url::Url;

use crate::config::{AppConfig, EventPaths};
use crate::events::EventConfig;
use crate::models::PaperRecord;

/// すべてのスケジュールサイト固有パーサーのための共通トレイト
trait ScheduleParser
where
    Self: Send,
{
    /// トップページから日ごとのスケジュール断片の URL を取り出す
    fn snippet_links(&self, html_content: &str, base_url: &Url) -> Vec<Url>;

    /// HTMLコンテンツをパースし、論文情報のリストを抽出する
    fn parse_and_extract(
        &self,
        html_content: &str,
        event: &EventConfig,
    ) -> Result<Vec<PaperRecord>, CrawlError>;
}

/// URLのホスト名に基づいて適切なパーサーを選択する
fn get_parser(url_str: &str) -> Result<Box<dyn ScheduleParser>, CrawlError> {
    let url = Url::parse(url_str)?;
    let host = url.host_str().unwrap_or_default();

    if host.ends_with("conference-schedule.org") {
        tracing::debug!("Using ConferenceScheduleParser for: {}", url_str);
        Ok(Box::new(ConferenceScheduleParser))
    } else {
        tracing::warn!("No parser found for host: {}", host);
        Err(CrawlError::NoParserFound(url_str.to_string()))
    }
}

/// 1 つのスケジュール文書から論文を抽出する (ネットワークは使わない)
pub fn extract_papers(
    html_content: &str,
    event: &EventConfig,
) -> Result<Vec<PaperRecord>, CrawlError> {
    get_parser(event.source_url)?.parse_and_extract(html_content, event)
}

// --- HTMLフェッチロジック ---
/// 全リクエストで共有する HTTP クライアント
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, CrawlError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn get_ok(&self, url: &str) -> Result<reqwest::Response, CrawlError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!("Failed to fetch URL {}: {}", url, status);
            return Err(CrawlError::Http(format!("HTTP Error for {}: {}", url, status)));
        }
        Ok(response)
    }

    /// 指定されたURLからHTMLコンテンツを非同期で取得する
    /// charset 指定が無いページがあるので常に UTF-8 として読む
    pub async fn fetch_html(&self, url: &str) -> Result<String, CrawlError> {
        tracing::debug!("Fetching HTML from: {}", url);
        let bytes = self.get_ok(url).await?.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let bytes = self.get_ok(url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

// --- スクレイピング処理 ---

#[derive(Debug, Clone, Copy)]
pub struct ScrapeOptions {
    pub fetch_details: bool,
}

/// スクレイピング結果の要約
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub papers: usize,
    pub with_image_url: usize,
    pub images_saved: usize,
}

impl fmt::Display for ScrapeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scrape complete. Papers: {}. Images downloaded: {}/{}",
            self.papers, self.images_saved, self.with_image_url
        )
    }
}

impl ScrapeSummary {
    fn from_papers(papers: &[PaperRecord]) -> Self {
        ScrapeSummary {
            papers: papers.len(),
            with_image_url: papers.iter().filter(|p| p.image_url.is_some()).count(),
            images_saved: papers.iter().filter(|p| p.image_file.is_some()).count(),
        }
    }
}

/// トップページと日ごとの断片を取得する
/// トップページの失敗は致命的、断片の失敗はスキップして続行する
/// ただし断片がすべて失敗した場合はスケジュールが無いのと同じなので失敗とする
async fn fetch_schedule_documents(
    client: &HttpClient,
    parser: &dyn ScheduleParser,
    event: &EventConfig,
) -> Result<Vec<String>, CrawlError> {
    let base_url = Url::parse(event.source_url)?;
    tracing::info!("Fetching schedule from: {}", event.source_url);
    let landing = client.fetch_html(event.source_url).await?;

    let links = parser.snippet_links(&landing, &base_url);
    if links.is_empty() {
        tracing::info!("No schedule snippets linked; parsing the landing page directly");
        return Ok(vec![landing]);
    }

    tracing::info!("Found {} schedule snippets", links.len());
    let mut documents = Vec::with_capacity(links.len());
    for (i, link) in links.iter().enumerate() {
        tracing::info!("Fetching schedule snippet ({}/{})", i + 1, links.len());
        match client.fetch_html(link.as_str()).await {
            Ok(html_content) => documents.push(html_content),
            Err(e) => tracing::error!("Skipping schedule snippet {}: {}", link, e),
        }
    }

    if documents.is_empty() {
        return Err(CrawlError::ScheduleUnavailable(links.len()));
    }
    Ok(documents)
}

/// 同じ発表が複数の断片に載るため、論文 ID で重複を除く (先勝ち)
fn dedup_by_paper_id(papers: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut seen = HashSet::new();
    papers
        .into_iter()
        .filter(|p| seen.insert(p.paper_id.clone()))
        .collect()
}

/// イベント固有の手動修正を適用する
fn apply_author_fixes(papers: Vec<PaperRecord>, event: &EventConfig) -> Vec<PaperRecord> {
    papers
        .into_iter()
        .map(|paper| match event.author_fixes.iter().find(|f| f.title == paper.title) {
            Some(fix) => {
                tracing::debug!("Applying author fix for: {}", paper.title);
                PaperRecord {
                    authors: fix.authors.iter().map(|a| a.to_string()).collect(),
                    affiliations: fix
                        .affiliations
                        .iter()
                        .map(|insts| insts.iter().map(|i| i.to_string()).collect())
                        .collect(),
                    ..paper
                }
            }
            None => paper,
        })
        .collect()
}

/// スクレイピングのコアロジック (内部関数)
/// 断片・詳細・画像の取得に失敗しても処理を続行します。
async fn run_scrape_logic(
    client: &HttpClient,
    parser: &dyn ScheduleParser,
    event: &EventConfig,
    paths: &EventPaths,
    options: ScrapeOptions,
) -> Result<Vec<PaperRecord>, CrawlError> {
    // 1. スケジュールのフェッチ
    let documents = fetch_schedule_documents(client, parser, event).await?;

    // 2. パース (壊れた文書はスキップ)
    let mut papers = Vec::new();
    for html_content in &documents {
        match parser.parse_and_extract(html_content, event) {
            Ok(found) => papers.extend(found),
            Err(parse_err) => tracing::error!("Error parsing schedule document: {}", parse_err),
        }
    }
    let papers = dedup_by_paper_id(papers);
    tracing::info!("Extracted {} technical papers for {}", papers.len(), event.key);

    // 3. 発表ページの詳細
    let papers = if options.fetch_details {
        details::enrich_papers(client, papers).await
    } else {
        papers
    };
    let papers = apply_author_fixes(papers, event);

    // 4. 画像
    images::download_images(client, papers, &paths.images_dir()).await
}

/// スクレイピングを実行し、papers.json と画像を書き出します (公開API)
pub async fn run_scrape(
    config: &AppConfig,
    event: &EventConfig,
    options: ScrapeOptions,
) -> Result<ScrapeSummary, CrawlError> {
    // URLに基づいてパーサーを選択
    let parser = get_parser(event.source_url)?;
    let client = HttpClient::new(&config.user_agent)?;
    scrape_into(
        &client,
        parser.as_ref(),
        event,
        &config.event_paths(event),
        options,
    )
    .await
}

/// 取得に成功したときだけ papers.json を書き換える
async fn scrape_into(
    client: &HttpClient,
    parser: &dyn ScheduleParser,
    event: &EventConfig,
    paths: &EventPaths,
    options: ScrapeOptions,
) -> Result<ScrapeSummary, CrawlError> {
    let papers = match run_scrape_logic(client, parser, event, paths, options).await {
        Ok(papers) => papers,
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            return Err(e);
        }
    };

    crate::store::write_papers(&paths.papers_json(), &papers)?;

    let summary = ScrapeSummary::from_papers(&papers);
    tracing::info!("{}", summary);
    Ok(summary)
}
