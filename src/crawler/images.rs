// src/crawler/images.rs
use std::path::Path;

use super::{CrawlError, HttpClient};
use crate::models::PaperRecord;
use url::Url;

const DEFAULT_EXTENSION: &str = "jpg";

/// 論文 ID と画像 URL の拡張子から保存ファイル名を決める
///
/// ID は `[a-z0-9._-]` 以外 (大文字も含む) を `~XX` (UTF-8 バイトの16進) に置き換えるので、
/// 大文字小文字を区別しないファイルシステムでも異なる ID が同じファイル名になることはない。
pub fn image_filename(paper_id: &str, image_url: &str) -> String {
    let mut stem = String::with_capacity(paper_id.len());
    for c in paper_id.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
            stem.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                stem.push_str(&format!("~{:02X}", b));
            }
        }
    }
    format!("{}.{}", stem, image_extension(image_url))
}

fn image_extension(image_url: &str) -> String {
    Url::parse(image_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
        })
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

async fn fetch_image(
    client: &HttpClient,
    image_url: &str,
    dest: &Path,
) -> Result<(), CrawlError> {
    let bytes = client.fetch_bytes(image_url).await?;
    fs_err::write(dest, &bytes)?;
    Ok(())
}

/// 画像を 1 枚ずつ順番にダウンロードする
///
/// 失敗した論文は `image_file` が `None` のまま残り、後続の取得は継続する。
pub(super) async fn download_images(
    client: &HttpClient,
    papers: Vec<PaperRecord>,
    images_dir: &Path,
) -> Result<Vec<PaperRecord>, CrawlError> {
    fs_err::create_dir_all(images_dir)?;

    let total = papers.iter().filter(|p| p.image_url.is_some()).count();
    let mut done = 0;
    let mut saved: Vec<Option<String>> = Vec::with_capacity(papers.len());

    for paper in &papers {
        let Some(image_url) = paper.image_url.as_deref() else {
            saved.push(None);
            continue;
        };
        done += 1;

        let filename = image_filename(&paper.paper_id, image_url);
        match fetch_image(client, image_url, &images_dir.join(&filename)).await {
            Ok(()) => {
                tracing::info!("Downloaded image ({}/{}): {}", done, total, filename);
                saved.push(Some(filename));
            }
            Err(e) => {
                tracing::warn!("Failed to download image for {}: {}", paper.paper_id, e);
                saved.push(None);
            }
        }
    }

    Ok(papers
        .into_iter()
        .zip(saved)
        .map(|(paper, image_file)| paper.with_image_file(image_file))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_paper;
    use std::collections::HashSet;

    #[test]
    fn filename_uses_paper_id_and_extension() {
        assert_eq!(
            image_filename("papers_101", "https://example.org/media/x.png?w=300"),
            "papers_101.png"
        );
        assert_eq!(image_filename("papers_101", "https://example.org/media/x"), "papers_101.jpg");
        assert_eq!(image_filename("p1", "not a url"), "p1.jpg");
    }

    #[test]
    fn distinct_ids_give_distinct_filenames() {
        let ids = ["a/b", "a_b", "a~2Fb", "a b", "a-b", "a.b", "ä", "a", "A", "Ab", "aB", "a~41"];
        // 大文字小文字を区別しないファイルシステムでも衝突しないこと
        let names: HashSet<String> = ids
            .iter()
            .map(|id| image_filename(id, "https://example.org/img.png").to_ascii_lowercase())
            .collect();
        assert_eq!(names.len(), ids.len());
        assert!(names.iter().all(|n| !n.contains('/')));
        assert_eq!(image_filename("Paper_7", "https://example.org/x.PNG"), "~50aper_7.png");
    }

    #[tokio::test]
    async fn failed_download_keeps_url_and_leaves_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let client = HttpClient::new("papers-digest-test").unwrap();

        let mut broken = sample_paper("Broken", "Rendering I", "p1");
        broken.image_url = Some("http://127.0.0.1:9/img.png".to_string());
        let no_image = sample_paper("No Image", "Rendering I", "p2");

        let papers = download_images(&client, vec![broken, no_image], dir.path())
            .await
            .unwrap();

        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].image_url.as_deref(), Some("http://127.0.0.1:9/img.png"));
        assert_eq!(papers[0].image_file, None);
        assert_eq!(papers[1].image_file, None);

        let json = serde_json::to_value(&papers[0]).unwrap();
        assert!(json["imageFile"].is_null());
        assert_eq!(json["imageUrl"], "http://127.0.0.1:9/img.png");
    }
}
