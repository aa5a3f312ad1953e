// src/render/pdf.rs
use std::path::Path;

use anyhow::{Context, bail};
use headless_chrome::{Browser, LaunchOptionsBuilder, types::PrintToPdfOptions};
use url::Url;

/// スライド 1 枚のサイズ (px)
pub const SLIDE_WIDTH: u32 = 1280;
pub const SLIDE_HEIGHT: u32 = 720;

/// CSS の 1in = 96px
const PX_PER_INCH: f64 = 96.0;

/// 画像とフォントの読み込みがすべて終わるまで待つ
const WAIT_FOR_RESOURCES: &str = r#"
(async () => {
  const pending = Array.from(document.images)
    .filter((img) => !img.complete)
    .map((img) => new Promise((resolve) => {
      img.addEventListener("load", resolve);
      img.addEventListener("error", resolve);
    }));
  await Promise.all(pending);
  if (document.fonts) {
    await document.fonts.ready;
  }
  return true;
})()
"#;

/// 描画済みの slides.html をヘッドレスブラウザで開き、PDF として保存する
///
/// ブロッキング処理なので非同期コンテキストからは `spawn_blocking` で呼ぶこと。
pub fn export_pdf(
    slides_html: &Path,
    pdf_path: &Path,
    chrome_path: Option<&Path>,
) -> anyhow::Result<()> {
    if !slides_html.is_file() {
        bail!(
            "{} does not exist. Run build:slides first.",
            slides_html.display()
        );
    }
    let absolute = fs_err::canonicalize(slides_html)?;
    let url = Url::from_file_path(&absolute)
        .map_err(|_| anyhow::anyhow!("Cannot build file URL for {}", absolute.display()))?;

    let browser = Browser::new(
        LaunchOptionsBuilder::default()
            .path(chrome_path.map(Path::to_path_buf))
            .window_size(Some((SLIDE_WIDTH, SLIDE_HEIGHT)))
            .build()?,
    )
    .context("Failed to launch headless browser")?;

    let tab = browser.new_tab()?;
    tracing::info!("Loading {}", url);
    tab.navigate_to(url.as_str())?.wait_until_navigated()?;
    tab.evaluate(WAIT_FOR_RESOURCES, true)
        .context("Failed while waiting for slide resources")?;

    let pdf = tab.print_to_pdf(Some(PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(f64::from(SLIDE_WIDTH) / PX_PER_INCH),
        paper_height: Some(f64::from(SLIDE_HEIGHT) / PX_PER_INCH),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        prefer_css_page_size: Some(true),
        ..Default::default()
    }))?;

    fs_err::write(pdf_path, pdf)?;
    tracing::info!("Wrote {}", pdf_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_slides_fail_before_launching_browser() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_pdf(
            &dir.path().join("slides.html"),
            &dir.path().join("slides.pdf"),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("build:slides"));
        assert!(!dir.path().join("slides.pdf").exists());
    }

    #[test]
    fn page_size_matches_slide_in_inches() {
        assert!((f64::from(SLIDE_WIDTH) / PX_PER_INCH - 13.333).abs() < 0.001);
        assert!((f64::from(SLIDE_HEIGHT) / PX_PER_INCH - 7.5).abs() < f64::EPSILON);
    }
}
