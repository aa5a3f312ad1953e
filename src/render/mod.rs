// src/render/mod.rs

mod group;
mod pdf;

pub use group::{UNKNOWN_SESSION, group_by_session};
pub use pdf::{SLIDE_HEIGHT, SLIDE_WIDTH, export_pdf};

use std::path::PathBuf;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::config::EventPaths;
use crate::events::EventConfig;
use crate::models::SessionGroup;
use crate::store;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const SLIDES_TEMPLATE: &str = include_str!("../../templates/slides.html");
const SLIDES_CSS_TEMPLATE: &str = include_str!("../../templates/slides.css");

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// テンプレートに渡す値 (集計値はここで計算する)
#[derive(Debug, Serialize)]
struct RenderContext<'a> {
    event: &'a EventConfig,
    sessions: &'a [SessionGroup],
    session_count: usize,
    paper_count: usize,
}

impl<'a> RenderContext<'a> {
    fn new(sessions: &'a [SessionGroup], event: &'a EventConfig) -> Self {
        RenderContext {
            event,
            sessions,
            session_count: sessions.len(),
            paper_count: sessions.iter().map(|s| s.papers.len()).sum(),
        }
    }
}

/// スライドの HTML と CSS の組
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDeck {
    pub html: String,
    pub css: String,
}

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;
    env.add_template("slides.html", SLIDES_TEMPLATE)?;
    env.add_template("slides.css", SLIDES_CSS_TEMPLATE)?;
    Ok(env)
}

/// セッション一覧ページを描画する
pub fn render_index(
    sessions: &[SessionGroup],
    event: &EventConfig,
) -> Result<String, minijinja::Error> {
    let env = environment()?;
    env.get_template("index.html")?
        .render(RenderContext::new(sessions, event))
}

/// タイトル → セッション → 論文の順にスライドを描画する
pub fn render_slides(
    sessions: &[SessionGroup],
    event: &EventConfig,
) -> Result<SlideDeck, minijinja::Error> {
    let env = environment()?;
    let html = env
        .get_template("slides.html")?
        .render(RenderContext::new(sessions, event))?;
    let css = env
        .get_template("slides.css")?
        .render(context! { width => SLIDE_WIDTH, height => SLIDE_HEIGHT })?;
    Ok(SlideDeck { html, css })
}

fn load_sessions(paths: &EventPaths) -> Vec<SessionGroup> {
    let papers = store::read_papers_or_empty(&paths.papers_json());
    let sessions = group_by_session(papers);
    tracing::info!("Loaded {} sessions", sessions.len());
    sessions
}

/// papers.json から index.html を生成する
pub fn build_index(paths: &EventPaths, event: &EventConfig) -> Result<PathBuf, RenderError> {
    let sessions = load_sessions(paths);
    let html = render_index(&sessions, event)?;

    fs_err::create_dir_all(&paths.dir)?;
    let out = paths.index_html();
    fs_err::write(&out, html)?;
    tracing::info!("Wrote {}", out.display());
    Ok(out)
}

/// papers.json から slides.html と slides.css を生成する
pub fn build_slides(
    paths: &EventPaths,
    event: &EventConfig,
) -> Result<(PathBuf, PathBuf), RenderError> {
    let sessions = load_sessions(paths);
    let deck = render_slides(&sessions, event)?;

    fs_err::create_dir_all(&paths.dir)?;
    let html_out = paths.slides_html();
    let css_out = paths.slides_css();
    fs_err::write(&html_out, deck.html)?;
    fs_err::write(&css_out, deck.css)?;
    tracing::info!("Wrote {} and {}", html_out.display(), css_out.display());
    Ok((html_out, css_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EVENTS;
    use crate::models::sample_paper;

    fn sessions() -> Vec<SessionGroup> {
        let mut with_image = sample_paper("Neural <Caching>", "Rendering I", "p1");
        with_image.image_url = Some("https://example.org/p1.png".to_string());
        with_image.image_file = Some("p1.png".to_string());
        let mut remote_only = sample_paper("Path Guiding", "Rendering I", "p2");
        remote_only.image_url = Some("https://example.org/p2.png".to_string());
        group_by_session(vec![
            with_image,
            remote_only,
            sample_paper("Meshes", "Geometry", "p3"),
        ])
    }

    #[test]
    fn index_lists_sessions_and_papers() {
        let html = render_index(&sessions(), &EVENTS[0]).unwrap();
        assert!(html.contains("<title>SIGGRAPH 2025 Technical Papers</title>"));
        assert!(html.contains("2 sessions · 3 papers"));
        assert!(html.contains("Neural &lt;Caching&gt;"));
        assert!(html.contains(r#"src="images/p1.png""#));
        assert!(html.contains("Ada Lovelace, Alan Turing"));
        let rendering = html.find("<h2>Rendering I</h2>").unwrap();
        let geometry = html.find("<h2>Geometry</h2>").unwrap();
        assert!(rendering < geometry);
    }

    #[test]
    fn slides_are_title_then_sessions_then_papers() {
        let deck = render_slides(&sessions(), &EVENTS[0]).unwrap();
        let html = &deck.html;
        assert_eq!(html.matches(r#"class="slide title-slide""#).count(), 1);
        assert_eq!(html.matches(r#"class="slide session-slide""#).count(), 2);
        assert_eq!(html.matches(r#"class="slide paper-slide""#).count(), 3);
        assert!(html.contains("<strong>2 sessions</strong>"));
        assert!(html.contains("<strong>3 papers</strong>"));
        assert!(html.contains("Session 1 / 2"));
        assert!(html.contains("Session 2 / 2"));

        let title = html.find("title-slide").unwrap();
        let first_session = html.find("session-slide").unwrap();
        assert!(title < first_session);
        assert!(deck.css.contains("size: 1280px 720px"));
    }

    #[test]
    fn empty_deck_still_has_title_slide() {
        let deck = render_slides(&[], &EVENTS[1]).unwrap();
        assert!(deck.html.contains("0 sessions"));
        assert!(deck.html.contains("0 papers"));
        assert!(deck.html.contains("SIGGRAPH Asia 2025 Technical Papers"));
        assert_eq!(deck.html.matches(r#"class="slide"#).count(), 1);
    }

    #[test]
    fn rendering_is_deterministic() {
        let first = render_slides(&sessions(), &EVENTS[0]).unwrap();
        let second = render_slides(&sessions(), &EVENTS[0]).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            render_index(&sessions(), &EVENTS[0]).unwrap(),
            render_index(&sessions(), &EVENTS[0]).unwrap()
        );
    }
}
