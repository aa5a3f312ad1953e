// src/cli.rs
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::crawler::{self, ScrapeOptions};
use crate::events::{self, EVENTS};
use crate::render;

#[derive(Debug, Parser)]
#[command(version, about = "Scrape conference technical papers and build summary pages and slides")]
pub struct Cli {
    /// Output root directory (overrides PAPERS_OUTPUT_DIR)
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape the schedule into <event>/papers.json and <event>/images/
    Scrape {
        event: String,
        /// Do not fetch each paper's presentation page
        #[arg(long)]
        skip_details: bool,
    },
    /// Render <event>/index.html
    Build {
        #[arg(long)]
        event: String,
    },
    /// Render <event>/slides.html and <event>/slides.css
    #[command(name = "build:slides")]
    BuildSlides {
        #[arg(long)]
        event: String,
    },
    /// Export <event>/slides.html to <event>/slides.pdf
    #[command(name = "build:slides-pdf")]
    BuildSlidesPdf {
        #[arg(long)]
        event: String,
    },
    /// List supported events
    Events,
}

pub async fn run(cli: Cli, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(out_dir) = cli.out_dir {
        config.output_dir = out_dir;
    }

    // 未対応のイベントは I/O の前に弾く
    let key = match &cli.command {
        Command::Events => {
            for event in EVENTS {
                println!("{}\t{}\t{}", event.key, event.page_title, event.source_url);
            }
            return Ok(());
        }
        Command::Scrape { event, .. }
        | Command::Build { event }
        | Command::BuildSlides { event }
        | Command::BuildSlidesPdf { event } => event.clone(),
    };
    let event = events::lookup(&key)?;
    let paths = config.event_paths(event);

    match cli.command {
        Command::Scrape { skip_details, .. } => {
            let options = ScrapeOptions {
                fetch_details: !skip_details,
            };
            let summary = crawler::run_scrape(&config, event, options)
                .await
                .with_context(|| format!("Scraping {} failed", event.key))?;
            println!("{}", summary);
        }
        Command::Build { .. } => {
            let out = render::build_index(&paths, event)?;
            println!("Wrote {}", out.display());
        }
        Command::BuildSlides { .. } => {
            let (html, css) = render::build_slides(&paths, event)?;
            println!("Wrote {} and {}", html.display(), css.display());
        }
        Command::BuildSlidesPdf { .. } => {
            let (html, pdf) = (paths.slides_html(), paths.slides_pdf());
            let chrome_path = config.chrome_path.clone();
            tokio::task::spawn_blocking(move || {
                render::export_pdf(&html, &pdf, chrome_path.as_deref())
            })
            .await??;
            println!("Wrote {}", paths.slides_pdf().display());
        }
        Command::Events => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_colon_subcommands() {
        let cli = Cli::try_parse_from(["papers-digest", "build:slides-pdf", "--event", "siggraph2025"])
            .unwrap();
        assert!(matches!(cli.command, Command::BuildSlidesPdf { ref event } if event == "siggraph2025"));

        let cli = Cli::try_parse_from(["papers-digest", "scrape", "siggraph-asia-2025", "--skip-details"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Scrape { ref event, skip_details: true } if event == "siggraph-asia-2025"
        ));
    }

    #[test]
    fn build_requires_event_flag() {
        assert!(Cli::try_parse_from(["papers-digest", "build"]).is_err());
    }

    #[tokio::test]
    async fn unknown_event_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["papers-digest", "build", "--event", "nope"]).unwrap();
        let config = AppConfig {
            output_dir: dir.path().to_path_buf(),
            user_agent: "test".to_string(),
            chrome_path: None,
        };
        let err = run(cli, config).await.unwrap_err();
        assert!(err.to_string().contains("siggraph2025"));
        assert!(!dir.path().join("nope").exists());
    }
}
