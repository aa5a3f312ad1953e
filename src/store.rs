// src/store.rs
use std::{
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use fs_err::File;

use crate::crawler::CrawlError;
use crate::models::PaperRecord;

/// 論文リストを JSON として書き出す (親ディレクトリは必要なら作成)
pub fn write_papers(path: &Path, papers: &[PaperRecord]) -> Result<(), CrawlError> {
    if let Some(dir) = path.parent() {
        fs_err::create_dir_all(dir)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, papers)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    tracing::info!("Wrote {} papers to {}", papers.len(), path.display());
    Ok(())
}

pub fn read_papers(path: &Path) -> Result<Vec<PaperRecord>, CrawlError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// 描画フェーズ用: 読めない papers.json は空リストとして扱う
pub fn read_papers_or_empty(path: &Path) -> Vec<PaperRecord> {
    match read_papers(path) {
        Ok(papers) => papers,
        Err(e) => {
            tracing::warn!(
                "Could not read {} ({}). Rendering an empty paper list.",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_paper;

    #[test]
    fn json_round_trip_keeps_order_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/papers.json");

        let mut second = sample_paper("Second", "Geometry", "papers_2");
        second.image_url = Some("https://example/img.png".to_string());
        second.affiliations = vec![vec!["ETH Zurich".to_string()]];
        let papers = vec![sample_paper("First", "Rendering I", "papers_1"), second];

        write_papers(&path, &papers).unwrap();
        assert_eq!(read_papers(&path).unwrap(), papers);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_papers_or_empty(&dir.path().join("papers.json")).is_empty());
    }

    #[test]
    fn garbage_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.json");
        fs_err::write(&path, "{not json").unwrap();
        assert!(read_papers(&path).is_err());
        assert!(read_papers_or_empty(&path).is_empty());
    }
}
