use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::PenworkError;
use crate::llm::client::{CompletionRequest, LlmClient};
use crate::llm::prompts;
use crate::util::ensure_dir;

/// Rewrite one chapter once per author.
#[derive(Debug, Clone)]
pub struct RestyleJob {
    pub dir: PathBuf,
    /// File name inside `dir`; responses reuse it
    pub text_file: String,
    pub authors: Vec<String>,
    /// Free text about the book, placed before the instruction
    pub book_context: String,
}

impl RestyleJob {
    pub fn text_path(&self) -> PathBuf {
        self.dir.join(&self.text_file)
    }

    /// `<dir>/responses/<AuthorWithoutSpaces>/<text_file>`
    pub fn response_path(&self, author: &str) -> PathBuf {
        let folder: String = author.chars().filter(|c| *c != ' ').collect();
        self.dir
            .join("responses")
            .join(folder)
            .join(&self.text_file)
    }
}

pub struct Restyler {
    client: Box<dyn LlmClient>,
}

impl Restyler {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Returns the responses written. Authors whose call or write fails are
    /// skipped.
    pub async fn run(&self, job: &RestyleJob) -> Result<Vec<PathBuf>> {
        let text_path = job.text_path();
        if !text_path.is_file() {
            return Err(PenworkError::MissingInput(text_path).into());
        }
        let chapter = fs::read_to_string(&text_path)
            .with_context(|| format!("Failed to read {}", text_path.display()))?;

        let mut written = Vec::new();
        for author in &job.authors {
            info!("Restyling {} as {}...", job.text_file, author);
            let request = CompletionRequest::new(format!(
                "{}{}",
                prompts::restyle_prompt(&job.book_context, author),
                chapter
            ))
            .with_system(prompts::RESTYLE_SYSTEM);

            let response = match self.client.complete(&request).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Restyle as {} failed: {:#}", author, e);
                    continue;
                }
            };

            let out = job.response_path(author);
            if let Err(e) = write_response(&out, &response) {
                error!("Saving restyle as {} failed: {:#}", author, e);
                continue;
            }
            info!("[OK] Written response to {}", out.display());
            written.push(out);
        }
        Ok(written)
    }
}

fn write_response(out: &Path, response: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        ensure_dir(parent)?;
    }
    fs::write(out, response).with_context(|| format!("Failed to write {}", out.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLlmClient;
    use tempfile::TempDir;

    fn job(dir: &TempDir, authors: &[&str]) -> RestyleJob {
        RestyleJob {
            dir: dir.path().to_path_buf(),
            text_file: "Resurrection.tex".to_string(),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            book_context: "A satirical novel.".to_string(),
        }
    }

    #[test]
    fn test_response_path_strips_spaces() {
        let dir = TempDir::new().unwrap();
        let job = job(&dir, &[]);
        assert_eq!(
            job.response_path("Philip K Dick"),
            dir.path()
                .join("responses")
                .join("PhilipKDick")
                .join("Resurrection.tex")
        );
    }

    #[tokio::test]
    async fn test_missing_chapter_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Restyler::new(Box::new(MockLlmClient::new()))
            .run(&job(&dir, &["Dan Brown"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PenworkError>(),
            Some(PenworkError::MissingInput(_))
        ));
    }

    #[tokio::test]
    async fn test_one_response_per_author() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Resurrection.tex"), "Jack woke up.").unwrap();
        let written = Restyler::new(Box::new(MockLlmClient::new()))
            .run(&job(&dir, &["Isaac Asimov", "Ernest Hemingway"]))
            .await
            .unwrap();
        assert_eq!(written.len(), 2);
        let body = fs::read_to_string(&written[0]).unwrap();
        assert!(body.starts_with("[dry-run] A satirical novel. Rewrite this chapter in the style of Isaac Asimov"));
    }

    #[tokio::test]
    async fn test_unwritable_author_folder_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Resurrection.tex"), "Jack woke up.").unwrap();
        fs::create_dir_all(dir.path().join("responses")).unwrap();
        // a plain file where the author folder should go
        fs::write(dir.path().join("responses").join("IsaacAsimov"), "").unwrap();

        let job = job(&dir, &["Isaac Asimov", "Dan Brown"]);
        let written = Restyler::new(Box::new(MockLlmClient::new()))
            .run(&job)
            .await
            .unwrap();

        assert_eq!(written, vec![job.response_path("Dan Brown")]);
        assert!(job.response_path("Dan Brown").is_file());
    }
}
