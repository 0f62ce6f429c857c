use anyhow::{anyhow, Context, Result};
use docx_rs::{DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild, Style, StyleType};
use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::PenworkError;
use crate::llm::client::{CompletionRequest, LlmClient};
use crate::llm::prompts;

/// Articles longer than this many characters are summarized piecewise.
pub const DEFAULT_CHUNK_CHARS: usize = 90_000;

/// Read an article body from `.txt`, `.md`, `.pdf` or `.docx`.
pub fn read_article(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        "pdf" => read_pdf(path),
        "docx" => read_docx(path),
        _ => Err(PenworkError::UnsupportedFormat(format!(".{}", ext)).into()),
    }
}

fn read_pdf(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    // The extractor panics on some malformed files
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(anyhow!("Failed to extract text from {}: {}", path.display(), e)),
        Err(_) => Err(anyhow!("Failed to extract text from {}", path.display())),
    }
}

/// Paragraph texts joined by a single space.
fn read_docx(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let docx = docx_rs::read_docx(&bytes)
        .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;
    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();
    Ok(paragraphs.join(" "))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

/// Split on char boundaries into pieces of at most `max_chars` chars.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max_chars {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Markdown document with one `# Article N` heading per summary.
pub fn render_summaries(summaries: &[String]) -> String {
    let mut doc = String::new();
    for (idx, summary) in summaries.iter().enumerate() {
        doc.push_str(&format!("# Article {}\n\n{}\n\n", idx + 1, summary.trim()));
    }
    doc
}

/// Word document with a `Heading 1` "Article N" per summary followed by one
/// paragraph per non-empty summary line.
pub fn write_summaries_docx(summaries: &[String], output: &Path) -> Result<()> {
    let heading = Style::new("Heading1", StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold();
    let mut docx = Docx::new().add_style(heading);
    for (idx, summary) in summaries.iter().enumerate() {
        docx = docx.add_paragraph(
            Paragraph::new()
                .style("Heading1")
                .add_run(Run::new().add_text(format!("Article {}", idx + 1))),
        );
        for line in summary.lines().map(str::trim).filter(|l| !l.is_empty()) {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
    }

    let file = fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    docx.build()
        .pack(file)
        .map_err(|e| anyhow!("Failed to write {}: {}", output.display(), e))?;
    Ok(())
}

fn is_docx(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case("docx"))
}

pub struct Summarizer {
    client: Box<dyn LlmClient>,
    chunk_chars: usize,
}

impl Summarizer {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars;
        self
    }

    pub async fn summarize_article(&self, path: &Path) -> Result<String> {
        let content = read_article(path)?;
        let chunks = chunk_text(&content, self.chunk_chars);
        info!(
            "Content size: {} characters in {} chunk(s)",
            content.chars().count(),
            chunks.len()
        );

        if chunks.len() <= 1 {
            let request = CompletionRequest::new(prompts::summarize_prompt(&content))
                .with_system(prompts::SUMMARY_SYSTEM);
            return self.client.complete(&request).await;
        }

        let mut parts = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            info!("Processing chunk {}/{}...", idx + 1, chunks.len());
            let request = CompletionRequest::new(prompts::summarize_chunk_prompt(chunk))
                .with_system(prompts::SUMMARY_SYSTEM);
            parts.push(self.client.complete(&request).await?);
        }
        Ok(parts.join("\n\n"))
    }

    /// Summarize each article and write the collected document to `output`,
    /// as Word when it ends in `.docx` and Markdown otherwise. Failing
    /// articles are logged and left out; numbering follows the successes.
    pub async fn summarize_articles(&self, paths: &[PathBuf], output: &Path) -> Result<usize> {
        let mut summaries = Vec::new();
        for path in paths {
            info!("Processing: {}", path.display());
            match self.summarize_article(path).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => error!("Error processing {}: {:#}", path.display(), e),
            }
        }

        if is_docx(output) {
            write_summaries_docx(&summaries, output)?;
        } else {
            fs::write(output, render_summaries(&summaries))
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        info!("[OK] Summaries saved to {}", output.display());
        Ok(summaries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLlmClient;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    #[test]
    fn test_read_article_rejects_unknown_format() {
        let err = read_article(Path::new("/tmp/paper.RTF")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format: .rtf");
    }

    #[test]
    fn test_corrupt_pdf_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.pdf");
        fs::write(&path, "%PDF-1.4\nnot really a pdf").unwrap();
        let err = read_article(&path).unwrap_err();
        assert!(err.to_string().contains("paper.pdf"));
    }

    #[test]
    fn test_docx_written_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summaries.docx");
        write_summaries_docx(
            &["First point.\nSecond point.".to_string(), "Other.".to_string()],
            &path,
        )
        .unwrap();

        let text = read_article(&path).unwrap();
        assert!(text.starts_with("Article 1"));
        assert!(text.contains("First point. Second point."));
        assert!(text.trim_end().ends_with("Article 2 Other."));
    }

    #[test]
    fn test_is_docx() {
        assert!(is_docx(Path::new("out/Summaries.DOCX")));
        assert!(!is_docx(Path::new("summaries.md")));
        assert!(!is_docx(Path::new("docx")));
    }

    #[test]
    fn test_chunk_text_respects_char_boundaries() {
        assert_eq!(chunk_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(chunk_text("ééé", 2), vec!["éé", "é"]);
        assert!(chunk_text("", 4).is_empty());
    }

    #[test]
    fn test_render_summaries() {
        let doc = render_summaries(&["First.".to_string(), "Second.\n".to_string()]);
        assert_eq!(doc, "# Article 1\n\nFirst.\n\n# Article 2\n\nSecond.\n\n");
    }

    #[tokio::test]
    async fn test_long_article_is_chunked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.txt");
        fs::write(&path, "x".repeat(25)).unwrap();

        let client = MockLlmClient::with_response("part");
        let calls = client.call_counter();
        let summary = Summarizer::new(Box::new(client))
            .with_chunk_chars(10)
            .summarize_article(&path)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(summary, "part\n\npart\n\npart");
    }
}
