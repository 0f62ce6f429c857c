//! Batch rewrite over system roles × user roles × texts.
//!
//! ```text
//! <dir>/system_roles/*   system prompt per file
//! <dir>/user_roles/*     instruction per file
//! <dir>/text/*           texts to rewrite
//! <dir>/responses/<system>/<user>/<text>_response.txt
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::cache::{content_hash, RewriteCache, REWRITE_CACHE_FILE};
use crate::llm::client::{CompletionRequest, LlmClient};
use crate::llm::prompts::revise_user_content;
use crate::util::{ensure_dir, file_stem, list_files, word_count};

#[derive(Debug, Clone)]
pub struct RewriteJob {
    pub base_dir: PathBuf,
    /// Percentage to shrink each text by; 0 keeps the length
    pub reduction: u32,
    /// Ignore the response cache
    pub force: bool,
    /// Part of the cache key so switching models regenerates
    pub model: String,
    /// Responses come from the mock client; a later real run must not
    /// treat them as fresh
    pub dry_run: bool,
}

impl RewriteJob {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            reduction: 0,
            force: false,
            model: String::new(),
            dry_run: false,
        }
    }

    pub fn with_reduction(mut self, reduction: u32) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn system_dir(&self) -> PathBuf {
        self.base_dir.join("system_roles")
    }

    pub fn user_dir(&self) -> PathBuf {
        self.base_dir.join("user_roles")
    }

    pub fn text_dir(&self) -> PathBuf {
        self.base_dir.join("text")
    }

    pub fn responses_dir(&self) -> PathBuf {
        self.base_dir.join("responses")
    }

    /// Create the four working directories.
    pub fn prepare(&self) -> Result<()> {
        for dir in [
            self.system_dir(),
            self.user_dir(),
            self.text_dir(),
            self.responses_dir(),
        ] {
            ensure_dir(&dir)?;
        }
        Ok(())
    }
}

/// Word counts over one or more rewrites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordTotals {
    pub original: usize,
    /// Sum of the per-item targets after reduction
    pub revised: usize,
    pub response: usize,
}

impl WordTotals {
    fn add(&mut self, other: WordTotals) {
        self.original += other.original;
        self.revised += other.revised;
        self.response += other.response;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub totals: WordTotals,
}

struct Role {
    stem: String,
    content: String,
}

fn read_roles(dir: &Path) -> Result<Vec<Role>> {
    let mut roles = Vec::new();
    for path in list_files(dir)? {
        match fs::read_to_string(&path) {
            Ok(content) => roles.push(Role {
                stem: file_stem(&path),
                content,
            }),
            Err(e) => error!("Failed to read {}: {}", path.display(), e),
        }
    }
    Ok(roles)
}

enum Outcome {
    Generated(WordTotals),
    Skipped,
}

pub struct Rewriter {
    client: Box<dyn LlmClient>,
}

impl Rewriter {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Process every combination. Item failures are logged and counted; the
    /// run itself only fails when a directory cannot be listed or the cache
    /// cannot be saved. The cache is saved after every response so an
    /// interrupted run keeps what it finished.
    pub async fn run(&self, job: &RewriteJob) -> Result<RewriteSummary> {
        job.prepare()?;
        let responses_dir = job.responses_dir();
        let cache_path = responses_dir.join(REWRITE_CACHE_FILE);
        let mut cache = RewriteCache::load(&cache_path)?;

        let system_roles = read_roles(&job.system_dir())?;
        let user_roles = read_roles(&job.user_dir())?;
        let texts = list_files(&job.text_dir())?;
        info!(
            "Rewriting {} text(s) with {} system role(s) and {} user role(s)",
            texts.len(),
            system_roles.len(),
            user_roles.len()
        );

        let mut summary = RewriteSummary::default();
        for system in &system_roles {
            let mut role_totals = WordTotals::default();
            for user in &user_roles {
                let out_dir = responses_dir.join(&system.stem).join(&user.stem);
                if let Err(e) = ensure_dir(&out_dir) {
                    error!("{:#}", e);
                    summary.failed += texts.len();
                    continue;
                }
                for text in &texts {
                    match self
                        .rewrite_one(job, &mut cache, system, user, text, &out_dir)
                        .await
                    {
                        Ok(Outcome::Generated(totals)) => {
                            summary.generated += 1;
                            role_totals.add(totals);
                            cache.save(&cache_path)?;
                        }
                        Ok(Outcome::Skipped) => summary.skipped += 1,
                        Err(e) => {
                            summary.failed += 1;
                            error!(
                                "Failed {}/{}/{}: {:#}",
                                system.stem,
                                user.stem,
                                text.display(),
                                e
                            );
                        }
                    }
                }
            }
            info!(
                "Total number of words for {}: original {} revised {} response {}",
                system.stem, role_totals.original, role_totals.revised, role_totals.response
            );
            summary.totals.add(role_totals);
        }

        info!(
            "[OK] Rewrite finished: {} generated, {} unchanged, {} failed",
            summary.generated, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    async fn rewrite_one(
        &self,
        job: &RewriteJob,
        cache: &mut RewriteCache,
        system: &Role,
        user: &Role,
        text_path: &Path,
        out_dir: &Path,
    ) -> Result<Outcome> {
        let text = fs::read_to_string(text_path)
            .with_context(|| format!("Failed to read {}", text_path.display()))?;
        let original = word_count(&text);
        let (user_content, target) = revise_user_content(&user.content, original, job.reduction);

        let response_name = format!("{}_response.txt", file_stem(text_path));
        let output = out_dir.join(&response_name);
        let key = format!("{}/{}/{}", system.stem, user.stem, response_name);
        let mode = if job.dry_run { "dry-run" } else { "live" };
        let hash = content_hash(&[
            mode,
            job.model.as_str(),
            system.content.as_str(),
            user_content.as_str(),
            text.as_str(),
        ]);

        if !job.force && cache.is_fresh(&key, &hash, &output) {
            debug!("{} is up to date", key);
            return Ok(Outcome::Skipped);
        }

        info!("Rewriting {} ({} words, target {})", key, original, target);
        let request = CompletionRequest::new(format!("{}{}", user_content, text))
            .with_system(system.content.clone());
        let response = self.client.complete(&request).await?;

        fs::write(&output, &response)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        cache.record(&key, hash);

        let response_words = word_count(&response);
        debug!("{}: {} words in response", key, response_words);
        Ok(Outcome::Generated(WordTotals {
            original,
            revised: target,
            response: response_words,
        }))
    }
}
