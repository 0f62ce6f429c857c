//! Technical report generation.
//!
//! Notes live in `<input>/<section>.md`. Each section is sent through the LLM
//! once and cached as `<output>/<section>.txt`; the metadata sidecar records
//! the hash of the notes it was generated from so unchanged sections are
//! skipped on the next run. Outputs are then assembled into a Markdown
//! rendering and, on request, a LaTeX source compiled with pdflatex.

pub mod compile;
pub mod latex;
pub mod samples;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::cache::{self, Metadata, Version, METADATA_FILE};
use crate::config::ReportConfig;
use crate::llm::client::{CompletionRequest, LlmClient};
use crate::llm::prompts;
use crate::util::ensure_dir;

pub use compile::{compile_latex_to_pdf, LatexToolchain};
pub use samples::create_sample_input_files;

pub const NOTES_FILE: &str = "all_sections_notes.md";
pub const LATEX_FILE: &str = "technical_report.tex";
pub const PLAIN_FILE: &str = "technical_report.md";
pub const BIBTEX_FILE: &str = "references.bib";
pub const TITLE_FILE: &str = "title.md";
pub const LATEX_DIR: &str = "latex_output";

const DEFAULT_AUTHOR: &str = "Research Team";
const DEFAULT_SUBTITLE: &str = "with Comparative RL Baseline";
const RULE_WIDTH: usize = 80;
/// Stored hashes carrying this prefix never match a real input hash.
const DRY_RUN_HASH_PREFIX: &str = "dry-run:";

const SECTION_MAX_TOKENS: u32 = 2000;
const ABSTRACT_MAX_TOKENS: u32 = 400;
const BIBTEX_MAX_TOKENS: u32 = 2000;
const WRITING_TEMPERATURE: f32 = 0.7;
const BIBTEX_TEMPERATURE: f32 = 0.3;

static BIBTEX_OPEN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```+bibtex\s*").expect("Failed to compile fence regex"));
static BARE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```+\s*$").expect("Failed to compile fence regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Abstract,
    Introduction,
    Background,
    Methodology,
    ExperimentalResults,
    Discussion,
    RecommendationsFutureWork,
    References,
}

impl Section {
    /// Report order.
    pub const ALL: [Section; 8] = [
        Section::Abstract,
        Section::Introduction,
        Section::Background,
        Section::Methodology,
        Section::ExperimentalResults,
        Section::Discussion,
        Section::RecommendationsFutureWork,
        Section::References,
    ];

    /// Sections the abstract is distilled from, in order.
    pub const ABSTRACT_SOURCES: [Section; 5] = [
        Section::Introduction,
        Section::Methodology,
        Section::ExperimentalResults,
        Section::Discussion,
        Section::RecommendationsFutureWork,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Abstract => "abstract",
            Section::Introduction => "introduction",
            Section::Background => "background",
            Section::Methodology => "methodology",
            Section::ExperimentalResults => "experimental_results",
            Section::Discussion => "discussion",
            Section::RecommendationsFutureWork => "recommendations_future_work",
            Section::References => "references",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Abstract => "Abstract",
            Section::Introduction => "Introduction",
            Section::Background => "Background",
            Section::Methodology => "Methodology",
            Section::ExperimentalResults => "Experimental Results",
            Section::Discussion => "Discussion",
            Section::RecommendationsFutureWork => "Recommendations & Future Work",
            Section::References => "References",
        }
    }

    pub fn input_file(self) -> String {
        format!("{}.md", self.name())
    }

    pub fn output_file(self) -> String {
        format!("{}.txt", self.name())
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything printed above the first section.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleInfo {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub email: Option<String>,
    pub org: Option<String>,
    pub version: Version,
    /// Already formatted, e.g. "March 04, 2026"
    pub date: String,
}

/// What a `report` run should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Regenerate changed sections (all of them with `force`), then render.
    Full { force: bool, latex: bool },
    /// Render from existing outputs without calling the LLM for sections.
    PdfOnly { latex: bool },
    ConcatenateOnly,
    CompileLatexOnly,
}

impl Default for RunMode {
    fn default() -> Self {
        RunMode::Full {
            force: false,
            latex: false,
        }
    }
}

/// Timestamped sibling used when the preferred output path is locked.
pub fn fallback_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let stamp = now.format("%Y%m%d_%H%M%S");
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };
    path.with_file_name(name)
}

/// Write `contents` to `path`, or to its timestamped sibling when `path`
/// is not writable. Returns the path actually written.
fn write_with_fallback<W>(path: &Path, contents: &str, write: W) -> Result<PathBuf>
where
    W: Fn(&Path, &str) -> std::io::Result<()>,
{
    match write(path, contents) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            let fallback = fallback_path(path, Local::now());
            warn!(
                "{} is not writable ({}), using {}",
                path.display(),
                e,
                fallback.display()
            );
            write(&fallback, contents)
                .with_context(|| format!("Failed to write {}", fallback.display()))?;
            Ok(fallback)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to write {}", path.display())),
    }
}

/// Strip ```bibtex / ``` fence lines from a model response.
pub fn strip_bibtex_fences(content: &str) -> String {
    let content = BIBTEX_OPEN_FENCE.replace_all(content, "");
    let content = BARE_FENCE.replace_all(&content, "");
    content.trim().to_string()
}

pub struct ReportGenerator {
    client: Box<dyn LlmClient>,
    config: ReportConfig,
    input_dir: PathBuf,
    output_dir: PathBuf,
    metadata_path: PathBuf,
    dry_run: bool,
}

impl ReportGenerator {
    /// Creates the input and output directories if needed.
    pub fn new(client: Box<dyn LlmClient>, config: ReportConfig) -> Result<Self> {
        let input_dir = PathBuf::from(&config.input_dir);
        let output_dir = PathBuf::from(&config.output_dir);
        ensure_dir(&input_dir)?;
        ensure_dir(&output_dir)?;
        let metadata_path = output_dir.join(METADATA_FILE);
        Ok(Self {
            client,
            config,
            input_dir,
            output_dir,
            metadata_path,
            dry_run: false,
        })
    }

    /// Mark outputs as produced by the mock client so a later real run
    /// regenerates them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn recorded_hash(&self, hash: String) -> String {
        if self.dry_run {
            format!("{}{}", DRY_RUN_HASH_PREFIX, hash)
        } else {
            hash
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn latex_dir(&self) -> PathBuf {
        self.output_dir.join(LATEX_DIR)
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn input_path(&self, section: Section) -> PathBuf {
        self.input_dir.join(section.input_file())
    }

    fn output_path(&self, section: Section) -> PathBuf {
        self.output_dir.join(section.output_file())
    }

    /// Read a generated section; `None` when it was never generated.
    fn read_output(&self, section: Section) -> Result<Option<String>> {
        let path = self.output_path(section);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Apply `title.md` from the input directory on top of the configured
    /// title, subtitle and organization. A broken file is reported, not fatal.
    pub fn load_title_info(&mut self) {
        let path = self.input_dir.join(TITLE_FILE);
        if let Err(e) = self.config.apply_title_file(&path) {
            warn!("Error loading title information: {:#}", e);
        }
    }

    pub fn author(&self) -> String {
        if let Some(ref author) = self.config.author {
            return author.clone();
        }
        Metadata::load(&self.metadata_path)
            .ok()
            .and_then(|m| m.author())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string())
    }

    pub fn title(&self) -> String {
        self.config
            .title
            .clone()
            .unwrap_or_else(|| format!("PCT Applied to {}", self.config.environment))
    }

    pub fn subtitle(&self) -> String {
        self.config
            .subtitle
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBTITLE.to_string())
    }

    pub fn title_info(&self, version: Version) -> TitleInfo {
        TitleInfo {
            title: self.title(),
            subtitle: self.subtitle(),
            author: self.author(),
            email: self.config.email.clone(),
            org: self.config.org.clone(),
            version,
            date: Local::now().format("%B %d, %Y").to_string(),
        }
    }

    pub fn needs_regeneration(&self, section: Section) -> Result<bool> {
        let metadata = Metadata::load(&self.metadata_path)?;
        let stored = metadata.input_hash(section.name());
        cache::needs_regeneration(
            &self.input_path(section),
            &self.output_path(section),
            stored.as_deref(),
        )
    }

    /// Generate one section from its notes. Missing or blank notes yield
    /// `Ok(None)`.
    pub async fn generate_section(&self, section: Section) -> Result<Option<String>> {
        let input = self.input_path(section);
        if !input.exists() {
            warn!("Input file {} not found. Skipping {}.", input.display(), section);
            return Ok(None);
        }
        let notes = fs::read_to_string(&input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let notes = notes.trim();
        if notes.is_empty() {
            warn!("Input file {} is empty. Skipping {}.", input.display(), section);
            return Ok(None);
        }

        info!("Generating content for {}...", section);
        let request = CompletionRequest::new(prompts::section_prompt(
            section,
            &self.config.environment,
            notes,
        ))
        .with_system(prompts::REPORT_SYSTEM)
        .with_max_tokens(SECTION_MAX_TOKENS)
        .with_temperature(WRITING_TEMPERATURE);
        let content = self
            .client
            .complete(&request)
            .await
            .with_context(|| format!("LLM call failed for {}", section))?;

        let output = self.output_path(section);
        fs::write(&output, &content)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        let mut metadata = Metadata::load(&self.metadata_path)?;
        let hash = self.recorded_hash(cache::file_hash(&input)?);
        metadata.record_generated(section.name(), hash, &output);
        metadata.save(&self.metadata_path)?;

        info!("[OK] Generated {}", section);
        Ok(Some(content))
    }

    /// Write `abstract.txt` from the generated body sections.
    pub async fn generate_abstract_from_sections(&self) -> Result<Option<String>> {
        info!("Generating abstract from existing sections...");
        let mut combined = String::new();
        for section in Section::ABSTRACT_SOURCES {
            if let Some(content) = self.read_output(section)? {
                let content = content.trim();
                if !content.is_empty() {
                    combined.push_str(&format!("\n\n{}:\n{}", section.title(), content));
                }
            }
        }
        if combined.is_empty() {
            warn!("No existing sections found for abstract generation.");
            return Ok(None);
        }

        let request = CompletionRequest::new(prompts::abstract_prompt(
            &self.config.environment,
            &combined,
        ))
        .with_system(prompts::ABSTRACT_SYSTEM)
        .with_max_tokens(ABSTRACT_MAX_TOKENS)
        .with_temperature(WRITING_TEMPERATURE);
        let content = self
            .client
            .complete(&request)
            .await
            .context("LLM call failed for abstract")?;

        let output = self.output_path(Section::Abstract);
        fs::write(&output, &content)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        let mut metadata = Metadata::load(&self.metadata_path)?;
        metadata.record_derived(Section::Abstract.name(), &output);
        metadata.save(&self.metadata_path)?;

        info!("[OK] Generated abstract from existing sections");
        Ok(Some(content))
    }

    /// Regenerate every body section whose notes changed, then the abstract
    /// if anything was updated. Per-section failures are logged and skipped.
    pub async fn generate_sections(&self) -> Result<Vec<Section>> {
        let mut updated = Vec::new();

        for section in Section::ALL {
            if section == Section::Abstract {
                continue;
            }
            match self.needs_regeneration(section) {
                Ok(false) => {
                    debug!("{} is up to date", section);
                    continue;
                }
                Ok(true) => {}
                Err(e) => {
                    warn!("Could not check {}: {:#}", section, e);
                    continue;
                }
            }
            match self.generate_section(section).await {
                Ok(Some(_)) => updated.push(section),
                Ok(None) => {}
                Err(e) => error!("Error generating {}: {:#}", section, e),
            }
        }

        if !updated.is_empty() {
            match self.generate_abstract_from_sections().await {
                Ok(Some(_)) => updated.push(Section::Abstract),
                Ok(None) => {}
                Err(e) => error!("Error generating abstract: {:#}", e),
            }
        }

        Ok(updated)
    }

    /// Concatenate all notes in report order into `<input>/<name>`.
    pub fn concatenate_input_files(&self, name: &str) -> Result<PathBuf> {
        info!("Concatenating input files...");
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();
        out.push_str("# Technical Report - PCT Applied (with RL Comparison)\n");
        out.push_str(&format!(
            "# Generated on: {}\n",
            Local::now().format("%B %d, %Y at %H:%M:%S")
        ));
        out.push_str(&format!("# Environment: {}\n", self.config.environment));
        out.push_str("# Focus: PCT primary; RL comparator baseline\n");
        out.push_str(&rule);
        out.push_str("\n\n");

        for section in Section::ALL {
            let title = section.title();
            out.push_str(&format!("## {}\n", title.to_uppercase()));
            out.push_str(&"-".repeat(title.len() + 3));
            out.push_str("\n\n");

            let input = self.input_path(section);
            if input.exists() {
                let content = fs::read_to_string(&input)
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let content = content.trim();
                out.push_str(if content.is_empty() {
                    "[No content provided]"
                } else {
                    content
                });
                out.push_str("\n\n");
            } else {
                out.push_str(&format!("[Input file {} not found]\n\n", section.input_file()));
            }
            out.push_str(&rule);
            out.push_str("\n\n");
        }

        let path = self.input_dir.join(name);
        fs::write(&path, out).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("[OK] Input files concatenated: {}", path.display());
        Ok(path)
    }

    /// Convert `references.txt` to `references.bib`, skipping the call when
    /// the references have not changed since the last conversion.
    pub async fn generate_bibtex(&self) -> Result<bool> {
        let references = self.output_path(Section::References);
        if !references.exists() {
            warn!("References file {} not found.", references.display());
            return Ok(false);
        }
        let bib_path = self.output_dir.join(BIBTEX_FILE);
        let current_hash = cache::file_hash(&references)?;

        if bib_path.exists() {
            let metadata = Metadata::load(&self.metadata_path)?;
            if metadata.input_hash("bibtex").as_deref() == Some(current_hash.as_str()) {
                info!("BibTeX file up to date (references.txt unchanged). Skipping regeneration.");
                return Ok(true);
            }
        }

        info!("Generating BibTeX file...");
        let refs = fs::read_to_string(&references)
            .with_context(|| format!("Failed to read {}", references.display()))?;
        let request = CompletionRequest::new(prompts::bibtex_prompt(refs.trim()))
            .with_system(prompts::BIBTEX_SYSTEM)
            .with_max_tokens(BIBTEX_MAX_TOKENS)
            .with_temperature(BIBTEX_TEMPERATURE);
        let response = self
            .client
            .complete(&request)
            .await
            .context("LLM call failed for BibTeX")?;

        fs::write(&bib_path, strip_bibtex_fences(&response))
            .with_context(|| format!("Failed to write {}", bib_path.display()))?;

        let mut metadata = Metadata::load(&self.metadata_path)?;
        metadata.record_generated("bibtex", self.recorded_hash(current_hash), &bib_path);
        metadata.save(&self.metadata_path)?;

        info!("[OK] BibTeX file generated: {}", bib_path.display());
        Ok(true)
    }

    /// Write `<output>/latex_output/<name>`.
    pub fn generate_latex(&self, name: &str, version: Version) -> Result<PathBuf> {
        info!("Generating LaTeX report...");
        let latex_dir = self.latex_dir();
        ensure_dir(&latex_dir)?;

        let info = self.title_info(version);
        let abstract_text = self.read_output(Section::Abstract)?;
        let mut sections = Vec::new();
        for section in Section::ALL {
            if section == Section::Abstract {
                continue;
            }
            sections.push((section, self.read_output(section)?));
        }

        let doc = latex::render_document(
            &info,
            abstract_text.as_deref(),
            &sections,
            &self.input_dir,
            &self.config.citations,
        );
        let path = latex_dir.join(name);
        fs::write(&path, doc).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("[OK] LaTeX report generated: {}", path.display());
        Ok(path)
    }

    pub fn compile_latex(&self, name: &str) -> Result<bool> {
        compile_latex_to_pdf(
            &LatexToolchain::from_config(&self.config),
            &self.input_dir,
            &self.output_dir,
            &self.latex_dir(),
            name,
        )
    }

    fn plain_document(&self, version: Version) -> Result<String> {
        let info = self.title_info(version);
        let mut doc = format!("# {}\n\n## {}\n\n", info.title, info.subtitle);

        let mut meta = vec![format!("Author: {}", info.author)];
        if let Some(ref org) = info.org {
            meta.push(format!("Organization: {}", org));
        }
        if let Some(ref email) = info.email {
            meta.push(format!("Email: {}", email));
        }
        meta.push(format!("Version {}", info.version));
        meta.push(info.date.clone());
        doc.push_str(&meta.join(" — "));
        doc.push_str("\n\n");

        if let Some(text) = self.read_output(Section::Abstract)? {
            doc.push_str("## Abstract\n\n");
            for para in text.trim().split("\n\n").map(str::trim) {
                if !para.is_empty() {
                    doc.push_str(para);
                    doc.push_str("\n\n");
                }
            }
        }
        doc.push_str("---\n\n");

        let mut counter = 0;
        for section in Section::ALL {
            if section == Section::Abstract {
                continue;
            }
            let Some(content) = self.read_output(section)? else {
                warn!("Output for {} not found, skipping it in the report", section);
                continue;
            };
            counter += 1;
            doc.push_str(&format!("## {}. {}\n\n", counter, section.title()));
            for para in content.split("\n\n").map(str::trim) {
                if !para.is_empty() {
                    doc.push_str(para);
                    doc.push_str("\n\n");
                }
            }
        }
        Ok(doc)
    }

    /// Render the Markdown report into `<output>/<name>`. If that file cannot
    /// be written because it is locked, retry once under a timestamped name.
    pub fn render_plain(&self, name: &str, version: Version) -> Result<PathBuf> {
        info!("Rendering report...");
        let doc = self.plain_document(version)?;
        let path = self.output_dir.join(name);
        let written = write_with_fallback(&path, &doc, |p, d| fs::write(p, d))?;
        if written == path {
            info!("[OK] Report rendered: {}", written.display());
        } else {
            info!("[OK] Report rendered (fallback): {}", written.display());
        }
        Ok(written)
    }

    pub fn any_section_output(&self) -> bool {
        Section::ALL
            .iter()
            .any(|section| self.output_path(*section).exists())
    }

    /// Run one report invocation. Returns overall success.
    pub async fn run(&mut self, mode: RunMode) -> Result<bool> {
        info!("Technical Report Generator");
        info!("Environment: {}", self.config.environment);

        self.load_title_info();

        let (force, latex, generate) = match mode {
            RunMode::CompileLatexOnly => return self.compile_latex(LATEX_FILE),
            RunMode::ConcatenateOnly => {
                self.concatenate_input_files(NOTES_FILE)?;
                return Ok(true);
            }
            RunMode::Full { force, latex } => (force, latex, true),
            RunMode::PdfOnly { latex } => (false, latex, false),
        };

        if generate {
            if force && self.metadata_path.exists() {
                info!("Force regenerating all sections...");
                fs::remove_file(&self.metadata_path).with_context(|| {
                    format!("Failed to remove {}", self.metadata_path.display())
                })?;
            }
            let updated = self.generate_sections().await?;
            if updated.is_empty() {
                info!("No sections needed updating.");
            } else {
                let names: Vec<&str> = updated.iter().map(|s| s.name()).collect();
                info!("Updated sections: {}", names.join(", "));
            }
        }

        if let Err(e) = self.concatenate_input_files(NOTES_FILE) {
            warn!("Error concatenating input files: {:#}", e);
        }

        if generate && !self.any_section_output() {
            error!("No output sections found. Please ensure input files exist and run generation first.");
            return Ok(false);
        }

        let version = cache::bump_version(&self.metadata_path)?;
        info!("Report version {}", version);
        let mut success = true;

        if latex {
            match self.generate_bibtex().await {
                Ok(ok) => success &= ok,
                Err(e) => {
                    error!("Error generating BibTeX: {:#}", e);
                    success = false;
                }
            }
            match self.generate_latex(LATEX_FILE, version) {
                Ok(_) => match self.compile_latex(LATEX_FILE) {
                    Ok(ok) => success &= ok,
                    Err(e) => {
                        error!("Error compiling LaTeX: {:#}", e);
                        success = false;
                    }
                },
                Err(e) => {
                    error!("Error generating LaTeX: {:#}", e);
                    success = false;
                }
            }
        }

        match self.render_plain(PLAIN_FILE, version) {
            Ok(_) => {}
            Err(e) => {
                error!("Error rendering report: {:#}", e);
                success = false;
            }
        }

        Ok(success)
    }
}
