use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::ReportConfig;
use crate::util::{is_not_found, run_cmd_with_timeout};

/// Extensions copied from the input directory next to the `.tex` file.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "pdf", "eps"];

const PDFLATEX_PASSES: u32 = 3;

/// The external TeX binaries and how long each run may take.
#[derive(Debug, Clone)]
pub struct LatexToolchain {
    pub pdflatex: String,
    pub bibtex: String,
    pub timeout: Duration,
}

impl LatexToolchain {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            pdflatex: config.pdflatex.clone(),
            bibtex: config.bibtex.clone(),
            timeout: Duration::from_secs(config.compile_timeout_secs),
        }
    }

    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(cwd);
        run_cmd_with_timeout(cmd, self.timeout).with_context(|| format!("Failed to run {}", program))
    }

    fn pdflatex(&self, tex_name: &str, cwd: &Path) -> Result<Output> {
        self.run(&self.pdflatex, &["-interaction=nonstopmode", tex_name], cwd)
    }
}

fn tail(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}

/// Copy `references.bib` and any images into the LaTeX build directory.
fn stage_assets(input_dir: &Path, output_dir: &Path, latex_dir: &Path) -> Result<()> {
    let bib = output_dir.join("references.bib");
    if bib.exists() {
        fs::copy(&bib, latex_dir.join("references.bib"))
            .with_context(|| format!("Failed to copy {}", bib.display()))?;
    }

    if !input_dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if !is_image {
            continue;
        }
        if let Some(name) = path.file_name() {
            fs::copy(&path, latex_dir.join(name))
                .with_context(|| format!("Failed to copy {}", path.display()))?;
            info!("  Copied image: {}", name.to_string_lossy());
        }
    }
    Ok(())
}

/// Compile `<latex_dir>/<tex_name>` with pdflatex, bibtex, pdflatex, pdflatex.
///
/// Returns `Ok(false)` when the source is missing, pdflatex is not installed,
/// the final pass fails, or no PDF appears. Only the last pdflatex pass is
/// allowed to fail the build; earlier failures are usually unresolved
/// references.
pub fn compile_latex_to_pdf(
    toolchain: &LatexToolchain,
    input_dir: &Path,
    output_dir: &Path,
    latex_dir: &Path,
    tex_name: &str,
) -> Result<bool> {
    info!("Compiling LaTeX to PDF...");
    let tex_path = latex_dir.join(tex_name);
    if !tex_path.exists() {
        warn!("LaTeX file {} not found. Cannot compile.", tex_path.display());
        return Ok(false);
    }

    stage_assets(input_dir, output_dir, latex_dir)?;

    info!("  Running {} (pass 1/{})...", toolchain.pdflatex, PDFLATEX_PASSES);
    match toolchain.pdflatex(tex_name, latex_dir) {
        Ok(output) if !output.status.success() => {
            warn!("pdflatex pass 1 reported errors:\n{}", tail(&output));
        }
        Ok(_) => {}
        Err(e) if is_not_found(&e) => {
            error!(
                "{} not found. Install a LaTeX distribution (TeX Live, MacTeX or MiKTeX); see https://www.latex-project.org/get/",
                toolchain.pdflatex
            );
            return Ok(false);
        }
        Err(e) => return Err(e),
    }

    let stem = Path::new(tex_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| tex_name.to_string());
    info!("  Running {}...", toolchain.bibtex);
    match toolchain.run(&toolchain.bibtex, &[&stem], latex_dir) {
        Ok(output) if !output.status.success() => {
            warn!(
                "bibtex warning (may be normal if no citations):\n{}",
                tail(&output)
            );
        }
        Ok(_) => {}
        Err(e) => warn!("bibtex did not run: {:#}", e),
    }

    for pass in 2..=PDFLATEX_PASSES {
        info!(
            "  Running {} (pass {}/{})...",
            toolchain.pdflatex, pass, PDFLATEX_PASSES
        );
        let output = toolchain.pdflatex(tex_name, latex_dir)?;
        if !output.status.success() {
            warn!("pdflatex pass {} reported errors:\n{}", pass, tail(&output));
            if pass == PDFLATEX_PASSES {
                error!("LaTeX compilation failed");
                return Ok(false);
            }
        }
    }

    let pdf_path = tex_path.with_extension("pdf");
    if pdf_path.exists() {
        info!("[OK] LaTeX PDF compiled: {}", pdf_path.display());
        Ok(true)
    } else {
        error!("PDF file not created after compilation");
        Ok(false)
    }
}
