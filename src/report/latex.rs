//! Markdown-ish LLM output to LaTeX.
//!
//! Section bodies go through a fixed pipeline: code fences, then tables, then
//! image references, then citations, then escaping. Escaping runs with
//! protection on so the environments produced by the earlier steps survive.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::{Section, TitleInfo};

const VERBATIM: &str = r"(?s)\\begin\{verbatim\}.*?\\end\{verbatim\}";
const TABLE_ENV: &str = r"(?s)\\begin\{table\}.*?\\end\{table\}";
const FIGURE_ENV: &str = r"(?s)\\begin\{figure\}.*?\\end\{figure\}";
const CITE_OR_REF: &str = r"~?\\(?:cite[pt]?|ref)\{[^}]+\}";
const INLINE_MATH: &str = r"\$[^$]+\$";

static VERBATIM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(VERBATIM).expect("Failed to compile VERBATIM regex"));
static TABLE_ENV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TABLE_ENV).expect("Failed to compile TABLE_ENV regex"));
static FIGURE_ENV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(FIGURE_ENV).expect("Failed to compile FIGURE_ENV regex"));
static CITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(CITE_OR_REF).expect("Failed to compile CITE_OR_REF regex"));
static MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(INLINE_MATH).expect("Failed to compile INLINE_MATH regex"));

static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[a-zA-Z0-9_+-]*\n(.*?)\n```").expect("Failed to compile code block regex")
});

// Optional caption before (`**Table N:** cap` or `- Caption: cap`), the table
// itself, optional caption after (`Table: cap` or `Caption: cap`).
static MD_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?m)(?:(?:\*\*Table\s+\d+:\*\*|(?:^|\n)-\s*Caption:)\s*([^\n]+)\n+)?",
        r"(\|[^\n]+\|\n\|[-:\s|]+\|\n(?:\|[^\n]+\|\n?)+)",
        r"(?:\n+(?:Table:|Caption:)\s*([^\n]+))?",
    ))
    .expect("Failed to compile markdown table regex")
});

// [Image: path] / [Image: path [width=...] (caption)]
static INLINE_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[Image:\s+([^\s\[\(]+)(?:\s+\[([^\]]+)\])?(?:\s+\(([^\)]+)\))?\]")
        .expect("Failed to compile inline image regex")
});

// - **Image**: `path`
//   - [width=...]
//   - Caption: text
static LIST_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"-\s+\*\*Image\*\*:\s+`([^`]+)`(?:\s*\n\s*-\s+\[([^\]]+)\])?(?:\s*\n\s*-\s+Caption:\s*([^\n]+))?",
    )
    .expect("Failed to compile list image regex")
});

const DEFAULT_FIGURE_WIDTH: &str = r"width=0.8\textwidth";

/// Placeholder families, in protection order. Restored in reverse.
fn protected_patterns() -> [(&'static str, &'static Regex); 5] {
    [
        ("VERBATIM", &*VERBATIM_RE),
        ("TABLE", &*TABLE_ENV_RE),
        ("FIGURE", &*FIGURE_ENV_RE),
        ("TEMP", &*CITE_RE),
        ("MATH", &*MATH_RE),
    ]
}

/// Fixed `(Author, Year)` forms and their BibTeX keys.
const CITATIONS: [(&str, &str); 9] = [
    ("(Powers et al., 1960)", "powers1960"),
    ("(Powers, 1973)", "powers1973"),
    ("(Sutton and Barto, 2018)", "sutton2018"),
    ("(Sutton & Barto, 2018)", "sutton2018"),
    ("(Mnih et al., 2015)", "mnih2015"),
    ("(Young, 2017)", "young2017"),
    ("(Young, 2020)", "young2020"),
    ("(Young, 2025)", "young2025"),
    ("(timurgepard, 2025)", "timurgepard2025"),
];

const PLACEHOLDER_CITATION: &str = "(Author, Year)";

fn unicode_math(c: char) -> Option<&'static str> {
    Some(match c {
        '≥' => r"$\geq$",
        '≤' => r"$\leq$",
        '≈' => r"$\approx$",
        '≠' => r"$\neq$",
        '×' => r"$\times$",
        '÷' => r"$\div$",
        '±' => r"$\pm$",
        '∞' => r"$\infty$",
        '°' => r"$^\circ$",
        _ => return None,
    })
}

fn map_unicode_math(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match unicode_math(c) {
            Some(latex) => out.push_str(latex),
            None => out.push(c),
        }
    }
    out
}

/// Single pass so replacement text is never escaped a second time.
fn escape_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '$' => out.push_str(r"\$"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            other => match unicode_math(other) {
                Some(latex) => out.push_str(latex),
                None => out.push(other),
            },
        }
    }
    out
}

fn placeholder(tag: &str, index: usize) -> String {
    format!("XX{}MARKER{}XX", tag, index)
}

/// Escape LaTeX special characters.
///
/// With `protect_commands`, verbatim/table/figure environments, `\cite`/`\ref`
/// commands and inline math are swapped for alphanumeric placeholders before
/// escaping and restored afterwards, byte for byte.
pub fn escape_latex(text: &str, protect_commands: bool) -> String {
    if !protect_commands {
        return escape_chars(text);
    }

    let patterns = protected_patterns();
    let mut working = map_unicode_math(text);
    let mut saved: Vec<Vec<String>> = Vec::with_capacity(patterns.len());
    for (tag, re) in patterns.iter() {
        let mut originals = Vec::new();
        working = re
            .replace_all(&working, |caps: &Captures| {
                originals.push(caps[0].to_string());
                placeholder(tag, originals.len() - 1)
            })
            .into_owned();
        saved.push(originals);
    }

    let mut escaped = escape_chars(&working);

    for ((tag, _), originals) in patterns.iter().zip(saved.iter()).rev() {
        for (i, original) in originals.iter().enumerate() {
            escaped = escaped.replace(&placeholder(tag, i), original);
        }
    }
    escaped
}

/// Turn known `(Author, Year)` citations into `~\cite{key}` and drop the
/// generic `(Author, Year)` placeholder. `extra` maps additional citation
/// text to keys and is applied first.
pub fn convert_citations(text: &str, extra: &BTreeMap<String, String>) -> String {
    let mut out = text.to_string();
    for (pattern, key) in extra {
        out = out.replace(pattern.as_str(), &format!(r"~\cite{{{}}}", key));
    }
    for (pattern, key) in CITATIONS {
        out = out.replace(pattern, &format!(r"~\cite{{{}}}", key));
    }
    out.replace(PLACEHOLDER_CITATION, "")
}

/// Fenced code blocks become `verbatim` environments.
pub fn convert_code_blocks(text: &str) -> String {
    CODE_BLOCK_RE
        .replace_all(text, |caps: &Captures| {
            format!("\\begin{{verbatim}}\n{}\n\\end{{verbatim}}", &caps[1])
        })
        .into_owned()
}

fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn render_table(caps: &Captures) -> String {
    let caption = caps
        .get(1)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim().to_string());
    let table_text = caps[2].trim();
    let lines: Vec<&str> = table_text.lines().collect();
    if lines.len() < 2 {
        return table_text.to_string();
    }

    let headers = split_row(lines[0]);
    let columns = headers.len();
    let rows: Vec<Vec<String>> = lines[2..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| split_row(l))
        .filter(|cells| cells.len() == columns)
        .collect();

    let mut latex = String::from("\n\\begin{table}[h]\n\\centering\n\\small\n");
    let spec = format!("|l|{}", "c|".repeat(columns.saturating_sub(1)));
    latex.push_str(&format!("\\begin{{tabular}}{{{}}}\n\\hline\n", spec));
    let header: Vec<String> = headers
        .iter()
        .map(|h| format!("\\textbf{{{}}}", escape_latex(h, true)))
        .collect();
    latex.push_str(&header.join(" & "));
    latex.push_str(" \\\\\n\\hline\n");
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_latex(c, true)).collect();
        latex.push_str(&cells.join(" & "));
        latex.push_str(" \\\\\n");
    }
    latex.push_str("\\hline\n\\end{tabular}\n");
    if let Some(caption) = caption {
        latex.push_str(&format!("\\caption{{{}}}\n", escape_latex(&caption, true)));
    }
    latex.push_str("\\end{table}\n");
    latex
}

/// Markdown pipe tables become `table` environments with a bold header row.
/// Rows whose cell count differs from the header are dropped.
pub fn convert_tables(text: &str) -> String {
    MD_TABLE_RE.replace_all(text, render_table).into_owned()
}

struct FigureCollector<'a> {
    input_dir: &'a Path,
    figures: Vec<String>,
}

impl FigureCollector<'_> {
    fn figure(
        &mut self,
        raw_path: &str,
        width: Option<&str>,
        caption: Option<&str>,
        default_caption_prefix: &str,
    ) -> String {
        let image_path = raw_path.trim_matches(|c| matches!(c, '\'' | '"' | '`' | ' '));
        let latex_path = image_path.replace('\\', "/");
        let file = Path::new(&latex_path);
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let basename = file
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let label = format!("fig:{}{}", stem, self.figures.len() + 1);
        let width = width.map(str::trim).unwrap_or(DEFAULT_FIGURE_WIDTH);

        let mut latex = String::from("\n\\begin{figure}[htbp]\n\\centering\n");
        if self.input_dir.join(image_path).exists() {
            latex.push_str(&format!("\\includegraphics[{}]{{{}}}\n", width, latex_path));
        } else {
            warn!("Image {} not found in {}", image_path, self.input_dir.display());
            latex.push_str(&format!(
                "\\fbox{{\\parbox{{0.8\\textwidth}}{{\\centering Image not found:\\\\{}}}}}\n",
                escape_latex(&latex_path, false)
            ));
        }
        let caption = match caption.map(str::trim) {
            Some(c) => escape_latex(c, true),
            None => format!("{}{}", default_caption_prefix, escape_latex(&basename, false)),
        };
        latex.push_str(&format!("\\caption{{{}}}\n", caption));
        latex.push_str(&format!("\\label{{{}}}\n\\end{{figure}}\n", label));

        self.figures.push(latex);
        format!("Figure~\\ref{{{}}}", label)
    }
}

/// Replace image references with `Figure~\ref{...}` and append the figure
/// environments at the end of the text. Images present in `input_dir` get
/// `\includegraphics`; missing ones get a framed placeholder.
pub fn convert_images(text: &str, input_dir: &Path) -> String {
    let mut collector = FigureCollector {
        input_dir,
        figures: Vec::new(),
    };

    let text = INLINE_IMAGE_RE
        .replace_all(text, |caps: &Captures| {
            collector.figure(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
                "Figure from: ",
            )
        })
        .into_owned();
    let mut text = LIST_IMAGE_RE
        .replace_all(&text, |caps: &Captures| {
            collector.figure(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
                "Figure: ",
            )
        })
        .into_owned();

    if !collector.figures.is_empty() {
        debug!("Converted {} image reference(s)", collector.figures.len());
        text.push_str("\n\n");
        text.push_str(&collector.figures.join("\n"));
    }
    text
}

/// Full conversion of one generated section body, paragraphs separated by a
/// blank line.
pub fn render_section_body(
    content: &str,
    input_dir: &Path,
    citations: &BTreeMap<String, String>,
) -> String {
    let content = convert_code_blocks(content);
    let content = convert_tables(&content);
    let content = convert_images(&content, input_dir);
    let content = convert_citations(&content, citations);
    let content = escape_latex(&content, true);

    let mut out = String::new();
    for para in content.split("\n\n") {
        let para = para.trim();
        if !para.is_empty() {
            out.push_str(para);
            out.push_str("\n\n");
        }
    }
    out
}

const PREAMBLE: &str = r"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{times}
\usepackage[margin=1in]{geometry}
\usepackage{setspace}
\usepackage{parskip}
\usepackage{titlesec}
\usepackage{hyperref}
\usepackage{graphicx}
\usepackage{amsmath}
\usepackage{natbib}

\hypersetup{
    colorlinks=true,
    linkcolor=blue,
    citecolor=blue,
    urlcolor=blue
}

\titleformat{\section}{\Large\bfseries}{\thesection.}{0.5em}{}
\titleformat{\subsection}{\large\bfseries}{\thesubsection.}{0.5em}{}

\onehalfspacing

\begin{document}

";

fn render_title_page(
    info: &TitleInfo,
    abstract_text: Option<&str>,
    citations: &BTreeMap<String, String>,
) -> String {
    let mut out = String::from("\\begin{titlepage}\n\\centering\n\\vspace*{1cm}\n\n");
    out.push_str(&format!(
        "{{\\huge\\bfseries {}\\par}}\n\n",
        escape_latex(&info.title, false)
    ));
    out.push_str("\\vspace{0.5cm}\n");
    out.push_str(&format!(
        "{{\\Large {}\\par}}\n\n",
        escape_latex(&info.subtitle, false)
    ));
    out.push_str("\\vspace{1.5cm}\n\n");

    let mut author_line = format!("\\textbf{{Author:}} {}", escape_latex(&info.author, false));
    if let Some(ref email) = info.email {
        author_line.push_str(&format!(
            " \\quad \\textbf{{Email:}} \\texttt{{{}}}",
            escape_latex(email, false)
        ));
    }
    author_line.push_str(&format!(" \\quad \\textbf{{Version:}} {}", info.version));
    author_line.push_str(&format!(" \\quad \\textbf{{Date:}} {}", info.date));
    out.push_str(&format!("{{{}\\par}}\n\n", author_line));
    if let Some(ref org) = info.org {
        out.push_str(&format!(
            "{{\\textbf{{Organization:}} {}\\par}}\n\n",
            escape_latex(org, false)
        ));
    }

    if let Some(text) = abstract_text {
        out.push_str("\\vspace{1.5cm}\n\\begin{abstract}\n");
        let text = text.trim();
        if !text.is_empty() {
            let converted = convert_citations(text, citations);
            out.push_str(&escape_latex(&converted, true));
            out.push('\n');
        }
        out.push_str("\\end{abstract}\n");
    }
    out.push_str("\\end{titlepage}\n\n\\newpage\n\n");
    out
}

/// Assemble the complete `.tex` source.
///
/// `sections` holds the generated text for each body section, `None` when the
/// output file does not exist. The abstract goes on the title page; the
/// references section is replaced by the BibTeX bibliography.
pub fn render_document(
    info: &TitleInfo,
    abstract_text: Option<&str>,
    sections: &[(Section, Option<String>)],
    input_dir: &Path,
    citations: &BTreeMap<String, String>,
) -> String {
    let mut doc = String::from(PREAMBLE);
    doc.push_str(&render_title_page(info, abstract_text, citations));

    for (section, content) in sections {
        match (section, content) {
            (Section::Abstract, _) => continue,
            (Section::References, _) => {
                doc.push_str("\\bibliographystyle{apalike}\n\\bibliography{references}\n\n");
            }
            (_, Some(content)) => {
                doc.push_str(&format!(
                    "\\section{{{}}}\n\n",
                    escape_latex(section.title(), false)
                ));
                let content = content.trim();
                if !content.is_empty() {
                    doc.push_str(&render_section_body(content, input_dir, citations));
                }
                doc.push('\n');
            }
            (_, None) => {
                warn!("Output for {} not found, skipping it in LaTeX", section);
            }
        }
    }

    doc.push_str("\\end{document}\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Version;
    use tempfile::TempDir;

    fn no_extra() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_escape_plain_specials() {
        assert_eq!(escape_latex("50% of a_b & #1", false), r"50\% of a\_b \& \#1");
        assert_eq!(
            escape_latex(r"\foo{x}", false),
            r"\textbackslash{}foo\{x\}"
        );
        assert_eq!(
            escape_latex("~^", false),
            r"\textasciitilde{}\textasciicircum{}"
        );
    }

    #[test]
    fn test_escape_unicode_math() {
        assert_eq!(escape_latex("x ≥ 5", false), r"x $\geq$ 5");
        assert_eq!(escape_latex("x ≥ 5", true), r"x $\geq$ 5");
        assert_eq!(escape_latex("90°", true), r"90$^\circ$");
    }

    #[test]
    fn test_escape_protects_cite_and_math() {
        let text = r"See ~\cite{powers1973} and $x^2$ & Figure~\ref{fig:plot_a1}";
        assert_eq!(
            escape_latex(text, true),
            r"See ~\cite{powers1973} and $x^2$ \& Figure~\ref{fig:plot_a1}"
        );
    }

    #[test]
    fn test_escape_protects_environments_verbatim() {
        let verbatim = "\\begin{verbatim}\nlet x_1 = {a & b};\n\\end{verbatim}";
        let table = "\\begin{table}[h]\n\\begin{tabular}{|l|c|}\nA & B \\\\\n\\end{tabular}\n\\end{table}";
        let figure = "\\begin{figure}[htbp]\n\\includegraphics[width=0.8\\textwidth]{a_b.png}\n\\end{figure}";
        let text = format!("{}\n\n50%\n\n{}\n\n{}", verbatim, table, figure);
        let escaped = escape_latex(&text, true);
        assert!(escaped.contains(verbatim));
        assert!(escaped.contains(table));
        assert!(escaped.contains(figure));
        assert!(escaped.contains(r"50\%"));
        assert!(!escaped.contains("MARKER"));
    }

    #[test]
    fn test_escape_many_citations_restore_distinctly() {
        let text: String = (0..12).map(|i| format!(r"\cite{{k{}}} ", i)).collect();
        assert_eq!(escape_latex(&text, true), text);
    }

    #[test]
    fn test_convert_citations() {
        let out = convert_citations(
            "PCT (Powers, 1973) and RL (Sutton & Barto, 2018) (Author, Year).",
            &no_extra(),
        );
        assert_eq!(
            out,
            r"PCT ~\cite{powers1973} and RL ~\cite{sutton2018} ."
        );
    }

    #[test]
    fn test_convert_citations_extra_mapping() {
        let mut extra = BTreeMap::new();
        extra.insert("(Mansell, 2020)".to_string(), "mansell2020".to_string());
        assert_eq!(
            convert_citations("see (Mansell, 2020)", &extra),
            r"see ~\cite{mansell2020}"
        );
    }

    #[test]
    fn test_convert_code_blocks() {
        let out = convert_code_blocks("before\n```python\nprint(1)\n```\nafter");
        assert_eq!(
            out,
            "before\n\\begin{verbatim}\nprint(1)\n\\end{verbatim}\nafter"
        );
    }

    #[test]
    fn test_convert_tables_with_caption_before() {
        let text = "**Table 1:** Results summary\n| Controller | Score |\n|---|---|\n| PCT | 280 |\n| RL | 250 | extra |\n";
        let out = convert_tables(text);
        assert!(out.contains("\\begin{tabular}{|l|c|}"));
        assert!(out.contains("\\textbf{Controller} & \\textbf{Score} \\\\"));
        assert!(out.contains("PCT & 280 \\\\"));
        // Mismatched row dropped
        assert!(!out.contains("RL & 250"));
        assert!(out.contains("\\caption{Results summary}"));
        assert!(!out.contains("**Table 1:**"));
    }

    #[test]
    fn test_convert_tables_caption_after() {
        let text = "| A | B | C |\n|:--|:-:|--:|\n| 1 | 2 | 3 |\n\nTable: Three columns";
        let out = convert_tables(text);
        assert!(out.contains("{|l|c|c|}"));
        assert!(out.contains("1 & 2 & 3"));
        assert!(out.contains("\\caption{Three columns}"));
    }

    #[test]
    fn test_convert_images_existing_and_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("reward.png"), b"png").unwrap();

        let text = "See [Image: reward.png [width=1.0\\textwidth] (Reward curve)] and [Image: missing.png].";
        let out = convert_images(text, dir.path());

        assert!(out.starts_with("See Figure~\\ref{fig:reward1} and Figure~\\ref{fig:missing2}."));
        assert!(out.contains("\\includegraphics[width=1.0\\textwidth]{reward.png}"));
        assert!(out.contains("\\caption{Reward curve}"));
        assert!(out.contains("Image not found:\\\\missing.png"));
        assert!(out.contains("\\caption{Figure from: missing.png}"));
    }

    #[test]
    fn test_convert_list_style_image() {
        let dir = TempDir::new().unwrap();
        let text = "- **Image**: `plot.png`\n  - [width=0.5\\textwidth]\n  - Caption: Episode lengths";
        let out = convert_images(text, dir.path());
        assert!(out.starts_with("Figure~\\ref{fig:plot1}"));
        assert!(out.contains("\\caption{Episode lengths}"));
    }

    #[test]
    fn test_render_section_body_keeps_figures_intact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("lander_run.png"), b"png").unwrap();
        let body = render_section_body(
            "Results (Powers, 1973) at 95% [Image: lander_run.png (Run)].\n\nNext para.",
            dir.path(),
            &no_extra(),
        );
        assert!(body.contains(r"~\cite{powers1973}"));
        assert!(body.contains(r"95\%"));
        assert!(body.contains(r"Figure~\ref{fig:lander_run1}"));
        assert!(body.contains(r"\includegraphics[width=0.8\textwidth]{lander_run.png}"));
        assert!(body.contains("Next para.\n\n"));
    }

    #[test]
    fn test_render_document_structure() {
        let dir = TempDir::new().unwrap();
        let info = TitleInfo {
            title: "PCT Applied to CartPole".to_string(),
            subtitle: "with Comparative RL Baseline".to_string(),
            author: "Research Team".to_string(),
            email: Some("team@example.org".to_string()),
            org: None,
            version: Version {
                major: 1,
                minor: 0,
                patch: 3,
            },
            date: "January 01, 2026".to_string(),
        };
        let sections = vec![
            (Section::Introduction, Some("Intro text".to_string())),
            (Section::Background, None),
            (Section::References, Some("Powers (1973)".to_string())),
        ];
        let doc = render_document(&info, Some("Short abstract"), &sections, dir.path(), &no_extra());

        assert!(doc.starts_with("\\documentclass[12pt,a4paper]{article}"));
        assert!(doc.contains("{\\huge\\bfseries PCT Applied to CartPole\\par}"));
        assert!(doc.contains("\\textbf{Version:} 1.0.3"));
        assert!(doc.contains("\\begin{abstract}\nShort abstract\n\\end{abstract}"));
        assert!(doc.contains("\\section{Introduction}\n\nIntro text\n\n"));
        assert!(!doc.contains("\\section{Background}"));
        assert!(doc.contains("\\bibliography{references}"));
        assert!(doc.ends_with("\\end{document}\n"));
    }
}
