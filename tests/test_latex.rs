//! Section bodies through the full LaTeX conversion.

use penwork::report::latex::{escape_latex, render_section_body};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_code_block_survives_escaping() {
    let dir = TempDir::new().unwrap();
    let body = "Run it:\n\n```python\nreward = {\"a\": 1} # 100%\n```\n\nDone & dusted.";

    let out = render_section_body(body, dir.path(), &BTreeMap::new());

    assert!(out.contains("\\begin{verbatim}\nreward = {\"a\": 1} # 100%\n\\end{verbatim}"));
    assert!(out.contains("Done \\& dusted."));
    assert!(!out.contains("MARKER"));
}

#[test]
fn test_table_cells_escaped_once() {
    let dir = TempDir::new().unwrap();
    let body = "**Table 1:** Success rate (%)\n\n| Agent | Rate |\n|---|---|\n| PCT_v2 | 95% |\n| DQN | 80% |\n";

    let out = render_section_body(body, dir.path(), &BTreeMap::new());

    assert!(out.contains("\\textbf{Agent} & \\textbf{Rate} \\\\"));
    assert!(out.contains("PCT\\_v2 & 95\\% \\\\"));
    assert!(out.contains("\\caption{Success rate (\\%)}"));
    assert!(!out.contains("\\\\%"));
}

#[test]
fn test_citations_and_math_kept_verbatim() {
    let dir = TempDir::new().unwrap();
    let mut extra = BTreeMap::new();
    extra.insert("(Marken, 2014)".to_string(), "marken2014".to_string());
    let body = "Control theory (Powers, 1973) and demos (Marken, 2014) use $k_p = 2$ gains (Author, Year).";

    let out = render_section_body(body, dir.path(), &extra);

    assert_eq!(
        out,
        "Control theory ~\\cite{powers1973} and demos ~\\cite{marken2014} use $k_p = 2$ gains .\n\n"
    );
}

#[test]
fn test_figure_for_existing_image() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("reward_curve.png"), b"png").unwrap();
    let body = "Learning is fast [Image: reward_curve.png (Reward per episode, 50% smoothing)].";

    let out = render_section_body(body, dir.path(), &BTreeMap::new());

    assert!(out.starts_with("Learning is fast Figure~\\ref{fig:reward_curve1}."));
    assert!(out.contains("\\includegraphics[width=0.8\\textwidth]{reward_curve.png}"));
    assert!(out.contains("\\caption{Reward per episode, 50\\% smoothing}"));
}

#[test]
fn test_protection_is_optional() {
    assert_eq!(escape_latex("\\cite{x}", false), "\\textbackslash{}cite\\{x\\}");
    assert_eq!(escape_latex("\\cite{x}", true), "\\cite{x}");
}
