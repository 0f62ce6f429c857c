//! Prompt text for every procedure. Kept in one place so wording changes do
//! not ripple through the pipelines.

use crate::report::Section;

pub const REPORT_SYSTEM: &str = "You are an expert technical writer specializing in control systems and artificial intelligence research.";
pub const ABSTRACT_SYSTEM: &str =
    "You are an expert technical writer specializing in research abstracts.";
pub const BIBTEX_SYSTEM: &str = "You are an expert in bibliographic formatting and BibTeX.";
pub const SUMMARY_SYSTEM: &str =
    "You are an expert academic specializing in summarizing research papers.";
pub const RESTYLE_SYSTEM: &str = "You are an expert science fiction writer and literary mimic. \
You can rewrite text in the distinct voice and stylistic manner of notable science fiction and literary authors \
such as Isaac Asimov, Ursula K. Le Guin, William Gibson, Octavia Butler, Arthur C. Clarke, and others. \
You preserve the core narrative and character arcs while adapting prose, tone, pacing, and diction to match the target author.";

fn base_context(environment: &str) -> String {
    format!(
        r#"You are writing a technical report that primarily presents a Perceptual Control Theory (PCT) controller applied to the {environment} environment,
and secondarily provides a comparison against a Reinforcement Learning (RL) controller as a baseline.

Emphasize the PCT approach, its rationale, architecture, implementation details, and performance in the environment.
Use RL as a comparator to contextualize results and highlight similarities/differences.

Write in an academic, technical style appropriate for a research paper.
Include APA-style in-text citations where appropriate (use placeholder citations like (Author, Year)).

IMPORTANT: Do NOT include the section title or any heading in your response. Start directly with the content paragraphs.
The section title will be added automatically by the document generator.

CITATION HANDLING: If the notes contain LaTeX citation commands like \cite{{...}}, \citep{{...}}, or \citet{{...}},
these MUST be included in your output text where appropriate. These are LaTeX commands that will be processed later.
When you write about videos, results, or any referenced work that has a citation command in the notes,
include that citation command in your narrative text.

IMAGE HANDLING: When referencing images, use the format: [Image: filename.png (Caption text goes here)]
If the notes provide image references with captions, preserve the filename and include the caption in parentheses.
Do NOT add quotes around filenames.
If the notes specify a width parameter like [width=1.0\textwidth], include it immediately before the caption:
[Image: filename.png [width=1.0\textwidth] (Caption text)]
IMPORTANT: Include ALL images mentioned in the notes in your output, in the same order they appear.

TABLE HANDLING: If the notes contain Markdown tables (with pipes | and dashes), preserve them EXACTLY in your output.
Do NOT convert tables to prose or replace them with placeholders.
Keep the complete table structure with all rows and columns intact."#
    )
}

fn section_instructions(section: Section, environment: &str) -> String {
    match section {
        Section::Abstract => "Write a concise abstract (maximum 250 words) that summarizes PCT applied to the target environment, followed by a brief comparison with an RL baseline. Include objective, methodology overview, key findings, and main conclusions.".to_string(),
        Section::Introduction => "Write an introduction that frames the report as a presentation of PCT applied to the target environment, with a secondary comparison to an RL baseline. Clearly state the objectives and why PCT is an appropriate approach.".to_string(),
        Section::Background => format!("Provide comprehensive background emphasizing Perceptual Control Theory (principles, hierarchy, and control units), the {environment} environment, and briefly summarize RL concepts used as a comparator. Establish the theoretical foundation with a PCT-first emphasis."),
        Section::Methodology => format!("Describe the methodology with PCT as the primary focus: the {environment} setup, PCT hierarchy design and training (e.g., evolutionary algorithm parameters), followed by a concise RL baseline configuration, evaluation metrics, and procedures."),
        Section::ExperimentalResults => format!("Present results primarily for the PCT controller in the {environment} environment, including performance, stability, and interpretability aspects; then compare against the RL baseline. CRITICAL: When the notes mention images, tables, or videos with specific ordering (first, second, third), you MUST reference them in your narrative in EXACTLY that order."),
        Section::Discussion => "Analyze and interpret results with a PCT-first lens: strengths, limitations, implications, and design insights of PCT; then contrast with RL to highlight advantages/trade-offs.".to_string(),
        Section::RecommendationsFutureWork => "Provide specific recommendations focusing on advancing PCT (architecture, training, analysis) and outline future research, including more rigorous RL baselines for comparison.".to_string(),
        Section::References => "Generate ONLY a reference list in APA format. Do NOT include any introductory text, discussion, or conclusions. Just provide the properly formatted references cited in the report. Each reference should be on its own line or paragraph, properly formatted in APA style.".to_string(),
    }
}

/// Prompt for one report section built from the author's notes.
pub fn section_prompt(section: Section, environment: &str, notes: &str) -> String {
    format!(
        "{}\n\n{}\n\nNotes for this section:\n{}\n\nGenerate the content for this section:",
        base_context(environment),
        section_instructions(section, environment),
        notes
    )
}

/// Prompt for an abstract distilled from already generated sections.
pub fn abstract_prompt(environment: &str, combined_sections: &str) -> String {
    format!(
        r#"Based on the following technical report sections, write a concise abstract (maximum 250 words) that summarizes the research study comparing control systems for the {environment} environment. The abstract should include:
1. Research objective and problem statement
2. Methodology overview (PCT vs RL comparison)
3. Key findings and results
4. Main conclusions and implications

Make it a standalone summary that gives readers a complete overview of the work. IMPORTANT: Keep the abstract to 250 words or fewer.

Report content:
{combined_sections}

Generate a professional abstract:"#
    )
}

pub fn bibtex_prompt(references: &str) -> String {
    format!(
        r#"Convert the following references to BibTeX format.
Generate proper BibTeX entries with appropriate citation keys (e.g., powers1973, sutton2018, etc.).
Use standard BibTeX entry types (@article, @book, @inbook, @misc, etc.).
Ensure all entries are properly formatted and complete.

References:
{references}

Generate only the BibTeX entries, no additional text:"#
    )
}

/// Append a length constraint when shrinking text.
///
/// With `reduction == 0` the content is returned unchanged and the target is
/// the original word count. Halves round to the even neighbour.
pub fn revise_user_content(user_content: &str, word_count: usize, reduction: u32) -> (String, usize) {
    if reduction == 0 {
        return (user_content.to_string(), word_count);
    }
    let scaled = |pct: i64| -> usize {
        let pct = pct.max(0) as f64;
        (word_count as f64 * pct / 100.0).round_ties_even() as usize
    };
    let target = scaled(100 - reduction as i64);
    let lower = scaled(100 - reduction as i64 - 10);
    let revised = format!(
        "{}Ensure that the generated text is between {} and {} words.",
        user_content, lower, target
    );
    (revised, target)
}

/// User turn for rewriting a chapter in an author's voice.
pub fn restyle_prompt(book_context: &str, author: &str) -> String {
    let context = book_context.trim();
    let lead = if context.is_empty() {
        String::new()
    } else {
        format!("{} ", context)
    };
    format!(
        "{lead}Rewrite this chapter in the style of {author} while retaining the word count. \
Preserve the plot, character details, storyline and events, but adapt the tone and language to match their literary voice.\n\n"
    )
}

pub fn summarize_prompt(article: &str) -> String {
    format!(
        "Summarize this academic article by identifying its main thesis, key arguments, \
and any objections or counterarguments it addresses. Provide a clear and concise \
explanation of the author's reasoning, including any philosophical concepts or theories \
they rely on. If relevant, highlight the implications of the argument and how it contributes \
to the broader discussion. Also get its BibTeX citation:\n\n{}",
        article
    )
}

/// Used instead of [`summarize_prompt`] when an article is split into chunks.
pub fn summarize_chunk_prompt(chunk: &str) -> String {
    format!(
        "Summarize this academic article chunk by identifying its main thesis, key arguments, \
and any objections or counterarguments it addresses. Provide a clear and concise \
explanation of the author's reasoning, including any philosophical concepts or theories \
they rely on. If relevant, highlight the implications of the argument and how it contributes \
to the broader discussion:\n\n{}",
        chunk
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_prompt_contains_notes_and_environment() {
        let prompt = section_prompt(Section::Methodology, "Lunar Lander", "- used DEAP");
        assert!(prompt.contains("Lunar Lander environment"));
        assert!(prompt.contains("Notes for this section:\n- used DEAP"));
        assert!(prompt.ends_with("Generate the content for this section:"));
        // Literal braces survive format! escaping
        assert!(prompt.contains(r"\cite{...}"));
    }

    #[test]
    fn test_every_section_has_instructions() {
        for section in Section::ALL {
            assert!(!section_instructions(section, "Env").is_empty());
        }
    }

    #[test]
    fn test_abstract_prompt_marker() {
        let prompt = abstract_prompt("CartPole", "\n\nIntroduction:\ntext");
        assert!(prompt.contains("write a concise abstract"));
        assert!(prompt.contains("Introduction:\ntext"));
    }

    #[test]
    fn test_revise_user_content_no_reduction() {
        let (content, target) = revise_user_content("Rewrite.", 200, 0);
        assert_eq!(content, "Rewrite.");
        assert_eq!(target, 200);
    }

    #[test]
    fn test_revise_user_content_with_reduction() {
        let (content, target) = revise_user_content("Rewrite. ", 200, 20);
        assert_eq!(target, 160);
        assert_eq!(
            content,
            "Rewrite. Ensure that the generated text is between 140 and 160 words."
        );
    }

    #[test]
    fn test_revise_user_content_lower_bound_clamped() {
        let (content, target) = revise_user_content("", 100, 95);
        assert_eq!(target, 5);
        assert!(content.contains("between 0 and 5 words"));
    }

    #[test]
    fn test_revise_user_content_rounds_half_to_even() {
        let (content, target) = revise_user_content("", 5, 50);
        assert_eq!(target, 2);
        assert!(content.contains("between 2 and 2 words"));
        let (_, target) = revise_user_content("", 7, 50);
        assert_eq!(target, 4);
    }

    #[test]
    fn test_restyle_prompt() {
        let prompt = restyle_prompt("My book is a satire.", "Isaac Asimov");
        assert!(prompt.starts_with("My book is a satire. Rewrite this chapter in the style of Isaac Asimov"));
        let bare = restyle_prompt("", "Dan Brown");
        assert!(bare.starts_with("Rewrite this chapter in the style of Dan Brown"));
    }

    #[test]
    fn test_bibtex_and_summary_prompts() {
        assert!(bibtex_prompt("Powers (1973)").contains("References:\nPowers (1973)"));
        assert!(summarize_prompt("BODY").ends_with("BibTeX citation:\n\nBODY"));
        assert!(summarize_chunk_prompt("PART").ends_with("discussion:\n\nPART"));
    }
}
