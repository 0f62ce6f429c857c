use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::Section;
use crate::util::ensure_dir;

fn sample_notes(section: Section) -> &'static str {
    match section {
        Section::Abstract => {
            r#"# Abstract Notes

**Note**: This section will be automatically generated from your other sections.

Abstract will include:
- **Research objective**: Compare PCT vs RL control systems
- **Methodology**: Environment testing and evaluation
- **Key findings**: Trade-offs between interpretability and convergence
- **Conclusions**: Each approach has distinct advantages"#
        }
        Section::Introduction => {
            r#"# Introduction Notes

## Key Points

- **Control systems** are critical for autonomous agents
- **Traditional control** vs **modern AI approaches**
- **PCT** offers:
  - Biological inspiration and interpretability
  - Realistic rationale
  - Simpler architecture and computational footprint
- **RL** provides:
  - Data-driven learning capabilities
  - *Limitations*: Input-action mapping not biologically credible, reward efficacy concept not psychologically coherent
- **Research gap**: Direct comparison in standardized environment
- Specific environment provides consistent evaluation platform"#
        }
        Section::Background => {
            r#"# Background Notes

## Topics to Cover

### Perceptual Control Theory
- **PCT fundamentals**: Elegant and powerful hierarchical architecture
  - Self-correcting feedback loop
  - Adapts to environment (Powers, 1973)

### Optimization & Learning
- **Evolutionary algorithms** for hierarchy optimization
- **Reinforcement learning** theory and deep Q-networks

### Environment
- **Characteristics and challenges** of the target environment

### Related Work
- Previous comparative studies **limitations**
- Control system **evaluation metrics**"#
        }
        Section::Methodology => {
            r#"# Methodology Notes

## Environment Setup
- **Target environment**: Specify your target environment

## PCT Implementation
- **PCT hierarchy**: Optimally generated by evolutionary algorithm
  - Guided by rewards and specific fitness function
- **Evolutionary algorithm**: DEAP framework with Optuna hyperparameter optimization

## RL Baseline
- **RL approach**: Simphony taken from OpenAI Gym leaderboard

## Evaluation
- **Metrics**:
  - Episodes
  - Success rate (out of 100 retries)
  - Steps
  - Number of nodes
  - Number of weights
- **Statistical analysis**: t-tests, effect sizes

## Hardware
- **Specs**: Specify this machine's specifications"#
        }
        Section::ExperimentalResults => {
            r#"# Experimental Results Notes

## Performance Data

### Comparison
- **Performance comparison** across 100 episodes
- **Results summary table**

### Reproducibility
- **Results reproduction**:
  - PCT example
  - Simphony model

### Visual Media
- **Videos** of controller performance
- **Environment images**

### Analysis
- **Key findings and insights**"#
        }
        Section::Discussion => {
            r#"# Discussion Notes

## PCT Advantages
- **Interpretability**: Break down into control units
- **Biological plausibility**
- **Psychologically credible**
- **Smaller computational footprint**

## RL Advantages
- **Sample efficiency**
- **Generalization**
- **Scalability**

## Analysis Points
- **Comparative analysis**: Strengths and weaknesses of each approach
- **Trade-offs** between approaches
- **Implications** for real-world applications
- **Limitations** of current study
- **Unexpected findings** and their explanations"#
        }
        Section::RecommendationsFutureWork => {
            r#"# Recommendations & Future Work Notes

## Recommendations

### Hybrid Approaches
- Combining **PCT and RL**

### Extended Testing
- Testing on more **complex and realistic** world environments
- **Real-world robotics** applications

### Computational Optimization
- Implement **EPCT in deep learning framework**
- **Parallel processing** and GPUs

### AI Interpretability
- **Human-interpretable AI systems**"#
        }
        Section::References => {
            r#"# References Notes

## Key References to Include

### Perceptual Control Theory

- Powers, W. T., Clark, R., and McFarland, R. (1960). A general feedback theory of human behavior: Part i. *Perceptual and motor skills*, 11(1):71–88.

- Powers, W. T. (1973). *Behavior: The control of perception*. Aldine de Gruyter.

- Young, R. (2017). A General Architecture for Robotics Systems: A Perception-Based Approach to Artificial Life. *Artificial Life*, 23(2):236–286.

- Young, R. (2020). Robotics in the real world: the perceptual control theory approach. In Mansell, W., editor, *The Interdisciplinary Handbook of Perceptual Control Theory*, chapter 14, pages 517–556. Academic Press.

### Reinforcement Learning

- Sutton, R. S., & Barto, A. G. (2018). *Reinforcement Learning: An Introduction*. MIT Press.

- Mnih, V., Kavukcuoglu, K., Silver, D., Rusu, A. A., Veness, J., Bellemare, M. G., ... & Hassabis, D. (2015). Human-level control through deep reinforcement learning. *Nature*, 518(7540), 529-533.

### Benchmarking

- OpenAI Gym benchmarking studies"#
        }
    }
}

/// Write template notes for every section. Existing files are left alone.
/// Returns the files that were created.
pub fn create_sample_input_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_dir(input_dir)?;
    let mut created = Vec::new();
    for section in Section::ALL {
        let path = input_dir.join(section.input_file());
        if path.exists() {
            continue;
        }
        fs::write(&path, sample_notes(section))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        created.push(path);
    }
    info!(
        "Sample input files created in {} ({} new)",
        input_dir.display(),
        created.len()
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_all_sections() {
        let dir = TempDir::new().unwrap();
        let created = create_sample_input_files(dir.path()).unwrap();
        assert_eq!(created.len(), Section::ALL.len());
        let methodology = fs::read_to_string(dir.path().join("methodology.md")).unwrap();
        assert!(methodology.starts_with("# Methodology Notes"));
    }

    #[test]
    fn test_existing_notes_are_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("discussion.md"), "my own notes").unwrap();
        let created = create_sample_input_files(dir.path()).unwrap();
        assert_eq!(created.len(), Section::ALL.len() - 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("discussion.md")).unwrap(),
            "my own notes"
        );
    }
}
