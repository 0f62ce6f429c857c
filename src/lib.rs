//! penwork - LLM-assisted writing chores
//!
//! Batch rewriting of texts under every system/user role pair, a cached
//! technical report generator with LaTeX and PDF output, article summaries
//! and chapter restyling. Supports OpenAI, Anthropic, Gemini and
//! OpenAI-compatible providers.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod util;
