pub mod restyle;
pub mod rewrite;
pub mod summarize;
