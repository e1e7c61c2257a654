//! Prompt assembly for the two workflow stages that hand work to the
//! external assistant. The engine never reads source files; it only tells
//! the assistant where to look and what to bring back.

mod analysis;
mod execution;

pub use analysis::{build_analysis_preparation, AnalysisPreparation};
pub use execution::{build_execution_prompt, ExecutionContext, DEFAULT_GUIDELINES};
