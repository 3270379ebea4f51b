//! Build pipeline orchestration
//!
//! The pipeline runs a fixed sequence of phases over a shared
//! [`BuildContext`]: compile, then (production only) bundle, fanout and
//! manifest. Each phase reads what earlier phases recorded in the context
//! and appends its own results.

pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;

pub use context::BuildContext;
pub use orchestrator::PipelineOrchestrator;
pub use phase_trait::WorkflowPhase;
