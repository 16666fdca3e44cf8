//! Pipeline - 合成管线编排

mod orchestrator;
mod selector;

pub use orchestrator::{PipelineConfig, SpeechPipeline, SynthesisOutcome, SynthesizeCommand};
pub use selector::{BackendSelector, RetryConfig, SelectionOutcome};
