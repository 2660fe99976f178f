use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Generate;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Prepare,
    CallLlm,
    Validate,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::CallLlm => "call_llm",
            Phase::Validate => "validate",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Prepare => info_span!("prepare"),
            Phase::CallLlm => info_span!("call_llm"),
            Phase::Validate => info_span!("validate"),
        }
    }
}

impl OpMarker for Generate {
    const NAME: &'static str = "generate";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("generate")
    }
}
