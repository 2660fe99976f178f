use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Cook;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Prepare,
    Generate,
    Save,
    Output,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Generate => "generate",
            Phase::Save => "save",
            Phase::Output => "output",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Prepare => info_span!("prepare"),
            Phase::Generate => info_span!("generate"),
            Phase::Save => info_span!("save"),
            Phase::Output => info_span!("output"),
        }
    }
}

impl OpMarker for Cook {
    const NAME: &'static str = "cook";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("cook")
    }
}
