use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Session;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Submit,
    Rescale,
    Reset,
    Open,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Submit => "submit",
            Phase::Rescale => "rescale",
            Phase::Reset => "reset",
            Phase::Open => "open",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Submit => info_span!("submit"),
            Phase::Rescale => info_span!("rescale"),
            Phase::Reset => info_span!("reset"),
            Phase::Open => info_span!("open"),
        }
    }
}

impl OpMarker for Session {
    const NAME: &'static str = "session";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("session")
    }
}
