use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Saved;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    List,
    Show,
    Remove,
    Rescale,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::List => "list",
            Phase::Show => "show",
            Phase::Remove => "remove",
            Phase::Rescale => "rescale",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::List => info_span!("list"),
            Phase::Show => info_span!("show"),
            Phase::Remove => info_span!("remove"),
            Phase::Rescale => info_span!("rescale"),
        }
    }
}

impl OpMarker for Saved {
    const NAME: &'static str = "saved";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("saved")
    }
}
