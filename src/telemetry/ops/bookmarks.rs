use tracing::{info_span, Span};

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Bookmarks;

#[derive(Copy, Clone, Debug)]
pub enum Phase {
    Load,
    Toggle,
    Remove,
    Persist,
}

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Toggle => "toggle",
            Phase::Remove => "remove",
            Phase::Persist => "persist",
        }
    }

    fn span(&self) -> Span {
        match self {
            Phase::Load => info_span!("load"),
            Phase::Toggle => info_span!("toggle"),
            Phase::Remove => info_span!("remove"),
            Phase::Persist => info_span!("persist"),
        }
    }
}

impl OpMarker for Bookmarks {
    const NAME: &'static str = "bookmarks";
    type Phase = Phase;

    fn root_span() -> Span {
        info_span!("bookmarks")
    }
}
