//! The active-plan state machine.
//!
//! ```text
//! Idle  | Ready | Error --submit-->   Loading
//! Loading            --success-->  Ready
//! Loading            --failure-->  Error   (previous plan kept for context)
//! Ready              --rescale-->  Loading (only when the size changes)
//! Ready | Error      --reset-->    Idle
//! ```
//!
//! At most one generation call is outstanding per session. Methods take
//! `&self`, so overlapping calls on a shared session are possible and are
//! rejected with [`SessionError::Busy`] instead of being queued.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::generate::{GenerationError, GenerationErrorKind, Language, PlanGenerator, check_request};
use crate::plan::{Plan, SavedPlan};
use crate::telemetry;
use crate::telemetry::ops::session::Phase as SessionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a plan is already being generated")]
    Busy,
    #[error("no active plan to rescale")]
    NoActivePlan,
    #[error("could not generate a plan")]
    Generation(#[from] GenerationError),
}

impl SessionError {
    /// Classification for callers that only show "could not generate".
    pub fn generation_kind(&self) -> Option<GenerationErrorKind> {
        match self {
            SessionError::Generation(e) => Some(e.kind()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRequest {
    pub household_size: u32,
    pub dish_description: String,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    language: Language,
    active: Option<Plan>,
    description: Option<String>,
    last_error: Option<GenerationErrorKind>,
    last_request: Option<PlanRequest>,
}

pub struct PlanSession<G> {
    generator: G,
    inner: Mutex<Inner>,
}

/// Reverts a `Loading` session if the in-flight call is dropped before it
/// resolves.
struct LoadingGuard<'a> {
    inner: &'a Mutex<Inner>,
    prior: SessionState,
    armed: bool,
}

impl LoadingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if inner.state == SessionState::Loading {
                inner.state = self.prior;
            }
        }
    }
}

impl<G: PlanGenerator> PlanSession<G> {
    pub fn new(generator: G, language: Language) -> Self {
        Self {
            generator,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                language,
                active: None,
                description: None,
                last_error: None,
                last_request: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate a plan for `household_size` diners and make it active.
    pub async fn submit(&self, household_size: u32, dish_description: &str) -> Result<Plan, SessionError> {
        let log = telemetry::session();
        let span = log.span(&SessionPhase::Submit);
        self.run(household_size, dish_description).instrument(span).await
    }

    /// Re-generate the active plan's dish description for a new size. Same
    /// size returns the active plan without calling the generator.
    pub async fn rescale(&self, new_size: u32) -> Result<Plan, SessionError> {
        let log = telemetry::session();
        let span = log.span(&SessionPhase::Rescale);
        let description = {
            let inner = self.lock();
            match inner.state {
                SessionState::Loading => return Err(SessionError::Busy),
                SessionState::Ready => {}
                SessionState::Idle | SessionState::Error => return Err(SessionError::NoActivePlan),
            }
            let (Some(plan), Some(description)) = (&inner.active, &inner.description) else {
                return Err(SessionError::NoActivePlan);
            };
            if plan.portion_size == new_size {
                log.info_kv("rescale skipped", [("size", new_size.to_string())]);
                return Ok(plan.clone());
            }
            description.clone()
        };
        self.run(new_size, &description).instrument(span).await
    }

    async fn run(&self, household_size: u32, dish_description: &str) -> Result<Plan, SessionError> {
        let log = telemetry::session();
        check_request(household_size, dish_description)?;

        let (language, guard) = {
            let mut inner = self.lock();
            if inner.state == SessionState::Loading {
                log.warn("rejecting request while a plan is loading");
                return Err(SessionError::Busy);
            }
            let prior = inner.state;
            inner.state = SessionState::Loading;
            inner.last_request = Some(PlanRequest {
                household_size,
                dish_description: dish_description.to_string(),
            });
            let guard = LoadingGuard { inner: &self.inner, prior, armed: true };
            (inner.language, guard)
        };

        let outcome = self
            .generator
            .generate(household_size, dish_description, language)
            .await;

        let mut inner = self.lock();
        guard.disarm();
        match outcome {
            Ok(plan) => {
                inner.active = Some(plan.clone());
                inner.description = Some(dish_description.to_string());
                inner.last_error = None;
                inner.state = SessionState::Ready;
                log.info_kv(
                    "plan ready",
                    [("size", plan.portion_size.to_string()), ("title", plan.title())],
                );
                Ok(plan)
            }
            Err(err) => {
                inner.last_error = Some(err.kind());
                inner.state = SessionState::Error;
                log.warn_kv("generation failed", [("kind", format!("{:?}", err.kind()))]);
                Err(err.into())
            }
        }
    }

    /// Make a bookmarked plan the active one.
    pub fn open_saved(&self, saved: &SavedPlan) -> Result<(), SessionError> {
        let log = telemetry::session();
        let _g = log.span(&SessionPhase::Open).entered();
        let mut inner = self.lock();
        if inner.state == SessionState::Loading {
            return Err(SessionError::Busy);
        }
        inner.active = Some(saved.plan.clone());
        inner.description = Some(saved.original_query.clone());
        inner.last_error = None;
        inner.state = SessionState::Ready;
        Ok(())
    }

    pub fn reset(&self) -> Result<(), SessionError> {
        let log = telemetry::session();
        let _g = log.span(&SessionPhase::Reset).entered();
        let mut inner = self.lock();
        if inner.state == SessionState::Loading {
            return Err(SessionError::Busy);
        }
        inner.active = None;
        inner.description = None;
        inner.last_error = None;
        inner.state = SessionState::Idle;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn is_loading(&self) -> bool {
        self.state() == SessionState::Loading
    }

    /// The plan to present; `None` unless the session is `Ready`.
    pub fn current_plan(&self) -> Option<Plan> {
        let inner = self.lock();
        match inner.state {
            SessionState::Ready => inner.active.clone(),
            _ => None,
        }
    }

    /// Last successful plan, kept through failures for display context.
    pub fn retained_plan(&self) -> Option<Plan> {
        self.lock().active.clone()
    }

    /// Description that produced the active plan.
    pub fn description(&self) -> Option<String> {
        self.lock().description.clone()
    }

    pub fn last_error(&self) -> Option<GenerationErrorKind> {
        self.lock().last_error
    }

    pub fn last_request(&self) -> Option<PlanRequest> {
        self.lock().last_request.clone()
    }

    pub fn language(&self) -> Language {
        self.lock().language
    }

    pub fn set_language(&self, language: Language) {
        self.lock().language = language;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct StubGenerator {
        scripted: Mutex<VecDeque<Result<Plan, GenerationError>>>,
        calls: Mutex<Vec<(u32, String, Language)>>,
        gate: Option<Arc<Notify>>,
    }

    impl StubGenerator {
        fn gated(gate: Arc<Notify>) -> Self {
            Self { gate: Some(gate), ..Default::default() }
        }

        fn push(&self, outcome: Result<Plan, GenerationError>) {
            self.scripted.lock().unwrap().push_back(outcome);
        }

        fn calls(&self) -> Vec<(u32, String, Language)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlanGenerator for StubGenerator {
        async fn generate(
            &self,
            household_size: u32,
            dish_description: &str,
            language: Language,
        ) -> Result<Plan, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((household_size, dish_description.to_string(), language));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let scripted = self.scripted.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| {
                let first = dish_description.split(',').next().unwrap_or_default().trim();
                Ok(fixtures::plan(first, household_size))
            })
        }
    }

    fn timeout_error() -> GenerationError {
        GenerationError::Service("request timed out".into())
    }

    #[tokio::test]
    async fn submit_makes_plan_active() {
        let session = PlanSession::new(StubGenerator::default(), Language::TraditionalChineseHk);
        assert_eq!(session.state(), SessionState::Idle);

        let plan = session.submit(4, "蒸魚, 炒菜").await.unwrap();

        assert_eq!(plan.portion_size, 4);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.current_plan(), Some(plan));
        assert_eq!(session.description().as_deref(), Some("蒸魚, 炒菜"));
        assert_eq!(
            session.generator.calls(),
            vec![(4, "蒸魚, 炒菜".to_string(), Language::TraditionalChineseHk)]
        );
    }

    #[tokio::test]
    async fn timeout_moves_to_error_and_resubmit_is_allowed() {
        let session = PlanSession::new(StubGenerator::default(), Language::English);
        session.submit(2, "蒸魚").await.unwrap();
        let previous = session.current_plan().unwrap();

        session.generator.push(Err(timeout_error()));
        let err = session.submit(3, "炒菜").await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::Service));
        assert_eq!(session.state(), SessionState::Error);
        assert_eq!(session.last_error(), Some(GenerationErrorKind::Service));
        assert_eq!(session.current_plan(), None);
        assert_eq!(session.retained_plan(), Some(previous));
        assert_eq!(
            session.last_request(),
            Some(PlanRequest { household_size: 3, dish_description: "炒菜".into() })
        );

        let plan = session.submit(3, "炒菜").await.unwrap();
        assert_eq!(plan.portion_size, 3);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.last_error(), None);
        assert_eq!(session.description().as_deref(), Some("炒菜"));
    }

    #[tokio::test]
    async fn second_submit_while_loading_is_rejected() {
        let gate = Arc::new(Notify::new());
        let session = Arc::new(PlanSession::new(
            StubGenerator::gated(gate.clone()),
            Language::English,
        ));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit(2, "蒸魚").await }
        });
        while !session.is_loading() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(session.submit(3, "炒菜").await, Err(SessionError::Busy)));
        assert!(matches!(session.rescale(5).await, Err(SessionError::Busy)));
        assert!(matches!(session.reset(), Err(SessionError::Busy)));

        gate.notify_one();
        let plan = first.await.unwrap().unwrap();
        assert_eq!(plan.portion_size, 2);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn dropped_call_reverts_loading() {
        let gate = Arc::new(Notify::new());
        let session = PlanSession::new(StubGenerator::gated(gate), Language::English);

        let res = tokio::time::timeout(Duration::from_millis(20), session.submit(2, "蒸魚")).await;
        assert!(res.is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn rescale_reuses_description_and_skips_same_size() {
        let session = PlanSession::new(StubGenerator::default(), Language::English);
        session.submit(2, "蒸魚, 炒菜").await.unwrap();

        let same = session.rescale(2).await.unwrap();
        assert_eq!(same.portion_size, 2);
        assert_eq!(session.generator.calls().len(), 1);

        let bigger = session.rescale(6).await.unwrap();
        assert_eq!(bigger.portion_size, 6);
        let calls = session.generator.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], (6, "蒸魚, 炒菜".to_string(), Language::English));
        assert_eq!(session.current_plan().unwrap().portion_size, 6);
    }

    #[tokio::test]
    async fn rescale_requires_a_ready_plan() {
        let session = PlanSession::new(StubGenerator::default(), Language::English);
        assert!(matches!(session.rescale(3).await, Err(SessionError::NoActivePlan)));

        session.generator.push(Err(timeout_error()));
        let _ = session.submit(2, "蒸魚").await;
        assert!(matches!(session.rescale(3).await, Err(SessionError::NoActivePlan)));
        assert!(session.generator.calls().len() == 1);
    }

    #[tokio::test]
    async fn invalid_input_does_not_change_state() {
        let session = PlanSession::new(StubGenerator::default(), Language::English);
        session.submit(2, "蒸魚").await.unwrap();

        let err = session.submit(2, "  ").await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::InvalidRequest));
        let err = session.rescale(0).await.unwrap_err();
        assert_eq!(err.generation_kind(), Some(GenerationErrorKind::InvalidRequest));

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let session = PlanSession::new(StubGenerator::default(), Language::English);
        session.generator.push(Err(timeout_error()));
        let _ = session.submit(2, "蒸魚").await;

        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.last_error(), None);
        assert_eq!(session.retained_plan(), None);
        assert_eq!(session.description(), None);
    }

    #[tokio::test]
    async fn opened_bookmark_can_be_rescaled_in_new_language() {
        let session = PlanSession::new(StubGenerator::default(), Language::English);
        let saved = SavedPlan {
            id: "id-1".into(),
            original_query: "咖喱雞".into(),
            created_at: 0,
            plan: fixtures::plan("咖喱雞", 2),
        };

        session.open_saved(&saved).unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.current_plan(), Some(saved.plan.clone()));

        session.set_language(Language::SimplifiedChinese);
        session.rescale(4).await.unwrap();
        assert_eq!(
            session.generator.calls(),
            vec![(4, "咖喱雞".to_string(), Language::SimplifiedChinese)]
        );
    }
}
