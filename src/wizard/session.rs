//! WizardSession — coordinates the engine, the session state, and what the
//! rendering surface is allowed to see.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::WizardError;
use crate::formatter::format_request;
use crate::lookup::PostalCodeResolver;

use super::engine::{StepForm, WizardEngine, WizardState};
use super::fields::{FieldSpec, fields_for};
use super::record::AnswerRecord;
use super::step::Step;

/// Wizard status exposed to the rendering surface.
#[derive(Debug, Clone, Serialize)]
pub struct WizardStatus {
    pub session_id: Uuid,
    pub step: Step,
    pub completed: bool,
    /// Validation messages from the last failed `advance`, empty after any
    /// successful transition.
    pub errors: Vec<String>,
    /// Read-only record snapshot for summary/sidebar display.
    pub record: AnswerRecord,
}

/// One active collection session. State is owned here exclusively; the REST
/// layer shares the session behind an `Arc`.
pub struct WizardSession {
    id: Uuid,
    engine: WizardEngine,
    state: RwLock<WizardState>,
    last_errors: RwLock<Vec<String>>,
}

impl WizardSession {
    pub fn new(resolver: Arc<dyn PostalCodeResolver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine: WizardEngine::new(resolver),
            state: RwLock::new(WizardState::new()),
            last_errors: RwLock::new(Vec::new()),
        }
    }

    /// Current step, completion flag, last validation errors, and a record
    /// snapshot.
    pub async fn status(&self) -> WizardStatus {
        let state = self.state.read().await;
        let errors = self.last_errors.read().await;
        WizardStatus {
            session_id: self.id,
            step: state.current_step,
            completed: state.current_step.is_terminal(),
            errors: errors.clone(),
            record: state.record.clone(),
        }
    }

    /// The fields that apply to the current step given the answers so far.
    pub async fn fields(&self) -> Vec<FieldSpec> {
        let state = self.state.read().await;
        fields_for(state.current_step, &state.record)
    }

    /// Validate and commit one step's input. Stores the error list on
    /// failure so the surface can redisplay it.
    pub async fn advance(&self, form: StepForm) -> Result<Step, WizardError> {
        let mut state = self.state.write().await;
        let from = state.current_step;
        let result = self.engine.advance(&mut state, form).await;

        let mut last_errors = self.last_errors.write().await;
        match &result {
            Ok(next) => {
                last_errors.clear();
                tracing::info!(session = %self.id, from = %from, to = %next, "wizard advanced");
            }
            Err(WizardError::Invalid(errors)) => {
                *last_errors = errors.iter().map(ToString::to_string).collect();
                tracing::info!(
                    session = %self.id,
                    step = %from,
                    errors = errors.len(),
                    "step validation failed"
                );
            }
            Err(e) => {
                *last_errors = vec![e.to_string()];
                tracing::warn!(session = %self.id, step = %from, error = %e, "advance rejected");
            }
        }
        result
    }

    /// Go back one step without touching collected answers. Returns the new
    /// step, or `None` at the first step.
    pub async fn retreat(&self) -> Option<Step> {
        let mut state = self.state.write().await;
        let result = self.engine.retreat(&mut state);
        if let Some(step) = result {
            self.last_errors.write().await.clear();
            tracing::info!(session = %self.id, to = %step, "wizard retreated");
        }
        result
    }

    /// The formatted pricing request, available once the final step is
    /// reached.
    pub async fn document(&self) -> Option<String> {
        let state = self.state.read().await;
        if state.current_step.is_terminal() {
            Some(format_request(&state.record))
        } else {
            None
        }
    }

    /// Raw structured record (internal/debug view).
    pub async fn record(&self) -> AnswerRecord {
        self.state.read().await.record.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::lookup::ResolvedAddress;
    use crate::wizard::record::Modality;
    use async_trait::async_trait;

    struct NeverFound;

    #[async_trait]
    impl PostalCodeResolver for NeverFound {
        async fn resolve(&self, _code: &str) -> Result<Option<ResolvedAddress>, LookupError> {
            Ok(None)
        }
    }

    fn session() -> WizardSession {
        WizardSession::new(Arc::new(NeverFound))
    }

    #[tokio::test]
    async fn fresh_session_starts_at_modalities() {
        let session = session();
        let status = session.status().await;
        assert_eq!(status.step, Step::Modalities);
        assert!(!status.completed);
        assert!(status.errors.is_empty());
        assert!(status.record.modalities.is_empty());
    }

    #[tokio::test]
    async fn failed_advance_exposes_errors_until_the_next_success() {
        let session = session();
        let result = session.advance(StepForm::Modalities { selected: vec![] }).await;
        assert!(result.is_err());

        let status = session.status().await;
        assert_eq!(status.errors, vec!["Select at least one modality".to_string()]);

        session
            .advance(StepForm::Modalities { selected: vec![Modality::XRay] })
            .await
            .unwrap();
        assert!(session.status().await.errors.is_empty());
    }

    #[tokio::test]
    async fn document_is_unavailable_before_final() {
        let session = session();
        assert!(session.document().await.is_none());
    }

    #[tokio::test]
    async fn retreat_clears_stale_errors() {
        let session = session();
        session
            .advance(StepForm::Modalities { selected: vec![Modality::XRay] })
            .await
            .unwrap();
        // Fail volumetry, then go back: the stale error list should not
        // follow the user to the previous step.
        let _ = session
            .advance(StepForm::Volumetry { profiles: Default::default() })
            .await;
        assert!(!session.status().await.errors.is_empty());

        assert_eq!(session.retreat().await, Some(Step::Modalities));
        assert!(session.status().await.errors.is_empty());
    }

    #[tokio::test]
    async fn retreat_at_start_returns_none() {
        let session = session();
        assert_eq!(session.retreat().await, None);
    }
}
