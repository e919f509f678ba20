//! ApplicationManager: coordinates the wizard, snapshot persistence, and
//! the suggestion and registration collaborators.
//!
//! The wizard lock is never held across a collaborator call. Snapshots are
//! written while the lock is held so they always reflect the committed
//! transition.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{CollaboratorError, Error, TransitionError};
use crate::services::{RegistrationService, SuggestionService};
use crate::store::SnapshotStore;

use super::buffer::{FieldValue, StepBuffer};
use super::model::ApplicationRecord;
use super::snapshot;
use super::state::{Commit, Wizard, WizardState};
use super::suggestion::{PendingSuggestion, ReviewDecision, SuggestionCategory, SuggestionReviewer};
use super::validator::{StepValidator, Validation};

const SUGGESTION_SERVICE: &str = "suggestion";
const REGISTRATION_SERVICE: &str = "registration";

/// Everything a rendering layer needs to draw the current screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApplicationStatus {
    pub state: WizardState,
    /// -1 landing, 0-2 editing, 3 review.
    pub step: i32,
    pub busy: bool,
    pub record: ApplicationRecord,
    /// The active step's buffer, when editing.
    pub buffer: Option<StepBuffer>,
    pub pending_suggestions: Vec<PendingSuggestion>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmissionReceipt {
    pub status_code: u16,
    pub message: String,
    pub reference: String,
}

/// Owns the wizard and runs every operation against it.
pub struct ApplicationManager {
    store: Arc<dyn SnapshotStore>,
    suggestions: Arc<dyn SuggestionService>,
    registration: Arc<dyn RegistrationService>,
    wizard: RwLock<Wizard>,
}

impl ApplicationManager {
    /// A manager with a fresh wizard. The store is not read.
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        suggestions: Arc<dyn SuggestionService>,
        registration: Arc<dyn RegistrationService>,
        validator: StepValidator,
    ) -> Self {
        Self {
            store,
            suggestions,
            registration,
            wizard: RwLock::new(Wizard::new(validator)),
        }
    }

    /// A manager resumed from whatever snapshot the store holds.
    pub async fn restore(
        store: Arc<dyn SnapshotStore>,
        suggestions: Arc<dyn SuggestionService>,
        registration: Arc<dyn RegistrationService>,
        validator: StepValidator,
    ) -> Self {
        let loaded = snapshot::load(store.as_ref()).await;
        let requested = loaded.state.unwrap_or_default();
        let wizard = Wizard::restore(loaded.record.unwrap_or_default(), requested, validator);

        if wizard.state() != requested {
            warn!(
                requested = %requested,
                restored = %wizard.state(),
                "Snapshot step is ahead of validated data; resuming earlier"
            );
        }
        info!(state = %wizard.state(), "Application restored");

        Self {
            store,
            suggestions,
            registration,
            wizard: RwLock::new(wizard),
        }
    }

    async fn persist(&self, wizard: &Wizard, commit: Commit) {
        snapshot::save(self.store.as_ref(), commit, wizard.record(), wizard.state()).await;
    }

    pub async fn status(&self) -> ApplicationStatus {
        let wizard = self.wizard.read().await;
        ApplicationStatus {
            state: wizard.state(),
            step: wizard.state().index(),
            busy: wizard.is_busy(),
            record: wizard.record().clone(),
            buffer: wizard.active_buffer().cloned(),
            pending_suggestions: wizard.pending_suggestions().cloned().collect(),
        }
    }

    pub async fn state(&self) -> WizardState {
        self.wizard.read().await.state()
    }

    pub async fn record(&self) -> ApplicationRecord {
        self.wizard.read().await.record().clone()
    }

    pub async fn is_busy(&self) -> bool {
        self.wizard.read().await.is_busy()
    }

    /// Copy of the active step's buffer, if editing.
    pub async fn read_buffer(&self) -> Option<StepBuffer> {
        self.wizard.read().await.active_buffer().cloned()
    }

    pub async fn validate_current_step(&self) -> Validation {
        self.wizard.read().await.validate_current_step()
    }

    pub async fn start(&self) -> Result<WizardState, TransitionError> {
        let mut wizard = self.wizard.write().await;
        let commit = wizard.start()?;
        self.persist(&wizard, commit).await;
        info!(state = %wizard.state(), "Application started");
        Ok(wizard.state())
    }

    pub async fn set_field(
        &self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TransitionError> {
        self.wizard.write().await.set_field(name, value)
    }

    /// Write a batch of fields under one lock; all or nothing.
    pub async fn set_fields(
        &self,
        values: impl IntoIterator<Item = (String, FieldValue)>,
    ) -> Result<(), TransitionError> {
        self.wizard.write().await.set_fields(values)
    }

    pub async fn advance(&self) -> Result<WizardState, TransitionError> {
        let mut wizard = self.wizard.write().await;
        let from = wizard.state();
        let commit = wizard.advance()?;
        self.persist(&wizard, commit).await;
        info!(from = %from, to = %wizard.state(), "Step completed");
        Ok(wizard.state())
    }

    pub async fn retreat(&self) -> Result<WizardState, TransitionError> {
        let mut wizard = self.wizard.write().await;
        let from = wizard.state();
        let commit = wizard.retreat()?;
        self.persist(&wizard, commit).await;
        info!(from = %from, to = %wizard.state(), "Stepped back");
        Ok(wizard.state())
    }

    /// Discard everything. Always succeeds, even while a request is
    /// outstanding; that request's result will be dropped.
    pub async fn reset(&self) -> WizardState {
        let mut wizard = self.wizard.write().await;
        let was_busy = wizard.is_busy();
        let commit = wizard.reset();
        self.persist(&wizard, commit).await;
        info!(was_busy, "Application reset");
        wizard.state()
    }

    /// Hand the record to the registration service. On success the
    /// application resets.
    pub async fn submit(&self) -> Result<SubmissionReceipt, Error> {
        let (record, generation) = self.wizard.write().await.begin_submit()?;
        info!(generation, "Submitting application");

        let response = self.registration.submit(&record).await;

        let mut wizard = self.wizard.write().await;
        if !wizard.settle(generation) {
            warn!(generation, "Discarding registration response after reset");
            return Err(CollaboratorError::Discarded {
                service: REGISTRATION_SERVICE,
            }
            .into());
        }

        let status_code = response.status_code;
        let message = response.message.clone();
        let reference = response.into_result(REGISTRATION_SERVICE).inspect_err(|e| {
            warn!(error = %e, "Registration failed; application kept for retry");
        })?;

        let commit = wizard.reset();
        self.persist(&wizard, commit).await;
        info!(%reference, "Application submitted");

        Ok(SubmissionReceipt {
            status_code,
            message,
            reference,
        })
    }

    /// Ask the suggestion service for a draft and hold it for review.
    ///
    /// Without an explicit prompt one is built from the household section.
    pub async fn request_suggestion(
        &self,
        category: SuggestionCategory,
        prompt: Option<String>,
    ) -> Result<PendingSuggestion, Error> {
        let (household, generation) = self.wizard.write().await.begin_suggestion()?;
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| category.prompt(&household));

        let response = self.suggestions.suggest(category, &prompt).await;

        let mut wizard = self.wizard.write().await;
        if !wizard.settle(generation) {
            warn!(%category, generation, "Discarding suggestion after reset");
            return Err(CollaboratorError::Discarded {
                service: SUGGESTION_SERVICE,
            }
            .into());
        }

        let text = response.into_result(SUGGESTION_SERVICE).inspect_err(|e| {
            warn!(%category, error = %e, "Suggestion request failed");
        })?;
        if text.trim().is_empty() {
            return Err(CollaboratorError::EmptyResponse {
                service: SUGGESTION_SERVICE,
            }
            .into());
        }

        let pending = PendingSuggestion {
            category,
            text,
            generation,
        };
        if !wizard.hold_suggestion(pending.clone()) {
            return Err(CollaboratorError::Discarded {
                service: SUGGESTION_SERVICE,
            }
            .into());
        }
        info!(%category, "Suggestion ready for review");
        Ok(pending)
    }

    /// Apply or drop a held suggestion.
    pub async fn resolve_suggestion(
        &self,
        category: SuggestionCategory,
        decision: ReviewDecision,
    ) -> Result<Option<String>, TransitionError> {
        let applied = self
            .wizard
            .write()
            .await
            .resolve_suggestion(category, &decision)?;
        info!(%category, applied = applied.is_some(), "Suggestion resolved");
        Ok(applied)
    }

    /// Request a suggestion, show it to `reviewer`, and apply the decision.
    pub async fn assist(
        &self,
        category: SuggestionCategory,
        prompt: Option<String>,
        reviewer: &dyn SuggestionReviewer,
    ) -> Result<Option<String>, Error> {
        let pending = self.request_suggestion(category, prompt).await?;
        let decision = reviewer.review(category, &pending.text).await;
        Ok(self.resolve_suggestion(category, decision).await?)
    }
}
