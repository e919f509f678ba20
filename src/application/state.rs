//! Application state machine: which step the person is on and what they
//! have entered so far.
//!
//! [`Wizard`] is synchronous and owns no I/O. Every transition that changes
//! the record or step returns a [`Commit`] telling the caller what to
//! persist.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

use super::buffer::{FieldValue, StepBuffer};
use super::model::{ApplicationRecord, FamilyFinancialInfo};
use super::suggestion::{PendingSuggestion, ReviewDecision, SuggestionCategory};
use super::validator::{StepValidator, Validation};

/// The three editable steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    PersonalInfo,
    FamilyFinancial,
    SituationDescription,
}

impl FormStep {
    pub const ALL: [FormStep; 3] = [
        Self::PersonalInfo,
        Self::FamilyFinancial,
        Self::SituationDescription,
    ];

    pub fn index(&self) -> usize {
        match self {
            Self::PersonalInfo => 0,
            Self::FamilyFinancial => 1,
            Self::SituationDescription => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<FormStep> {
        Self::ALL.get(index).copied()
    }

    pub fn next(&self) -> Option<FormStep> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<FormStep> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl std::fmt::Display for FormStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PersonalInfo => "personal_info",
            Self::FamilyFinancial => "family_financial",
            Self::SituationDescription => "situation_description",
        };
        write!(f, "{s}")
    }
}

/// Where the person is in the application.
///
/// Progresses linearly: NotStarted → Editing(personal) → Editing(family) →
/// Editing(situation) → Reviewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    NotStarted,
    Editing(FormStep),
    Reviewing,
}

impl WizardState {
    /// Step index as stored in the snapshot: -1 landing, 0-2 editing, 3 review.
    pub fn index(&self) -> i32 {
        match self {
            Self::NotStarted => -1,
            Self::Editing(step) => step.index() as i32,
            Self::Reviewing => 3,
        }
    }

    pub fn from_index(index: i32) -> Option<WizardState> {
        match index {
            -1 => Some(Self::NotStarted),
            3 => Some(Self::Reviewing),
            n => usize::try_from(n)
                .ok()
                .and_then(FormStep::from_index)
                .map(Self::Editing),
        }
    }

    /// Check if a forward transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardState) -> bool {
        self.next() == Some(target)
    }

    /// The next state in the linear progression, if any.
    pub fn next(&self) -> Option<WizardState> {
        match self {
            Self::NotStarted => Some(Self::Editing(FormStep::PersonalInfo)),
            Self::Editing(step) => Some(step.next().map_or(Self::Reviewing, Self::Editing)),
            Self::Reviewing => None,
        }
    }

    /// Where a "back" from this state lands.
    pub fn previous(&self) -> Option<WizardState> {
        match self {
            Self::NotStarted => None,
            Self::Editing(step) => Some(step.previous().map_or(Self::NotStarted, Self::Editing)),
            Self::Reviewing => Some(Self::Editing(FormStep::SituationDescription)),
        }
    }

    /// The step whose buffer is editable in this state.
    pub fn active_step(&self) -> Option<FormStep> {
        match self {
            Self::Editing(step) => Some(*step),
            _ => None,
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl std::fmt::Display for WizardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Editing(step) => write!(f, "editing({step})"),
            Self::Reviewing => write!(f, "reviewing"),
        }
    }
}

/// What a committed transition changed, and therefore what to snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Only the step moved.
    Step,
    /// A section was merged and the step moved.
    RecordAndStep,
    /// Everything went back to defaults; snapshots should be erased.
    Reset,
}

/// The in-memory wizard.
#[derive(Debug)]
pub struct Wizard {
    state: WizardState,
    record: ApplicationRecord,
    buffers: [StepBuffer; 3],
    validator: StepValidator,
    busy: bool,
    generation: u64,
    pending: HashMap<SuggestionCategory, PendingSuggestion>,
}

fn buffers_for(record: &ApplicationRecord) -> [StepBuffer; 3] {
    FormStep::ALL.map(|step| StepBuffer::from_record(step, record))
}

impl Wizard {
    pub fn new(validator: StepValidator) -> Self {
        Self::restore(ApplicationRecord::default(), WizardState::NotStarted, validator)
    }

    /// Rebuild from a snapshot.
    ///
    /// The record is taken as-is. The state is pulled back to the first step
    /// whose section of the record does not validate, so every step behind
    /// the current one holds validated data.
    pub fn restore(record: ApplicationRecord, state: WizardState, validator: StepValidator) -> Self {
        let buffers = buffers_for(&record);
        let reached = match state {
            WizardState::NotStarted => 0,
            WizardState::Editing(step) => step.index(),
            WizardState::Reviewing => FormStep::ALL.len(),
        };
        let state = FormStep::ALL[..reached]
            .iter()
            .find(|step| !validator.validate(&buffers[step.index()]).is_valid())
            .map_or(state, |step| WizardState::Editing(*step));

        Self {
            state,
            record,
            buffers,
            validator,
            busy: false,
            generation: 0,
            pending: HashMap::new(),
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn record(&self) -> &ApplicationRecord {
        &self.record
    }

    /// True while a submission or suggestion request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Bumped by every reset; collaborator responses carry the generation
    /// they were requested under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn buffer(&self, step: FormStep) -> &StepBuffer {
        &self.buffers[step.index()]
    }

    /// The buffer bound to the current step, if editing.
    pub fn active_buffer(&self) -> Option<&StepBuffer> {
        self.state.active_step().map(|step| self.buffer(step))
    }

    pub fn pending_suggestion(&self, category: SuggestionCategory) -> Option<&PendingSuggestion> {
        self.pending.get(&category)
    }

    pub fn pending_suggestions(&self) -> impl Iterator<Item = &PendingSuggestion> {
        self.pending.values()
    }

    fn ensure_idle(&self) -> Result<(), TransitionError> {
        if self.busy {
            Err(TransitionError::Busy)
        } else {
            Ok(())
        }
    }

    fn not_allowed(&self, operation: &'static str) -> TransitionError {
        TransitionError::NotAllowed {
            operation,
            state: self.state,
        }
    }

    fn move_to(&mut self, target: WizardState) {
        if self.state == WizardState::Editing(FormStep::SituationDescription) {
            self.pending.clear();
        }
        self.state = target;
    }

    /// NotStarted → Editing(personal).
    pub fn start(&mut self) -> Result<Commit, TransitionError> {
        self.ensure_idle()?;
        if self.state != WizardState::NotStarted {
            return Err(self.not_allowed("start"));
        }
        self.move_to(WizardState::Editing(FormStep::PersonalInfo));
        Ok(Commit::Step)
    }

    /// Write one field of the active buffer.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TransitionError> {
        self.ensure_idle()?;
        let step = self
            .state
            .active_step()
            .ok_or_else(|| self.not_allowed("set_field"))?;
        self.buffers[step.index()].set_field(name, value)
    }

    /// Write several fields of the active buffer. Nothing is written unless
    /// every name belongs to the step.
    pub fn set_fields(
        &mut self,
        values: impl IntoIterator<Item = (String, FieldValue)>,
    ) -> Result<(), TransitionError> {
        self.ensure_idle()?;
        let step = self
            .state
            .active_step()
            .ok_or_else(|| self.not_allowed("set_field"))?;
        let values: Vec<_> = values.into_iter().collect();
        let buffer = &mut self.buffers[step.index()];
        let schema = buffer.schema();
        if let Some((name, _)) = values.iter().find(|(name, _)| schema.field(name).is_none()) {
            return Err(TransitionError::UnknownField {
                step,
                field: name.clone(),
            });
        }
        for (name, value) in values {
            buffer.set_field(&name, value)?;
        }
        Ok(())
    }

    /// Validate the active buffer without transitioning.
    pub fn validate_current_step(&self) -> Validation {
        match self.active_buffer() {
            Some(buffer) => self.validator.validate(buffer),
            None => Validation::Valid,
        }
    }

    /// Validate the active buffer and, if it passes, merge it and move on.
    ///
    /// On failure nothing changes and the field errors are returned.
    pub fn advance(&mut self) -> Result<Commit, TransitionError> {
        self.ensure_idle()?;
        let step = self
            .state
            .active_step()
            .ok_or_else(|| self.not_allowed("advance"))?;
        let buffer = &self.buffers[step.index()];
        if let Validation::Invalid(errors) = self.validator.validate(buffer) {
            return Err(TransitionError::Validation(errors));
        }
        buffer.merge_into(&mut self.record);

        let next = step.next().map_or(WizardState::Reviewing, WizardState::Editing);
        debug_assert!(self.state.can_transition_to(next));
        self.move_to(next);
        Ok(Commit::RecordAndStep)
    }

    /// Go back one step. Buffers keep their contents. Back from the first
    /// step is a full reset.
    pub fn retreat(&mut self) -> Result<Commit, TransitionError> {
        self.ensure_idle()?;
        match self.state.previous() {
            None => Err(self.not_allowed("retreat")),
            Some(WizardState::NotStarted) => Ok(self.reset()),
            Some(target) => {
                self.move_to(target);
                Ok(Commit::Step)
            }
        }
    }

    /// Back to defaults from any state. Always allowed, even while busy;
    /// in-flight responses become stale.
    pub fn reset(&mut self) -> Commit {
        self.state = WizardState::NotStarted;
        self.record = ApplicationRecord::default();
        self.buffers = buffers_for(&self.record);
        self.busy = false;
        self.generation += 1;
        self.pending.clear();
        Commit::Reset
    }

    /// Mark a submission as outstanding and hand out the record to send.
    pub fn begin_submit(&mut self) -> Result<(ApplicationRecord, u64), TransitionError> {
        self.ensure_idle()?;
        if self.state != WizardState::Reviewing {
            return Err(self.not_allowed("submit"));
        }
        self.busy = true;
        Ok((self.record.clone(), self.generation))
    }

    /// Mark a suggestion request as outstanding and hand out the household
    /// section the prompt is built from.
    pub fn begin_suggestion(&mut self) -> Result<(FamilyFinancialInfo, u64), TransitionError> {
        self.ensure_idle()?;
        if self.state != WizardState::Editing(FormStep::SituationDescription) {
            return Err(self.not_allowed("suggest"));
        }
        self.busy = true;
        Ok((self.record.family_financial_info.clone(), self.generation))
    }

    /// Clear the busy flag for a finished request.
    ///
    /// Returns `false` when the request belongs to an older generation; its
    /// result must then be ignored.
    pub fn settle(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.busy = false;
        true
    }

    /// Keep a suggestion for review. Replaces any earlier one for the same
    /// category. Stale suggestions are dropped.
    pub fn hold_suggestion(&mut self, suggestion: PendingSuggestion) -> bool {
        if suggestion.generation != self.generation
            || self.state != WizardState::Editing(FormStep::SituationDescription)
        {
            return false;
        }
        self.pending.insert(suggestion.category, suggestion);
        true
    }

    /// Apply the person's decision on a held suggestion.
    ///
    /// Accepted or edited text overwrites the category's field in the
    /// situation buffer. Returns the text written, if any.
    pub fn resolve_suggestion(
        &mut self,
        category: SuggestionCategory,
        decision: &ReviewDecision,
    ) -> Result<Option<String>, TransitionError> {
        self.ensure_idle()?;
        self.pending
            .remove(&category)
            .ok_or(TransitionError::NoPendingSuggestion { category })?;

        let Some(text) = decision.text() else {
            return Ok(None);
        };
        self.buffers[FormStep::SituationDescription.index()].set_field(category.field(), text)?;
        Ok(Some(text.to_string()))
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(StepValidator::default())
    }
}
