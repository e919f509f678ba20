//! Application wizard: the step-by-step social-support application.
//!
//! The person moves through three editable steps (personal details,
//! household finances, situation description) and a review step. Each step
//! is validated before its data is folded into the [`ApplicationRecord`];
//! the record and current step are snapshotted after every committed
//! transition so an interrupted application can be resumed.

pub mod buffer;
pub mod manager;
pub mod messages;
pub mod model;
pub mod routes;
pub mod schema;
pub mod snapshot;
pub mod state;
pub mod suggestion;
pub mod validator;

pub use buffer::{FieldValue, StepBuffer};
pub use manager::{ApplicationManager, ApplicationStatus, SubmissionReceipt};
pub use messages::{EnglishMessages, MessageCatalog};
pub use model::{ApplicationRecord, FamilyFinancialInfo, PersonalInfo, SituationDescription};
pub use routes::{ApplicationRouteState, application_routes};
pub use state::{Commit, FormStep, Wizard, WizardState};
pub use suggestion::{PendingSuggestion, ReviewDecision, SuggestionCategory, SuggestionReviewer};
pub use validator::{FieldError, FieldErrors, StepValidator, Validation, Violation};
