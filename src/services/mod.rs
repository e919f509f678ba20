//! External collaborators consumed by the application manager.

pub mod registration;
pub mod response;
pub mod suggestion;

pub use registration::{HttpRegistrationService, RegistrationService, SimulatedRegistrationService};
pub use response::ServiceResponse;
pub use suggestion::{
    OpenAiSuggestionService, SuggestionConfig, SuggestionService, UnconfiguredSuggestionService,
};
