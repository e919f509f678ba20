//! AI-assisted text for the situation-description step.
//!
//! A suggestion is requested for one of three free-text fields, held until
//! the person reviews it, then applied to the situation buffer or dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::model::FamilyFinancialInfo;

/// The three free-text fields a suggestion can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionCategory {
    CurrentFinancialSituation,
    EmploymentCircumstances,
    ReasonForApplying,
}

impl SuggestionCategory {
    pub const ALL: [SuggestionCategory; 3] = [
        Self::CurrentFinancialSituation,
        Self::EmploymentCircumstances,
        Self::ReasonForApplying,
    ];

    /// Wire name of the situation field this category writes to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::CurrentFinancialSituation => "currentFinancialSituation",
            Self::EmploymentCircumstances => "employmentCircumstances",
            Self::ReasonForApplying => "reasonForApplying",
        }
    }

    /// Inverse of [`field`](Self::field).
    pub fn from_field(name: &str) -> Option<SuggestionCategory> {
        Self::ALL.into_iter().find(|c| c.field() == name)
    }

    /// Instruction given to the text model for this category.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::CurrentFinancialSituation => {
                "You help users describe their current financial hardship for aid or support forms. \
                 Respond with one respectful, empathetic sentence between 30-200 characters."
            }
            Self::EmploymentCircumstances => {
                "You help users describe their employment circumstances or challenges for aid forms. \
                 Respond with one clear, concise, and respectful sentence between 30-200 characters."
            }
            Self::ReasonForApplying => {
                "You help users describe their reason for applying for social support. \
                 Respond with one respectful and concise sentence between 30-200 characters."
            }
        }
    }

    fn ask(&self) -> &'static str {
        match self {
            Self::CurrentFinancialSituation => "help me describe my current financial situation.",
            Self::EmploymentCircumstances => "help me describe my employment circumstances.",
            Self::ReasonForApplying => "help me describe my reason for applying for social support.",
        }
    }

    /// Default user prompt, built from the household section of the record.
    pub fn prompt(&self, household: &FamilyFinancialInfo) -> String {
        format!(
            "{} I am {}, have {} dependents, housing status is {}, employment is {} and my total monthly income is {}.",
            self.ask(),
            household.marital_status,
            household.dependents,
            household.housing_status,
            household.employment_status,
            household.monthly_income,
        )
    }
}

impl std::fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// A suggestion waiting for the person's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSuggestion {
    pub category: SuggestionCategory,
    pub text: String,
    /// Wizard generation the suggestion was produced for.
    #[serde(skip)]
    pub generation: u64,
}

/// The person's decision on a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "text", rename_all = "snake_case")]
pub enum ReviewDecision {
    Accepted(String),
    Edited(String),
    Rejected,
}

impl ReviewDecision {
    /// Text to write into the field, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Accepted(text) | Self::Edited(text) => Some(text.as_str()),
            Self::Rejected => None,
        }
    }
}

/// The confirmation dialog: shows a suggestion and reports the decision.
#[async_trait]
pub trait SuggestionReviewer: Send + Sync {
    async fn review(&self, category: SuggestionCategory, suggestion: &str) -> ReviewDecision;
}
