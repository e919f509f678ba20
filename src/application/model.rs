//! Application record: the validated aggregate that is persisted and submitted.
//!
//! The JSON shape of [`ApplicationRecord`] is a fixed contract: it is both the
//! local snapshot format and the submission payload.

use serde::{Deserialize, Serialize};

/// Personal details collected on the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub national_id: String,
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone: String,
    pub email: String,
}

/// Household and income details collected on the second step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyFinancialInfo {
    pub marital_status: String,
    pub dependents: u32,
    pub employment_status: String,
    pub monthly_income: f64,
    pub housing_status: String,
}

/// Free-text answers collected on the third step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationDescription {
    pub current_financial_situation: String,
    pub employment_circumstances: String,
    pub reason_for_applying: String,
}

/// The aggregate of all validated steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub personal_info: PersonalInfo,
    pub family_financial_info: FamilyFinancialInfo,
    pub situation_description: SituationDescription,
}

impl ApplicationRecord {
    /// Whether every section still holds its default value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Allowed values for the enumerated fields.
pub mod options {
    pub const GENDER: &[&str] = &["male", "female", "other"];

    pub const MARITAL_STATUS: &[&str] = &["single", "married", "divorced", "widowed", "separated"];

    pub const EMPLOYMENT_STATUS: &[&str] = &[
        "employed_full_time",
        "employed_part_time",
        "self_employed",
        "unemployed",
        "student",
        "retired",
        "homemaker",
        "freelancer",
        "other",
    ];

    pub const HOUSING_STATUS: &[&str] = &[
        "own",
        "rent",
        "living_with_family",
        "subsidized",
        "homeless",
        "temporary",
        "other",
    ];
}

/// Keys used for the two snapshot slots in the key-value store.
pub mod snapshot_keys {
    /// JSON-serialized `ApplicationRecord`.
    pub const APPLICATION_RECORD: &str = "socialSupportApplication";
    /// Stringified step index (-1..=3).
    pub const APPLICATION_STEP: &str = "socialSupportApplicationStep";
}
