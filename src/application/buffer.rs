//! Per-step working copies of field values.
//!
//! A buffer holds whatever the person has typed so far, valid or not. It is
//! folded into the [`ApplicationRecord`] only after the step validates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

use super::model::{ApplicationRecord, FamilyFinancialInfo, PersonalInfo, SituationDescription};
use super::schema::StepSchema;
use super::state::FormStep;

/// A raw field value as entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Textual form. Numbers render without a trailing `.0`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }

    /// Numeric form, parsing text when needed. `None` for blank,
    /// unparseable, or non-finite input.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }

    /// Whether the value counts as "not provided".
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// Editable field values for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepBuffer {
    step: FormStep,
    values: BTreeMap<String, FieldValue>,
}

impl StepBuffer {
    /// A buffer seeded from the record's section for `step`.
    pub fn from_record(step: FormStep, record: &ApplicationRecord) -> Self {
        let mut values = BTreeMap::new();
        let mut put = |name: &str, value: FieldValue| {
            values.insert(name.to_string(), value);
        };

        match step {
            FormStep::PersonalInfo => {
                let p = &record.personal_info;
                put("name", p.name.as_str().into());
                put("nationalId", p.national_id.as_str().into());
                put("dateOfBirth", p.date_of_birth.as_str().into());
                put("gender", p.gender.as_str().into());
                put("address", p.address.as_str().into());
                put("city", p.city.as_str().into());
                put("state", p.state.as_str().into());
                put("country", p.country.as_str().into());
                put("phone", p.phone.as_str().into());
                put("email", p.email.as_str().into());
            }
            FormStep::FamilyFinancial => {
                let f = &record.family_financial_info;
                put("maritalStatus", f.marital_status.as_str().into());
                put("dependents", f.dependents.into());
                put("employmentStatus", f.employment_status.as_str().into());
                put("monthlyIncome", f.monthly_income.into());
                put("housingStatus", f.housing_status.as_str().into());
            }
            FormStep::SituationDescription => {
                let s = &record.situation_description;
                put(
                    "currentFinancialSituation",
                    s.current_financial_situation.as_str().into(),
                );
                put(
                    "employmentCircumstances",
                    s.employment_circumstances.as_str().into(),
                );
                put("reasonForApplying", s.reason_for_applying.as_str().into());
            }
        }

        Self { step, values }
    }

    /// A buffer holding default values.
    pub fn empty(step: FormStep) -> Self {
        Self::from_record(step, &ApplicationRecord::default())
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn schema(&self) -> &'static StepSchema {
        StepSchema::for_step(self.step)
    }

    /// Overwrite one field. Names outside the step's schema are rejected.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TransitionError> {
        let field = self
            .schema()
            .field(name)
            .ok_or_else(|| TransitionError::UnknownField {
                step: self.step,
                field: name.to_string(),
            })?;
        self.values.insert(field.name.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Every field value, keyed by wire name.
    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    fn text(&self, name: &str) -> String {
        self.values
            .get(name)
            .map(FieldValue::as_text)
            .unwrap_or_default()
    }

    fn number(&self, name: &str) -> f64 {
        self.values
            .get(name)
            .and_then(FieldValue::as_number)
            .unwrap_or_default()
    }

    /// Replace the record's section for this step with the buffer contents.
    ///
    /// Callers validate first; numeric conversion assumes the values passed
    /// their rules.
    pub fn merge_into(&self, record: &mut ApplicationRecord) {
        match self.step {
            FormStep::PersonalInfo => {
                record.personal_info = PersonalInfo {
                    name: self.text("name"),
                    national_id: self.text("nationalId"),
                    date_of_birth: self.text("dateOfBirth"),
                    gender: self.text("gender"),
                    address: self.text("address"),
                    city: self.text("city"),
                    state: self.text("state"),
                    country: self.text("country"),
                    phone: self.text("phone"),
                    email: self.text("email"),
                };
            }
            FormStep::FamilyFinancial => {
                record.family_financial_info = FamilyFinancialInfo {
                    marital_status: self.text("maritalStatus"),
                    dependents: self.number("dependents") as u32,
                    employment_status: self.text("employmentStatus"),
                    monthly_income: self.number("monthlyIncome"),
                    housing_status: self.text("housingStatus"),
                };
            }
            FormStep::SituationDescription => {
                record.situation_description = SituationDescription {
                    current_financial_situation: self.text("currentFinancialSituation"),
                    employment_circumstances: self.text("employmentCircumstances"),
                    reason_for_applying: self.text("reasonForApplying"),
                };
            }
        }
    }
}
