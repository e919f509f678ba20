//! Declarative field rules for each editable step.
//!
//! Rules are plain data; [`crate::application::validator`] interprets them and
//! [`crate::application::messages`] turns violations into text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::model::options;
use super::state::FormStep;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern compiles"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// How a field's raw value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
}

/// Named formats for pattern rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// One or more ASCII digits.
    Digits,
    /// Exactly ten ASCII digits.
    Phone,
}

impl PatternKind {
    pub fn regex(&self) -> &'static Regex {
        match self {
            Self::Digits => &*DIGITS,
            Self::Phone => &*PHONE,
        }
    }
}

/// Whether `value` is a syntactically valid email address.
pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// A single constraint on a field. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MinValue(f64),
    MaxValue(f64),
    Integer,
    Pattern(PatternKind),
    Email,
    OneOf(&'static [&'static str]),
}

/// Rules for one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Wire name, matching the `ApplicationRecord` JSON field.
    pub name: &'static str,
    /// Display label used when rendering messages.
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
}

impl FieldSchema {
    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }
}

/// Rules for every field of one step.
#[derive(Debug)]
pub struct StepSchema {
    pub step: FormStep,
    pub fields: &'static [FieldSchema],
}

impl StepSchema {
    /// Look up a field by wire name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The schema for a step.
    pub fn for_step(step: FormStep) -> &'static StepSchema {
        match step {
            FormStep::PersonalInfo => &PERSONAL_INFO,
            FormStep::FamilyFinancial => &FAMILY_FINANCIAL,
            FormStep::SituationDescription => &SITUATION_DESCRIPTION,
        }
    }
}

const fn text(name: &'static str, label: &'static str, rules: &'static [Rule]) -> FieldSchema {
    FieldSchema {
        name,
        label,
        kind: FieldKind::Text,
        rules,
    }
}

const fn number(name: &'static str, label: &'static str, rules: &'static [Rule]) -> FieldSchema {
    FieldSchema {
        name,
        label,
        kind: FieldKind::Number,
        rules,
    }
}

pub static PERSONAL_INFO: StepSchema = StepSchema {
    step: FormStep::PersonalInfo,
    fields: &[
        text("name", "Full name", &[Rule::Required, Rule::MinLength(2)]),
        text(
            "nationalId",
            "National ID",
            &[Rule::Required, Rule::Pattern(PatternKind::Digits)],
        ),
        text("dateOfBirth", "Date of birth", &[Rule::Required]),
        text(
            "gender",
            "Gender",
            &[Rule::Required, Rule::OneOf(options::GENDER)],
        ),
        text("address", "Address", &[Rule::Required, Rule::MinLength(10)]),
        text("city", "City", &[Rule::Required, Rule::MinLength(2)]),
        text("state", "State", &[Rule::Required, Rule::MinLength(2)]),
        text("country", "Country", &[Rule::Required, Rule::MinLength(2)]),
        text(
            "phone",
            "Phone number",
            &[Rule::Required, Rule::Pattern(PatternKind::Phone)],
        ),
        text("email", "Email", &[Rule::Required, Rule::Email]),
    ],
};

pub static FAMILY_FINANCIAL: StepSchema = StepSchema {
    step: FormStep::FamilyFinancial,
    fields: &[
        text(
            "maritalStatus",
            "Marital status",
            &[Rule::Required, Rule::OneOf(options::MARITAL_STATUS)],
        ),
        number(
            "dependents",
            "Dependents",
            &[
                Rule::Required,
                Rule::MinValue(0.0),
                Rule::MaxValue(u32::MAX as f64),
                Rule::Integer,
            ],
        ),
        text(
            "employmentStatus",
            "Employment status",
            &[Rule::Required, Rule::OneOf(options::EMPLOYMENT_STATUS)],
        ),
        number(
            "monthlyIncome",
            "Monthly income",
            &[Rule::Required, Rule::MinValue(0.0)],
        ),
        text(
            "housingStatus",
            "Housing status",
            &[Rule::Required, Rule::OneOf(options::HOUSING_STATUS)],
        ),
    ],
};

pub static SITUATION_DESCRIPTION: StepSchema = StepSchema {
    step: FormStep::SituationDescription,
    fields: &[
        text(
            "currentFinancialSituation",
            "Current financial situation",
            &[Rule::Required, Rule::MinLength(20)],
        ),
        text(
            "employmentCircumstances",
            "Employment circumstances",
            &[Rule::Required, Rule::MinLength(20)],
        ),
        text(
            "reasonForApplying",
            "Reason for applying",
            &[Rule::Required, Rule::MinLength(20)],
        ),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::model::{ApplicationRecord, FamilyFinancialInfo};

    #[test]
    fn schema_fields_match_record_json() {
        let json = serde_json::to_value(ApplicationRecord::default()).unwrap();
        let sections = [
            (&PERSONAL_INFO, "personalInfo"),
            (&FAMILY_FINANCIAL, "familyFinancialInfo"),
            (&SITUATION_DESCRIPTION, "situationDescription"),
        ];
        for (schema, key) in sections {
            let section = json[key].as_object().unwrap();
            assert_eq!(section.len(), schema.fields.len(), "{key} field count");
            for field in schema.fields {
                assert!(section.contains_key(field.name), "{key} lacks {}", field.name);
            }
        }
    }

    #[test]
    fn numeric_fields_are_typed_as_numbers() {
        let json = serde_json::to_value(FamilyFinancialInfo::default()).unwrap();
        for field in FAMILY_FINANCIAL.fields {
            let is_number = json[field.name].is_number();
            assert_eq!(is_number, field.kind == FieldKind::Number, "{}", field.name);
        }
    }

    #[test]
    fn every_field_is_required() {
        for step in FormStep::ALL {
            for field in StepSchema::for_step(step).fields {
                assert!(field.is_required(), "{} should be required", field.name);
                assert_eq!(field.rules[0], Rule::Required);
            }
        }
    }

    #[test]
    fn field_lookup() {
        assert_eq!(PERSONAL_INFO.field("phone").unwrap().label, "Phone number");
        assert!(PERSONAL_INFO.field("dependents").is_none());
        assert_eq!(
            StepSchema::for_step(FormStep::FamilyFinancial).step,
            FormStep::FamilyFinancial
        );
    }

    #[test]
    fn patterns() {
        assert!(PatternKind::Digits.regex().is_match("0012"));
        assert!(!PatternKind::Digits.regex().is_match("12A3"));
        assert!(!PatternKind::Digits.regex().is_match(""));
        assert!(PatternKind::Phone.regex().is_match("0501234567"));
        assert!(!PatternKind::Phone.regex().is_match("050123456"));
        assert!(!PatternKind::Phone.regex().is_match("05012345678"));
    }

    #[test]
    fn email_syntax() {
        assert!(is_email("someone@example.com"));
        assert!(is_email("first.last+tag@sub.example.org"));
        assert!(is_email("user@localhost"));
        assert!(!is_email("someone@"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("no-at-sign.example.com"));
        assert!(!is_email("two@@example.com"));
        assert!(!is_email("space in@example.com"));
    }
}
