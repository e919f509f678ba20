//! Step validator: interprets a [`StepSchema`] against a buffer.
//!
//! Validation is pure: it never touches the buffer and can be called any
//! number of times. Every field is checked; within one field the first
//! failing rule wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::buffer::{FieldValue, StepBuffer};
use super::messages::{EnglishMessages, MessageCatalog};
use super::schema::{FieldKind, FieldSchema, PatternKind, Rule, StepSchema, is_email};

/// Which rule a field broke, with the bound values it was checked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Required,
    NotANumber,
    MinLength { min: usize },
    MinValue { min: f64 },
    MaxValue { max: f64 },
    Integer,
    Pattern { pattern: PatternKind },
    Email,
    OneOf { options: &'static [&'static str] },
}

/// One field's failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub violation: Violation,
    pub message: String,
}

/// Field name → error, for every failing field of a step.
pub type FieldErrors = BTreeMap<String, FieldError>;

/// Outcome of validating one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid,
    Invalid(FieldErrors),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Valid => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}

/// Check one field value against its rules.
///
/// Returns the first violation in rule order, or `None` when the value
/// passes. A missing or blank value on a field without `Required` passes.
pub fn check_field(field: &FieldSchema, value: Option<&FieldValue>) -> Option<Violation> {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ => {
            return field.is_required().then_some(Violation::Required);
        }
    };

    let text = value.as_text();
    let number = match field.kind {
        FieldKind::Number => match value.as_number() {
            Some(n) => Some(n),
            None => return Some(Violation::NotANumber),
        },
        FieldKind::Text => None,
    };

    field.rules.iter().find_map(|rule| match (*rule, number) {
        (Rule::Required, _) => None,
        (Rule::MinLength(min), None) => (text.chars().count() < min).then_some(Violation::MinLength { min }),
        (Rule::MinValue(min), Some(n)) => (n < min).then_some(Violation::MinValue { min }),
        (Rule::MaxValue(max), Some(n)) => (n > max).then_some(Violation::MaxValue { max }),
        (Rule::Integer, Some(n)) => (n.fract() != 0.0).then_some(Violation::Integer),
        (Rule::Pattern(pattern), None) => {
            (!pattern.regex().is_match(&text)).then_some(Violation::Pattern { pattern })
        }
        (Rule::Email, None) => (!is_email(&text)).then_some(Violation::Email),
        (Rule::OneOf(options), None) => {
            (!options.iter().any(|o| *o == text)).then_some(Violation::OneOf { options })
        }
        // Text rules on numeric fields and numeric rules on text fields do not apply.
        _ => None,
    })
}

/// Runs step schemas and renders messages through a [`MessageCatalog`].
#[derive(Clone)]
pub struct StepValidator {
    catalog: Arc<dyn MessageCatalog>,
}

impl StepValidator {
    pub fn new(catalog: Arc<dyn MessageCatalog>) -> Self {
        Self { catalog }
    }

    /// Validate a buffer against its step's schema.
    pub fn validate(&self, buffer: &StepBuffer) -> Validation {
        self.validate_values(buffer.schema(), buffer.values())
    }

    /// Validate raw values against a schema.
    pub fn validate_values(
        &self,
        schema: &StepSchema,
        values: &BTreeMap<String, FieldValue>,
    ) -> Validation {
        let errors: FieldErrors = schema
            .fields
            .iter()
            .filter_map(|field| {
                let violation = check_field(field, values.get(field.name))?;
                let message = self.catalog.render(field, &violation);
                Some((
                    field.name.to_string(),
                    FieldError {
                        field: field.name,
                        violation,
                        message,
                    },
                ))
            })
            .collect();

        if errors.is_empty() {
            Validation::Valid
        } else {
            debug!(
                step = %schema.step,
                failing = errors.len(),
                fields = ?errors.keys().collect::<Vec<_>>(),
                "Step validation failed"
            );
            Validation::Invalid(errors)
        }
    }
}

impl Default for StepValidator {
    fn default() -> Self {
        Self::new(Arc::new(EnglishMessages))
    }
}

impl std::fmt::Debug for StepValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::state::FormStep;

    fn valid_personal() -> StepBuffer {
        let mut b = StepBuffer::empty(FormStep::PersonalInfo);
        b.set_field("name", "Mariam Haddad").unwrap();
        b.set_field("nationalId", "784199012345").unwrap();
        b.set_field("dateOfBirth", "1990-04-12").unwrap();
        b.set_field("gender", "female").unwrap();
        b.set_field("address", "Building 4, Street 12").unwrap();
        b.set_field("city", "Dubai").unwrap();
        b.set_field("state", "Dubai").unwrap();
        b.set_field("country", "UAE").unwrap();
        b.set_field("phone", "0501234567").unwrap();
        b.set_field("email", "mariam@example.com").unwrap();
        b
    }

    fn valid_family() -> StepBuffer {
        let mut b = StepBuffer::empty(FormStep::FamilyFinancial);
        b.set_field("maritalStatus", "married").unwrap();
        b.set_field("dependents", 2u32).unwrap();
        b.set_field("employmentStatus", "unemployed").unwrap();
        b.set_field("monthlyIncome", 0.0).unwrap();
        b.set_field("housingStatus", "rent").unwrap();
        b
    }

    fn valid_situation() -> StepBuffer {
        let mut b = StepBuffer::empty(FormStep::SituationDescription);
        b.set_field("currentFinancialSituation", "x".repeat(20)).unwrap();
        b.set_field("employmentCircumstances", "Lost my job in March this year.").unwrap();
        b.set_field("reasonForApplying", "Need help covering rent and food.").unwrap();
        b
    }

    fn only_error(validation: &Validation) -> (&String, &FieldError) {
        let errors = validation.errors().expect("expected Invalid");
        assert_eq!(errors.len(), 1, "errors: {errors:?}");
        errors.iter().next().unwrap()
    }

    #[test]
    fn valid_buffers_pass() {
        let v = StepValidator::default();
        assert_eq!(v.validate(&valid_personal()), Validation::Valid);
        assert_eq!(v.validate(&valid_family()), Validation::Valid);
        assert_eq!(v.validate(&valid_situation()), Validation::Valid);
    }

    #[test]
    fn default_buffers_fail_every_text_field() {
        let v = StepValidator::default();
        let personal = v.validate(&StepBuffer::empty(FormStep::PersonalInfo));
        let errors = personal.errors().unwrap();
        assert_eq!(errors.len(), 10);
        assert!(errors.values().all(|e| e.violation == Violation::Required));

        // Zero is a valid number; only the three enumerations are missing.
        let family = v.validate(&StepBuffer::empty(FormStep::FamilyFinancial));
        let errors = family.errors().unwrap();
        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["employmentStatus", "housingStatus", "maritalStatus"]
        );
    }

    #[test]
    fn each_personal_violation_in_isolation() {
        let v = StepValidator::default();
        let cases: &[(&str, &str, Violation)] = &[
            ("name", "J", Violation::MinLength { min: 2 }),
            ("name", "", Violation::Required),
            (
                "nationalId",
                "12A3",
                Violation::Pattern {
                    pattern: PatternKind::Digits,
                },
            ),
            ("dateOfBirth", "", Violation::Required),
            (
                "gender",
                "unknown",
                Violation::OneOf {
                    options: crate::application::model::options::GENDER,
                },
            ),
            ("address", "Short st", Violation::MinLength { min: 10 }),
            ("city", "D", Violation::MinLength { min: 2 }),
            ("state", "D", Violation::MinLength { min: 2 }),
            ("country", "U", Violation::MinLength { min: 2 }),
            (
                "phone",
                "05012345",
                Violation::Pattern {
                    pattern: PatternKind::Phone,
                },
            ),
            ("email", "mariam@", Violation::Email),
        ];

        for (field, value, expected) in cases {
            let mut buffer = valid_personal();
            buffer.set_field(field, *value).unwrap();
            let result = v.validate(&buffer);
            let (name, error) = only_error(&result);
            assert_eq!(name, field);
            assert_eq!(&error.violation, expected, "field {field}");
        }
    }

    #[test]
    fn name_and_national_id_fail_together() {
        let v = StepValidator::default();
        let mut buffer = valid_personal();
        buffer.set_field("name", "J").unwrap();
        buffer.set_field("nationalId", "12A3").unwrap();

        let result = v.validate(&buffer);
        let errors = result.errors().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors["name"].message.contains("min 2 chars"));
        assert!(errors["nationalId"].message.contains("digits only"));
    }

    #[test]
    fn two_character_name_passes() {
        let v = StepValidator::default();
        let mut buffer = valid_personal();
        buffer.set_field("name", "Jo").unwrap();
        assert!(v.validate(&buffer).is_valid());
    }

    #[test]
    fn dependents_bounds_and_integrality() {
        let v = StepValidator::default();

        let mut buffer = valid_family();
        buffer.set_field("dependents", -1i64).unwrap();
        let result = v.validate(&buffer);
        let (_, error) = only_error(&result);
        assert_eq!(error.violation, Violation::MinValue { min: 0.0 });
        assert!(error.message.contains("min value 0"));

        buffer.set_field("dependents", 2.5).unwrap();
        let result = v.validate(&buffer);
        let (_, error) = only_error(&result);
        assert_eq!(error.violation, Violation::Integer);
        assert!(error.message.contains("must be integer"));

        // Min value is checked before integrality.
        buffer.set_field("dependents", -1.5).unwrap();
        let result = v.validate(&buffer);
        assert_eq!(only_error(&result).1.violation, Violation::MinValue { min: 0.0 });

        // Counts beyond the record's integer range are refused.
        buffer.set_field("dependents", 5_000_000_000.0).unwrap();
        let result = v.validate(&buffer);
        let (_, error) = only_error(&result);
        assert_eq!(error.violation, Violation::MaxValue { max: 4_294_967_295.0 });
        assert!(error.message.contains("max value 4294967295"));

        buffer.set_field("dependents", 4_294_967_295.0).unwrap();
        assert!(v.validate(&buffer).is_valid());
    }

    #[test]
    fn numeric_text_is_parsed() {
        let v = StepValidator::default();
        let mut buffer = valid_family();
        buffer.set_field("monthlyIncome", "1520.75").unwrap();
        buffer.set_field("dependents", "3").unwrap();
        assert!(v.validate(&buffer).is_valid());

        buffer.set_field("monthlyIncome", "lots").unwrap();
        let result = v.validate(&buffer);
        let (name, error) = only_error(&result);
        assert_eq!(name, "monthlyIncome");
        assert_eq!(error.violation, Violation::NotANumber);

        buffer.set_field("monthlyIncome", "").unwrap();
        let result = v.validate(&buffer);
        assert_eq!(only_error(&result).1.violation, Violation::Required);

        buffer.set_field("monthlyIncome", -0.01).unwrap();
        let result = v.validate(&buffer);
        assert_eq!(only_error(&result).1.violation, Violation::MinValue { min: 0.0 });
    }

    #[test]
    fn situation_minimum_length_boundary() {
        let v = StepValidator::default();
        let mut buffer = valid_situation();

        buffer.set_field("reasonForApplying", "a".repeat(19)).unwrap();
        let result = v.validate(&buffer);
        let (name, error) = only_error(&result);
        assert_eq!(name, "reasonForApplying");
        assert!(error.message.contains("min 20 chars"));

        buffer.set_field("reasonForApplying", "a".repeat(20)).unwrap();
        assert!(v.validate(&buffer).is_valid());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let v = StepValidator::default();
        let mut buffer = valid_situation();
        // 20 two-byte characters.
        buffer.set_field("employmentCircumstances", "é".repeat(20)).unwrap();
        assert!(v.validate(&buffer).is_valid());
    }

    #[test]
    fn validation_is_repeatable_and_leaves_buffer_untouched() {
        let v = StepValidator::default();
        let mut buffer = valid_personal();
        buffer.set_field("phone", "123").unwrap();
        let before = buffer.clone();

        let first = v.validate(&buffer);
        let second = v.validate(&buffer);
        assert_eq!(first, second);
        assert_eq!(buffer, before);
    }

    #[test]
    fn custom_catalog_is_used() {
        struct Codes;
        impl MessageCatalog for Codes {
            fn render(&self, field: &FieldSchema, _violation: &Violation) -> String {
                format!("err.{}", field.name)
            }
        }

        let v = StepValidator::new(Arc::new(Codes));
        let result = v.validate(&StepBuffer::empty(FormStep::SituationDescription));
        let errors = result.errors().unwrap();
        assert_eq!(errors["reasonForApplying"].message, "err.reasonForApplying");
    }

    #[test]
    fn optional_fields_skip_rules_when_blank() {
        static OPTIONAL: FieldSchema = FieldSchema {
            name: "nickname",
            label: "Nickname",
            kind: FieldKind::Text,
            rules: &[Rule::MinLength(3)],
        };
        assert_eq!(check_field(&OPTIONAL, None), None);
        assert_eq!(check_field(&OPTIONAL, Some(&FieldValue::from(""))), None);
        assert_eq!(
            check_field(&OPTIONAL, Some(&FieldValue::from("ab"))),
            Some(Violation::MinLength { min: 3 })
        );
    }

    #[test]
    fn max_value_rule() {
        static CAPPED: FieldSchema = FieldSchema {
            name: "age",
            label: "Age",
            kind: FieldKind::Number,
            rules: &[Rule::Required, Rule::MaxValue(120.0)],
        };
        assert_eq!(check_field(&CAPPED, Some(&FieldValue::from(120.0))), None);
        assert_eq!(
            check_field(&CAPPED, Some(&FieldValue::from(121.0))),
            Some(Violation::MaxValue { max: 120.0 })
        );
    }
}
