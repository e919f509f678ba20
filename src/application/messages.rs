//! Human-readable rendering of validation violations.

use super::schema::{FieldSchema, PatternKind};
use super::validator::Violation;

/// Turns a structured violation into display text.
///
/// Swap implementations to localize messages without touching the rules.
pub trait MessageCatalog: Send + Sync {
    fn render(&self, field: &FieldSchema, violation: &Violation) -> String;
}

/// Default English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

impl MessageCatalog for EnglishMessages {
    fn render(&self, field: &FieldSchema, violation: &Violation) -> String {
        let label = field.label;
        match violation {
            Violation::Required => format!("{label} is required"),
            Violation::NotANumber => format!("{label} must be a number"),
            Violation::MinLength { min } => format!("{label}: min {min} chars"),
            Violation::MinValue { min } => format!("{label}: min value {min}"),
            Violation::MaxValue { max } => format!("{label}: max value {max}"),
            Violation::Integer => format!("{label} must be integer"),
            Violation::Pattern {
                pattern: PatternKind::Digits,
            } => format!("{label} must contain digits only"),
            Violation::Pattern {
                pattern: PatternKind::Phone,
            } => format!("{label} must be exactly 10 digits"),
            Violation::Email => format!("{label} must be a valid email address"),
            Violation::OneOf { options } => {
                format!("{label} must be one of: {}", options.join(", "))
            }
        }
    }
}
