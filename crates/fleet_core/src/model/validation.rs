//! Declarative field validation.
//!
//! # Responsibility
//! - Describe per-entity field constraints as static rule tables.
//! - Evaluate every rule and aggregate all violations into one error.
//!
//! # Invariants
//! - Rule tables are `const` data; evaluating them never touches storage.
//! - `validate()` reports every violated rule, in table order.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One field-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Text must be present and contain a non-whitespace character.
    NotBlank,
    /// Amount must be strictly greater than zero.
    Positive,
    /// Amount must stay strictly greater than zero once rounded half away
    /// from zero to the given number of decimal places.
    PositiveAtScale(u32),
    /// Amount must be zero or greater.
    NonNegative,
    /// Date must not be earlier than the named date field.
    NotBefore(&'static str),
}

/// Rule bound to a field name plus the message reported on violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub rule: Rule,
    pub message: &'static str,
}

impl FieldRule {
    pub const fn new(field: &'static str, rule: Rule, message: &'static str) -> Self {
        Self {
            field,
            rule,
            message,
        }
    }
}

/// Field value as seen by the rule evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Amount(Option<Decimal>),
    Date(Option<NaiveDate>),
    /// The type does not expose a field with the requested name.
    Unknown,
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// Aggregated validation failure.
///
/// Also used for cross-entity failures (missing referenced parent, taken
/// registration number) so callers handle every "input rejected" case the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    /// Builds an error holding a single violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// Builds an error from collected violations, or `None` when empty.
    pub fn from_violations(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns whether any violation targets `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let details = self
            .violations
            .iter()
            .map(|violation| format!("{}: {}", violation.field, violation.message))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "validation failed: {details}")
    }
}

impl Error for ValidationError {}

/// Types with a static rule table.
pub trait Validate {
    /// Rules evaluated by [`Validate::validate`].
    const RULES: &'static [FieldRule];

    /// Exposes a field by name for rule evaluation.
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Evaluates every rule in [`Validate::RULES`].
    ///
    /// # Errors
    /// - Returns one [`ValidationError`] listing every violated rule.
    fn validate(&self) -> Result<(), ValidationError> {
        let violations = Self::RULES
            .iter()
            .filter(|rule| !rule_holds(rule.rule, self.field(rule.field), |name| self.field(name)))
            .map(|rule| Violation {
                field: rule.field.to_string(),
                message: rule.message.to_string(),
            })
            .collect();

        match ValidationError::from_violations(violations) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn rule_holds<'a>(
    rule: Rule,
    value: FieldValue<'a>,
    lookup: impl Fn(&str) -> FieldValue<'a>,
) -> bool {
    match (rule, value) {
        (Rule::NotBlank, FieldValue::Text(text)) => {
            text.is_some_and(|text| !text.trim().is_empty())
        }
        (Rule::Positive, FieldValue::Amount(amount)) => {
            amount.is_some_and(|amount| amount > Decimal::ZERO)
        }
        (Rule::PositiveAtScale(scale), FieldValue::Amount(amount)) => {
            amount.is_some_and(|amount| {
                amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
                    > Decimal::ZERO
            })
        }
        (Rule::NonNegative, FieldValue::Amount(amount)) => {
            amount.is_some_and(|amount| amount >= Decimal::ZERO)
        }
        (Rule::NotBefore(other), FieldValue::Date(date)) => match (date, lookup(other)) {
            (Some(date), FieldValue::Date(Some(earliest))) => date >= earliest,
            // Missing dates are reported by their own rules.
            (_, FieldValue::Date(_)) => true,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldRule, FieldValue, Rule, Validate, ValidationError};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    struct Sample {
        name: String,
        amount: Decimal,
        from: NaiveDate,
        to: NaiveDate,
    }

    impl Validate for Sample {
        const RULES: &'static [FieldRule] = &[
            FieldRule::new("name", Rule::NotBlank, "Name is required"),
            FieldRule::new("amount", Rule::Positive, "Amount must be positive"),
            FieldRule::new("to", Rule::NotBefore("from"), "To must not precede from"),
        ];

        fn field(&self, name: &str) -> FieldValue<'_> {
            match name {
                "name" => FieldValue::Text(Some(self.name.as_str())),
                "amount" => FieldValue::Amount(Some(self.amount)),
                "from" => FieldValue::Date(Some(self.from)),
                "to" => FieldValue::Date(Some(self.to)),
                _ => FieldValue::Unknown,
            }
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn valid_sample_passes() {
        let sample = Sample {
            name: "ok".to_string(),
            amount: Decimal::new(1, 2),
            from: date(10),
            to: date(10),
        };
        assert!(sample.validate().is_ok());
    }

    #[test]
    fn every_violation_is_reported_in_rule_order() {
        let sample = Sample {
            name: "   ".to_string(),
            amount: Decimal::ZERO,
            from: date(11),
            to: date(10),
        };
        let err = sample.validate().unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "amount", "to"]);
        assert_eq!(
            err.to_string(),
            "validation failed: name: Name is required, amount: Amount must be positive, \
             to: To must not precede from"
        );
    }

    #[test]
    fn non_negative_accepts_zero() {
        struct Balance(Decimal);
        impl Validate for Balance {
            const RULES: &'static [FieldRule] =
                &[FieldRule::new("balance", Rule::NonNegative, "negative")];
            fn field(&self, _name: &str) -> FieldValue<'_> {
                FieldValue::Amount(Some(self.0))
            }
        }

        assert!(Balance(Decimal::ZERO).validate().is_ok());
        assert!(Balance(Decimal::new(-1, 2)).validate().is_err());
    }

    #[test]
    fn positive_at_scale_checks_the_rounded_amount() {
        struct Price(Decimal);
        impl Validate for Price {
            const RULES: &'static [FieldRule] =
                &[FieldRule::new("price", Rule::PositiveAtScale(2), "too small")];
            fn field(&self, _name: &str) -> FieldValue<'_> {
                FieldValue::Amount(Some(self.0))
            }
        }

        assert!(Price(Decimal::new(4, 3)).validate().is_err());
        assert!(Price(Decimal::new(5, 3)).validate().is_ok());
        assert!(Price(Decimal::new(1, 2)).validate().is_ok());
        assert!(Price(Decimal::new(-1, 2)).validate().is_err());
    }

    #[test]
    fn unknown_field_counts_as_violation() {
        struct Broken;
        impl Validate for Broken {
            const RULES: &'static [FieldRule] =
                &[FieldRule::new("missing", Rule::NotBlank, "required")];
            fn field(&self, _name: &str) -> FieldValue<'_> {
                FieldValue::Unknown
            }
        }

        let err = Broken.validate().unwrap_err();
        assert!(err.has_field("missing"));
    }

    #[test]
    fn empty_violation_list_builds_no_error() {
        assert!(ValidationError::from_violations(Vec::new()).is_none());
    }
}
