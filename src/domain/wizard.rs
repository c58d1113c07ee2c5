//! Step wizard
//!
//! A wizard walks a fixed, ordered list of stages. Moving forward requires the
//! current stage's field rules to hold; moving back is always allowed. Field
//! values are kept per stage and live only as long as the wizard.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// An ordered, finite set of wizard stages.
///
/// `ORDER` must be non-empty; its first entry is where every wizard starts.
pub trait Stage: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    const ORDER: &'static [Self];

    /// Rules checked before leaving this stage forward.
    fn rules(self) -> &'static [FieldRule];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRule {
    Required(&'static str),
    Email(&'static str),
    /// Digit count after removing spaces and dashes.
    Digits { field: &'static str, min: usize, max: usize },
    /// Character count of the trimmed value.
    Length { field: &'static str, min: usize, max: usize },
    /// Must equal another field of the same stage.
    Matches { field: &'static str, other: &'static str },
}

impl FieldRule {
    pub fn field(&self) -> &'static str {
        match *self {
            Self::Required(field) | Self::Email(field) => field,
            Self::Digits { field, .. } | Self::Length { field, .. } | Self::Matches { field, .. } => field,
        }
    }

    fn check(&self, values: &BTreeMap<String, String>) -> Option<Violation> {
        let value = values.get(self.field()).map(|v| v.trim()).unwrap_or_default();
        match *self {
            Self::Required(_) if value.is_empty() => Some(Violation::Missing),
            Self::Required(_) => None,
            Self::Email(_) if value.is_empty() => Some(Violation::Missing),
            Self::Email(_) => (!validator::validate_email(value)).then_some(Violation::InvalidEmail),
            Self::Digits { min, max, .. } => {
                if value.is_empty() { return Some(Violation::Missing); }
                let digits: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
                let ok = digits.chars().all(|c| c.is_ascii_digit()) && (min..=max).contains(&digits.len());
                (!ok).then_some(Violation::Digits { min, max })
            }
            Self::Length { min, max, .. } => {
                if value.is_empty() { return Some(Violation::Missing); }
                (!(min..=max).contains(&value.chars().count())).then_some(Violation::Length { min, max })
            }
            Self::Matches { other, .. } => {
                let expected = values.get(other).map(|v| v.trim()).unwrap_or_default();
                (value != expected).then_some(Violation::Mismatch { other })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Error)]
pub enum Violation {
    #[error("is required")]
    Missing,
    #[error("is not a valid e-mail address")]
    InvalidEmail,
    #[error("must have {min} to {max} digits")]
    Digits { min: usize, max: usize },
    #[error("must be {min} to {max} characters long")]
    Length { min: usize, max: usize },
    #[error("does not match {other}")]
    Mismatch { other: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub violation: Violation,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.field, self.violation) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("{stage} step is incomplete: {}", list(.violations))]
    Invalid { stage: String, violations: Vec<FieldViolation> },
}

fn list(violations: &[FieldViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Outcome of a navigation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepChange<S> {
    Moved { from: S, to: S },
    Unchanged(S),
}

impl<S: Copy> StepChange<S> {
    pub fn current(&self) -> S {
        match *self { Self::Moved { to, .. } => to, Self::Unchanged(s) => s }
    }
}

#[derive(Clone, Debug)]
pub struct Wizard<S: Stage> {
    index: usize,
    fields: Vec<BTreeMap<String, String>>,
    _stage: PhantomData<S>,
}

impl<S: Stage> Wizard<S> {
    pub fn new() -> Self {
        Self { index: 0, fields: vec![BTreeMap::new(); S::ORDER.len()], _stage: PhantomData }
    }

    pub fn current(&self) -> S { S::ORDER[self.index] }
    pub fn is_first(&self) -> bool { self.index == 0 }
    pub fn is_last(&self) -> bool { self.index + 1 == S::ORDER.len() }

    /// 1-based progress, e.g. `(2, 3)` on the second of three stages.
    pub fn progress(&self) -> (usize, usize) { (self.index + 1, S::ORDER.len()) }

    /// Sets a field on the current stage.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields[self.index].insert(name.into(), value.into());
    }

    pub fn field(&self, stage: S, name: &str) -> Option<&str> {
        self.fields[stage.position()].get(name).map(String::as_str)
    }

    pub fn values(&self, stage: S) -> &BTreeMap<String, String> { &self.fields[stage.position()] }

    pub fn violations(&self, stage: S) -> Vec<FieldViolation> {
        let values = self.values(stage);
        stage.rules().iter()
            .filter_map(|rule| rule.check(values).map(|violation| FieldViolation { field: rule.field(), violation }))
            .collect()
    }

    pub fn validate(&self, stage: S) -> Result<(), WizardError> {
        let violations = self.violations(stage);
        if violations.is_empty() { return Ok(()); }
        Err(WizardError::Invalid { stage: stage.to_string(), violations })
    }

    /// Validates the current stage and moves forward. A no-op on the last stage.
    pub fn advance(&mut self) -> Result<StepChange<S>, WizardError> {
        let from = self.current();
        if self.is_last() { return Ok(StepChange::Unchanged(from)); }
        self.validate(from)?;
        self.index += 1;
        Ok(StepChange::Moved { from, to: self.current() })
    }

    /// Moves back one stage. A no-op on the first stage.
    pub fn retreat(&mut self) -> StepChange<S> {
        let from = self.current();
        if self.is_first() { return StepChange::Unchanged(from); }
        self.index -= 1;
        StepChange::Moved { from, to: self.current() }
    }
}

impl<S: Stage> Default for Wizard<S> {
    fn default() -> Self { Self::new() }
}

/// Checkout: contact and address, shipping method, then payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CheckoutStep {
    Information,
    Shipping,
    Payment,
}

impl CheckoutStep {
    const INFORMATION_RULES: &'static [FieldRule] = &[
        FieldRule::Email("email"),
        FieldRule::Length { field: "phone", min: 7, max: 20 },
        FieldRule::Required("first_name"),
        FieldRule::Required("last_name"),
        FieldRule::Required("address"),
        FieldRule::Required("city"),
        FieldRule::Required("state"),
        FieldRule::Length { field: "zip_code", min: 3, max: 10 },
    ];
    const PAYMENT_RULES: &'static [FieldRule] = &[
        FieldRule::Required("card_name"),
        FieldRule::Digits { field: "card_number", min: 13, max: 19 },
        FieldRule::Required("card_expiry"),
        FieldRule::Digits { field: "card_cvc", min: 3, max: 4 },
    ];
}

impl Stage for CheckoutStep {
    const ORDER: &'static [Self] = &[Self::Information, Self::Shipping, Self::Payment];

    fn rules(self) -> &'static [FieldRule] {
        match self {
            Self::Information => Self::INFORMATION_RULES,
            Self::Shipping => &[],
            Self::Payment => Self::PAYMENT_RULES,
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Information => "Information", Self::Shipping => "Shipping", Self::Payment => "Payment" })
    }
}

/// Password recovery: pick a contact, enter the one-time code, set a new password.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum RecoveryStep {
    Verify,
    Otp,
    Reset,
}

impl Stage for RecoveryStep {
    const ORDER: &'static [Self] = &[Self::Verify, Self::Otp, Self::Reset];

    fn rules(self) -> &'static [FieldRule] {
        match self {
            Self::Verify => &[FieldRule::Required("contact")],
            Self::Otp => &[FieldRule::Digits { field: "otp", min: 6, max: 6 }],
            Self::Reset => &[
                FieldRule::Required("new_password"),
                FieldRule::Matches { field: "confirm_password", other: "new_password" },
            ],
        }
    }
}

impl fmt::Display for RecoveryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Verify => "Verify", Self::Otp => "OTP", Self::Reset => "Reset" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_information(wizard: &mut Wizard<CheckoutStep>) {
        for (name, value) in [
            ("email", "jane@example.com"), ("phone", "(123) 456-7890"), ("first_name", "Jane"),
            ("last_name", "Doe"), ("address", "1 Main St"), ("city", "Springfield"),
            ("state", "IL"), ("zip_code", "62701"),
        ] {
            wizard.set_field(name, value);
        }
    }

    #[test]
    fn test_starts_at_first_stage() {
        let wizard = Wizard::<CheckoutStep>::new();
        assert_eq!(wizard.current(), CheckoutStep::Information);
        assert_eq!(wizard.progress(), (1, 3));
    }

    #[test]
    fn test_advance_requires_fields() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        wizard.set_field("email", "not-an-email");
        let Err(WizardError::Invalid { stage, violations }) = wizard.advance() else { panic!("expected invalid") };
        assert_eq!(stage, "Information");
        assert_eq!(violations[0], FieldViolation { field: "email", violation: Violation::InvalidEmail });
        assert!(violations.iter().any(|v| v.field == "zip_code" && v.violation == Violation::Missing));
        assert_eq!(wizard.current(), CheckoutStep::Information);
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        fill_information(&mut wizard);
        wizard.set_field("city", "   ");
        let violations = wizard.violations(CheckoutStep::Information);
        assert_eq!(violations, vec![FieldViolation { field: "city", violation: Violation::Missing }]);
    }

    #[test]
    fn test_full_walk_and_terminal_noop() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        fill_information(&mut wizard);
        assert_eq!(
            wizard.advance().unwrap(),
            StepChange::Moved { from: CheckoutStep::Information, to: CheckoutStep::Shipping }
        );
        assert_eq!(wizard.advance().unwrap().current(), CheckoutStep::Payment);
        assert!(wizard.is_last());
        assert_eq!(wizard.advance().unwrap(), StepChange::Unchanged(CheckoutStep::Payment));
        assert_eq!(wizard.current(), CheckoutStep::Payment);
    }

    #[test]
    fn test_retreat_from_first_is_noop() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        assert_eq!(wizard.retreat(), StepChange::Unchanged(CheckoutStep::Information));
        fill_information(&mut wizard);
        wizard.advance().unwrap();
        assert_eq!(wizard.retreat().current(), CheckoutStep::Information);
        assert_eq!(wizard.field(CheckoutStep::Information, "first_name"), Some("Jane"));
    }

    #[test]
    fn test_fields_are_scoped_per_stage() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        fill_information(&mut wizard);
        wizard.advance().unwrap();
        wizard.set_field("note", "leave at door");
        assert_eq!(wizard.field(CheckoutStep::Shipping, "note"), Some("leave at door"));
        assert_eq!(wizard.field(CheckoutStep::Information, "note"), None);
    }

    #[test]
    fn test_phone_and_zip_lengths() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        fill_information(&mut wizard);
        wizard.set_field("phone", "123");
        wizard.set_field("zip_code", "1");
        assert_eq!(
            wizard.violations(CheckoutStep::Information),
            vec![
                FieldViolation { field: "phone", violation: Violation::Length { min: 7, max: 20 } },
                FieldViolation { field: "zip_code", violation: Violation::Length { min: 3, max: 10 } },
            ]
        );
        assert!(wizard.advance().is_err());
        assert_eq!(wizard.current(), CheckoutStep::Information);
    }

    #[test]
    fn test_payment_digit_rules() {
        let mut wizard = Wizard::<CheckoutStep>::new();
        fill_information(&mut wizard);
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        wizard.set_field("card_name", "Jane Doe");
        wizard.set_field("card_number", "1234 5678 9012 3456");
        wizard.set_field("card_expiry", "12/27");
        wizard.set_field("card_cvc", "12a");
        assert_eq!(
            wizard.violations(CheckoutStep::Payment),
            vec![FieldViolation { field: "card_cvc", violation: Violation::Digits { min: 3, max: 4 } }]
        );
        wizard.set_field("card_cvc", "123");
        assert!(wizard.validate(CheckoutStep::Payment).is_ok());
    }

    #[test]
    fn test_recovery_flow() {
        let mut wizard = Wizard::<RecoveryStep>::new();
        wizard.set_field("contact", "0912345678");
        wizard.advance().unwrap();
        wizard.set_field("otp", "12345");
        assert!(wizard.advance().is_err());
        wizard.set_field("otp", "123456");
        assert_eq!(wizard.advance().unwrap().current(), RecoveryStep::Reset);

        wizard.set_field("new_password", "hunter22");
        wizard.set_field("confirm_password", "hunter23");
        assert_eq!(
            wizard.violations(RecoveryStep::Reset),
            vec![FieldViolation { field: "confirm_password", violation: Violation::Mismatch { other: "new_password" } }]
        );
        wizard.set_field("confirm_password", "hunter22");
        assert!(wizard.validate(RecoveryStep::Reset).is_ok());
    }

    #[test]
    fn test_error_message_lists_fields() {
        let wizard = Wizard::<RecoveryStep>::new();
        let err = wizard.validate(RecoveryStep::Verify).unwrap_err();
        assert_eq!(err.to_string(), "Verify step is incomplete: contact is required");
    }
}
