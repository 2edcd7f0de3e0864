//! Input validators.

use crate::component::Value;
use core::fmt;
use std::sync::Arc;

/// A validation failure; the message is shown inline on the component.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError {
            message: message.into(),
        }
    }
}

type Rule = dyn Fn(&Value) -> Result<(), ValidationError> + Send + Sync;

/// Accepts or rejects input values.
///
/// Cheap to clone; the rule is shared.
#[derive(Clone)]
pub struct Validator(Arc<Rule>);

impl Validator {
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Validator(Arc::new(rule))
    }

    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        (self.0)(value)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    /// Rejects `Empty` and empty text.
    pub fn required(message: impl Into<String>) -> Self {
        let message = message.into();
        Validator::new(move |value| {
            if value.is_empty() {
                Err(ValidationError::new(message.clone()))
            } else {
                Ok(())
            }
        })
    }

    /// Rejects text longer than `max` characters. Non-text values pass.
    pub fn max_length(max: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        Validator::new(move |value| match value.as_text() {
            Some(text) if text.chars().count() > max => Err(ValidationError::new(message.clone())),
            _ => Ok(()),
        })
    }

    /// Rejects values outside `min..=max`, and values that aren’t numeric at all.
    ///
    /// Empty values pass; combine with [`Validator::required`] to reject them.
    pub fn range(min: f64, max: f64, message: impl Into<String>) -> Self {
        let message = message.into();
        Validator::new(move |value| {
            if value.is_empty() {
                return Ok(());
            }
            match value.as_f64() {
                Some(n) if n >= min && n <= max => Ok(()),
                _ => Err(ValidationError::new(message.clone())),
            }
        })
    }

    /// Runs `self`, then `other`; the first failure wins.
    pub fn and(self, other: Validator) -> Self {
        Validator::new(move |value| {
            self.check(value)?;
            other.check(value)
        })
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Validator(..)")
    }
}

#[test]
fn test_builtin_validators() {
    let required = Validator::required("required");
    assert!(!required.accepts(&Value::Empty));
    assert!(!required.accepts(&Value::from("")));
    assert!(required.accepts(&Value::from("x")));

    let short = Validator::max_length(3, "too long");
    assert!(short.accepts(&Value::from("abc")));
    assert_eq!(
        short.check(&Value::from("abcd")),
        Err(ValidationError::new("too long"))
    );

    let age = Validator::range(0., 150., "bad age");
    assert!(age.accepts(&Value::from(42)));
    assert!(age.accepts(&Value::from(" 42 ")), "numeric text should parse");
    assert!(!age.accepts(&Value::from(151)));
    assert!(!age.accepts(&Value::from("forty")));
    assert!(age.accepts(&Value::Empty), "range alone lets empty input through");
}

#[test]
fn test_validator_and() {
    let v = Validator::required("required").and(Validator::max_length(2, "too long"));
    assert_eq!(v.check(&Value::Empty).unwrap_err().message, "required");
    assert_eq!(v.check(&Value::from("abc")).unwrap_err().message, "too long");
    assert!(v.accepts(&Value::from("ab")));
}
