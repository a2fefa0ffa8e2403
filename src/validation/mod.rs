//! Form validation
//!
//! Forms are declared as data: a list of fields, each with rules, plus
//! cross-field rules. Evaluation is synchronous and reports every failure,
//! not just the first.
//!
//! ```text
//! FormSpec ─┬─ FieldSpec("username", [Required, MinLength(4)])
//!           ├─ FieldSpec("password", [Required, StrongPassword])
//!           └─ CrossRule::FieldsMatch("password", "repeat_password")
//! ```

pub mod forms;

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, TaskflowError};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("email regex is valid")
});

// The password policy needs lookaheads, which `regex` lacks: split it up.
static PASSWORD_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$").expect("charset regex is valid"));
static PASSWORD_CLASSES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [r"[a-z]", r"[A-Z]", r"\d", r"[@$!%*?&]"].map(|p| Regex::new(p).expect("class regex is valid"))
});

/// Single-field constraint
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern {
        name: &'static str,
        regex: &'static Regex,
    },
    Email,
    /// Numeric value must be >= the bound
    MinValue(f64),
    /// `YYYY-MM-DD`, strictly after today
    FutureDate,
    /// 8+ chars from `[A-Za-z0-9@$!%*?&]` with lower, upper, digit and symbol
    StrongPassword,
}

/// Constraint across two fields
#[derive(Debug, Clone)]
pub enum CrossRule {
    FieldsMatch(&'static str, &'static str),
    /// First field's number must exceed the second's
    GreaterThan(&'static str, &'static str),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    pub fn new(name: &'static str, rules: Vec<Rule>) -> Self {
        Self { name, rules }
    }
}

#[derive(Debug, Clone)]
pub struct FormSpec {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub cross: Vec<CrossRule>,
}

/// Submitted values, by field name
#[derive(Debug, Clone, Default)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Missing fields read as empty
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldErrorKind {
    Required,
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    PatternMismatch(&'static str),
    InvalidEmail,
    NotANumber,
    BelowMinimum(f64),
    NotADate,
    NotInFuture,
    WeakPassword,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorKind::Required => write!(f, "is required"),
            FieldErrorKind::TooShort { min, actual } => {
                write!(f, "must be at least {} characters (got {})", min, actual)
            }
            FieldErrorKind::TooLong { max, actual } => {
                write!(f, "must be at most {} characters (got {})", max, actual)
            }
            FieldErrorKind::PatternMismatch(name) => write!(f, "must be a valid {}", name),
            FieldErrorKind::InvalidEmail => write!(f, "must be a valid email address"),
            FieldErrorKind::NotANumber => write!(f, "must be a number"),
            FieldErrorKind::BelowMinimum(min) => write!(f, "must be at least {}", min),
            FieldErrorKind::NotADate => write!(f, "must be a date (YYYY-MM-DD)"),
            FieldErrorKind::NotInFuture => write!(f, "must be in the future"),
            FieldErrorKind::WeakPassword => write!(
                f,
                "needs 8+ characters with lower and upper case letters, a digit and one of @$!%*?&"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    Mismatch(&'static str, &'static str),
    NotGreater(&'static str, &'static str),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Mismatch(a, b) => write!(f, "{} and {} do not match", a, b),
            FormError::NotGreater(a, b) => write!(f, "{} must be greater than {}", a, b),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub field_errors: Vec<FieldError>,
    pub form_errors: Vec<FormError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.form_errors.is_empty()
    }

    pub fn errors_for(&self, field: &str) -> Vec<&FieldErrorKind> {
        self.field_errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| &e.kind)
            .collect()
    }

    /// One line per problem
    pub fn lines(&self) -> Vec<String> {
        self.field_errors
            .iter()
            .map(|e| format!("{} {}", e.field, e.kind))
            .chain(self.form_errors.iter().map(|e| e.to_string()))
            .collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("; "))
    }
}

impl FormSpec {
    pub fn validate(&self, values: &FormValues, today: NaiveDate) -> ValidationReport {
        let mut report = ValidationReport::default();

        for field in &self.fields {
            let value = values.get(field.name).trim();
            if value.is_empty() {
                if field.rules.iter().any(|r| matches!(r, Rule::Required)) {
                    report.field_errors.push(FieldError {
                        field: field.name,
                        kind: FieldErrorKind::Required,
                    });
                }
                continue;
            }
            for rule in &field.rules {
                if let Some(kind) = check_rule(rule, value, today) {
                    report.field_errors.push(FieldError {
                        field: field.name,
                        kind,
                    });
                }
            }
        }

        for rule in &self.cross {
            if let Some(error) = check_cross(rule, values) {
                report.form_errors.push(error);
            }
        }

        report
    }

    /// `validate` as a `Result`, for `?` before submitting
    pub fn check(&self, values: &FormValues, today: NaiveDate) -> Result<()> {
        let report = self.validate(values, today);
        if report.is_valid() {
            Ok(())
        } else {
            Err(TaskflowError::Validation {
                form: self.name.to_string(),
                report,
            })
        }
    }
}

fn check_rule(rule: &Rule, value: &str, today: NaiveDate) -> Option<FieldErrorKind> {
    let len = value.chars().count();
    match rule {
        Rule::Required => None,
        Rule::MinLength(min) if len < *min => Some(FieldErrorKind::TooShort {
            min: *min,
            actual: len,
        }),
        Rule::MaxLength(max) if len > *max => Some(FieldErrorKind::TooLong {
            max: *max,
            actual: len,
        }),
        Rule::MinLength(_) | Rule::MaxLength(_) => None,
        Rule::Pattern { name, regex } => (!regex.is_match(value)).then_some(FieldErrorKind::PatternMismatch(*name)),
        Rule::Email => (!EMAIL.is_match(value)).then_some(FieldErrorKind::InvalidEmail),
        Rule::MinValue(min) => match value.parse::<f64>() {
            Ok(n) if n < *min => Some(FieldErrorKind::BelowMinimum(*min)),
            Ok(_) => None,
            Err(_) => Some(FieldErrorKind::NotANumber),
        },
        Rule::FutureDate => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) if date <= today => Some(FieldErrorKind::NotInFuture),
            Ok(_) => None,
            Err(_) => Some(FieldErrorKind::NotADate),
        },
        Rule::StrongPassword => {
            let strong = PASSWORD_CHARSET.is_match(value)
                && PASSWORD_CLASSES.iter().all(|class| class.is_match(value));
            (!strong).then_some(FieldErrorKind::WeakPassword)
        }
    }
}

/// Cross rules only fire once both fields have a value
fn check_cross(rule: &CrossRule, values: &FormValues) -> Option<FormError> {
    match rule {
        CrossRule::FieldsMatch(a, b) => {
            let (va, vb) = (values.get(a), values.get(b));
            (!va.is_empty() && !vb.is_empty() && va != vb).then_some(FormError::Mismatch(*a, *b))
        }
        CrossRule::GreaterThan(a, b) => {
            let va = values.get(a).trim().parse::<f64>().ok()?;
            let vb = values.get(b).trim().parse::<f64>().ok()?;
            (va <= vb).then_some(FormError::NotGreater(*a, *b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn single(rules: Vec<Rule>) -> FormSpec {
        FormSpec {
            name: "test",
            fields: vec![FieldSpec::new("f", rules)],
            cross: vec![],
        }
    }

    fn errors(spec: &FormSpec, value: &str) -> Vec<FieldErrorKind> {
        spec.validate(&FormValues::new().with("f", value), today())
            .field_errors
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_required_and_empty_optional() {
        assert_eq!(errors(&single(vec![Rule::Required]), "  "), vec![FieldErrorKind::Required]);
        assert!(errors(&single(vec![Rule::MinLength(3)]), "").is_empty());
    }

    #[test]
    fn test_length_counts_chars() {
        let spec = single(vec![Rule::MinLength(3), Rule::MaxLength(4)]);
        assert!(errors(&spec, "čćž").is_empty());
        assert_eq!(
            errors(&spec, "ab"),
            vec![FieldErrorKind::TooShort { min: 3, actual: 2 }]
        );
        assert_eq!(
            errors(&spec, "abcde"),
            vec![FieldErrorKind::TooLong { max: 4, actual: 5 }]
        );
    }

    #[test]
    fn test_email() {
        let spec = single(vec![Rule::Email]);
        assert!(errors(&spec, "ana@example.com").is_empty());
        assert_eq!(errors(&spec, "ana@"), vec![FieldErrorKind::InvalidEmail]);
        assert_eq!(errors(&spec, "ana example.com"), vec![FieldErrorKind::InvalidEmail]);
    }

    #[test]
    fn test_strong_password() {
        let spec = single(vec![Rule::StrongPassword]);
        assert!(errors(&spec, "Secret1!").is_empty());
        for weak in ["secret1!", "SECRET1!", "Secret!!", "Secret12", "Sec1!", "Secret1!#"] {
            assert_eq!(errors(&spec, weak), vec![FieldErrorKind::WeakPassword], "{weak}");
        }
    }

    #[test]
    fn test_min_value() {
        let spec = single(vec![Rule::MinValue(1.0)]);
        assert!(errors(&spec, "3").is_empty());
        assert_eq!(errors(&spec, "0"), vec![FieldErrorKind::BelowMinimum(1.0)]);
        assert_eq!(errors(&spec, "x"), vec![FieldErrorKind::NotANumber]);
    }

    #[test]
    fn test_future_date_is_strict() {
        let spec = single(vec![Rule::FutureDate]);
        assert!(errors(&spec, "2025-01-16").is_empty());
        assert_eq!(errors(&spec, "2025-01-15"), vec![FieldErrorKind::NotInFuture]);
        assert_eq!(errors(&spec, "15/01/2025"), vec![FieldErrorKind::NotADate]);
    }

    #[test]
    fn test_cross_rules_wait_for_both_values() {
        let spec = FormSpec {
            name: "cross",
            fields: vec![],
            cross: vec![CrossRule::FieldsMatch("a", "b"), CrossRule::GreaterThan("max", "min")],
        };
        let partial = FormValues::new().with("a", "x");
        assert!(spec.validate(&partial, today()).is_valid());

        let bad = FormValues::new()
            .with("a", "x")
            .with("b", "y")
            .with("max", "2")
            .with("min", "2");
        let report = spec.validate(&bad, today());
        assert_eq!(
            report.form_errors,
            vec![FormError::Mismatch("a", "b"), FormError::NotGreater("max", "min")]
        );
    }

    #[test]
    fn test_check_wraps_report() {
        let err = single(vec![Rule::Required])
            .check(&FormValues::new(), today())
            .unwrap_err();
        match err {
            TaskflowError::Validation { form, report } => {
                assert_eq!(form, "test");
                assert_eq!(report.lines(), vec!["f is required".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
