//! Input validation errors.
//!
//! Each violation carries the offending field name and a machine-readable
//! constraint code, so callers can fix their request field by field.

use std::fmt;

/// Constraint that a field failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViolationKind {
    /// Required field absent
    Missing,
    /// Not coercible to an integer
    IntType,
    /// Not coercible to a number
    FloatType,
    /// Below the inclusive lower bound
    GreaterThanEqual(f64),
    /// Above the inclusive upper bound
    LessThanEqual(f64),
    /// Request body is not a JSON object
    ModelType,
    /// Request body is not valid JSON
    JsonInvalid,
}

impl ViolationKind {
    /// Machine-readable constraint code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::IntType => "int_type",
            Self::FloatType => "float_type",
            Self::GreaterThanEqual(_) => "greater_than_equal",
            Self::LessThanEqual(_) => "less_than_equal",
            Self::ModelType => "model_type",
            Self::JsonInvalid => "json_invalid",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Missing => "Field required".to_string(),
            Self::IntType => "Input should be a valid integer".to_string(),
            Self::FloatType => "Input should be a valid number".to_string(),
            Self::GreaterThanEqual(min) => format!("Input should be greater than or equal to {min}"),
            Self::LessThanEqual(max) => format!("Input should be less than or equal to {max}"),
            Self::ModelType => {
                "Input should be a valid dictionary or object to extract fields from".to_string()
            }
            Self::JsonInvalid => "JSON decode error".to_string(),
        }
    }
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    field: &'static str,
    kind: ViolationKind,
    message: String,
}

impl FieldViolation {
    /// Field name used when the violation concerns the whole request body.
    pub const BODY: &'static str = "body";

    #[must_use]
    pub fn new(field: &'static str, kind: ViolationKind) -> Self {
        Self {
            field,
            kind,
            message: kind.message(),
        }
    }

    #[must_use]
    pub fn body(kind: ViolationKind) -> Self {
        Self::new(Self::BODY, kind)
    }

    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    #[must_use]
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the violation concerns the body as a whole rather than a field.
    #[must_use]
    pub fn is_body(&self) -> bool {
        self.field == Self::BODY
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.kind.code())
    }
}

/// A rejected patient record. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid patient data: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub(crate) fn new(violations: Vec<FieldViolation>) -> Self {
        debug_assert!(!violations.is_empty());
        Self { violations }
    }

    /// The request body could not be parsed as JSON at all.
    #[must_use]
    pub fn json_invalid(cause: &serde_json::Error) -> Self {
        let mut violation = FieldViolation::body(ViolationKind::JsonInvalid);
        violation.message = format!("JSON decode error: {cause}");
        Self::new(vec![violation])
    }

    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the offending fields, in report order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.violations.iter().map(FieldViolation::field)
    }
}

impl From<FieldViolation> for ValidationError {
    fn from(violation: FieldViolation) -> Self {
        Self::new(vec![violation])
    }
}
