//! Patient record for heart disease risk prediction.
//!
//! Based on the 13 Cleveland heart disease dataset features. A record only
//! exists once every field has passed its range check.

use std::fmt;

use serde_json::{Map, Value};

use super::validation::{FieldViolation, ValidationError, ViolationKind};

/// Number of clinical features consumed by the model.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in the order the model was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Real,
    Integer,
}

/// Type and inclusive bounds of one input field.
struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    min: f64,
    max: f64,
}

const fn real(name: &'static str, min: f64, max: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Real,
        min,
        max,
    }
}

const fn integer(name: &'static str, min: f64, max: f64) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Integer,
        min,
        max,
    }
}

/// Field contract, in `FEATURE_NAMES` order.
///
/// `thal` is only meaningful as 3, 6 or 7 but is checked as the range [3, 7],
/// so 4 and 5 pass.
const FIELD_SPECS: [FieldSpec; FEATURE_COUNT] = [
    real("age", 1.0, 120.0),
    integer("sex", 0.0, 1.0),
    integer("cp", 1.0, 4.0),
    real("trestbps", 80.0, 200.0),
    real("chol", 100.0, 600.0),
    integer("fbs", 0.0, 1.0),
    integer("restecg", 0.0, 2.0),
    real("thalach", 60.0, 220.0),
    integer("exang", 0.0, 1.0),
    real("oldpeak", 0.0, 10.0),
    integer("slope", 1.0, 3.0),
    integer("ca", 0.0, 3.0),
    integer("thal", 3.0, 7.0),
];

impl FieldSpec {
    fn check(&self, value: Option<&Value>) -> Result<f64, FieldViolation> {
        let value = value.ok_or_else(|| FieldViolation::new(self.name, ViolationKind::Missing))?;
        let number = self.coerce(value).ok_or_else(|| {
            let kind = match self.kind {
                FieldKind::Real => ViolationKind::FloatType,
                FieldKind::Integer => ViolationKind::IntType,
            };
            FieldViolation::new(self.name, kind)
        })?;
        self.check_bounds(number)
    }

    fn coerce(&self, value: &Value) -> Option<f64> {
        match (self.kind, value) {
            (FieldKind::Real, Value::Number(n)) => n.as_f64(),
            (FieldKind::Real, Value::String(s)) => {
                s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
            }
            (FieldKind::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) => Some(i as f64),
                None => n.as_f64().filter(|v| v.is_finite() && v.fract() == 0.0),
            },
            (FieldKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(|i| i as f64),
            (_, Value::Bool(b)) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    fn check_bounds(&self, number: f64) -> Result<f64, FieldViolation> {
        if number < self.min {
            Err(FieldViolation::new(
                self.name,
                ViolationKind::GreaterThanEqual(self.min),
            ))
        } else if number > self.max {
            Err(FieldViolation::new(
                self.name,
                ViolationKind::LessThanEqual(self.max),
            ))
        } else {
            Ok(number)
        }
    }
}

/// A validated patient record.
///
/// Fields are only reachable inside the crate, so every instance went
/// through [`PatientRecord::validate`] or [`PatientRecord::from_values`].
/// `Debug` hides the clinical values.
#[derive(Clone, PartialEq)]
pub struct PatientRecord {
    /// Age in years
    pub(crate) age: f64,
    /// Sex (1 = male, 0 = female)
    pub(crate) sex: u8,
    /// Chest pain type (1-4)
    pub(crate) cp: u8,
    /// Resting blood pressure in mm Hg
    pub(crate) trestbps: f64,
    /// Serum cholesterol in mg/dl
    pub(crate) chol: f64,
    /// Fasting blood sugar > 120 mg/dl
    pub(crate) fbs: u8,
    /// Resting ECG results (0-2)
    pub(crate) restecg: u8,
    /// Maximum heart rate achieved
    pub(crate) thalach: f64,
    /// Exercise induced angina
    pub(crate) exang: u8,
    /// ST depression induced by exercise relative to rest
    pub(crate) oldpeak: f64,
    /// Slope of the peak exercise ST segment (1-3)
    pub(crate) slope: u8,
    /// Number of major vessels colored by fluoroscopy (0-3)
    pub(crate) ca: u8,
    /// Thalassemia (3 = normal, 6 = fixed defect, 7 = reversible defect)
    pub(crate) thal: u8,
}

impl PatientRecord {
    /// Validate an untyped JSON record.
    ///
    /// Every field is checked; all violations are reported together, in
    /// `FEATURE_NAMES` order. Unknown keys are ignored.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] naming each offending field.
    pub fn validate(raw: &Value) -> Result<Self, ValidationError> {
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationError::from(FieldViolation::body(ViolationKind::ModelType)))?;
        Self::validate_object(object)
    }

    fn validate_object(object: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut values = [0.0; FEATURE_COUNT];
        let mut violations = Vec::new();

        for (slot, spec) in values.iter_mut().zip(FIELD_SPECS.iter()) {
            match spec.check(object.get(spec.name)) {
                Ok(v) => *slot = v,
                Err(violation) => violations.push(violation),
            }
        }

        if violations.is_empty() {
            Ok(Self::from_checked(values))
        } else {
            Err(ValidationError::new(violations))
        }
    }

    /// Build a record from typed values given in `FEATURE_NAMES` order.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if a value is out of range, or if an
    /// integer field holds a fractional value.
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Result<Self, ValidationError> {
        let violations: Vec<FieldViolation> = values
            .iter()
            .zip(FIELD_SPECS.iter())
            .filter_map(|(&v, spec)| {
                let well_typed = v.is_finite()
                    && (spec.kind == FieldKind::Real || v.fract() == 0.0);
                if !well_typed {
                    let kind = match spec.kind {
                        FieldKind::Real => ViolationKind::FloatType,
                        FieldKind::Integer => ViolationKind::IntType,
                    };
                    return Some(FieldViolation::new(spec.name, kind));
                }
                spec.check_bounds(v).err()
            })
            .collect();

        if violations.is_empty() {
            Ok(Self::from_checked(values))
        } else {
            Err(ValidationError::new(violations))
        }
    }

    // Integer fields are already range-checked, so the casts are lossless.
    fn from_checked(v: [f64; FEATURE_COUNT]) -> Self {
        Self {
            age: v[0],
            sex: v[1] as u8,
            cp: v[2] as u8,
            trestbps: v[3],
            chol: v[4],
            fbs: v[5] as u8,
            restecg: v[6] as u8,
            thalach: v[7],
            exang: v[8] as u8,
            oldpeak: v[9],
            slope: v[10] as u8,
            ca: v[11] as u8,
            thal: v[12] as u8,
        }
    }
}

impl fmt::Debug for PatientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PatientRecord { <redacted> }")
    }
}

/// Ordered numeric encoding of a patient record, as consumed by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "age": 55, "sex": 1, "cp": 2, "trestbps": 130, "chol": 250, "fbs": 1,
            "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 2,
            "ca": 0, "thal": 3
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut raw = sample();
        raw[field] = value;
        raw
    }

    fn rejected_fields(raw: &Value) -> Vec<&'static str> {
        PatientRecord::validate(raw)
            .expect_err("Should be rejected")
            .violations()
            .iter()
            .map(FieldViolation::field)
            .collect()
    }

    #[test]
    fn test_field_specs_follow_feature_order() {
        let names: Vec<&str> = FIELD_SPECS.iter().map(|s| s.name).collect();
        assert_eq!(names, FEATURE_NAMES);
    }

    #[test]
    fn test_valid_record() {
        let record = PatientRecord::validate(&sample()).expect("Should validate");
        assert!((record.age - 55.0).abs() < f64::EPSILON);
        assert_eq!(record.sex, 1);
        assert!((record.oldpeak - 2.3).abs() < f64::EPSILON);
        assert_eq!(record.thal, 3);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        for spec in &FIELD_SPECS {
            for bound in [spec.min, spec.max] {
                let raw = with(spec.name, json!(bound));
                assert!(
                    PatientRecord::validate(&raw).is_ok(),
                    "{} should accept {bound}",
                    spec.name
                );
            }
        }
    }

    #[test]
    fn test_one_unit_past_bounds_is_rejected() {
        for spec in &FIELD_SPECS {
            let below = with(spec.name, json!(spec.min - 1.0));
            assert_eq!(rejected_fields(&below), vec![spec.name]);

            let above = with(spec.name, json!(spec.max + 1.0));
            assert_eq!(rejected_fields(&above), vec![spec.name]);
        }
    }

    #[test]
    fn test_age_zero_reports_lower_bound() {
        let err = PatientRecord::validate(&with("age", json!(0))).expect_err("age=0");
        let violation = &err.violations()[0];
        assert_eq!(violation.field(), "age");
        assert_eq!(violation.kind(), ViolationKind::GreaterThanEqual(1.0));
    }

    #[test]
    fn test_missing_fields_are_aggregated() {
        let mut raw = sample();
        let object = raw.as_object_mut().expect("object");
        object.remove("chol");
        object.remove("thal");

        let err = PatientRecord::validate(&raw).expect_err("Should be rejected");
        assert_eq!(err.violations().len(), 2);
        assert!(err
            .violations()
            .iter()
            .all(|v| v.kind() == ViolationKind::Missing));
        assert_eq!(rejected_fields(&raw), vec!["chol", "thal"]);
    }

    #[test]
    fn test_integer_fields_reject_fractions() {
        let err = PatientRecord::validate(&with("cp", json!(2.5))).expect_err("fraction");
        assert_eq!(err.violations()[0].kind(), ViolationKind::IntType);

        assert!(PatientRecord::validate(&with("cp", json!(2.0))).is_ok());
        assert!(PatientRecord::validate(&with("cp", json!("3"))).is_ok());
    }

    #[test]
    fn test_booleans_coerce_to_flags() {
        let mut raw = sample();
        raw["fbs"] = json!(true);
        raw["exang"] = json!(false);
        raw["sex"] = json!(false);
        let record = PatientRecord::validate(&raw).expect("bool flags");
        assert_eq!(record.fbs, 1);
        assert_eq!(record.exang, 0);
        assert_eq!(record.sex, 0);

        // false is 0, below the lower bound of cp.
        let err = PatientRecord::validate(&with("cp", json!(false))).expect_err("cp=0");
        assert_eq!(err.violations()[0].kind(), ViolationKind::GreaterThanEqual(1.0));
    }

    #[test]
    fn test_debug_hides_clinical_values() {
        let record = PatientRecord::validate(&sample()).expect("Should validate");
        let debug = format!("{record:?}");
        assert_eq!(debug, "PatientRecord { <redacted> }");
        assert!(!debug.contains("250"));
    }

    #[test]
    fn test_real_fields_coerce_numeric_strings() {
        let record = PatientRecord::validate(&with("oldpeak", json!("1.5"))).expect("coerce");
        assert!((record.oldpeak - 1.5).abs() < f64::EPSILON);

        let err = PatientRecord::validate(&with("chol", json!("high"))).expect_err("text");
        assert_eq!(err.violations()[0].kind(), ViolationKind::FloatType);

        let err = PatientRecord::validate(&with("chol", Value::Null)).expect_err("null");
        assert_eq!(err.violations()[0].kind(), ViolationKind::FloatType);
    }

    #[test]
    fn test_thal_keeps_loose_range() {
        for thal in [3, 4, 5, 6, 7] {
            assert!(PatientRecord::validate(&with("thal", json!(thal))).is_ok());
        }
    }

    #[test]
    fn test_non_object_body_is_rejected() {
        let err = PatientRecord::validate(&json!([1, 2, 3])).expect_err("array");
        assert_eq!(err.violations()[0].field(), "body");
        assert_eq!(err.violations()[0].kind(), ViolationKind::ModelType);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let raw = with("patient_name", json!("ignored"));
        assert!(PatientRecord::validate(&raw).is_ok());
    }

    #[test]
    fn test_from_values() {
        let values = [55.0, 1.0, 2.0, 130.0, 250.0, 1.0, 0.0, 150.0, 0.0, 2.3, 2.0, 0.0, 3.0];
        let record = PatientRecord::from_values(values).expect("Should build");
        assert_eq!(record, PatientRecord::validate(&sample()).expect("validate"));

        let mut bad = values;
        bad[2] = 1.5;
        bad[9] = 11.0;
        let err = PatientRecord::from_values(bad).expect_err("Should reject");
        let fields: Vec<&str> = err.violations().iter().map(FieldViolation::field).collect();
        assert_eq!(fields, vec!["cp", "oldpeak"]);
    }
}
