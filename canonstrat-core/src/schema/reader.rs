//! Field reader over untyped JSON that records every failure it sees.
//!
//! Readers return `None` when a field is missing or malformed and push a
//! [`ValidationError`] for it, so one pass over a document reports all problems.
//! Optional readers that fall back to a default still record malformed values.

use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A JSON object together with its dotted path in the document.
#[derive(Debug, Clone)]
pub(crate) struct Obj<'v> {
    path: String,
    map: &'v Map<String, Value>,
}

impl<'v> Obj<'v> {
    pub fn path(&self) -> &str {
        if self.path.is_empty() {
            "$"
        } else {
            &self.path
        }
    }

    pub fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// Field value; explicit `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&'v Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Default)]
pub(crate) struct Checker {
    errors: Vec<ValidationError>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationError::invalid(path, message));
    }

    /// Record a failure unless `ok` holds. Returns `ok`.
    pub fn check(&mut self, ok: bool, path: impl Into<String>, message: impl Into<String>) -> bool {
        if !ok {
            self.fail(path, message);
        }
        ok
    }

    /// `Ok(value)` only when nothing was recorded.
    pub fn finish<T>(mut self, value: Option<T>) -> Result<T, Vec<ValidationError>> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => {
                if self.errors.is_empty() {
                    debug_assert!(false, "reader produced no value and no error");
                    self.fail("$", "document is invalid");
                }
                Err(self.errors)
            }
        }
    }

    // ── Objects ──

    pub fn root<'v>(&mut self, raw: &'v Value) -> Option<Obj<'v>> {
        match raw {
            Value::Object(map) => Some(Obj { path: String::new(), map }),
            other => {
                self.fail("$", format!("expected an object, found {}", type_name(other)));
                None
            }
        }
    }

    pub fn object<'v>(&mut self, parent: &Obj<'v>, key: &str) -> Option<Obj<'v>> {
        let path = parent.field_path(key);
        match parent.get(key) {
            None => {
                self.fail(path, "is required");
                None
            }
            Some(value) => self.as_object(path, value),
        }
    }

    pub fn optional_object<'v>(&mut self, parent: &Obj<'v>, key: &str) -> Option<Obj<'v>> {
        let value = parent.get(key)?;
        self.as_object(parent.field_path(key), value)
    }

    fn as_object<'v>(&mut self, path: String, value: &'v Value) -> Option<Obj<'v>> {
        match value {
            Value::Object(map) => Some(Obj { path, map }),
            other => {
                self.fail(path, format!("expected an object, found {}", type_name(other)));
                None
            }
        }
    }

    // ── Strings ──

    pub fn string<'v>(&mut self, parent: &Obj<'v>, key: &str) -> Option<&'v str> {
        match parent.get(key) {
            None => {
                self.fail(parent.field_path(key), "is required");
                None
            }
            Some(value) => self.as_str(parent.field_path(key), value),
        }
    }

    pub fn optional_string<'v>(&mut self, parent: &Obj<'v>, key: &str) -> Option<&'v str> {
        let value = parent.get(key)?;
        self.as_str(parent.field_path(key), value)
    }

    fn as_str<'v>(&mut self, path: String, value: &'v Value) -> Option<&'v str> {
        match value {
            Value::String(s) => Some(s.as_str()),
            other => {
                self.fail(path, format!("expected a string, found {}", type_name(other)));
                None
            }
        }
    }

    /// Required string field that must be one of `options`.
    pub fn choice<T: Copy>(
        &mut self,
        parent: &Obj<'_>,
        key: &str,
        options: &[(&str, T)],
    ) -> Option<T> {
        let s = self.string(parent, key)?;
        self.pick(parent.field_path(key), s, options)
    }

    /// Optional string field that must be one of `options` when present.
    pub fn optional_choice<T: Copy>(
        &mut self,
        parent: &Obj<'_>,
        key: &str,
        options: &[(&str, T)],
        default: T,
    ) -> T {
        match self.optional_string(parent, key) {
            Some(s) => self.pick(parent.field_path(key), s, options).unwrap_or(default),
            None => default,
        }
    }

    fn pick<T: Copy>(&mut self, path: String, found: &str, options: &[(&str, T)]) -> Option<T> {
        match options.iter().find(|(name, _)| *name == found) {
            Some((_, v)) => Some(*v),
            None => {
                let names: Vec<&str> = options.iter().map(|(name, _)| *name).collect();
                self.fail(
                    path,
                    format!("unknown value '{found}' (expected one of: {})", names.join(", ")),
                );
                None
            }
        }
    }

    // ── Numbers ──

    pub fn number(&mut self, parent: &Obj<'_>, key: &str) -> Option<f64> {
        match parent.get(key) {
            None => {
                self.fail(parent.field_path(key), "is required");
                None
            }
            Some(value) => self.as_number(parent.field_path(key), value),
        }
    }

    pub fn optional_number(&mut self, parent: &Obj<'_>, key: &str) -> Option<f64> {
        let value = parent.get(key)?;
        self.as_number(parent.field_path(key), value)
    }

    /// Numeric strings such as `"1.5"` are rejected.
    fn as_number(&mut self, path: String, value: &Value) -> Option<f64> {
        match value.as_f64() {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.fail(path, format!("expected a number, found {}", type_name(value)));
                None
            }
        }
    }

    /// Required number satisfying `accept`.
    pub fn number_where(
        &mut self,
        parent: &Obj<'_>,
        key: &str,
        accept: impl Fn(f64) -> bool,
        message: &str,
    ) -> Option<f64> {
        let n = self.number(parent, key)?;
        self.check(accept(n), parent.field_path(key), message)
            .then_some(n)
    }

    /// Required number strictly greater than zero.
    pub fn positive(&mut self, parent: &Obj<'_>, key: &str) -> Option<f64> {
        self.number_where(parent, key, |n| n > 0.0, "must be greater than 0")
    }

    /// Optional number ≥ 0, `default` when absent.
    pub fn non_negative_or(&mut self, parent: &Obj<'_>, key: &str, default: f64) -> f64 {
        match self.optional_number(parent, key) {
            Some(n) if self.check(n >= 0.0, parent.field_path(key), "must not be negative") => n,
            _ => default,
        }
    }

    /// Required integer in `min..=max`. Integral floats such as `15.0` are accepted.
    pub fn integer(&mut self, parent: &Obj<'_>, key: &str, min: u32, max: u32) -> Option<u32> {
        match parent.get(key) {
            None => {
                self.fail(parent.field_path(key), "is required");
                None
            }
            Some(value) => self.as_integer(parent.field_path(key), value, min, max),
        }
    }

    /// Optional integer in `min..=max`, `default` when absent.
    pub fn optional_integer(
        &mut self,
        parent: &Obj<'_>,
        key: &str,
        min: u32,
        max: u32,
        default: u32,
    ) -> Option<u32> {
        match parent.get(key) {
            None => Some(default),
            Some(value) => self.as_integer(parent.field_path(key), value, min, max),
        }
    }

    fn as_integer(&mut self, path: String, value: &Value, min: u32, max: u32) -> Option<u32> {
        let n = self.as_number(path.clone(), value)?;
        let in_range = n.fract() == 0.0 && n >= f64::from(min) && n <= f64::from(max);
        if !in_range {
            let message = if max == u32::MAX {
                format!("must be an integer of at least {min}")
            } else {
                format!("must be an integer between {min} and {max}")
            };
            self.fail(path, message);
            return None;
        }
        Some(n as u32)
    }
}
