//! Conversions from stored values to the scalar types a target field may declare.

use std::path::PathBuf;

use super::BindError;
use crate::config::Value;

/// A type a stored [`Value`] can be coerced into.
pub trait FromValue: Sized {
    /// `path` is only used to describe failures.
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError>;
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> BindError {
    BindError::TypeMismatch {
        path: path.to_string(),
        expected,
        found: found.type_name(),
    }
}

fn invalid(path: &str, value: &str, target: &'static str) -> BindError {
    BindError::InvalidValue {
        path: path.to_string(),
        value: value.to_string(),
        target,
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, _path: &str) -> Result<Self, BindError> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => Ok(value.to_string()),
            other => Err(mismatch(path, "string", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            Value::String(s) => Err(invalid(path, s, "bool")),
            other => Err(mismatch(path, "bool", other)),
        }
    }
}

impl FromValue for char {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        let Value::String(s) = value else {
            return Err(mismatch(path, "char", value));
        };
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(invalid(path, s, "char")),
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        match value {
            Value::String(s) => Ok(PathBuf::from(s)),
            other => Err(mismatch(path, "path", other)),
        }
    }
}

/// Widens any integral value to `i128` before the range check.
fn integral(value: &Value, path: &str, target: &'static str) -> Result<i128, BindError> {
    match value {
        Value::Integer(i) => Ok(i128::from(*i)),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(*f as i128),
        Value::Float(f) => Err(invalid(path, &f.to_string(), target)),
        Value::String(s) => s.trim().parse::<i128>().map_err(|_| invalid(path, s, target)),
        other => Err(mismatch(path, target, other)),
    }
}

macro_rules! integer_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
                    let wide = integral(value, path, stringify!($ty))?;
                    <$ty>::try_from(wide).map_err(|_| BindError::OutOfRange {
                        path: path.to_string(),
                        value: wide.to_string(),
                        target: stringify!($ty),
                    })
                }
            }
        )*
    };
}

integer_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| invalid(path, s, "f64")),
            other => Err(mismatch(path, "f64", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        let wide = f64::from_value(value, path)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(BindError::OutOfRange {
                path: path.to_string(),
                value: wide.to_string(),
                target: "f32",
            });
        }
        Ok(narrow)
    }
}

/// Null reads as `None`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, path).map(Some),
        }
    }
}

/// Arrays convert element-wise; a string is split on commas.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value, path: &str) -> Result<Self, BindError> {
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item, &format!("{path}[{i}]")))
                .collect(),
            Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
            Value::String(s) => s
                .split(',')
                .enumerate()
                .map(|(i, part)| {
                    T::from_value(&Value::String(part.trim().to_string()), &format!("{path}[{i}]"))
                })
                .collect(),
            other => Err(mismatch(path, "array", other)),
        }
    }
}
