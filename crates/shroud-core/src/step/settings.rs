/*!
# Step Settings

Declared settings schema of a step and the validator that turns user
overrides into a complete, typed [`Settings`] map.
*/

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::ConfigError;

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    String(Cow<'static, str>),
}

/// Declared type of an option, with inclusive bounds for numeric types.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingType {
    Number { min: Option<f64>, max: Option<f64> },
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    String,
    Enum(&'static [&'static str]),
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bounds<T: fmt::Display>(min: &Option<T>, max: &Option<T>) -> String {
            let show = |b: &Option<T>| b.as_ref().map_or_else(|| "_".to_string(), T::to_string);
            format!("[{}, {}]", show(min), show(max))
        }
        match self {
            SettingType::Number { min, max } => write!(f, "number {}", bounds(min, max)),
            SettingType::Integer { min, max } => write!(f, "integer {}", bounds(min, max)),
            SettingType::Boolean => write!(f, "boolean"),
            SettingType::String => write!(f, "string"),
            SettingType::Enum(choices) => write!(f, "one of {}", choices.join("|")),
        }
    }
}

/// One entry of a step's settings schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: SettingType,
    pub default: SettingValue,
}

/// Validated settings: every declared option has a value that passed the
/// type and range checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    step: String,
    values: IndexMap<String, SettingValue>,
}

impl Settings {
    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn number(&self, name: &str) -> Result<f64, ConfigError> {
        match self.lookup(name)? {
            SettingValue::Number(n) => Ok(*n),
            SettingValue::Integer(i) => Ok(*i as f64),
            other => Err(self.mismatch(name, "number", other)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ConfigError> {
        match self.lookup(name)? {
            SettingValue::Integer(i) => Ok(*i),
            other => Err(self.mismatch(name, "integer", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ConfigError> {
        match self.lookup(name)? {
            SettingValue::Boolean(b) => Ok(*b),
            other => Err(self.mismatch(name, "boolean", other)),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, ConfigError> {
        match self.lookup(name)? {
            SettingValue::String(s) => Ok(s),
            other => Err(self.mismatch(name, "string", other)),
        }
    }

    fn lookup(&self, name: &str) -> Result<&SettingValue, ConfigError> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigError::missing_option(&self.step, name))
    }

    fn mismatch(&self, name: &str, expected: &str, actual: &SettingValue) -> ConfigError {
        ConfigError::wrong_type(&self.step, name, expected, &format!("{actual:?}"))
    }
}

/// Merge `overrides` over the declared defaults and check every value.
pub fn validate(
    step: &str,
    descriptors: &[SettingDescriptor],
    overrides: &Map<String, Value>,
) -> Result<Settings, ConfigError> {
    if let Some(unknown) = overrides
        .keys()
        .find(|key| !descriptors.iter().any(|d| d.name == key.as_str()))
    {
        return Err(ConfigError::UnknownOption {
            step: step.to_string(),
            option: unknown.clone(),
        });
    }

    let mut values = IndexMap::new();
    for descriptor in descriptors {
        let value = match overrides.get(descriptor.name) {
            Some(raw) => convert(step, descriptor, raw)?,
            None => descriptor.default.clone(),
        };
        check(step, descriptor, &value)?;
        values.insert(descriptor.name.to_string(), value);
    }

    Ok(Settings {
        step: step.to_string(),
        values,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn convert(
    step: &str,
    descriptor: &SettingDescriptor,
    raw: &Value,
) -> Result<SettingValue, ConfigError> {
    let converted = match &descriptor.kind {
        SettingType::Number { .. } => raw.as_f64().map(SettingValue::Number),
        SettingType::Integer { .. } => raw.as_i64().map(SettingValue::Integer),
        SettingType::Boolean => raw.as_bool().map(SettingValue::Boolean),
        SettingType::String | SettingType::Enum(_) => raw
            .as_str()
            .map(|s| SettingValue::String(Cow::Owned(s.to_string()))),
    };
    converted.ok_or_else(|| {
        ConfigError::wrong_type(
            step,
            descriptor.name,
            &descriptor.kind.to_string(),
            json_type_name(raw),
        )
    })
}

fn check(
    step: &str,
    descriptor: &SettingDescriptor,
    value: &SettingValue,
) -> Result<(), ConfigError> {
    let out_of_range = |value: f64, min: f64, max: f64| ConfigError::OutOfRange {
        step: step.to_string(),
        option: descriptor.name.to_string(),
        value,
        min,
        max,
    };
    match (&descriptor.kind, value) {
        (SettingType::Number { min, max }, SettingValue::Number(n)) => {
            let (lo, hi) = (min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY));
            // NaN fails both comparisons and is rejected here.
            if !(*n >= lo && *n <= hi) {
                return Err(out_of_range(*n, lo, hi));
            }
        }
        (SettingType::Integer { min, max }, SettingValue::Integer(i)) => {
            let (lo, hi) = (min.unwrap_or(i64::MIN), max.unwrap_or(i64::MAX));
            if *i < lo || *i > hi {
                return Err(out_of_range(*i as f64, lo as f64, hi as f64));
            }
        }
        (SettingType::Boolean, SettingValue::Boolean(_))
        | (SettingType::String, SettingValue::String(_)) => {}
        (SettingType::Enum(choices), SettingValue::String(s)) => {
            if !choices.contains(&&**s) {
                return Err(ConfigError::InvalidChoice {
                    step: step.to_string(),
                    option: descriptor.name.to_string(),
                    value: s.to_string(),
                    choices: choices.iter().map(|c| c.to_string()).collect(),
                });
            }
        }
        (kind, other) => {
            return Err(ConfigError::wrong_type(
                step,
                descriptor.name,
                &kind.to_string(),
                &format!("{other:?}"),
            ))
        }
    }
    Ok(())
}
