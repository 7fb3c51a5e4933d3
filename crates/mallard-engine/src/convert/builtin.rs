//! Built-in converters

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mallard_sdk::{EnumValue, Value};
use mallard_types::{TypeKind, ValueType};
use uuid::Uuid;

use super::{unparseable, ConverterRegistry};
use crate::error::ConversionError;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Register all built-in converters into the given registry.
pub(super) fn register_builtins(registry: &mut ConverterRegistry) {
    registry.register(TypeKind::Text, TypeKind::Integer, parse_integer, format_text);
    registry.register(TypeKind::Text, TypeKind::Float, parse_float, format_text);
    registry.register(TypeKind::Text, TypeKind::Boolean, parse_boolean, format_text);
    registry.register(TypeKind::Text, TypeKind::DateTime, parse_datetime, format_text);
    registry.register(TypeKind::Text, TypeKind::Enum, parse_enum, format_text);
    registry.register(TypeKind::Text, TypeKind::Uuid, parse_uuid, format_text);
    registry.register(TypeKind::Integer, TypeKind::Float, widen_integer, narrow_float);
}

fn text<'a>(value: &'a Value, to: &ValueType) -> Result<&'a str, ConversionError> {
    value
        .as_text()
        .map(str::trim)
        .ok_or_else(|| unparseable(value, to, "expected text"))
}

fn parse_integer(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    text(value, to)?
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| unparseable(value, to, e))
}

fn parse_float(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    text(value, to)?
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|e| unparseable(value, to, e))
}

fn parse_boolean(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    let s = text(value, to)?;
    if s.eq_ignore_ascii_case("true") {
        Ok(Value::Bool(true))
    } else if s.eq_ignore_ascii_case("false") {
        Ok(Value::Bool(false))
    } else {
        Err(unparseable(value, to, "expected true or false"))
    }
}

fn parse_datetime(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    let s = text(value, to)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Value::DateTime(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Value::DateTime(naive.and_utc()));
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Value::DateTime(naive.and_utc()));
    }
    Err(unparseable(value, to, "not a recognised date/time"))
}

fn parse_enum(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    let s = text(value, to)?;
    let ty = match to {
        ValueType::Enum(ty) => ty,
        _ => return Err(unparseable(value, to, "target is not an enum")),
    };
    ty.variant_ignore_case(s)
        .and_then(|variant| EnumValue::new(ty.clone(), variant))
        .map(Value::Enum)
        .ok_or_else(|| unparseable(value, to, format!("no variant named {:?} in {}", s, ty.name())))
}

fn parse_uuid(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    Uuid::parse_str(text(value, to)?)
        .map(Value::Uuid)
        .map_err(|e| unparseable(value, to, e))
}

fn format_text(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    let s = match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Enum(e) => e.variant().to_string(),
        Value::Uuid(u) => u.hyphenated().to_string(),
        Value::Text(s) => s.clone(),
        other => return Err(unparseable(other, to, "no text form")),
    };
    Ok(Value::Text(s))
}

fn widen_integer(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    value
        .as_int()
        .map(|i| Value::Float(i as f64))
        .ok_or_else(|| unparseable(value, to, "expected integer"))
}

fn narrow_float(value: &Value, to: &ValueType) -> Result<Value, ConversionError> {
    let f = value
        .as_float()
        .ok_or_else(|| unparseable(value, to, "expected float"))?;
    if f.fract() != 0.0 || !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(unparseable(value, to, "not an integral value in range"));
    }
    Ok(Value::Int(f as i64))
}
