//! Payload normalization.
//!
//! Backends and static files disagree on shape: some send an object keyed by
//! name, some an array, some wrap either in an envelope such as
//! `{"careers": {...}, "total": 12}` or `{"categories": [{"problems": [...]}]}`.
//! Everything funnels through [`Payload`] and comes out as an ordered
//! `Vec<T>`, or is rejected as a whole.

use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::models::{Content, ContentKind, slugify};

/// Envelopes nested deeper than this are not unwrapped.
const MAX_ENVELOPE_DEPTH: usize = 3;

/// The two collection shapes a payload can take once unwrapped.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Object keyed by display name (or by group name)
    Map(Map<String, Value>),
    /// Plain sequence of records (or of groups)
    Array(Vec<Value>),
}

impl Payload {
    /// Strip envelopes and discriminate the collection shape.
    pub fn parse(kind: ContentKind, value: Value) -> Result<Self> {
        match unwrap_envelope(kind, value, 0) {
            Value::Object(map) => Ok(Payload::Map(map)),
            Value::Array(values) => Ok(Payload::Array(values)),
            other => Err(AppError::schema(format!(
                "expected an object or array for {kind}, found {}",
                type_name(&other)
            ))),
        }
    }
}

/// Normalize a raw JSON document into typed records, preserving source order.
pub fn normalize<T: Content>(value: Value) -> Result<Vec<T>> {
    let payload = Payload::parse(T::KIND, value)?;

    let mut records = Vec::new();
    match payload {
        Payload::Map(entries) => collect_map::<T>(entries, None, &mut records)?,
        Payload::Array(values) => collect_array::<T>(values, None, &mut records)?,
    }

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(Value::Object(record))
                .map_err(|e| AppError::schema(format!("{} item {index}: {e}", T::KIND)))
        })
        .collect()
}

fn unwrap_envelope(kind: ContentKind, value: Value, depth: usize) -> Value {
    if depth >= MAX_ENVELOPE_DEPTH {
        return value;
    }
    let Value::Object(mut map) = value else {
        return value;
    };
    match envelope_key(kind, &map) {
        Some(key) => match map.remove(&key) {
            Some(inner) => unwrap_envelope(kind, inner, depth + 1),
            None => Value::Object(map),
        },
        None => Value::Object(map),
    }
}

/// Known envelope key present with a collection value, else a key that
/// starts with the kind's primary key (`careersArray`, `resourcesList`).
fn envelope_key(kind: ContentKind, map: &Map<String, Value>) -> Option<String> {
    let is_collection = |v: &Value| v.is_array() || v.is_object();
    let keys = kind.envelope_keys();

    keys.iter()
        .find(|key| map.get(**key).is_some_and(is_collection))
        .map(|key| key.to_string())
        .or_else(|| {
            let primary = keys.first()?;
            map.iter()
                .find(|(k, v)| k.starts_with(primary) && is_collection(v))
                .map(|(k, _)| k.clone())
        })
}

fn collect_map<T: Content>(
    entries: Map<String, Value>,
    group: Option<&str>,
    out: &mut Vec<Map<String, Value>>,
) -> Result<()> {
    for (key, value) in entries {
        match value {
            Value::Object(obj) if is_group::<T>(&obj) => {
                collect_map::<T>(obj, Some(group.unwrap_or(&key)), out)?;
            }
            Value::Object(obj) => out.push(finish::<T>(obj, Some(&key), group)),
            Value::Array(values) => {
                collect_array::<T>(values, Some(group.unwrap_or(&key)), out)?;
            }
            other => {
                return Err(AppError::schema(format!(
                    "entry '{key}' is {}, expected an object or array",
                    type_name(&other)
                )));
            }
        }
    }
    Ok(())
}

fn collect_array<T: Content>(
    values: Vec<Value>,
    group: Option<&str>,
    out: &mut Vec<Map<String, Value>>,
) -> Result<()> {
    for (index, value) in values.into_iter().enumerate() {
        let Value::Object(mut obj) = value else {
            return Err(AppError::schema(format!(
                "element {index} is not an object"
            )));
        };

        let nested = T::NESTED_FIELD.filter(|field| matches!(obj.get(*field), Some(Value::Array(_))));
        if let Some(field) = nested {
            let children = match obj.remove(field) {
                Some(Value::Array(children)) => children,
                _ => Vec::new(),
            };
            let group_name = text_field(&obj, "name")
                .or_else(|| text_field(&obj, "title"))
                .or(group.map(str::to_string));
            collect_array::<T>(children, group_name.as_deref(), out)?;
            continue;
        }

        out.push(finish::<T>(obj, None, group));
    }
    Ok(())
}

/// An object whose values are all arrays of objects is a group of
/// subcategories, not a record. Record fields such as `skills` never count.
fn is_group<T: Content>(obj: &Map<String, Value>) -> bool {
    if obj.contains_key(T::DISPLAY_FIELD)
        || obj.keys().any(|k| T::LIST_FIELDS.contains(&k.as_str()))
    {
        return false;
    }
    let arrays: Option<Vec<&Vec<Value>>> = obj.values().map(Value::as_array).collect();
    arrays.is_some_and(|arrays| {
        arrays.iter().any(|a| !a.is_empty())
            && arrays.iter().all(|a| a.iter().all(Value::is_object))
    })
}

/// Inject the map key, group name and derived id where the record lacks them.
fn finish<T: Content>(
    mut obj: Map<String, Value>,
    key: Option<&str>,
    group: Option<&str>,
) -> Map<String, Value> {
    if let Some(key) = key {
        if is_blank(obj.get(T::DISPLAY_FIELD)) {
            obj.insert(T::DISPLAY_FIELD.to_string(), Value::String(key.to_string()));
        }
    }
    if let Some(group) = group {
        if is_blank(obj.get(T::GROUP_FIELD)) {
            obj.insert(T::GROUP_FIELD.to_string(), Value::String(group.to_string()));
        }
    }
    if is_blank(obj.get("id")) {
        let basis = key
            .map(str::to_string)
            .or_else(|| text_field(&obj, T::DISPLAY_FIELD));
        if let Some(basis) = basis {
            obj.insert("id".to_string(), Value::String(slugify(&basis)));
        }
    }
    obj
}

fn text_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
