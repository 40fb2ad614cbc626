//! Dot-path access into JSON values.
//!
//! A dot-path such as `choices.0.message.content` joins object keys and
//! zero-based array indices with `.`. A segment made only of ASCII digits
//! is an index when the current value is an array and a key otherwise.

use serde_json::{Map, Value};
use thiserror::Error;

/// Why a dot-path could not be followed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DotPathError {
    #[error("empty path")]
    EmptyPath,

    #[error("key '{key}' not found at '{at}'")]
    MissingKey { key: String, at: String },

    #[error("index {index} out of range (len {len}) at '{at}'")]
    IndexOutOfRange { index: usize, len: usize, at: String },

    #[error("cannot descend into {found} with '{segment}' at '{at}'")]
    NotAContainer {
        segment: String,
        found: &'static str,
        at: String,
    },
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn segments(path: &str) -> Result<Vec<&str>, DotPathError> {
    if path.is_empty() {
        return Err(DotPathError::EmptyPath);
    }
    Ok(path.split('.').collect())
}

/// Look up the value at `path`
pub fn resolve<'v>(value: &'v Value, path: &str) -> Result<&'v Value, DotPathError> {
    let parts = segments(path)?;
    let mut current = value;

    for (i, segment) in parts.iter().enumerate() {
        let at = parts[..i].join(".");
        current = match current {
            Value::Object(map) => map.get(*segment).ok_or_else(|| DotPathError::MissingKey {
                key: segment.to_string(),
                at,
            })?,
            Value::Array(items) => {
                let index: usize = segment.parse().map_err(|_| DotPathError::NotAContainer {
                    segment: segment.to_string(),
                    found: "an array",
                    at: at.clone(),
                })?;
                items.get(index).ok_or(DotPathError::IndexOutOfRange {
                    index,
                    len: items.len(),
                    at,
                })?
            }
            other => {
                return Err(DotPathError::NotAContainer {
                    segment: segment.to_string(),
                    found: kind_of(other),
                    at,
                })
            }
        };
    }

    Ok(current)
}

/// Set `new_value` at `path`, creating intermediate objects for missing keys.
///
/// Array indices must already exist; arrays are never grown.
pub fn set(target: &mut Value, path: &str, new_value: Value) -> Result<(), DotPathError> {
    let parts = segments(path)?;
    let (last, parents) = parts.split_last().ok_or(DotPathError::EmptyPath)?;
    let mut current = target;

    for (i, segment) in parents.iter().enumerate() {
        let at = parts[..i].join(".");
        current = step_mut(current, segment, at, true)?;
    }

    let at = parents.join(".");
    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), new_value);
            Ok(())
        }
        Value::Array(items) => {
            let len = items.len();
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(|| DotPathError::IndexOutOfRange {
                    index: last.parse().unwrap_or(usize::MAX),
                    len,
                    at,
                })?;
            *slot = new_value;
            Ok(())
        }
        other => Err(DotPathError::NotAContainer {
            segment: last.to_string(),
            found: kind_of(other),
            at,
        }),
    }
}

fn step_mut<'v>(
    current: &'v mut Value,
    segment: &str,
    at: String,
    create: bool,
) -> Result<&'v mut Value, DotPathError> {
    match current {
        Value::Object(map) => {
            if create && !map.contains_key(segment) {
                map.insert(segment.to_string(), Value::Object(Map::new()));
            }
            map.get_mut(segment).ok_or_else(|| DotPathError::MissingKey {
                key: segment.to_string(),
                at,
            })
        }
        Value::Array(items) => {
            let len = items.len();
            let index: usize = segment.parse().map_err(|_| DotPathError::NotAContainer {
                segment: segment.to_string(),
                found: "an array",
                at: at.clone(),
            })?;
            items
                .get_mut(index)
                .ok_or(DotPathError::IndexOutOfRange { index, len, at })
        }
        other => Err(DotPathError::NotAContainer {
            segment: segment.to_string(),
            found: kind_of(other),
            at,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_openai_shape() {
        let value = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(resolve(&value, "choices.0.message.content").unwrap(), "hi");
    }

    #[test]
    fn test_resolve_out_of_range_index() {
        let value = json!({"choices": [{"message": {"content": "hi"}}]});
        let err = resolve(&value, "choices.1.message.content").unwrap_err();
        assert_eq!(
            err,
            DotPathError::IndexOutOfRange {
                index: 1,
                len: 1,
                at: "choices".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_missing_key_and_scalar() {
        let value = json!({"text": "hello", "meta": {"id": 7}});
        assert!(matches!(
            resolve(&value, "meta.name"),
            Err(DotPathError::MissingKey { key, at }) if key == "name" && at == "meta"
        ));
        assert!(matches!(
            resolve(&value, "text.0"),
            Err(DotPathError::NotAContainer { found: "a string", .. })
        ));
        assert_eq!(resolve(&value, ""), Err(DotPathError::EmptyPath));
    }

    #[test]
    fn test_numeric_key_on_object() {
        let value = json!({"results": {"0": "zero"}});
        assert_eq!(resolve(&value, "results.0").unwrap(), "zero");
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut body = json!({"model": "m"});
        set(&mut body, "input.text", json!("hello")).unwrap();
        assert_eq!(body, json!({"model": "m", "input": {"text": "hello"}}));
    }

    #[test]
    fn test_set_into_existing_array() {
        let mut body = json!({"messages": [{"role": "user", "content": ""}]});
        set(&mut body, "messages.0.content", json!("hi")).unwrap();
        assert_eq!(body["messages"][0]["content"], "hi");

        let err = set(&mut body, "messages.3.content", json!("x")).unwrap_err();
        assert!(matches!(err, DotPathError::IndexOutOfRange { index: 3, len: 1, .. }));
    }
}
