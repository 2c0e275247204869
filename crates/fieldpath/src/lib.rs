//! # fieldpath
//!
//! Typed access to values nested inside semi-structured resource trees.
//!
//! A field path is a dotted list of object keys with optional array indices:
//!
//! ```text
//! spec.forProvider.users
//! spec.forProvider.defaultRoute[0].slack[0].channelId
//! ```
//!
//! The central operation is [`apply`]: read the value at a path into the
//! type a transform expects, run the transform, and write its output back
//! at the same place. A path that does not exist is not an error, since not
//! every resource of a kind sets every field.
//!
//! ## Example
//!
//! ```
//! use fieldpath::{apply, Applied};
//! use serde_json::json;
//!
//! let mut object = json!({"spec": {"forProvider": {"users": ["alice", "bob"]}}});
//!
//! let applied = apply(&mut object, "spec.forProvider.users", |users: Vec<String>| {
//!     Ok::<_, fieldpath::Error>(users.into_iter().map(|u| u.to_uppercase()).collect::<Vec<_>>())
//! })
//! .unwrap();
//!
//! assert_eq!(applied, Applied::Replaced);
//! assert_eq!(object["spec"]["forProvider"]["users"], json!(["ALICE", "BOB"]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod path;

pub use error::{Error, Result};
pub use path::Segment;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Outcome of [`apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Nothing was found at the path; the tree is untouched.
    Missing,
    /// The transform ran and its output replaced the old value.
    Replaced,
}

/// Borrow the value at `path`.
///
/// Returns `Ok(None)` when any segment is absent, an index is out of range,
/// or the value is JSON `null`.
pub fn get<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>> {
    let segments = Segment::parse(path)?;
    let mut current = root;
    for segment in &segments {
        let next = match (segment, current) {
            (Segment::Field(name), Value::Object(map)) => map.get(name),
            (Segment::Index(idx), Value::Array(items)) => items.get(*idx),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    if current.is_null() {
        return Ok(None);
    }
    Ok(Some(current))
}

/// Decode the value at `path` into `T`.
///
/// Absence is `Ok(None)`; a value of the wrong shape is [`Error::Decode`].
pub fn get_into<T: DeserializeOwned>(root: &Value, path: &str) -> Result<Option<T>> {
    match get(root, path)? {
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|e| Error::decode(path, e)),
        None => Ok(None),
    }
}

/// Write `value` at `path`, creating missing intermediate objects.
///
/// Array indices must already exist; this never grows an array.
pub fn set<T: Serialize>(root: &mut Value, path: &str, value: T) -> Result<()> {
    let segments = Segment::parse(path)?;
    let encoded = serde_json::to_value(value).map_err(|e| Error::encode(path, e))?;

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| Error::InvalidPath {
            path: path.to_string(),
            reason: "path is empty".to_string(),
        })?;

    let mut current = root;
    for segment in parents {
        current = match segment {
            Segment::Field(name) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                let map = current
                    .as_object_mut()
                    .ok_or_else(|| Error::not_an_object(path, name))?;
                map.entry(name.clone())
                    .or_insert_with(|| Value::Object(Map::new()))
            }
            Segment::Index(idx) => current
                .as_array_mut()
                .and_then(|items| items.get_mut(*idx))
                .ok_or_else(|| Error::IndexOutOfRange {
                    path: path.to_string(),
                    index: *idx,
                })?,
        };
    }

    match last {
        Segment::Field(name) => {
            if current.is_null() {
                *current = Value::Object(Map::new());
            }
            let map = current
                .as_object_mut()
                .ok_or_else(|| Error::not_an_object(path, name))?;
            map.insert(name.clone(), encoded);
        }
        Segment::Index(idx) => {
            let slot = current
                .as_array_mut()
                .and_then(|items| items.get_mut(*idx))
                .ok_or_else(|| Error::IndexOutOfRange {
                    path: path.to_string(),
                    index: *idx,
                })?;
            *slot = encoded;
        }
    }
    Ok(())
}

/// Transform the value at `path` in place.
///
/// The current value is decoded into `I`. If the path is absent the
/// transform is not called and [`Applied::Missing`] is returned. If the
/// transform fails its error is returned and the tree keeps its prior value.
/// Decode and write failures are converted into the caller's error type.
pub fn apply<I, O, E, F>(root: &mut Value, path: &str, transform: F) -> std::result::Result<Applied, E>
where
    I: DeserializeOwned,
    O: Serialize,
    E: From<Error>,
    F: FnOnce(I) -> std::result::Result<O, E>,
{
    let Some(current) = get_into::<I>(root, path)? else {
        return Ok(Applied::Missing);
    };
    let replacement = transform(current)?;
    set(root, path, replacement)?;
    Ok(Applied::Replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shift() -> Value {
        json!({
            "apiVersion": "oncall.grafana.crossplane.io/v1alpha1",
            "kind": "OnCallShift",
            "spec": {
                "forProvider": {
                    "users": ["alice@example.com", "bob"],
                    "rollingUsers": [["a"], ["b", "c"]],
                    "defaultRoute": [{"slack": [{"channelId": "alerts"}]}]
                },
                "providerConfigRef": {"name": "default"}
            }
        })
    }

    #[test]
    fn test_get_nested_field() {
        let obj = shift();
        let value = get(&obj, "spec.providerConfigRef.name").unwrap();
        assert_eq!(value, Some(&json!("default")));
    }

    #[test]
    fn test_get_through_index() {
        let obj = shift();
        let value = get(&obj, "spec.forProvider.defaultRoute[0].slack[0].channelId").unwrap();
        assert_eq!(value, Some(&json!("alerts")));
    }

    #[test]
    fn test_get_missing_is_none() {
        let obj = shift();
        assert_eq!(get(&obj, "spec.forProvider.teamId").unwrap(), None);
        assert_eq!(get(&obj, "spec.forProvider.defaultRoute[3].slack").unwrap(), None);
        assert_eq!(get(&obj, "spec.forProvider.users.nested").unwrap(), None);
    }

    #[test]
    fn test_get_null_is_none() {
        let obj = json!({"spec": {"teamId": null}});
        assert_eq!(get(&obj, "spec.teamId").unwrap(), None);
    }

    #[test]
    fn test_get_into_shape_mismatch() {
        let obj = shift();
        let err = get_into::<String>(&obj, "spec.forProvider.users").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_get_into_nested_lists() {
        let obj = shift();
        let groups: Vec<Vec<String>> = get_into(&obj, "spec.forProvider.rollingUsers")
            .unwrap()
            .unwrap();
        assert_eq!(groups, vec![vec!["a"], vec!["b", "c"]]);
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut obj = json!({"spec": {}});
        set(&mut obj, "spec.forProvider.teamId", "T1").unwrap();
        assert_eq!(obj["spec"]["forProvider"]["teamId"], json!("T1"));
    }

    #[test]
    fn test_set_refuses_to_grow_arrays() {
        let mut obj = json!({"items": []});
        let err = set(&mut obj, "items[0]", 1).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut obj = json!({"spec": "flat"});
        let err = set(&mut obj, "spec.teamId", "T1").unwrap_err();
        assert!(matches!(err, Error::NotAnObject { .. }));
    }

    #[test]
    fn test_apply_missing_leaves_tree_unchanged() {
        let mut obj = shift();
        let before = serde_json::to_vec(&obj).unwrap();

        let applied = apply(&mut obj, "spec.forProvider.teamId", |_: String| -> Result<String> {
            panic!("transform must not run for a missing path")
        })
        .unwrap();

        assert_eq!(applied, Applied::Missing);
        assert_eq!(serde_json::to_vec(&obj).unwrap(), before);
    }

    #[test]
    fn test_apply_replaces_value() {
        let mut obj = shift();
        apply(&mut obj, "spec.forProvider.rollingUsers", |groups: Vec<Vec<String>>| {
            Ok::<_, Error>(
                groups
                    .into_iter()
                    .map(|g| g.into_iter().map(|u| format!("U-{u}")).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            )
        })
        .unwrap();
        assert_eq!(
            obj["spec"]["forProvider"]["rollingUsers"],
            json!([["U-a"], ["U-b", "U-c"]])
        );
    }

    #[test]
    fn test_apply_transform_error_does_not_write() {
        let mut obj = shift();
        let result = apply(&mut obj, "spec.forProvider.users", |_: Vec<String>| {
            Err::<Vec<String>, _>(Error::Other("lookup failed".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(
            obj["spec"]["forProvider"]["users"],
            json!(["alice@example.com", "bob"])
        );
    }

    #[test]
    fn test_apply_into_index_path() {
        let mut obj = shift();
        let applied = apply(
            &mut obj,
            "spec.forProvider.defaultRoute[0].slack[0].channelId",
            |name: String| Ok::<_, Error>(format!("C-{name}")),
        )
        .unwrap();
        assert_eq!(applied, Applied::Replaced);
        assert_eq!(
            obj["spec"]["forProvider"]["defaultRoute"][0]["slack"][0]["channelId"],
            json!("C-alerts")
        );
    }
}
