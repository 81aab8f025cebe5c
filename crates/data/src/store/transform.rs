//! Field update application.
//!
//! Pure functions over a [`Document`]; the store calls [`apply_all`] on a
//! copy of the stored document under its write lock and swaps the copy in
//! only if every update succeeded.

use serde_json::Value;

use super::{Document, FieldUpdate, StoreError};

/// Apply `updates` in order to `doc`.
pub(super) fn apply_all(doc: &mut Document, updates: &[FieldUpdate]) -> Result<(), StoreError> {
    for update in updates {
        apply(doc, update)?;
    }
    Ok(())
}

fn apply(doc: &mut Document, update: &FieldUpdate) -> Result<(), StoreError> {
    match update {
        FieldUpdate::Set { field, value } => {
            doc.insert(field.clone(), value.clone());
        }
        FieldUpdate::ArrayUnion { field, values } => {
            let array = array_mut(doc, field, true)?;
            if let Some(array) = array {
                for value in values {
                    if !array.contains(value) {
                        array.push(value.clone());
                    }
                }
            }
        }
        FieldUpdate::KeyedArrayUnion {
            field,
            key_field,
            element,
        } => {
            let key = element_key(field, key_field, element)?.clone();
            if let Some(array) = array_mut(doc, field, true)? {
                if array.iter().any(|item| same_content(item, element)) {
                    return Ok(());
                }
                if position_of(array, key_field, &key).is_some() {
                    return Err(StoreError::KeyedElementConflict {
                        field: field.clone(),
                        key_field: key_field.clone(),
                        key: key.to_string(),
                    });
                }
                array.push(element.clone());
            }
        }
        FieldUpdate::KeyedArrayReplace {
            field,
            key_field,
            element,
        } => {
            let key = element_key(field, key_field, element)?.clone();
            if let Some(array) = array_mut(doc, field, false)?
                && let Some(idx) = position_of(array, key_field, &key)
                && let Some(slot) = array.get_mut(idx)
            {
                *slot = element.clone();
            }
        }
        FieldUpdate::KeyedArrayRemove {
            field,
            key_field,
            key,
        } => {
            if let Some(array) = array_mut(doc, field, false)?
                && let Some(idx) = position_of(array, key_field, key)
            {
                array.remove(idx);
            }
        }
    }
    Ok(())
}

/// Borrow `field` as an array. A missing field is created when `create` is
/// set and reported as `None` otherwise.
fn array_mut<'a>(
    doc: &'a mut Document,
    field: &str,
    create: bool,
) -> Result<Option<&'a mut Vec<Value>>, StoreError> {
    if matches!(doc.get(field), None | Some(Value::Null)) {
        if !create {
            return Ok(None);
        }
        doc.insert(field.to_owned(), Value::Array(Vec::new()));
    }
    match doc.get_mut(field) {
        Some(Value::Array(array)) => Ok(Some(array)),
        Some(_) => Err(StoreError::FieldType {
            field: field.to_owned(),
            expected: "an array",
        }),
        None => Ok(None),
    }
}

fn element_key<'a>(
    field: &str,
    key_field: &str,
    element: &'a Value,
) -> Result<&'a Value, StoreError> {
    element
        .as_object()
        .and_then(|obj| obj.get(key_field))
        .ok_or_else(|| StoreError::FieldType {
            field: format!("{field}[].{key_field}"),
            expected: "present on the element",
        })
}

/// Equality that treats a `null` map member the same as an absent one.
fn same_content(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            let present = |map: &Document| {
                map.iter().filter(|(_, v)| !v.is_null()).count()
            };
            present(a) == present(b)
                && a.iter()
                    .filter(|(_, v)| !v.is_null())
                    .all(|(k, v)| b.get(k).is_some_and(|other| same_content(v, other)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_content(x, y))
        }
        _ => a == b,
    }
}

fn position_of(array: &[Value], key_field: &str, key: &Value) -> Option<usize> {
    array
        .iter()
        .position(|item| item.get(key_field) == Some(key))
}
