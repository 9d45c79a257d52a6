//! Normalization of `restSearch` response bodies.
//!
//! Depending on the MISP version and client library, an attribute search comes
//! back as a bare JSON list, as `{"response": {"Attribute": [...]}}`, or as
//! `{"Attribute": [...]}`. Everything past this module sees a plain list.

use serde_json::Value;

use crate::types::Attribute;

/// Extract the attribute list from any of the known response shapes
///
/// Shapes that carry no attribute list (an object without `Attribute`, a
/// scalar) yield an empty list. An `Attribute` member that is not a list is a
/// decode error. Entries that are not attribute objects are kept as empty
/// attributes: they still count toward the page size, but produce no entry.
pub fn attributes_from_response(body: Value) -> serde_json::Result<Vec<Attribute>> {
    let list = match body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove("response") {
            Some(Value::Object(mut inner)) => inner.remove("Attribute").unwrap_or_default(),
            Some(_) => Value::Null,
            None => map.remove("Attribute").unwrap_or_default(),
        },
        _ => Value::Null,
    };

    let items: Vec<Value> = match list {
        Value::Null => return Ok(Vec::new()),
        list => serde_json::from_value(list)?,
    };

    Ok(items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "malformed attribute in response, skipping");
                Attribute::default()
            })
        })
        .collect())
}
