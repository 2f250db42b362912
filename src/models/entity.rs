//! Generic entity record.
//!
//! Targetprocess returns PascalCase JSON objects whose shape depends on the
//! entity type and the `include` expansion requested. [`Entity`] keeps the
//! object as-is (field order preserved) and offers typed access to the
//! fields every entity has.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::EntityType;

/// A reference to a remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// The resource type.
    pub entity_type: EntityType,
    /// The server-assigned id.
    pub id: i64,
}

/// One entity record as returned by Targetprocess.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: Map<String, Value>,
}

impl Entity {
    /// Wraps an existing field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The `Id` field.
    pub fn id(&self) -> Option<i64> {
        self.fields.get("Id").and_then(Value::as_i64)
    }

    /// The `Name` field.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("Name").and_then(Value::as_str)
    }

    /// The `EntityState.Name` field.
    pub fn state_name(&self) -> Option<&str> {
        self.fields
            .get("EntityState")
            .and_then(|s| s.get("Name"))
            .and_then(Value::as_str)
    }

    /// The `ResourceType` field parsed into an [`EntityType`].
    pub fn resource_type(&self) -> Option<EntityType> {
        self.fields
            .get("ResourceType")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// `ResourceType` and `Id` as a reference.
    pub fn entity_ref(&self) -> Option<EntityRef> {
        Some(EntityRef {
            entity_type: self.resource_type()?,
            id: self.id()?,
        })
    }

    /// The `Id` of a nested reference, e.g. `nested_id(&["Project", "Process"])`.
    pub fn nested_id(&self, path: &[&str]) -> Option<i64> {
        let (first, rest) = path.split_first()?;
        let mut value = self.fields.get(*first)?;
        for key in rest {
            value = value.get(key)?;
        }
        value.get("Id").and_then(Value::as_i64)
    }

    /// The `TimeSpent` field, zero when absent or null.
    pub fn time_spent(&self) -> f64 {
        self.fields
            .get("TimeSpent")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Any field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// All fields in server order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Rewrites `/Date(ms±hhmm)/` literals to RFC 3339, recursively.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for value in self.fields.values_mut() {
            normalize_value(value);
        }
        self
    }
}

fn normalize_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if let Some(converted) = parse_tp_date(s) {
                *s = converted;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_value),
        Value::Object(map) => map.values_mut().for_each(normalize_value),
        _ => {}
    }
}

/// Converts a `/Date(1700000000000+0100)/` literal to RFC 3339.
///
/// The millisecond count is UTC; the optional suffix is the zone to render in.
/// Returns `None` for anything else.
pub fn parse_tp_date(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix("/Date(")?.strip_suffix(")/")?;

    // A leading '-' belongs to the millisecond count, not the offset.
    let split = inner
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i);

    let (millis, offset) = match split {
        Some(i) => (&inner[..i], Some(&inner[i..])),
        None => (inner, None),
    };

    let millis: i64 = millis.parse().ok()?;
    let utc = DateTime::from_timestamp_millis(millis)?;

    let offset = match offset {
        Some(raw) => parse_offset(raw)?,
        None => FixedOffset::east_opt(0)?,
    };

    Some(utc.with_timezone(&offset).to_rfc3339())
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    if raw.len() != 5 || !raw.is_ascii() {
        return None;
    }
    let sign = match &raw[..1] {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    let hours: i32 = raw[1..3].parse().ok()?;
    let minutes: i32 = raw[3..5].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_typed_accessors() {
        let e = entity(json!({
            "ResourceType": "UserStory",
            "Id": 42,
            "Name": "Login page",
            "EntityState": {"Id": 3, "Name": "Open"},
            "Project": {"Id": 7, "Process": {"Id": 2}},
            "TimeSpent": 1.5
        }));
        assert_eq!(e.id(), Some(42));
        assert_eq!(e.name(), Some("Login page"));
        assert_eq!(e.state_name(), Some("Open"));
        assert_eq!(
            e.entity_ref(),
            Some(EntityRef {
                entity_type: EntityType::UserStory,
                id: 42
            })
        );
        assert_eq!(e.nested_id(&["Project"]), Some(7));
        assert_eq!(e.nested_id(&["Project", "Process"]), Some(2));
        assert_eq!(e.time_spent(), 1.5);
    }

    #[test]
    fn test_missing_fields() {
        let e = entity(json!({"TimeSpent": null}));
        assert_eq!(e.id(), None);
        assert_eq!(e.state_name(), None);
        assert_eq!(e.nested_id(&["Project", "Process"]), None);
        assert_eq!(e.time_spent(), 0.0);
    }

    #[test]
    fn test_field_order_preserved() {
        let e = entity(json!({"Name": "x", "Id": 1, "Effort": 2}));
        let keys: Vec<&String> = e.fields().keys().collect();
        assert_eq!(keys, ["Name", "Id", "Effort"]);
    }

    #[test]
    fn test_parse_tp_date_with_offset() {
        assert_eq!(
            parse_tp_date("/Date(1700000000000+0100)/").as_deref(),
            Some("2023-11-14T23:13:20+01:00")
        );
    }

    #[test]
    fn test_parse_tp_date_without_offset() {
        assert_eq!(
            parse_tp_date("/Date(1700000000000)/").as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );
    }

    #[test]
    fn test_parse_tp_date_rejects_other_strings() {
        assert_eq!(parse_tp_date("2023-11-14"), None);
        assert_eq!(parse_tp_date("/Date(abc)/"), None);
        assert_eq!(parse_tp_date("/Date(1700000000000+01)/"), None);
    }

    #[test]
    fn test_normalized_rewrites_nested_dates() {
        let e = entity(json!({
            "Id": 1,
            "CreateDate": "/Date(1700000000000+0000)/",
            "Comments": {"Items": [{"CreateDate": "/Date(1700000000000-0500)/"}]},
            "Name": "/Date is not a date"
        }))
        .normalized();
        assert_eq!(e.get("CreateDate"), Some(&json!("2023-11-14T22:13:20+00:00")));
        assert_eq!(
            e.get("Comments").unwrap()["Items"][0]["CreateDate"],
            json!("2023-11-14T17:13:20-05:00")
        );
        assert_eq!(e.name(), Some("/Date is not a date"));
    }
}
