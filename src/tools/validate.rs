//! Local input checks shared by the tools.
//!
//! Everything here fails with `TpError::Validation` and never touches the
//! network.

use chrono::NaiveDate;

use crate::error::TpError;
use crate::models::EntityType;
use crate::tp_client::{UserRef, MAX_TAKE};

/// Rejects a blank required string.
pub fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, TpError> {
    if value.trim().is_empty() {
        return Err(TpError::validation(format!("{} is required", field)));
    }
    Ok(value)
}

/// Rejects a non-positive id.
pub fn require_id(id: i64, field: &str) -> Result<i64, TpError> {
    if id <= 0 {
        return Err(TpError::validation(format!(
            "{} must be a positive integer, got {}",
            field, id
        )));
    }
    Ok(id)
}

/// Like [`require_id`] for an optional id.
pub fn optional_id(id: Option<i64>, field: &str) -> Result<Option<i64>, TpError> {
    id.map(|id| require_id(id, field)).transpose()
}

/// Rejects negative or non-finite hours and effort values.
pub fn require_non_negative(value: f64, field: &str) -> Result<f64, TpError> {
    if !value.is_finite() || value < 0.0 {
        return Err(TpError::validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(value)
}

/// Parses an optional `YYYY-MM-DD` date bound.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, TpError> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                TpError::validation(format!(
                    "{} must be a date in YYYY-MM-DD format, got {:?}",
                    field, raw
                ))
            })
        })
        .transpose()
}

/// Applies the default page size and rejects values outside `1..=MAX_TAKE`.
pub fn resolve_limit(limit: Option<u32>, default: u32) -> Result<u32, TpError> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_TAKE).contains(&limit) {
        return Err(TpError::validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_TAKE, limit
        )));
    }
    Ok(limit)
}

/// Parses an entity type name.
pub fn parse_entity_type(value: &str) -> Result<EntityType, TpError> {
    require_text(value, "entity_type")?.parse()
}

/// Parses a list of entity type names, falling back to `default` when absent.
pub fn parse_entity_types(
    values: Option<&[String]>,
    default: &[EntityType],
) -> Result<Vec<EntityType>, TpError> {
    match values {
        None => Ok(default.to_vec()),
        Some(values) => {
            let mut types = Vec::with_capacity(values.len());
            for value in values {
                let parsed = parse_entity_type(value)?;
                if !types.contains(&parsed) {
                    types.push(parsed);
                }
            }
            Ok(types)
        }
    }
}

/// Requires a type that carries a workflow state (UserStory, Task, Bug).
pub fn require_assignable(entity_type: EntityType) -> Result<EntityType, TpError> {
    if !entity_type.is_assignable() {
        return Err(TpError::validation(format!(
            "{} has no workflow state; expected UserStory, Task or Bug",
            entity_type
        )));
    }
    Ok(entity_type)
}

/// Builds a user reference from optional id and email; neither means the caller.
pub fn user_ref(user_id: Option<i64>, email: Option<&str>) -> Result<UserRef, TpError> {
    match (user_id, email) {
        (Some(_), Some(_)) => Err(TpError::validation(
            "provide either user_id or email, not both",
        )),
        (Some(id), None) => Ok(UserRef::Id(require_id(id, "user_id")?)),
        (None, Some(email)) => Ok(UserRef::Email(email.to_string())),
        (None, None) => Ok(UserRef::Me),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("x", "name").unwrap(), "x");
        let err = require_text("  ", "name").unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn test_require_id() {
        assert!(require_id(1, "story_id").is_ok());
        assert!(require_id(0, "story_id").is_err());
        assert!(optional_id(None, "project_id").unwrap().is_none());
        assert!(optional_id(Some(-1), "project_id").is_err());
    }

    #[test]
    fn test_require_non_negative() {
        assert_eq!(require_non_negative(0.0, "hours").unwrap(), 0.0);
        assert!(require_non_negative(-0.5, "hours").is_err());
        assert!(require_non_negative(f64::NAN, "hours").is_err());
        assert!(require_non_negative(f64::INFINITY, "effort").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2024-01-31"), "created_after").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(parse_date(None, "created_after").unwrap(), None);
        let err = parse_date(Some("31/01/2024"), "created_after").unwrap_err();
        assert!(err.to_string().contains("created_after"));
        assert!(parse_date(Some("2024-02-30"), "created_before").is_err());
    }

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 50).unwrap(), 50);
        assert_eq!(resolve_limit(Some(1000), 50).unwrap(), 1000);
        assert!(resolve_limit(Some(0), 50).is_err());
        assert!(resolve_limit(Some(1001), 50).is_err());
    }

    #[test]
    fn test_parse_entity_types() {
        assert_eq!(
            parse_entity_types(None, &EntityType::WORK_ITEMS).unwrap(),
            EntityType::WORK_ITEMS.to_vec()
        );
        let values = vec!["bug".to_string(), "Bugs".to_string(), "Task".to_string()];
        assert_eq!(
            parse_entity_types(Some(&values), &[]).unwrap(),
            vec![EntityType::Bug, EntityType::Task]
        );
        let values = vec!["Epic".to_string()];
        assert!(parse_entity_types(Some(&values), &[]).is_err());
    }

    #[test]
    fn test_require_assignable() {
        assert!(require_assignable(EntityType::Bug).is_ok());
        assert!(require_assignable(EntityType::Project).is_err());
    }

    #[test]
    fn test_user_ref() {
        assert_eq!(user_ref(None, None).unwrap(), UserRef::Me);
        assert_eq!(user_ref(Some(4), None).unwrap(), UserRef::Id(4));
        assert_eq!(
            user_ref(None, Some("a@b.c")).unwrap(),
            UserRef::Email("a@b.c".to_string())
        );
        assert!(user_ref(Some(4), Some("a@b.c")).is_err());
        assert!(user_ref(Some(0), None).is_err());
    }
}
