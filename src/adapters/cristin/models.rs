//! Cristin API wire details
//!
//! The API answers list requests with a bare JSON array and reports the size
//! of the full result set in a response header.

use crate::domain::{EntityKind, ExternalId};
use serde_json::Value;

/// Header carrying the total number of entries of a list request
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.cristin.no/v2";

/// Extracts the external id of a list entry
///
/// The id lives in the kind's `cristin_*_id` field and may be sent as a
/// string or as a number.
pub fn parse_external_id(kind: EntityKind, entry: &Value) -> Result<ExternalId, String> {
    let field = kind.id_field();
    let raw = entry
        .get(field)
        .ok_or_else(|| format!("Entry has no \"{field}\" field"))?;
    ExternalId::from_json(raw).map_err(|e| format!("Invalid \"{field}\": {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_numeric_and_string_ids() {
        let entry = json!({"cristin_person_id": 12345, "first_name": "Ada"});
        assert_eq!(
            parse_external_id(EntityKind::Persons, &entry).unwrap().as_str(),
            "12345"
        );

        let entry = json!({"cristin_unit_id": "185.15.2.10"});
        assert_eq!(
            parse_external_id(EntityKind::Units, &entry).unwrap().as_str(),
            "185.15.2.10"
        );
    }

    #[test]
    fn test_contributors_use_result_id() {
        let entry = json!({"cristin_result_id": "777"});
        assert_eq!(
            parse_external_id(EntityKind::ResultContributors, &entry)
                .unwrap()
                .as_str(),
            "777"
        );
    }

    #[test]
    fn test_missing_id_field() {
        let err = parse_external_id(EntityKind::Projects, &json!({"title": "x"})).unwrap_err();
        assert!(err.contains("cristin_project_id"));
    }
}
